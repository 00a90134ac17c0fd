//! Disk libraries and mocked single-file libraries.

use package::LibraryConfig;
use std::path::{Path, PathBuf};
use utility::{has_file_extension, FILE_EXTENSION};

/// A collection of sources compiled as one unit.
pub enum LibraryOwner {
    /// Rooted at a folder with a manifest.
    Disk(DiskLibrary),
    /// A single loose workspace file, wrapped in an ad-hoc library.
    Mock(MockLibrary),
}

pub struct DiskLibrary {
    root: PathBuf,
    config: LibraryConfig,
    sources: Vec<PathBuf>,
}

pub struct MockLibrary {
    file: PathBuf,
}

impl LibraryOwner {
    pub fn disk(root: PathBuf, config: LibraryConfig) -> Self {
        let sources = config.library_sources(&root);
        Self::Disk(DiskLibrary {
            root,
            config,
            sources,
        })
    }

    pub fn mock(file: PathBuf) -> Self {
        Self::Mock(MockLibrary { file })
    }

    pub fn name(&self) -> String {
        match self {
            Self::Disk(library) => library.config.name.clone(),
            Self::Mock(library) => library
                .file
                .file_stem()
                .map_or_else(|| "<anonymous>".into(), |stem| stem.to_string_lossy().into()),
        }
    }

    /// The identity of the library, keying the primitive-factory cache.
    pub fn identity(&self) -> &Path {
        match self {
            Self::Disk(library) => &library.root,
            Self::Mock(library) => &library.file,
        }
    }

    pub fn sources(&self) -> &[PathBuf] {
        match self {
            Self::Disk(library) => &library.sources,
            Self::Mock(library) => std::slice::from_ref(&library.file),
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.sources().iter().any(|source| source == path)
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock(_))
    }

    /// Whether a created file at `path` belongs to this library.
    pub fn claims(&self, path: &Path) -> bool {
        match self {
            Self::Disk(library) => {
                path.starts_with(&library.root) && has_file_extension(path, FILE_EXTENSION)
            }
            Self::Mock(_) => false,
        }
    }

    /// Attach a newly created source. Only disk libraries are mutable.
    pub fn attach_source(&mut self, path: PathBuf) -> bool {
        match self {
            Self::Disk(library) if !library.sources.contains(&path) => {
                library.sources.push(path);
                library.sources.sort();
                true
            }
            _ => false,
        }
    }

    /// Detach a deleted source. Only disk libraries are mutable.
    pub fn detach_source(&mut self, path: &Path) -> bool {
        match self {
            Self::Disk(library) => {
                let length = library.sources.len();
                library.sources.retain(|source| source != path);
                library.sources.len() != length
            }
            Self::Mock(_) => false,
        }
    }
}
