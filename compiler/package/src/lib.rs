//! Library manifests and on-disk source discovery.
//!
//! A *library* is rooted at a folder containing a manifest file with the
//! fixed name `aya.json`. Loose source files without a surrounding library
//! are handled by the build orchestrator by mocking single-file libraries.

use serde::Deserialize;
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};
use utility::{has_file_extension, FILE_EXTENSION, MANIFEST_FILE_NAME};

/// The parsed content of a library manifest.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryConfig {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// The source folder, relative to the library root.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
}

fn default_source_dir() -> PathBuf {
    "src".into()
}

impl LibraryConfig {
    pub fn from_library_root(root: &Path) -> Result<Self, ManifestError> {
        let manifest = root.join(MANIFEST_FILE_NAME);
        let content = fs::read_to_string(manifest).map_err(ManifestError::Io)?;
        serde_json::from_str(&content).map_err(ManifestError::Parse)
    }

    /// The library's source files on disk.
    pub fn library_sources(&self, root: &Path) -> Vec<PathBuf> {
        collect_source_files(&root.join(&self.source_dir), MAX_SOURCE_DEPTH)
    }
}

/// A hard bound on source tree depth, guarding against link loops.
const MAX_SOURCE_DEPTH: usize = 32;

#[derive(Debug)]
pub enum ManifestError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "could not read the manifest: {error}"),
            Self::Parse(error) => write!(f, "could not parse the manifest: {error}"),
        }
    }
}

impl std::error::Error for ManifestError {}

/// Walk upward from `path` looking for a folder containing a manifest.
pub fn locate_library_root(path: &Path) -> Option<PathBuf> {
    let mut current = Some(path);

    while let Some(dir) = current {
        if dir.join(MANIFEST_FILE_NAME).is_file() {
            return Some(dir.to_owned());
        }
        current = dir.parent();
    }

    None
}

/// Collect source files beneath `path`, descending at most `depth` folder
/// levels. The result is sorted for deterministic scheduling.
pub fn collect_source_files(path: &Path, depth: usize) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    collect(path, depth, &mut sources);
    sources.sort();
    sources
}

fn collect(dir: &Path, depth: usize, sources: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && has_file_extension(&path, FILE_EXTENSION) {
            sources.push(path);
        } else if path.is_dir() && depth > 0 {
            collect(&path, depth - 1, sources);
        }
    }
}

#[cfg(test)]
mod test {
    use super::{collect_source_files, locate_library_root, LibraryConfig};
    use std::{fs, path::PathBuf};

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("aya-package-test")
            .join(format!("{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn manifest_round_trip() {
        let root = scratch("manifest");
        fs::write(
            root.join("aya.json"),
            r#"{ "name": "playground", "version": "0.1.0" }"#,
        )
        .unwrap();

        let config = LibraryConfig::from_library_root(&root).unwrap();
        assert_eq!(config.name, "playground");
        assert_eq!(config.version.as_deref(), Some("0.1.0"));
        assert_eq!(config.source_dir, PathBuf::from("src"));
    }

    #[test]
    fn broken_manifest_is_a_parse_error() {
        let root = scratch("broken");
        fs::write(root.join("aya.json"), "{").unwrap();

        assert!(matches!(
            LibraryConfig::from_library_root(&root),
            Err(super::ManifestError::Parse(_))
        ));
    }

    #[test]
    fn library_roots_are_located_upward() {
        let root = scratch("upward");
        fs::write(root.join("aya.json"), r#"{ "name": "lib" }"#).unwrap();
        let nested = root.join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(locate_library_root(&nested), Some(root.clone()));
        assert_eq!(
            locate_library_root(&scratch("no-manifest-here")),
            None
        );
    }

    #[test]
    fn source_discovery_is_depth_bounded() {
        let root = scratch("depth");
        fs::write(root.join("top.aya"), "").unwrap();
        fs::write(root.join("readme.md"), "").unwrap();
        let nested = root.join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("inner.aya"), "").unwrap();

        let shallow = collect_source_files(&root, 0);
        assert_eq!(shallow.len(), 1);

        let deep = collect_source_files(&root, 1);
        assert_eq!(deep.len(), 2);
    }
}
