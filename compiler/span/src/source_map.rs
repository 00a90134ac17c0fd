//! The source map: a registry of all source files known to a session.

use crate::{ByteIndex, Span};
use std::{
    io,
    ops::Index,
    path::{Path, PathBuf},
    sync::Arc,
};
use utility::HashMap;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SourceFileIndex(usize);

/// A file registered in a [`SourceMap`].
pub struct SourceFile {
    path: Option<PathBuf>,
    content: Arc<String>,
    /// The global span this file occupies inside its source map.
    span: Span,
    /// Byte offsets of line starts, file-local.
    line_starts: Vec<u32>,
}

impl SourceFile {
    fn new(path: Option<PathBuf>, content: Arc<String>, offset: u32) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|&(_, byte)| byte == b'\n')
                .map(|(index, _)| index as u32 + 1),
        );

        let span = Span::with_length(ByteIndex(offset), content.len() as u32);

        Self {
            path,
            content,
            span,
            line_starts,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn span(&self) -> Span {
        self.span
    }

    fn local(&self, index: ByteIndex) -> u32 {
        index.0 - self.span.start.0
    }

    /// Zero-based line and column of a global byte index within this file.
    pub fn locate(&self, index: ByteIndex) -> (u32, u32) {
        let local = self.local(index);
        let line = match self.line_starts.binary_search(&local) {
            Ok(line) => line,
            Err(line) => line - 1,
        };

        (line as u32, local - self.line_starts[line])
    }

    /// The global byte index of the given zero-based line and column.
    pub fn index_of(&self, line: u32, column: u32) -> Option<ByteIndex> {
        let start = *self.line_starts.get(line as usize)?;
        let index = self.span.start + start + column;
        self.span.contains(index).then_some(index)
    }
}

/// A resolved source location.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Location {
    pub file: SourceFileIndex,
    /// Zero-based.
    pub line: u32,
    /// Zero-based.
    pub column: u32,
}

/// All source files of a session with global, disjoint spans.
#[derive(Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
    by_path: HashMap<PathBuf, SourceFileIndex>,
    next_offset: u32,
}

impl SourceMap {
    pub fn add(&mut self, path: Option<PathBuf>, content: Arc<String>) -> SourceFileIndex {
        let index = SourceFileIndex(self.files.len());
        let file = SourceFile::new(path.clone(), content, self.next_offset);

        // +1 so even empty files occupy a non-empty range
        self.next_offset = file.span.end.0 + 1;

        if let Some(path) = path {
            self.by_path.insert(path, index);
        }
        self.files.push(file);
        index
    }

    /// Read the file at the given path and register it.
    pub fn load(&mut self, path: PathBuf) -> io::Result<SourceFileIndex> {
        let content = std::fs::read_to_string(&path)?;
        Ok(self.add(Some(path), Arc::new(content)))
    }

    pub fn file_by_path(&self, path: &Path) -> Option<SourceFileIndex> {
        self.by_path.get(path).copied()
    }

    pub fn file_containing(&self, index: ByteIndex) -> Option<SourceFileIndex> {
        self.files
            .binary_search_by(|file| index.relate(file.span).reverse())
            .ok()
            .map(SourceFileIndex)
    }

    pub fn locate(&self, index: ByteIndex) -> Option<Location> {
        let file = self.file_containing(index)?;
        let (line, column) = self[file].locate(index);

        Some(Location { file, line, column })
    }

    pub fn files(&self) -> impl Iterator<Item = (SourceFileIndex, &SourceFile)> {
        self.files
            .iter()
            .enumerate()
            .map(|(index, file)| (SourceFileIndex(index), file))
    }
}

impl Index<SourceFileIndex> for SourceMap {
    type Output = SourceFile;

    fn index(&self, index: SourceFileIndex) -> &Self::Output {
        &self.files[index.0]
    }
}

#[cfg(test)]
mod test {
    use super::SourceMap;
    use crate::ByteIndex;
    use std::sync::Arc;

    #[test]
    fn locate_lines_and_columns() {
        let mut map = SourceMap::default();
        let file = map.add(None, Arc::new("ab\ncd\n".into()));

        assert_eq!(map[file].locate(ByteIndex(0)), (0, 0));
        assert_eq!(map[file].locate(ByteIndex(1)), (0, 1));
        assert_eq!(map[file].locate(ByteIndex(3)), (1, 0));
        assert_eq!(map[file].locate(ByteIndex(4)), (1, 1));
    }

    #[test]
    fn global_offsets_are_disjoint() {
        let mut map = SourceMap::default();
        let first = map.add(None, Arc::new("one".into()));
        let second = map.add(None, Arc::new("two".into()));

        assert!(map[first].span().end <= map[second].span().start);
        assert_eq!(map[second].locate(map[second].span().start), (0, 0));
    }

    #[test]
    fn index_of_position() {
        let mut map = SourceMap::default();
        let file = map.add(None, Arc::new("ab\ncd\n".into()));
        let index = map[file].index_of(1, 1).unwrap();

        assert_eq!(map[file].locate(index), (1, 1));
    }
}
