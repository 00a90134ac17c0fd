//! Position conversions between the source map and the editor protocol.

use ::span::{ByteIndex, SourceMap, Span};
use std::path::Path;
use tower_lsp::lsp_types::{Position, Range};

/// The global byte index of an editor position within the given file.
pub(crate) fn byte_index_of(map: &SourceMap, path: &Path, position: Position) -> Option<ByteIndex> {
    let file = map.file_by_path(path)?;
    map[file].index_of(position.line, position.character)
}

/// A span resolved against the source map. Spans of unregistered files
/// cannot be resolved.
pub(crate) fn to_range(map: &SourceMap, span: Span) -> Option<Range> {
    let file = map.file_containing(span.start)?;
    let (start_line, start_column) = map[file].locate(span.start);
    let (end_line, end_column) = map[file].locate(span.end);

    Some(Range::new(
        Position::new(start_line, start_column),
        Position::new(end_line, end_column),
    ))
}

/// The identifier under the cursor, located lexically.
///
/// Returns its range and text, or nothing when the cursor is not on a
/// renameable word.
pub(crate) fn word_at(content: &str, position: Position) -> Option<(Range, String)> {
    let line = content.lines().nth(position.line as usize)?;
    let column = position.character as usize;
    if column > line.len() {
        return None;
    }

    let is_word = |char: char| char.is_alphanumeric() || matches!(char, '_' | '\'' | '-');

    let start = line[..column]
        .char_indices()
        .rev()
        .take_while(|(_, char)| is_word(*char))
        .last()
        .map_or(column, |(index, _)| index);
    let end = line[column..]
        .char_indices()
        .take_while(|(_, char)| is_word(*char))
        .last()
        .map_or(column, |(index, char)| column + index + char.len_utf8());

    if start == end {
        return None;
    }

    let range = Range::new(
        Position::new(position.line, start as u32),
        Position::new(position.line, end as u32),
    );

    Some((range, line[start..end].to_owned()))
}

#[cfg(test)]
mod test {
    use super::word_at;
    use tower_lsp::lsp_types::Position;

    #[test]
    fn word_under_the_cursor() {
        let (range, word) = word_at("open import nat", Position::new(0, 13)).unwrap();
        assert_eq!(word, "nat");
        assert_eq!(range.start.character, 12);
        assert_eq!(range.end.character, 15);
    }

    #[test]
    fn cursor_on_whitespace_is_not_renameable() {
        assert!(word_at("a  b", Position::new(0, 2)).is_none());
    }

    #[test]
    fn cursor_at_word_end_still_hits_it() {
        let (_, word) = word_at("foo bar", Position::new(0, 3)).unwrap();
        assert_eq!(word, "foo");
    }

    #[test]
    fn missing_lines_yield_nothing() {
        assert!(word_at("one line", Position::new(5, 0)).is_none());
    }
}
