//! Position/offset and range/location conversion helpers.

use std::path::Path;

use tower_lsp::lsp_types::{Location, Position, Range, Url};

use crate::error::ResolveError;
use crate::fileset::{FileSet, Pos};

/// Path of the synthesized builtin source file, relative to the stdlib
/// root.
pub const BUILTIN_SOURCE: &str = "src/builtin/builtin.mica";

/// Convert an LSP position (zero-based line and character) into a byte
/// offset within `content`.
///
/// Character offsets are counted in characters, not bytes; Mica source is
/// overwhelmingly ASCII, so treating LSP's UTF-16 code units as characters
/// holds up in practice. Unlike a clamping lookup this fails loudly: a
/// line past the end of the document, or a character past the end of its
/// line, is an `InvalidPosition` carrying the offending coordinates.
pub fn offset_for_position(
    content: &str,
    position: Position,
    file: &str,
) -> Result<u32, ResolveError> {
    let invalid = |reason: &str| ResolveError::InvalidPosition {
        file: file.to_string(),
        line: position.line,
        character: position.character,
        reason: reason.to_string(),
    };

    let bytes = content.as_bytes();
    let mut line_start = 0usize;
    for _ in 0..position.line {
        match memchr::memchr(b'\n', &bytes[line_start..]) {
            Some(nl) => line_start += nl + 1,
            None => return Err(invalid("line out of range")),
        }
    }
    let line_end = memchr::memchr(b'\n', &bytes[line_start..])
        .map(|nl| line_start + nl)
        .unwrap_or(bytes.len());

    let mut character = 0u32;
    for (idx, _) in content[line_start..line_end].char_indices() {
        if character == position.character {
            return Ok((line_start + idx) as u32);
        }
        character += 1;
    }
    // One past the last character addresses the end of the line.
    if character == position.character {
        return Ok(line_end as u32);
    }
    Err(invalid("character out of range"))
}

/// Convert a byte range within `fset` into an LSP location.
///
/// Positions with no concrete source file behind them (builtins) resolve
/// to a file with an empty path; those are rewritten to the fixed builtin
/// source with a zero range rather than handed to the editor as a
/// degenerate `file://` location.
pub fn range_to_location(fset: &FileSet, start: Pos, end: Pos, stdlib_root: &Path) -> Location {
    let Some(file) = fset.file_containing(start) else {
        return builtin_location(stdlib_root);
    };
    if file.path().is_empty() {
        return builtin_location(stdlib_root);
    }
    let Ok(uri) = Url::from_file_path(file.path()) else {
        return builtin_location(stdlib_root);
    };
    let (start_line, start_character) = file.line_col(start);
    let (end_line, end_character) = file.line_col(end);
    Location {
        uri,
        range: Range {
            start: Position {
                line: start_line,
                character: start_character,
            },
            end: Position {
                line: end_line,
                character: end_character,
            },
        },
    }
}

/// The synthesized location handed out for builtins: the stdlib's builtin
/// source file with a zero range.
pub fn builtin_location(stdlib_root: &Path) -> Location {
    let path = stdlib_root.join(BUILTIN_SOURCE);
    // from_file_path only rejects relative paths; "/" is always absolute.
    let uri = Url::from_file_path(&path)
        .or_else(|()| Url::from_file_path(Path::new("/").join(BUILTIN_SOURCE)))
        .expect("absolute builtin path");
    Location {
        uri,
        range: Range::default(),
    }
}
