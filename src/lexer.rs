//! Per-line lexical scan: positions of comment starts and braces, found before
//! any text is inserted. Purely syntactic; string literals and division
//! operators are not told apart from comment markers.

/// How a detected comment begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `/*`, possibly spanning later lines.
    Block,
    /// `//`, running to end of line.
    Line,
}

/// A comment opener at a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentOpen {
    /// Which comment form follows the slash.
    pub kind: CommentKind,
    /// Byte offset of the opening `/`.
    pub position: usize,
}

/// Tagged positions found on one line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineScan {
    /// Byte offset of the first `}`.
    pub brace_close: Option<usize>,
    /// Byte offset of the first `{`.
    pub brace_open: Option<usize>,
    /// Comment opened by the first `/` on the line, when it is followed by `/` or `*`.
    pub comment: Option<CommentOpen>,
    /// Byte offset of a `*/` ending the line (trailing whitespace ignored).
    pub trailing_block_close: Option<usize>,
}

impl LineScan {
    /// Does a block comment opened on this line also close on it?
    pub fn closes_own_block(&self) -> bool {
        let Some(CommentOpen { kind: CommentKind::Block, position }) = self.comment else {
            return false;
        };
        // `/*/` is an opener followed by a slash, not an empty comment.
        return self
            .trailing_block_close
            .is_some_and(|close| return close >= position.saturating_add(2));
    }
}

/// Scan one line for its first slash-comment opener, first braces, and a trailing `*/`.
///
/// Only the first `/` is considered: if it is not followed by `/` or `*`, the
/// line has no comment opener even when a later `//` exists.
pub fn scan_line(line: &str) -> LineScan {
    let bytes = line.as_bytes();

    let comment = line.find('/').and_then(|position| {
        let kind = match bytes.get(position.saturating_add(1)) {
            Some(b'*') => CommentKind::Block,
            Some(b'/') => CommentKind::Line,
            _ => return None,
        };
        return Some(CommentOpen { kind, position });
    });

    let trimmed = line.trim_end();
    let trailing_block_close = trimmed
        .ends_with("*/")
        .then(|| return trimmed.len().saturating_sub(2));

    return LineScan {
        brace_close: line.find('}'),
        brace_open: line.find('{'),
        comment,
        trailing_block_close,
    };
}
