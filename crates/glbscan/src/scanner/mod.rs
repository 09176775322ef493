//! Scanner: the byte cursor every other routine is built on.
//!
//! What it does
//! - Hops from one structural byte (`" { } [ ] : ,`) to the next, keeping
//!   track of whether it is inside a string literal so that structural bytes
//!   inside strings are never reported.
//! - Counts the members of an array or object in one forward pass without
//!   producing tokens, so the caller can size the destination exactly once.
//!
//! Scope
//! - The cursor does not interpret values. It never decodes escapes and never
//!   validates the bytes between structural bytes; the walker slices spans
//!   out of the gaps and hands them to the field decoders.
//!
//! Invariants
//! - `pos` only moves forward, except when the walker deliberately restores a
//!   saved cursor to re-scan a deferred span.
//! - A quote is a closing quote only when it is preceded by an even number of
//!   contiguous backslashes.
//!
//! Example
//! ```ignore
//! let mut c = Cursor::new(br#"{"a":[1,2]}"#);
//! assert_eq!(c.seek_next_structural(), Some(0)); // {
//! let count = c.count_items(b'}').unwrap();
//! assert_eq!(count.items, 1);
//! ```


use crate::error::SyntaxError;

#[inline]
pub(crate) fn is_structural(b: u8) -> bool {
    matches!(b, b'"' | b'{' | b'}' | b'[' | b']' | b':' | b',')
}

#[inline]
pub(crate) fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Result of a counting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Count {
    /// Number of sibling items at depth zero.
    pub items: usize,
    /// Offset of the bracket or brace that closes the container.
    pub end: usize,
}

/// A forward-only cursor over JSON bytes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    src: &'a [u8],
    pos: usize,
    in_string: bool,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            in_string: false,
        }
    }

    #[inline]
    pub fn src(&self) -> &'a [u8] {
        self.src
    }

    /// Offset of the next unread byte.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Consumes bytes up to and including the next structural byte and
    /// returns its offset, or `None` once the input is exhausted.
    ///
    /// Inside a string literal only the closing quote counts as structural.
    pub fn seek_next_structural(&mut self) -> Option<usize> {
        while self.pos < self.src.len() {
            let at = self.pos;
            let b = self.src[at];
            self.pos += 1;

            if self.in_string {
                if b == b'"' && !self.is_escaped(at) {
                    self.in_string = false;
                    return Some(at);
                }
            } else if is_structural(b) {
                if b == b'"' {
                    self.in_string = true;
                }
                return Some(at);
            }
        }
        None
    }

    /// Whether the quote at `at` is escaped: an odd run of backslashes
    /// directly before it.
    fn is_escaped(&self, at: usize) -> bool {
        let run = self.src[..at]
            .iter()
            .rev()
            .take_while(|&&b| b == b'\\')
            .count();
        run % 2 == 1
    }

    /// Counts the items of the container whose opening byte was just
    /// consumed, without moving this cursor.
    ///
    /// An item ends at every depth-zero `,` and at the closing byte, unless
    /// the container is empty. Bytes inside strings are opaque.
    pub fn count_items(&self, close: u8) -> Result<Count, (SyntaxError, usize)> {
        let mut ahead = *self;
        let mut depth = 0usize;
        let mut items = 0usize;
        let mut item_start = ahead.pos;

        loop {
            let Some(at) = ahead.seek_next_structural() else {
                return Err((SyntaxError::UnexpectedEndOfInput, self.src.len()));
            };
            match self.src[at] {
                b'{' | b'[' => depth += 1,
                b @ (b'}' | b']') => {
                    if depth > 0 {
                        depth -= 1;
                        continue;
                    }
                    if b != close {
                        return Err((
                            SyntaxError::UnexpectedCharacter {
                                found: b as char,
                                expected: closing_name(close),
                            },
                            at,
                        ));
                    }
                    if items > 0 || !is_blank(&self.src[item_start..at]) {
                        items += 1;
                    }
                    return Ok(Count { items, end: at });
                }
                b',' if depth == 0 => {
                    items += 1;
                    item_start = at + 1;
                }
                _ => {}
            }
        }
    }

    /// Moves past the closing byte found by [`Cursor::count_items`].
    pub fn resume_after(&mut self, count: Count) {
        self.pos = count.end + 1;
        self.in_string = false;
    }
}

pub(crate) fn closing_name(close: u8) -> &'static str {
    if close == b']' { "']'" } else { "'}'" }
}
