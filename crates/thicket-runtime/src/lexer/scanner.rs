//! Hand-written scanners for tokens a regular lexer cannot describe.

use crate::length::Point;
use crate::source::Source;

/// Scanner for the grammar's external tokens.
///
/// Scanners are stateless: everything a scan decides must follow from the
/// text and the set of valid tokens.
pub trait ExternalScanner: Send + Sync {
    /// Try to recognize one of the `valid` external tokens at the cursor.
    fn scan(&self, cursor: &mut ScanCursor<'_>, valid: &ValidExternals<'_>) -> Option<ExternalMatch>;
}

/// A recognized external token, by index in the grammar's `externals` list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExternalMatch {
    pub token: u16,
}

/// External tokens the parser can accept in its current state.
#[derive(Clone, Copy, Debug)]
pub struct ValidExternals<'a> {
    valid: &'a [u16],
}

impl<'a> ValidExternals<'a> {
    pub(crate) fn new(valid: &'a [u16]) -> Self {
        Self { valid }
    }

    pub fn contains(&self, token: u16) -> bool {
        self.valid.contains(&token)
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + 'a {
        self.valid.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

/// Cursor handed to an [`ExternalScanner`].
///
/// `skip` consumes whitespace before the token, `advance` consumes token
/// text, and `mark_end` fixes where the token ends (the current position when
/// it is never called).
pub struct ScanCursor<'s> {
    source: &'s dyn Source,
    start: usize,
    position: usize,
    point: Point,
    token_start: Option<usize>,
    end: Option<usize>,
    furthest: usize,
}

impl<'s> ScanCursor<'s> {
    pub(crate) fn new(source: &'s dyn Source, start: usize, point: Point) -> Self {
        Self {
            source,
            start,
            position: start,
            point,
            token_start: None,
            end: None,
            furthest: start,
        }
    }

    /// The byte at the cursor, `None` at the end of input.
    pub fn lookahead(&mut self) -> Option<u8> {
        self.furthest = self.furthest.max(self.position + 1);
        self.source.byte_at(self.position)
    }

    /// Consume the lookahead as part of the token.
    pub fn advance(&mut self) {
        if self.token_start.is_none() {
            self.token_start = Some(self.position);
        }
        self.step();
    }

    /// Consume the lookahead as whitespace before the token.
    ///
    /// Only meaningful before the first `advance`.
    pub fn skip(&mut self) {
        self.step();
    }

    /// The token ends at the current position.
    pub fn mark_end(&mut self) {
        if self.token_start.is_none() {
            self.token_start = Some(self.position);
        }
        self.end = Some(self.position);
    }

    pub fn column(&self) -> u32 {
        self.point.column
    }

    pub fn eof(&self) -> bool {
        self.position >= self.source.len()
    }

    fn step(&mut self) {
        let Some(byte) = self.source.byte_at(self.position) else {
            return;
        };
        self.position += 1;
        self.furthest = self.furthest.max(self.position);
        if byte == b'\n' {
            self.point = Point::new(self.point.row + 1, 0);
        } else {
            self.point.column += 1;
        }
    }

    /// `(token start, token end, furthest byte examined)`, all absolute.
    pub(crate) fn finish(&self) -> (usize, usize, usize) {
        let end = self.end.unwrap_or(self.position);
        let start = self.token_start.unwrap_or(end).min(end);
        (start.max(self.start), end, self.furthest.max(end))
    }
}
