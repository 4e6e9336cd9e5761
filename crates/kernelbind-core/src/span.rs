//! Source location tracking for declaration parse errors.

use std::fmt;

/// A byte range inside a single declaration string.
///
/// Declarations are one-liners (`"void Move(const MbVector3D & v)"`), so a
/// span is just a start offset and a length.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first character (0-indexed).
    pub start: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }

    /// Create a zero-length span at an offset.
    #[inline]
    pub fn point(start: u32) -> Self {
        Self { start, len: 0 }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// One past the last byte covered.
    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.len
    }

    /// Smallest span covering both `self` and `other`.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Span {
            start,
            len: end - start,
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}", self.start)
    }
}
