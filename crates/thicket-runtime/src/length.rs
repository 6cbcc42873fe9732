//! Byte offsets paired with row/column points.

use std::fmt;
use std::ops::{Add, Sub};

/// Zero-based row and byte column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub const ZERO: Point = Point { row: 0, column: 0 };

    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

impl Add for Point {
    type Output = Point;

    /// `other` is an extent measured from `self`.
    fn add(self, other: Point) -> Point {
        if other.row > 0 {
            Point::new(self.row + other.row, other.column)
        } else {
            Point::new(self.row, self.column + other.column)
        }
    }
}

impl Sub for Point {
    type Output = Point;

    /// Extent from `other` to `self`, saturating at zero.
    fn sub(self, other: Point) -> Point {
        if self.row > other.row {
            Point::new(self.row - other.row, self.column)
        } else {
            Point::new(0, self.column.saturating_sub(other.column))
        }
    }
}

/// A span measured both in bytes and in rows/columns.
///
/// Subtrees store their geometry as lengths relative to the end of the
/// previous sibling, which keeps every node position-independent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Length {
    pub bytes: u32,
    pub extent: Point,
}

impl Length {
    pub const ZERO: Length = Length {
        bytes: 0,
        extent: Point::ZERO,
    };

    pub fn new(bytes: u32, extent: Point) -> Self {
        Self { bytes, extent }
    }

    /// Length of `text`.
    pub fn of(text: &[u8]) -> Self {
        let mut length = Length::ZERO;
        length.extend(text);
        length
    }

    /// Grow by the bytes of `text`.
    pub fn extend(&mut self, text: &[u8]) {
        self.bytes += text.len() as u32;
        match text.iter().rposition(|&b| b == b'\n') {
            Some(last) => {
                let rows = text.iter().filter(|&&b| b == b'\n').count() as u32;
                self.extent.row += rows;
                self.extent.column = (text.len() - last - 1) as u32;
            }
            None => self.extent.column += text.len() as u32,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.bytes == 0
    }

    pub fn saturating_sub(self, other: Length) -> Length {
        Length {
            bytes: self.bytes.saturating_sub(other.bytes),
            extent: self.extent - other.extent,
        }
    }
}

impl Add for Length {
    type Output = Length;

    fn add(self, other: Length) -> Length {
        Length {
            bytes: self.bytes + other.bytes,
            extent: self.extent + other.extent,
        }
    }
}

impl Sub for Length {
    type Output = Length;

    fn sub(self, other: Length) -> Length {
        self.saturating_sub(other)
    }
}
