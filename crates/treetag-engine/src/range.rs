use std::fmt;
use tree_sitter::{Node, Point};

/// A half-open `[start, end)` region of the buffer in `(row, column)` points.
///
/// Rows and columns are 0-based and columns count characters, which is the
/// same as bytes in the projected buffer the trees are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: Point,
    pub end: Point,
}

/// The part of the buffer the host is currently showing.
pub type VisibleRange = TextRange;

pub(crate) fn point_key(point: Point) -> (usize, usize) {
    (point.row, point.column)
}

impl TextRange {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Rows `first..=last`, including the line break at the end of `last`.
    pub fn rows(first: usize, last: usize) -> Self {
        Self::new(Point::new(first, 0), Point::new(last + 1, 0))
    }

    pub fn of_node(node: &Node<'_>) -> Self {
        Self::new(node.start_position(), node.end_position())
    }

    pub fn is_empty(&self) -> bool {
        point_key(self.start) >= point_key(self.end)
    }

    /// True if the two ranges share at least one position. Touching ranges
    /// and empty ranges never overlap.
    pub fn overlaps(&self, other: &TextRange) -> bool {
        let start = point_key(self.start).max(point_key(other.start));
        let end = point_key(self.end).min(point_key(other.end));
        start < end
    }

    pub fn contains(&self, point: Point) -> bool {
        point_key(self.start) <= point_key(point) && point_key(point) < point_key(self.end)
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.row, self.start.column, self.end.row, self.end.column
        )
    }
}
