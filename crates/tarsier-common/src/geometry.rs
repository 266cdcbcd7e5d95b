//! Bounding boxes and the distance math behind layout proximity selectors.
//!
//! Layout engines (`left-of`, `right-of`, `above`, `below`, `near`) compare
//! the boxes of two elements and produce a score: smaller is closer. A score
//! of `None` means the spatial relationship does not hold at all.

/// An axis-aligned bounding box in CSS pixel coordinates.
///
/// The embedder supplies one per rendered element; elements without layout
/// (display:none, detached) have no box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Distance from the left edge of the viewport.
    pub x: f64,
    /// Distance from the top edge of the viewport.
    pub y: f64,
    /// Width of the box.
    pub width: f64,
    /// Height of the box.
    pub height: f64,
}

/// Maximum distance, in CSS pixels, at which two boxes are still "near"
/// each other when no explicit cutoff is supplied.
pub const DEFAULT_NEAR_DISTANCE: f64 = 50.0;

impl Rect {
    /// Create a new box from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The x coordinate of the right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// The y coordinate of the bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// The center point of the box as `(x, y)`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True if the vertical extents of `self` and `other` overlap at all.
    /// Horizontal relationships (left-of / right-of) only make sense between
    /// boxes that share some vertical range.
    #[must_use]
    pub fn overlaps_vertically(&self, other: &Self) -> bool {
        self.y < other.bottom() && other.y < self.bottom()
    }

    /// True if the horizontal extents of `self` and `other` overlap at all.
    #[must_use]
    pub fn overlaps_horizontally(&self, other: &Self) -> bool {
        self.x < other.right() && other.x < self.right()
    }

    /// Score for "`self` is entirely to the left of `other`".
    ///
    /// Returns the horizontal gap when the relationship holds and the boxes
    /// share vertical range, `None` otherwise.
    #[must_use]
    pub fn left_of(&self, other: &Self) -> Option<f64> {
        if self.right() <= other.x && self.overlaps_vertically(other) {
            Some(other.x - self.right())
        } else {
            None
        }
    }

    /// Score for "`self` is entirely to the right of `other`".
    #[must_use]
    pub fn right_of(&self, other: &Self) -> Option<f64> {
        if other.right() <= self.x && self.overlaps_vertically(other) {
            Some(self.x - other.right())
        } else {
            None
        }
    }

    /// Score for "`self` is entirely above `other`".
    #[must_use]
    pub fn above(&self, other: &Self) -> Option<f64> {
        if self.bottom() <= other.y && self.overlaps_horizontally(other) {
            Some(other.y - self.bottom())
        } else {
            None
        }
    }

    /// Score for "`self` is entirely below `other`".
    #[must_use]
    pub fn below(&self, other: &Self) -> Option<f64> {
        if other.bottom() <= self.y && self.overlaps_horizontally(other) {
            Some(self.y - other.bottom())
        } else {
            None
        }
    }

    /// Score for "`self` is near `other`": the shortest distance between the
    /// two boxes (0 when they intersect). Always holds; use a cutoff to
    /// filter.
    #[must_use]
    pub fn near(&self, other: &Self) -> f64 {
        let dx = gap(self.x, self.right(), other.x, other.right());
        let dy = gap(self.y, self.bottom(), other.y, other.bottom());
        dx.hypot(dy)
    }
}

/// One-dimensional gap between two intervals; 0 when they overlap.
fn gap(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> f64 {
    if a_end < b_start {
        b_start - a_end
    } else if b_end < a_start {
        a_start - b_end
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::Rect;

    #[test]
    fn left_of_requires_vertical_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 0.0, 10.0, 10.0);
        assert_eq!(a.left_of(&b), Some(10.0));
        assert_eq!(b.left_of(&a), None);

        let below = Rect::new(20.0, 100.0, 10.0, 10.0);
        assert_eq!(a.left_of(&below), None);
    }

    #[test]
    fn near_is_zero_for_intersecting_boxes() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.near(&b), 0.0);
    }

    #[test]
    fn near_uses_diagonal_distance() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(13.0, 14.0, 10.0, 10.0);
        assert_eq!(a.near(&b), 5.0);
    }
}
