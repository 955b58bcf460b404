//! Geometric primitives for layout analysis.
//!
//! All coordinates are page-space points with the origin at the top-left
//! corner and y growing downwards, so `y0` is the top edge of a box.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A 2D point in page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle given by its two corners.
///
/// # Examples
///
/// ```
/// use icsara::geometry::Rect;
///
/// let rect = Rect::new(10.0, 20.0, 110.0, 70.0);
/// assert_eq!(rect.width(), 100.0);
/// assert_eq!(rect.height(), 50.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl Rect {
    /// Create a rectangle from its corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create a rectangle from two arbitrary points, normalizing the corners.
    ///
    /// ```
    /// use icsara::geometry::{Point, Rect};
    ///
    /// let rect = Rect::from_points(Point::new(50.0, 10.0), Point::new(5.0, 30.0));
    /// assert_eq!(rect, Rect::new(5.0, 10.0, 50.0, 30.0));
    /// ```
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            x0: a.x.min(b.x),
            y0: a.y.min(b.y),
            x1: a.x.max(b.x),
            y1: a.y.max(b.y),
        }
    }

    /// Width of the rectangle (never negative).
    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    /// Height of the rectangle (never negative).
    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    /// Area of the rectangle.
    ///
    /// ```
    /// use icsara::geometry::Rect;
    ///
    /// assert_eq!(Rect::new(0.0, 0.0, 100.0, 50.0).area(), 5000.0);
    /// ```
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Check if this rectangle intersects with another.
    ///
    /// Touching edges count as intersecting, and so does a degenerate
    /// (zero-height) rule lying inside another box.
    ///
    /// ```
    /// use icsara::geometry::Rect;
    ///
    /// let r1 = Rect::new(0.0, 0.0, 100.0, 100.0);
    /// let r2 = Rect::new(50.0, 50.0, 150.0, 150.0);
    /// let r3 = Rect::new(200.0, 200.0, 300.0, 300.0);
    ///
    /// assert!(r1.intersects(&r2));
    /// assert!(!r1.intersects(&r3));
    /// ```
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }

    /// Check whether the gap between two rectangles is at most `gap` on both axes.
    ///
    /// Overlapping rectangles have a gap of zero.
    pub fn is_near(&self, other: &Rect, gap: f32) -> bool {
        let dx = (self.x0 - other.x1).max(other.x0 - self.x1).max(0.0);
        let dy = (self.y0 - other.y1).max(other.y0 - self.y1).max(0.0);
        dx <= gap && dy <= gap
    }

    /// Smallest rectangle containing both rectangles.
    ///
    /// ```
    /// use icsara::geometry::Rect;
    ///
    /// let union = Rect::new(0.0, 0.0, 50.0, 50.0).union(&Rect::new(25.0, 25.0, 75.0, 75.0));
    /// assert_eq!(union, Rect::new(0.0, 0.0, 75.0, 75.0));
    /// ```
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Corners as `[x0, y0, x1, y1]`.
    pub fn to_array(&self) -> [f32; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

/// Bounding box of a non-empty collection of rectangles.
pub fn bounding_box<'a, I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = &'a Rect>,
{
    rects.into_iter().fold(None, |acc, r| match acc {
        None => Some(*r),
        Some(b) => Some(b.union(r)),
    })
}

/// Global document position: 1-based page number and the top edge on that page.
///
/// Sort keys are totally ordered (page first, then `y0` via `f32::total_cmp`),
/// which is what lets chapters, hinges and question starts from different
/// detectors be merged into one timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    /// 1-based page number
    pub page: usize,
    /// Top edge on the page
    pub y0: f32,
}

impl SortKey {
    /// Create a new sort key.
    pub fn new(page: usize, y0: f32) -> Self {
        Self { page, y0 }
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.page
            .cmp(&other.page)
            .then_with(|| self.y0.total_cmp(&other.y0))
    }
}
