//! Geometric primitives for page description.
//!
//! Coordinates are PDF user space: units of 1/72 inch, origin at the
//! lower-left corner of the page, y axis pointing up.

use serde::{Deserialize, Serialize};

/// A 2D point in page space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagepress::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in page space, stored as two corners.
///
/// Also the type of a page's media box: `(x0, y0)` is the lower-left
/// corner, `(x1, y1)` the upper-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Lower-left x
    pub x0: f32,
    /// Lower-left y
    pub y0: f32,
    /// Upper-right x
    pub x1: f32,
    /// Upper-right y
    pub y1: f32,
}

impl Rect {
    /// Create a rectangle from two corner points.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagepress::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 612.0, 792.0);
    /// assert_eq!(rect.width(), 612.0);
    /// assert_eq!(rect.height(), 792.0);
    /// ```
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create a rectangle from an origin and dimensions.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x + width,
            y1: y + height,
        }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Whether this rectangle is usable as a media box: all coordinates
    /// finite and both extents strictly positive.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagepress::geometry::Rect;
    ///
    /// assert!(Rect::new(0.0, 0.0, 100.0, 50.0).is_valid());
    /// assert!(!Rect::new(0.0, 0.0, 0.0, 50.0).is_valid());
    /// assert!(!Rect::new(100.0, 0.0, 0.0, 50.0).is_valid());
    /// assert!(!Rect::new(0.0, 0.0, f32::NAN, 50.0).is_valid());
    /// ```
    pub fn is_valid(&self) -> bool {
        self.x0.is_finite()
            && self.y0.is_finite()
            && self.x1.is_finite()
            && self.y1.is_finite()
            && self.x1 > self.x0
            && self.y1 > self.y0
    }

    /// Check if this rectangle intersects another.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && self.x1 > other.x0 && self.y0 < other.y1 && self.y1 > other.y0
    }

    /// Compute the union of this rectangle with another.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagepress::geometry::Rect;
    ///
    /// let a = Rect::new(0.0, 0.0, 50.0, 50.0);
    /// let b = Rect::new(25.0, 25.0, 75.0, 75.0);
    /// assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 75.0, 75.0));
    /// ```
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {} {} {}]", self.x0, self.y0, self.x1, self.y1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_creation() {
        let p = Point::new(10.0, 20.0);
        assert_eq!(p.x, 10.0);
        assert_eq!(p.y, 20.0);
    }

    #[test]
    fn test_rect_dimensions() {
        let r = Rect::new(10.0, 20.0, 110.0, 70.0);
        assert_eq!(r.width(), 100.0);
        assert_eq!(r.height(), 50.0);
    }

    #[test]
    fn test_rect_from_xywh() {
        let r = Rect::from_xywh(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r, Rect::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn test_rect_validity() {
        assert!(Rect::new(0.0, 0.0, 612.0, 792.0).is_valid());
        // Zero extent
        assert!(!Rect::new(5.0, 5.0, 5.0, 100.0).is_valid());
        // Inverted corners
        assert!(!Rect::new(100.0, 100.0, 0.0, 0.0).is_valid());
        // Non-finite coordinates
        assert!(!Rect::new(0.0, 0.0, f32::INFINITY, 100.0).is_valid());
        assert!(!Rect::new(f32::NAN, 0.0, 100.0, 100.0).is_valid());
    }

    #[test]
    fn test_rect_intersects() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 150.0, 150.0);
        let c = Rect::new(200.0, 200.0, 300.0, 300.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_rect_display() {
        let r = Rect::new(0.0, 0.0, 100.0, 50.5);
        assert_eq!(format!("{}", r), "[0 0 100 50.5]");
    }
}
