//! Geometric primitives shared by extraction, row grouping and annotation.
//!
//! Rectangles are stored as two corners in page space. Nothing here assumes
//! which way the y axis points, only that it is consistent within a page.

use serde::{Deserialize, Serialize};

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

/// An axis-aligned rectangle `(x0, y0, x1, y1)` with `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x0: f32,
    /// Lower edge (in PDF user space)
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Upper edge (in PDF user space)
    pub y1: f32,
}

impl Rect {
    /// Create a rectangle from two corners, normalizing their order.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_idmark::geometry::Rect;
    ///
    /// let r = Rect::new(110.0, 70.0, 10.0, 20.0);
    /// assert_eq!(r.x0, 10.0);
    /// assert_eq!(r.y0, 20.0);
    /// assert_eq!(r.width(), 100.0);
    /// assert_eq!(r.height(), 50.0);
    /// ```
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
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

    /// Vertical midpoint.
    pub fn mid_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    /// Smallest rectangle containing both rectangles.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_idmark::geometry::Rect;
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

    /// Check if this rectangle fully contains another (edges inclusive).
    pub fn contains(&self, other: &Rect) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && self.x1 >= other.x1 && self.y1 >= other.y1
    }

    /// Check if this rectangle intersects with another.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && self.x1 > other.x0 && self.y0 < other.y1 && self.y1 > other.y0
    }

    /// Grow the rectangle vertically by `pad` on both sides.
    pub fn pad_vertical(&self, pad: f32) -> Rect {
        Rect {
            x0: self.x0,
            y0: self.y0 - pad,
            x1: self.x1,
            y1: self.y1 + pad,
        }
    }

    /// Replace the horizontal extent, keeping the vertical one.
    pub fn with_x_span(&self, x0: f32, x1: f32) -> Rect {
        Rect::new(x0, self.y0, x1, self.y1)
    }

    /// True when either side has zero (or negative) length.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Union of all rectangles in the iterator, or `None` if it is empty.
    pub fn union_all<'a, I>(rects: I) -> Option<Rect>
    where
        I: IntoIterator<Item = &'a Rect>,
    {
        rects
            .into_iter()
            .fold(None, |acc: Option<Rect>, r| Some(acc.map_or(*r, |a| a.union(r))))
    }

    /// QuadPoints for a text markup annotation covering this rectangle.
    ///
    /// Order is upper-left, upper-right, lower-left, lower-right, which is what
    /// viewers actually expect despite the wording of the PDF reference.
    pub fn quad_points(&self) -> [f32; 8] {
        [
            self.x0, self.y1, self.x1, self.y1, self.x0, self.y0, self.x1, self.y0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_normalizes_corners() {
        let r = Rect::new(10.0, 20.0, 5.0, 2.0);
        assert_eq!(r, Rect::new(5.0, 2.0, 10.0, 20.0));
        assert_eq!(r.width(), 5.0);
        assert_eq!(r.height(), 18.0);
    }

    #[test]
    fn test_rect_contains() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(outer.contains(&inner));
        assert!(outer.contains(&outer));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn test_rect_intersects() {
        let r1 = Rect::new(0.0, 0.0, 100.0, 100.0);
        let r2 = Rect::new(50.0, 50.0, 150.0, 150.0);
        let r3 = Rect::new(200.0, 200.0, 300.0, 300.0);
        assert!(r1.intersects(&r2));
        assert!(!r1.intersects(&r3));
    }

    #[test]
    fn test_union_all() {
        let rects = [
            Rect::new(10.0, 10.0, 20.0, 20.0),
            Rect::new(-5.0, 15.0, 0.0, 40.0),
        ];
        assert_eq!(Rect::union_all(&rects), Some(Rect::new(-5.0, 10.0, 20.0, 40.0)));
        assert_eq!(Rect::union_all(&[]), None);
    }

    #[test]
    fn test_pad_and_span() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0).pad_vertical(1.0);
        assert_eq!(r, Rect::new(10.0, 9.0, 20.0, 21.0));
        assert_eq!(r.with_x_span(0.0, 100.0), Rect::new(0.0, 9.0, 100.0, 21.0));
    }

    #[test]
    fn test_quad_points() {
        let q = Rect::new(72.0, 720.0, 172.0, 732.0).quad_points();
        assert_eq!(q, [72.0, 732.0, 172.0, 732.0, 72.0, 720.0, 172.0, 720.0]);
    }
}
