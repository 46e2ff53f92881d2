//! Rectangles and affine matrices.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle.
///
/// Text geometry uses a top-left origin with y growing downward, so `top`
/// is normally the smaller y value. Boxes read verbatim from the PDF
/// (see [`crate::Page::page_rect`]) keep user-space orientation instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// Create a rectangle from its four edges.
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a rectangle from an origin and a size.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// A rectangle is empty when it collapses to a single point.
    pub fn is_empty(&self) -> bool {
        self.left == self.right && self.top == self.bottom
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Whether the point lies inside the rectangle (edges included).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let r = self.normalized();
        x >= r.left && x <= r.right && y >= r.top && y <= r.bottom
    }

    pub fn intersects(&self, other: &Self) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a.left < b.right && b.left < a.right && a.top < b.bottom && b.top < a.bottom
    }

    /// The same rectangle with `left <= right` and `top <= bottom`.
    pub fn normalized(&self) -> Self {
        Self {
            left: self.left.min(self.right),
            top: self.top.min(self.bottom),
            right: self.left.max(self.right),
            bottom: self.top.max(self.bottom),
        }
    }

    /// Overlap of the vertical extents, as a fraction of the smaller height.
    pub(crate) fn vertical_overlap_ratio(&self, other: &Self) -> f64 {
        let overlap = self.bottom.min(other.bottom) - self.top.max(other.top);
        let smaller = self.height().min(other.height());
        if smaller <= 0.0 {
            return if overlap >= 0.0 { 1.0 } else { 0.0 };
        }
        (overlap / smaller).max(0.0)
    }
}

/// A 2D affine transform `[a b c d e f]` as used by PDF content streams.
///
/// Points are row vectors: `(x, y) * M = (a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self` applied first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Axis-aligned bounds of the transformed rectangle `(x0, y0)..(x1, y1)`.
    pub fn transform_bounds(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
        let corners = [
            self.transform_point(x0, y0),
            self.transform_point(x1, y0),
            self.transform_point(x0, y1),
            self.transform_point(x1, y1),
        ];
        let mut rect = Rect::new(corners[0].0, corners[0].1, corners[0].0, corners[0].1);
        for &(x, y) in &corners[1..] {
            rect.left = rect.left.min(x);
            rect.right = rect.right.max(x);
            rect.top = rect.top.min(y);
            rect.bottom = rect.bottom.max(y);
        }
        rect
    }

    /// The inverse transform, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Matrix {
            a,
            b,
            c,
            d,
            e: -(self.e * a + self.f * c),
            f: -(self.e * b + self.f * d),
        })
    }

    /// Length of the transformed unit y vector; the effective font scale.
    pub fn vertical_scale(&self) -> f64 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges_and_size() {
        let r = Rect::from_xywh(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r, Rect::new(10.0, 20.0, 40.0, 60.0));
        assert_eq!(r.width(), 30.0);
        assert_eq!(r.height(), 40.0);
        assert_eq!(r.center(), (25.0, 40.0));
    }

    #[test]
    fn test_rect_empty() {
        assert!(Rect::default().is_empty());
        assert!(Rect::new(5.0, 5.0, 5.0, 5.0).is_empty());
        assert!(!Rect::new(0.0, 0.0, 1.0, 0.0).is_empty());
    }

    #[test]
    fn test_rect_union_and_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 15.0, 15.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&Rect::new(20.0, 20.0, 30.0, 30.0)));
        assert!(a.contains_point(10.0, 0.0));
        assert!(!a.contains_point(10.5, 0.0));
    }

    #[test]
    fn test_vertical_overlap_ratio() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 30.0, 25.0);
        assert_eq!(a.vertical_overlap_ratio(&b), 0.5);
        let c = Rect::new(0.0, 11.0, 10.0, 20.0);
        assert_eq!(a.vertical_overlap_ratio(&c), 0.0);
    }

    #[test]
    fn test_matrix_then() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::translation(10.0, 5.0);
        let m = scale.then(&shift);
        assert_eq!(m.transform_point(1.0, 1.0), (12.0, 7.0));
        let m = shift.then(&scale);
        assert_eq!(m.transform_point(1.0, 1.0), (22.0, 12.0));
    }

    #[test]
    fn test_inverse_undoes_transform() {
        let m = Matrix::new(0.0, 1.0, -1.0, 0.0, 792.0, 0.0);
        let inv = m.inverse().unwrap();
        let (x, y) = m.transform_point(100.0, 250.0);
        assert_eq!(inv.transform_point(x, y), (100.0, 250.0));
        assert_eq!(m.then(&inv), Matrix::IDENTITY);
        assert!(Matrix::new(1.0, 2.0, 2.0, 4.0, 0.0, 0.0).inverse().is_none());
    }

    #[test]
    fn test_transform_bounds_rotated() {
        // 90 degrees counter-clockwise
        let rot = Matrix::new(0.0, 1.0, -1.0, 0.0, 0.0, 0.0);
        let r = rot.transform_bounds(0.0, 0.0, 10.0, 2.0);
        assert_eq!(r, Rect::new(-2.0, 0.0, 0.0, 10.0));
    }
}
