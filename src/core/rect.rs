//! Rectangles and Rotated Bounds
//!
//! Axis-aligned rectangles in screen space (+Y down) plus the helpers
//! needed to derive edges from a rotated corner set.

use serde::{Serialize, Deserialize};
use super::vec2::Vec2;

/// Axis-aligned rectangle. `(x, y)` is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub w: f32,
    /// Height
    pub h: f32,
}

impl Rect {
    /// Create a new rectangle.
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Build a rect whose bottom-center sits at `feet`.
    pub fn from_feet(feet: Vec2, w: f32, h: f32) -> Self {
        Self::new(feet.x - w * 0.5, feet.y - h, w, h)
    }

    /// Left edge (x).
    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Right edge (x + w).
    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Top edge (y).
    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Bottom edge (y + h).
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Strict overlap test; touching edges do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    /// Inclusive point test.
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left() && point.x <= self.right() && point.y >= self.top() && point.y <= self.bottom()
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Rect {
        Rect::new(self.x - margin, self.y - margin, self.w + margin * 2.0, self.h + margin * 2.0)
    }

    /// Corners in order: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.left(), self.top()),
            Vec2::new(self.right(), self.top()),
            Vec2::new(self.right(), self.bottom()),
            Vec2::new(self.left(), self.bottom()),
        ]
    }

    /// Corners rotated about `center`.
    pub fn rotated_corners(&self, center: Vec2, angle_rad: f32) -> [Vec2; 4] {
        self.corners().map(|c| c.rotate_around(center, angle_rad))
    }
}

/// Axis-aligned bounds of a set of points.
///
/// Returns a zero rect for an empty slice.
pub fn bounds_of(points: &[Vec2]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::default();
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
}
