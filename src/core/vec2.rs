//! 2D Vector
//!
//! Float vector used for positions, velocities and accelerations.
//! Screen convention: +X right, +Y down. Negative Y velocity is upward.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};
use serde::{Serialize, Deserialize};

/// 2D vector with `f32` components.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component (pixels)
    pub x: f32,
    /// Y component (pixels, down is positive)
    pub y: f32,
}

impl Vec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared length (avoids sqrt).
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Rotate this point around `center` by `angle_rad`.
    ///
    /// Standard 2D rotation; with +Y down a positive angle turns clockwise on screen.
    pub fn rotate_around(self, center: Self, angle_rad: f32) -> Self {
        let (sin, cos) = angle_rad.sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Self {
            x: center.x + dx * cos - dy * sin,
            y: center.y + dx * sin + dy * cos,
        }
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl fmt::Debug for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec2({:.3}, {:.3})", self.x, self.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_add_sub() {
        let a = Vec2::new(3.0, 4.0);
        let b = Vec2::new(1.0, 2.0);
        assert_eq!(a + b, Vec2::new(4.0, 6.0));
        assert_eq!(a - b, Vec2::new(2.0, 2.0));
        assert_eq!(-a, Vec2::new(-3.0, -4.0));
    }

    #[test]
    fn test_length() {
        let v = Vec2::new(3.0, 4.0);
        assert!(approx(v.length(), 5.0));
        assert!(approx(v.length_squared(), 25.0));
        assert!(approx(Vec2::ZERO.distance(v), 5.0));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let p = Vec2::new(10.0, 0.0);
        let r = p.rotate_around(Vec2::ZERO, std::f32::consts::FRAC_PI_2);
        assert!(approx(r.x, 0.0));
        assert!(approx(r.y, 10.0));
    }

    #[test]
    fn test_rotate_around_offset_center() {
        let center = Vec2::new(100.0, 100.0);
        let p = Vec2::new(110.0, 100.0);
        let r = p.rotate_around(center, std::f32::consts::PI);
        assert!(approx(r.x, 90.0));
        assert!(approx(r.y, 100.0));
    }
}
