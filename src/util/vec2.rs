//! 2D vector math used by the simulation

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// 2D vector; serialized as `{ "x": .., "y": .. }`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians)
    #[inline]
    pub fn from_angle(angle: f32) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn distance(&self, other: Vec2) -> f32 {
        (other - *self).length()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Rescale to exactly `length`. Returns `None` for a zero-length vector.
    pub fn with_length(&self, length: f32) -> Option<Self> {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            return None;
        }
        Some(Self {
            x: self.x / len * length,
            y: self.y / len * length,
        })
    }
}

/// Distance from `from` to `to` and the unit direction pointing at `to`.
///
/// Coincident points yield a zero direction.
pub fn distance_and_direction(from: Vec2, to: Vec2) -> (f32, Vec2) {
    let delta = to - from;
    let distance = delta.length();
    if distance > 0.0 {
        (distance, Vec2::new(delta.x / distance, delta.y / distance))
    } else {
        (0.0, Vec2::ZERO)
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_length_rescales() {
        let v = Vec2::new(3.0, 4.0).with_length(10.0).unwrap();
        assert!((v.x - 6.0).abs() < 1e-5);
        assert!((v.y - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_with_length_zero_is_none() {
        assert!(Vec2::ZERO.with_length(8.0).is_none());
    }

    #[test]
    fn test_distance_and_direction() {
        let (dist, dir) = distance_and_direction(Vec2::new(0.0, 0.0), Vec2::new(0.0, 5.0));
        assert_eq!(dist, 5.0);
        assert_eq!(dir, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_distance_and_direction_coincident() {
        let p = Vec2::new(2.0, 2.0);
        assert_eq!(distance_and_direction(p, p), (0.0, Vec2::ZERO));
    }
}
