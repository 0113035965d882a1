//! 2D direction and angle utilities used by the sketch cost functions.
//!
//! Angles follow the trigonometric sense: a positive angle turns counter-clockwise.

use super::{Point2, Vector2};

// =============================================================================
// Construction
// =============================================================================

/// Build a 2D direction vector from its components.
#[inline]
pub fn direction(x: f64, y: f64) -> Vector2 {
    Vector2::new(x, y)
}

/// Build a 2D point from its coordinates.
#[inline]
pub fn point(x: f64, y: f64) -> Point2 {
    Point2::new(x, y)
}

// =============================================================================
// Vector Operations
// =============================================================================

/// 2D cross product (z-component of 3D cross product).
/// Positive if v2 is counter-clockwise from v1.
#[inline]
pub fn cross_2d(v1: &Vector2, v2: &Vector2) -> f64 {
    v1.x * v2.y - v1.y * v2.x
}

/// Signed angle turning `from` onto `to`, in `(-PI, PI]`.
///
/// Zero-length inputs yield `0.0` rather than failing.
#[inline]
pub fn signed_angle(from: &Vector2, to: &Vector2) -> f64 {
    cross_2d(from, to).atan2(from.dot(to))
}

/// Sign of `v` as `-1`, `0` or `1`.
///
/// Unlike [`f64::signum`], zero maps to zero, so a degenerate sweep has no direction.
#[inline]
pub fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}
