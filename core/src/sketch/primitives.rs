//! Point and tangent queries over entity DOF slices.
//!
//! These are the only places that know how a LINE or CIRCLE lays out its DOF.
//! Slices are assumed to have the geometry's full DOF length; the cost
//! functions check that before calling in.
//! Arcs measure angles from the +Y axis: the point at angle `a` is
//! `(cx + r·sin a, cy + r·cos a)`.

use super::types::Geometry;
use crate::geometry::{direction, point, sign, Point2, Vector2};

/// Index of the radius inside a CIRCLE's DOF.
pub const ARC_RADIUS: usize = 2;
/// Index of the start angle inside a CIRCLE's DOF.
pub const ARC_START: usize = 3;
/// Index of the signed angular span inside a CIRCLE's DOF.
pub const ARC_SPAN: usize = 4;

// =============================================================================
// Line Segments
// =============================================================================

#[inline]
pub fn line_start(x: &[f64]) -> Point2 {
    point(x[0], x[1])
}

#[inline]
pub fn line_end(x: &[f64]) -> Point2 {
    point(x[2], x[3])
}

/// Direction from the first to the second endpoint (not normalized).
#[inline]
pub fn line_direction(x: &[f64]) -> Vector2 {
    line_end(x) - line_start(x)
}

/// `p1 + t·(p2 − p1)`.
#[inline]
pub fn line_point(x: &[f64], t: f64) -> Point2 {
    line_start(x) + line_direction(x) * t
}

// =============================================================================
// Arcs
// =============================================================================

#[inline]
fn arc_point_at_angle(x: &[f64], a: f64) -> Point2 {
    point(x[0] + x[ARC_RADIUS] * a.sin(), x[1] + x[ARC_RADIUS] * a.cos())
}

/// Tangent at angle `a`, oriented along the sweep. A zero span has no direction.
#[inline]
fn arc_tangent_at_angle(x: &[f64], a: f64) -> Vector2 {
    let s = sign(x[ARC_SPAN]);
    direction(s * a.cos(), -s * a.sin())
}

#[inline]
pub fn arc_first(x: &[f64]) -> Point2 {
    arc_point_at_angle(x, x[ARC_START])
}

#[inline]
pub fn arc_last(x: &[f64]) -> Point2 {
    arc_point_at_angle(x, x[ARC_START] + x[ARC_SPAN])
}

/// Point at `a0 + t·da`.
#[inline]
pub fn arc_point(x: &[f64], t: f64) -> Point2 {
    arc_point_at_angle(x, x[ARC_START] + t * x[ARC_SPAN])
}

#[inline]
pub fn arc_first_tangent(x: &[f64]) -> Vector2 {
    arc_tangent_at_angle(x, x[ARC_START])
}

#[inline]
pub fn arc_last_tangent(x: &[f64]) -> Vector2 {
    arc_tangent_at_angle(x, x[ARC_START] + x[ARC_SPAN])
}

// =============================================================================
// Geometry dispatch
// =============================================================================

/// Point at a normalized parameter; `None` selects the start point.
pub fn point_at(x: &[f64], geometry: Geometry, param: Option<f64>) -> Point2 {
    let t = param.unwrap_or(0.0);
    match geometry {
        Geometry::Line => line_point(x, t),
        Geometry::Circle => arc_point(x, t),
    }
}

pub fn first_point(x: &[f64], geometry: Geometry) -> Point2 {
    match geometry {
        Geometry::Line => line_start(x),
        Geometry::Circle => arc_first(x),
    }
}

pub fn last_point(x: &[f64], geometry: Geometry) -> Point2 {
    match geometry {
        Geometry::Line => line_end(x),
        Geometry::Circle => arc_last(x),
    }
}

/// Direction of travel where the primitive begins.
pub fn start_tangent(x: &[f64], geometry: Geometry) -> Vector2 {
    match geometry {
        Geometry::Line => line_direction(x),
        Geometry::Circle => arc_first_tangent(x),
    }
}

/// Direction of travel where the primitive ends.
pub fn end_tangent(x: &[f64], geometry: Geometry) -> Vector2 {
    match geometry {
        Geometry::Line => line_direction(x),
        Geometry::Circle => arc_last_tangent(x),
    }
}

/// Straight length of a LINE, `r·|da|` for a CIRCLE.
pub fn curve_length(x: &[f64], geometry: Geometry) -> f64 {
    match geometry {
        Geometry::Line => line_direction(x).norm(),
        Geometry::Circle => x[ARC_RADIUS] * x[ARC_SPAN].abs(),
    }
}
