//! Residual functions, one per constraint kind.
//!
//! Each residual is exactly zero when its constraint is satisfied. The objective
//! squares them, so the sign only matters for the gradient.

use super::primitives::{
    curve_length, end_tangent, first_point, last_point, line_direction, point_at, start_tangent,
    ARC_RADIUS, ARC_SPAN,
};
use super::types::{ConstraintKind, Geometry, SketchConstraint};
use super::{SketchError, SketchResult};
use crate::geometry::{direction, signed_angle};

/// Entity DOF slice together with its geometry tag.
pub type EntityView<'a> = (&'a [f64], Geometry);

fn check(kind: ConstraintKind, views: &[EntityView<'_>]) -> SketchResult<()> {
    if !views.iter().all(|(_, g)| kind.allows(*g)) {
        return Err(SketchError::InvalidArguments {
            kind,
            geometries: views.iter().map(|(_, g)| *g).collect(),
        });
    }
    for (x, geometry) in views {
        if x.len() != geometry.dof_len() {
            return Err(SketchError::SliceLength {
                geometry: *geometry,
                expected: geometry.dof_len(),
                actual: x.len(),
            });
        }
    }
    Ok(())
}

/// Euclidean distance between the whole DOF vector and `target`.
pub fn fixed_cost(x: &[f64], geometry: Geometry, target: &[f64]) -> SketchResult<f64> {
    check(ConstraintKind::Fixed, &[(x, geometry)])?;
    if target.len() != x.len() {
        return Err(SketchError::ValueMismatch {
            kind: ConstraintKind::Fixed,
            expected: "a target with one value per DOF",
        });
    }

    Ok(x.iter()
        .zip(target)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt())
}

/// Gap between the end of the first entity and the start of the second.
pub fn coincident_cost(x1: &[f64], g1: Geometry, x2: &[f64], g2: Geometry) -> SketchResult<f64> {
    check(ConstraintKind::Coincident, &[(x1, g1), (x2, g2)])?;
    Ok((last_point(x1, g1) - first_point(x2, g2)).norm())
}

/// Angle turning the second entity's start direction onto the first entity's end direction, minus `value`.
pub fn angle_cost(
    x1: &[f64],
    g1: Geometry,
    x2: &[f64],
    g2: Geometry,
    value: f64,
) -> SketchResult<f64> {
    check(ConstraintKind::Angle, &[(x1, g1), (x2, g2)])?;
    let v1 = end_tangent(x1, g1);
    let v2 = start_tangent(x2, g2);
    Ok(signed_angle(&v2, &v1) - value)
}

pub fn length_cost(x: &[f64], geometry: Geometry, value: f64) -> SketchResult<f64> {
    check(ConstraintKind::Length, &[(x, geometry)])?;
    Ok(curve_length(x, geometry) - value)
}

pub fn distance_cost(
    x1: &[f64],
    g1: Geometry,
    x2: &[f64],
    g2: Geometry,
    params: [Option<f64>; 2],
    value: f64,
) -> SketchResult<f64> {
    check(ConstraintKind::Distance, &[(x1, g1), (x2, g2)])?;
    let p1 = point_at(x1, g1, params[0]);
    let p2 = point_at(x2, g2, params[1]);
    Ok((p1 - p2).norm() - value)
}

pub fn radius_cost(x: &[f64], geometry: Geometry, value: f64) -> SketchResult<f64> {
    check(ConstraintKind::Radius, &[(x, geometry)])?;
    Ok(x[ARC_RADIUS] - value)
}

/// Angle turning the line direction onto `target`.
pub fn orientation_cost(x: &[f64], geometry: Geometry, target: [f64; 2]) -> SketchResult<f64> {
    check(ConstraintKind::Orientation, &[(x, geometry)])?;
    Ok(signed_angle(&line_direction(x), &direction(target[0], target[1])))
}

pub fn arc_angle_cost(x: &[f64], geometry: Geometry, value: f64) -> SketchResult<f64> {
    check(ConstraintKind::ArcAngle, &[(x, geometry)])?;
    Ok(x[ARC_SPAN].abs() - value)
}

/// Evaluate the residual of `constraint` against the given entity views.
///
/// `second` must be present exactly when the constraint is binary.
pub fn evaluate(
    constraint: &SketchConstraint,
    first: EntityView<'_>,
    second: Option<EntityView<'_>>,
) -> SketchResult<f64> {
    let (x1, g1) = first;
    let kind = constraint.kind();
    let pair = || {
        second.ok_or(SketchError::ArityMismatch {
            kind,
            expected: 2,
            actual: 1,
        })
    };

    match constraint {
        SketchConstraint::Fixed { target, .. } => {
            let target = target.as_deref().ok_or(SketchError::ValueMismatch {
                kind,
                expected: "a resolved target DOF vector",
            })?;
            fixed_cost(x1, g1, target)
        }
        SketchConstraint::Coincident { .. } => {
            let (x2, g2) = pair()?;
            coincident_cost(x1, g1, x2, g2)
        }
        SketchConstraint::Angle { value, .. } => {
            let (x2, g2) = pair()?;
            angle_cost(x1, g1, x2, g2, *value)
        }
        SketchConstraint::Length { value, .. } => length_cost(x1, g1, *value),
        SketchConstraint::Distance { params, value, .. } => {
            let (x2, g2) = pair()?;
            distance_cost(x1, g1, x2, g2, *params, *value)
        }
        SketchConstraint::Radius { value, .. } => radius_cost(x1, g1, *value),
        SketchConstraint::Orientation { direction, .. } => orientation_cost(x1, g1, *direction),
        SketchConstraint::ArcAngle { value, .. } => arc_angle_cost(x1, g1, *value),
    }
}
