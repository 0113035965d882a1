//! Assembles the flat parameter vector, its per-entity index map and the
//! variable bounds from the entity and constraint lists.

use super::objective::Objective;
use super::primitives::ARC_RADIUS;
use super::types::{Dof, Geometry, SketchConstraint};
use super::{SketchError, SketchResult};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Offsets locating each entity's DOF inside the flat vector.
///
/// Holds one boundary per entity plus a final sentinel, so entity `i` occupies
/// `offsets[i]..offsets[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMap {
    offsets: Vec<usize>,
}

impl IndexMap {
    pub fn from_lengths(lengths: impl IntoIterator<Item = usize>) -> Self {
        let mut offsets = vec![0];
        let mut total = 0;
        for len in lengths {
            total += len;
            offsets.push(total);
        }
        Self { offsets }
    }

    pub fn from_entities(entities: &[Dof]) -> Self {
        Self::from_lengths(entities.iter().map(Vec::len))
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the flat vector.
    pub fn total(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    pub fn range(&self, entity: usize) -> Range<usize> {
        self.offsets[entity]..self.offsets[entity + 1]
    }

    /// View of one entity's DOF inside `x`.
    pub fn slice<'a>(&self, x: &'a [f64], entity: usize) -> &'a [f64] {
        &x[self.range(entity)]
    }

    /// Copy `x` back out into one DOF vector per entity.
    pub fn split(&self, x: &[f64]) -> Vec<Dof> {
        self.offsets
            .windows(2)
            .map(|w| x[w[0]..w[1]].to_vec())
            .collect()
    }
}

/// Per-component lower/upper bounds of the flat vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
        }
    }

    /// Radii may not go negative; every other DOF is free.
    pub fn for_geometries(index: &IndexMap, geometries: &[Geometry]) -> Self {
        let mut bounds = Self::unbounded(index.total());
        for (i, geometry) in geometries.iter().enumerate() {
            if *geometry == Geometry::Circle {
                bounds.lower[index.offsets()[i] + ARC_RADIUS] = 0.0;
            }
        }
        bounds
    }

    pub fn contains(&self, x: &[f64]) -> bool {
        x.iter()
            .zip(self.lower.iter().zip(&self.upper))
            .all(|(v, (lo, hi))| *v >= *lo && *v <= *hi)
    }

    /// Clamp `x` component-wise into the bounds.
    pub fn project_in_place(&self, x: &mut [f64]) {
        for (v, (lo, hi)) in x.iter_mut().zip(self.lower.iter().zip(&self.upper)) {
            *v = v.max(*lo).min(*hi);
        }
    }

    pub fn project(&self, x: &[f64]) -> Vec<f64> {
        let mut out = x.to_vec();
        self.project_in_place(&mut out);
        out
    }

    /// Turn the gradient at `project(y)` into the gradient of the clamped
    /// objective at `y`.
    ///
    /// Components outside the bounds are flat. Components sitting on a bound
    /// are zeroed when a descent step would push them through it.
    pub fn mask_gradient(&self, y: &[f64], grad: &mut [f64]) {
        for (k, g) in grad.iter_mut().enumerate() {
            let (lo, hi) = (self.lower[k], self.upper[k]);
            let outside = y[k] < lo || y[k] > hi;
            let pinned_low = y[k] <= lo && *g > 0.0;
            let pinned_high = y[k] >= hi && *g < 0.0;
            if outside || pinned_low || pinned_high {
                *g = 0.0;
            }
        }
    }
}

/// A validated sketch problem ready for optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Initial flat vector: every entity's DOF, in entity order.
    pub x0: Vec<f64>,
    pub index: IndexMap,
    pub bounds: Bounds,
    pub geometries: Vec<Geometry>,
    /// Constraints with every `Fixed` target resolved.
    pub constraints: Vec<SketchConstraint>,
}

impl Problem {
    /// Validate the inputs and build the flat problem.
    pub fn assemble(
        entities: &[Dof],
        geometries: &[Geometry],
        constraints: &[SketchConstraint],
    ) -> SketchResult<Self> {
        if entities.len() != geometries.len() {
            return Err(SketchError::GeometryCountMismatch {
                entities: entities.len(),
                geometries: geometries.len(),
            });
        }

        for (entity, (dof, geometry)) in entities.iter().zip(geometries).enumerate() {
            if dof.len() != geometry.dof_len() {
                return Err(SketchError::DofMismatch {
                    entity,
                    geometry: *geometry,
                    expected: geometry.dof_len(),
                    actual: dof.len(),
                });
            }
        }

        let constraints = constraints
            .iter()
            .enumerate()
            .map(|(i, c)| resolve_constraint(i, c, entities, geometries))
            .collect::<SketchResult<Vec<_>>>()?;

        let index = IndexMap::from_entities(entities);
        let bounds = Bounds::for_geometries(&index, geometries);

        Ok(Self {
            x0: Self::flatten(entities),
            index,
            bounds,
            geometries: geometries.to_vec(),
            constraints,
        })
    }

    /// Concatenate entity DOF in entity order.
    pub fn flatten(entities: &[Dof]) -> Vec<f64> {
        entities.iter().flatten().copied().collect()
    }

    pub fn objective(&self, diff_step: f64) -> Objective<'_> {
        Objective::new(&self.constraints, &self.geometries, &self.index, diff_step)
    }
}

/// Check a constraint against the catalog and fill in a missing `Fixed` target.
fn resolve_constraint(
    index: usize,
    constraint: &SketchConstraint,
    entities: &[Dof],
    geometries: &[Geometry],
) -> SketchResult<SketchConstraint> {
    let kind = constraint.kind();
    let (e1, e2) = constraint.entities();
    let refs: Vec<usize> = std::iter::once(e1).chain(e2).collect();

    if let Some(&entity) = refs.iter().find(|&&e| e >= entities.len()) {
        return Err(SketchError::EntityOutOfRange {
            constraint: index,
            entity,
            count: entities.len(),
        });
    }

    let types: Vec<Geometry> = refs.iter().map(|&e| geometries[e]).collect();
    if !types.iter().all(|g| kind.allows(*g)) {
        return Err(SketchError::InvalidArguments {
            kind,
            geometries: types,
        });
    }

    match constraint {
        SketchConstraint::Fixed { entity, target: None } => Ok(SketchConstraint::Fixed {
            entity: *entity,
            target: Some(entities[*entity].clone()),
        }),
        SketchConstraint::Fixed {
            entity,
            target: Some(target),
        } if target.len() != entities[*entity].len() => Err(SketchError::FixedTargetMismatch {
            entity: *entity,
            expected: entities[*entity].len(),
            actual: target.len(),
        }),
        _ => Ok(constraint.clone()),
    }
}
