//! Objective and gradient over the flat parameter vector.
//!
//! The objective is the sum of squared constraint residuals. Its gradient is
//! built constraint by constraint with one-sided finite differences of the
//! residual: `∂(r²)/∂x_k ≈ 2·r·(r(x + ε·e_k) − r(x)) / ε`, perturbing only the
//! DOF of the entities the constraint references.

use super::costs::{self, EntityView};
use super::problem::IndexMap;
use super::types::{Geometry, SketchConstraint};
use super::SketchResult;

pub struct Objective<'a> {
    constraints: &'a [SketchConstraint],
    geometries: &'a [Geometry],
    index: &'a IndexMap,
    diff_step: f64,
}

impl<'a> Objective<'a> {
    pub fn new(
        constraints: &'a [SketchConstraint],
        geometries: &'a [Geometry],
        index: &'a IndexMap,
        diff_step: f64,
    ) -> Self {
        Self {
            constraints,
            geometries,
            index,
            diff_step,
        }
    }

    /// Number of variables in the flat vector.
    pub fn dimension(&self) -> usize {
        self.index.total()
    }

    fn view<'x>(&self, x: &'x [f64], entity: usize) -> EntityView<'x> {
        (self.index.slice(x, entity), self.geometries[entity])
    }

    /// Residual of a single constraint at `x`.
    pub fn residual(&self, constraint: &SketchConstraint, x: &[f64]) -> SketchResult<f64> {
        let (e1, e2) = constraint.entities();
        costs::evaluate(constraint, self.view(x, e1), e2.map(|e| self.view(x, e)))
    }

    /// Residual of every constraint at `x`, in constraint order.
    pub fn residuals(&self, x: &[f64]) -> SketchResult<Vec<f64>> {
        self.constraints
            .iter()
            .map(|c| self.residual(c, x))
            .collect()
    }

    /// Sum of squared residuals.
    pub fn value(&self, x: &[f64]) -> SketchResult<f64> {
        let mut total = 0.0;
        for constraint in self.constraints {
            let r = self.residual(constraint, x)?;
            total += r * r;
        }
        Ok(total)
    }

    /// Fill `out` with the finite-difference gradient of [`Self::value`].
    ///
    /// Components no constraint touches stay zero.
    pub fn gradient(&self, x: &[f64], out: &mut [f64]) -> SketchResult<()> {
        debug_assert_eq!(out.len(), self.dimension());
        out.fill(0.0);

        for constraint in self.constraints {
            self.accumulate_gradient(constraint, x, out)?;
        }

        Ok(())
    }

    /// Objective value and gradient in one pass.
    pub fn value_and_gradient(&self, x: &[f64], out: &mut [f64]) -> SketchResult<f64> {
        self.gradient(x, out)?;
        self.value(x)
    }

    /// Add one constraint's contribution to `out`.
    ///
    /// Each referenced entity gets its own scratch copy, so perturbing one
    /// never leaks into the other even when both refer to the same entity.
    fn accumulate_gradient(
        &self,
        constraint: &SketchConstraint,
        x: &[f64],
        out: &mut [f64],
    ) -> SketchResult<()> {
        let eps = self.diff_step;
        let (e1, e2) = constraint.entities();
        let g1 = self.geometries[e1];

        let mut x1 = self.index.slice(x, e1).to_vec();
        let mut second = e2.map(|e| (self.index.slice(x, e).to_vec(), self.geometries[e]));

        let r = costs::evaluate(
            constraint,
            (x1.as_slice(), g1),
            second.as_ref().map(|(x2, g2)| (x2.as_slice(), *g2)),
        )?;

        for (j, k) in self.index.range(e1).enumerate() {
            let saved = x1[j];
            x1[j] += eps;
            let r1 = costs::evaluate(
                constraint,
                (x1.as_slice(), g1),
                second.as_ref().map(|(x2, g2)| (x2.as_slice(), *g2)),
            )?;
            out[k] += 2.0 * r * (r1 - r) / eps;
            x1[j] = saved;
        }

        if let (Some(e2), Some((x2, g2))) = (e2, second.as_mut()) {
            for (j, k) in self.index.range(e2).enumerate() {
                let saved = x2[j];
                x2[j] += eps;
                let r2 = costs::evaluate(constraint, (x1.as_slice(), g1), Some((x2.as_slice(), *g2)))?;
                out[k] += 2.0 * r * (r2 - r) / eps;
                x2[j] = saved;
            }
        }

        Ok(())
    }
}
