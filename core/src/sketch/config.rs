use super::{SketchError, SketchResult};
use serde::{Deserialize, Serialize};

/// Numerical settings for a solve.
///
/// Objective-change tolerance defaults to zero (disabled). Runs stop on the
/// step size, the gradient size, an exactly-zero objective or a stalled line search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Forward-difference step for the gradient.
    pub diff_step: f64,
    /// Relative step tolerance: stop once every component moves by at most
    /// `xtol_rel·|x| + xtol_abs` in one iteration.
    pub xtol_rel: f64,
    /// Absolute step tolerance, see [`Self::xtol_rel`].
    pub xtol_abs: f64,
    /// Stop once the gradient norm drops below this.
    pub tol_grad: f64,
    /// Stop once the objective changes by less than this between iterations.
    pub tol_cost: f64,
    /// Stop once the objective reaches this value.
    pub target_cost: f64,
    /// Hard cap on optimizer iterations.
    pub max_iters: u64,
    /// L-BFGS correction pairs kept.
    pub history: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            diff_step: 1e-10,
            xtol_rel: 1e-9,
            xtol_abs: 1e-12,
            tol_grad: 1e-10,
            tol_cost: 0.0,
            target_cost: 0.0,
            max_iters: 10_000,
            history: 10,
        }
    }
}

impl SolverConfig {
    pub fn from_json(json: &str) -> SketchResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SketchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SketchResult<()> {
        if self.diff_step.is_nan() || self.diff_step <= 0.0 {
            return Err(SketchError::Config(format!(
                "diff_step must be positive, got {}",
                self.diff_step
            )));
        }
        let tolerances = [self.xtol_rel, self.xtol_abs, self.tol_grad, self.tol_cost];
        if tolerances.iter().any(|t| t.is_nan() || *t < 0.0) {
            return Err(SketchError::Config("tolerances must be non-negative".into()));
        }
        if self.max_iters == 0 {
            return Err(SketchError::Config("max_iters must be at least 1".into()));
        }
        if self.history == 0 {
            return Err(SketchError::Config("history must be at least 1".into()));
        }
        Ok(())
    }
}
