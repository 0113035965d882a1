use super::config::SolverConfig;
use super::objective::Objective;
use super::problem::{Bounds, Problem};
use super::types::{Dof, Geometry, SketchConstraint};
use super::{SketchError, SketchResult};
use argmin::core::{
    CostFunction, Executor, Gradient, IterState, Problem as EngineProblem, Solver, State,
    TerminationReason, TerminationStatus, KV,
};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use tracing::{debug, info, warn};

/// How the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Objective reached the target value (zero by default).
    Success,
    /// Step-size, gradient or objective-change tolerance satisfied.
    ToleranceReached,
    /// Iteration cap hit before any tolerance.
    MaxIterationsReached,
    /// The line search could not make further progress. The best point seen is returned.
    RoundoffLimited,
    /// Interrupted or timed out.
    ForcedStop,
}

impl SolveStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Success | Self::ToleranceReached)
    }
}

/// Diagnostics returned alongside the solved entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Entities as they were handed to the solver.
    pub initial_entities: Vec<Dof>,
    /// Final objective value (sum of squared residuals).
    pub cost: f64,
    /// Number of distinct points at which the objective was evaluated.
    pub evaluations: usize,
    /// Optimizer iterations, when the engine finished without error.
    pub iterations: Option<u64>,
    pub status: SolveStatus,
    /// Final residual of each constraint, in constraint order.
    pub residuals: Vec<f64>,
}

// =============================================================================
// argmin Adapter
// =============================================================================

type SketchState = IterState<Vec<f64>, Vec<f64>, (), (), (), f64>;

/// Evaluation bookkeeping that outlives the engine run.
#[derive(Default)]
struct Tracker {
    /// Last `(y, f, ∇f)`; the engine asks for cost and gradient separately at the same point.
    last: RefCell<Option<(Vec<f64>, f64, Vec<f64>)>>,
    /// Lowest-cost projected point seen so far.
    best: RefCell<Option<(Vec<f64>, f64)>>,
    evaluations: Cell<usize>,
    /// First structured failure raised by the objective.
    error: RefCell<Option<SketchError>>,
}

/// Presents the sketch objective to argmin.
///
/// Line search trial points `y` may leave the bounds. Every evaluation
/// happens at `project(y)` and the gradient is masked to match, so the
/// engine sees one consistent piecewise-smooth function.
struct SketchCost<'a> {
    objective: &'a Objective<'a>,
    bounds: &'a Bounds,
    tracker: &'a Tracker,
}

impl SketchCost<'_> {
    fn ensure_evaluated(&self, y: &[f64]) -> Result<(), argmin::core::Error> {
        {
            let cached = self.tracker.last.borrow();
            if let Some((p, _, _)) = cached.as_ref() {
                if p.as_slice() == y {
                    return Ok(());
                }
            }
        }

        let x = self.bounds.project(y);
        let mut grad = vec![0.0; x.len()];
        let value = match self.objective.value_and_gradient(&x, &mut grad) {
            Ok(value) => value,
            Err(e) => {
                let msg = e.to_string();
                self.tracker.error.borrow_mut().get_or_insert(e);
                return Err(argmin::core::Error::msg(msg));
            }
        };
        self.bounds.mask_gradient(y, &mut grad);
        self.tracker.evaluations.set(self.tracker.evaluations.get() + 1);

        {
            let mut best = self.tracker.best.borrow_mut();
            let improves = match best.as_ref() {
                Some((_, best_value)) => value < *best_value,
                None => !value.is_nan(),
            };
            if improves {
                *best = Some((x, value));
            }
        }

        *self.tracker.last.borrow_mut() = Some((y.to_vec(), value, grad));
        Ok(())
    }
}

impl CostFunction for SketchCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, y: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        self.ensure_evaluated(y)?;
        self.tracker
            .last
            .borrow()
            .as_ref()
            .map(|(_, value, _)| *value)
            .ok_or_else(|| argmin::core::Error::msg("objective cache is empty"))
    }
}

impl Gradient for SketchCost<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, y: &Self::Param) -> Result<Self::Gradient, argmin::core::Error> {
        self.ensure_evaluated(y)?;
        self.tracker
            .last
            .borrow()
            .as_ref()
            .map(|(_, _, grad)| grad.clone())
            .ok_or_else(|| argmin::core::Error::msg("objective cache is empty"))
    }
}

/// Runs an inner quasi-Newton solver, pulls each accepted iterate back into
/// the bounds and stops once a step gets small in variable space.
struct Projected<'a, S> {
    inner: S,
    bounds: &'a Bounds,
    xtol_rel: f64,
    xtol_abs: f64,
    /// Iterate before the last step.
    prev: Option<Vec<f64>>,
}

impl<'a, S> Projected<'a, S> {
    fn new(inner: S, bounds: &'a Bounds, config: &SolverConfig) -> Self {
        Self {
            inner,
            bounds,
            xtol_rel: config.xtol_rel,
            xtol_abs: config.xtol_abs,
            prev: None,
        }
    }

    fn step_is_small(&self, x: &[f64]) -> bool {
        let Some(prev) = self.prev.as_deref() else {
            return false;
        };
        x.iter()
            .zip(prev)
            .all(|(a, b)| (a - b).abs() <= self.xtol_rel * a.abs() + self.xtol_abs)
    }
}

impl<O, S> Solver<O, SketchState> for Projected<'_, S>
where
    O: CostFunction<Param = Vec<f64>, Output = f64> + Gradient<Param = Vec<f64>, Gradient = Vec<f64>>,
    S: Solver<O, SketchState>,
{
    const NAME: &'static str = "projected L-BFGS";

    fn init(
        &mut self,
        problem: &mut EngineProblem<O>,
        state: SketchState,
    ) -> Result<(SketchState, Option<KV>), argmin::core::Error> {
        self.inner.init(problem, state)
    }

    fn next_iter(
        &mut self,
        problem: &mut EngineProblem<O>,
        state: SketchState,
    ) -> Result<(SketchState, Option<KV>), argmin::core::Error> {
        self.prev = state.get_param().cloned();
        let (mut state, kv) = self.inner.next_iter(problem, state)?;
        if state.terminated() {
            return Ok((state, kv));
        }

        let Some(y) = state.get_param() else {
            return Ok((state, kv));
        };
        if self.bounds.contains(y) {
            return Ok((state, kv));
        }

        // Same cost at the clamped point; only the gradient mask can differ.
        // The previous iterate stays in `prev_param`.
        let x = self.bounds.project(y);
        let grad = problem.gradient(&x)?;
        state.param = Some(x);
        Ok((state.gradient(grad), kv))
    }

    fn terminate(&mut self, state: &SketchState) -> TerminationStatus {
        let inner = <S as Solver<O, SketchState>>::terminate(&mut self.inner, state);
        if inner.terminated() {
            return inner;
        }
        match state.get_param() {
            Some(x) if self.step_is_small(x) => {
                TerminationStatus::Terminated(TerminationReason::SolverConverged)
            }
            _ => TerminationStatus::NotTerminated,
        }
    }
}

/// Map how the engine stopped onto the sketch-level status.
pub(super) fn status_for(reason: Option<&TerminationReason>) -> SolveStatus {
    match reason {
        Some(TerminationReason::TargetCostReached) => SolveStatus::Success,
        Some(TerminationReason::SolverConverged) => SolveStatus::ToleranceReached,
        Some(TerminationReason::MaxItersReached) => SolveStatus::MaxIterationsReached,
        Some(TerminationReason::SolverExit(_)) => SolveStatus::RoundoffLimited,
        Some(TerminationReason::Interrupt | TerminationReason::Timeout) | None => {
            SolveStatus::ForcedStop
        }
    }
}

fn engine_error(e: argmin::core::Error) -> SketchError {
    SketchError::Optimizer(e.to_string())
}

// =============================================================================
// Driver
// =============================================================================

/// Solves one sketch: a fixed snapshot of entities, geometry tags and constraints.
///
/// Changing any input means building a new solver.
#[derive(Debug, Clone)]
pub struct SketchSolver {
    entities: Vec<Dof>,
    problem: Problem,
}

impl SketchSolver {
    /// Validate the sketch and assemble its flat problem.
    pub fn new(
        entities: Vec<Dof>,
        geometries: Vec<Geometry>,
        constraints: Vec<SketchConstraint>,
    ) -> SketchResult<Self> {
        let problem = Problem::assemble(&entities, &geometries, &constraints)?;
        debug!(
            entities = entities.len(),
            constraints = problem.constraints.len(),
            variables = problem.index.total(),
            "assembled sketch problem"
        );
        Ok(Self { entities, problem })
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Solve with [`SolverConfig::default`].
    pub fn solve(&self) -> SketchResult<(Vec<Dof>, SolveReport)> {
        self.solve_with(&SolverConfig::default())
    }

    /// Run the optimizer and slice the result back into per-entity DOF.
    ///
    /// Non-convergence is reported through [`SolveReport::status`], not as an error.
    pub fn solve_with(&self, config: &SolverConfig) -> SketchResult<(Vec<Dof>, SolveReport)> {
        config.validate()?;
        let problem = &self.problem;
        let objective = problem.objective(config.diff_step);
        let x0 = problem.bounds.project(&problem.x0);

        // Surface malformed constraints before the engine swallows them.
        let initial_cost = objective.value(&x0)?;
        debug!(initial_cost, "initial objective");
        if initial_cost <= config.target_cost {
            return self.finish(&objective, x0, 1, Some(0), SolveStatus::Success);
        }

        let tracker = Tracker::default();
        let cost = SketchCost {
            objective: &objective,
            bounds: &problem.bounds,
            tracker: &tracker,
        };

        let linesearch: MoreThuenteLineSearch<Vec<f64>, Vec<f64>, f64> = MoreThuenteLineSearch::new();
        let solver: LBFGS<_, Vec<f64>, Vec<f64>, f64> = LBFGS::new(linesearch, config.history)
            .with_tolerance_grad(config.tol_grad)
            .map_err(engine_error)?
            .with_tolerance_cost(config.tol_cost)
            .map_err(engine_error)?;

        let solver = Projected::new(solver, &problem.bounds, config);

        let outcome = Executor::new(cost, solver)
            .configure(|state| {
                state
                    .param(x0)
                    .max_iters(config.max_iters)
                    .target_cost(config.target_cost)
            })
            .run();

        let (status, iterations) = match outcome {
            Ok(result) => {
                let state = result.state();
                let reason = state.get_termination_reason();
                let status = status_for(reason);
                if let Some(TerminationReason::SolverExit(why)) = reason {
                    warn!(reason = %why, "optimizer stalled, keeping best point");
                }
                debug!(iterations = state.get_iter(), ?status, "optimizer terminated");
                (status, Some(state.get_iter()))
            }
            Err(err) => {
                if let Some(e) = tracker.error.borrow_mut().take() {
                    return Err(e);
                }
                if tracker.best.borrow().is_none() {
                    return Err(engine_error(err));
                }
                warn!(error = %err, "optimizer stalled, keeping best point");
                (SolveStatus::RoundoffLimited, None)
            }
        };

        let (x, _) = tracker
            .best
            .take()
            .ok_or_else(|| SketchError::Optimizer("no point was evaluated".into()))?;
        self.finish(&objective, x, tracker.evaluations.get(), iterations, status)
    }

    fn finish(
        &self,
        objective: &Objective<'_>,
        x: Vec<f64>,
        evaluations: usize,
        iterations: Option<u64>,
        status: SolveStatus,
    ) -> SketchResult<(Vec<Dof>, SolveReport)> {
        let residuals = objective.residuals(&x)?;
        let cost: f64 = residuals.iter().map(|r| r * r).sum();
        info!(cost, evaluations, ?status, "sketch solve finished");

        let report = SolveReport {
            initial_entities: self.entities.clone(),
            cost,
            evaluations,
            iterations,
            status,
            residuals,
        };
        Ok((self.problem.index.split(&x), report))
    }
}
