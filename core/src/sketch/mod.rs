//! Sketch constraint solving.
//!
//! Entities are flat DOF vectors tagged with a [`Geometry`]; constraints relate
//! one or two of them. [`SketchSolver`] turns both lists into a bound-constrained
//! least-squares problem and hands it to an L-BFGS engine.

pub mod types;
pub mod primitives;
pub mod costs;
pub mod problem;
pub mod objective;
pub mod config;
pub mod solver;


#[cfg(test)]
mod tests_problem;


#[cfg(test)]
mod tests_solver;


pub use config::SolverConfig;
pub use objective::Objective;
pub use problem::{Bounds, IndexMap, Problem};
pub use solver::{SketchSolver, SolveReport, SolveStatus};
pub use types::{ConstraintKind, ConstraintValue, Dof, Geometry, SketchConstraint};

use thiserror::Error;

/// Errors raised while building or evaluating a sketch problem.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SketchError {
    #[error("Invalid argument types for {kind}: {geometries:?}")]
    InvalidArguments {
        kind: ConstraintKind,
        geometries: Vec<Geometry>,
    },

    #[error("{geometries} geometry tags given for {entities} entities")]
    GeometryCountMismatch { entities: usize, geometries: usize },

    #[error("Entity {entity} is a {geometry} with {actual} DOF, expected {expected}")]
    DofMismatch {
        entity: usize,
        geometry: Geometry,
        expected: usize,
        actual: usize,
    },

    #[error("A {geometry} needs {expected} DOF, got a slice of {actual}")]
    SliceLength {
        geometry: Geometry,
        expected: usize,
        actual: usize,
    },

    #[error("Constraint {constraint} references entity {entity}, but the sketch has {count}")]
    EntityOutOfRange {
        constraint: usize,
        entity: usize,
        count: usize,
    },

    #[error("{kind} takes {expected} entities, got {actual}")]
    ArityMismatch {
        kind: ConstraintKind,
        expected: usize,
        actual: usize,
    },

    #[error("{kind} expects {expected}")]
    ValueMismatch {
        kind: ConstraintKind,
        expected: &'static str,
    },

    #[error("Fixed target for entity {entity} has {actual} values, expected {expected}")]
    FixedTargetMismatch {
        entity: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid solver configuration: {0}")]
    Config(String),

    #[error("Optimizer failed: {0}")]
    Optimizer(String),
}

/// Result type for sketch operations.
pub type SketchResult<T> = Result<T, SketchError>;
