//! 2D sketch constraint solving.
//!
//! Line segments and circular arcs are described by small DOF vectors. Named
//! constraints between them become squared residuals, and the total is
//! minimized by a bound-constrained, gradient-based optimizer.
//!
//! ```no_run
//! use sketch_core::sketch::{Geometry, SketchConstraint, SketchSolver};
//!
//! let solver = SketchSolver::new(
//!     vec![vec![0.0, 0.0, 1.0, 0.0, std::f64::consts::FRAC_PI_2]],
//!     vec![Geometry::Circle],
//!     vec![SketchConstraint::Radius { entity: 0, value: 2.0 }],
//! )?;
//! let (entities, report) = solver.solve()?;
//! assert!(report.cost < 1e-12);
//! # let _ = entities;
//! # Ok::<(), sketch_core::sketch::SketchError>(())
//! ```

pub mod geometry;
pub mod sketch;
