use crate::sketch::config::SolverConfig;
use crate::sketch::solver::{status_for, SketchSolver, SolveStatus};
use crate::sketch::types::{Geometry, SketchConstraint};
use crate::sketch::SketchError;
use argmin::core::TerminationReason;
use std::f64::consts::FRAC_PI_2;

#[test]
fn test_solver_already_coincident() {
    let entities = vec![vec![0.0, 0.0, 1.0, 0.0], vec![1.0, 0.0, 2.0, 0.0]];
    let solver = SketchSolver::new(
        entities.clone(),
        vec![Geometry::Line, Geometry::Line],
        vec![SketchConstraint::Coincident { entities: [0, 1] }],
    )
    .unwrap();

    let (solved, report) = solver.solve().unwrap();

    assert_eq!(report.status, SolveStatus::Success);
    assert_eq!(report.iterations, Some(0));
    assert!(report.cost < 1e-12);
    for (before, after) in entities.iter().zip(&solved) {
        for (a, b) in before.iter().zip(after) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}

#[test]
fn test_solver_coincident_gap_closes() {
    let solver = SketchSolver::new(
        vec![vec![0.0, 0.0, 10.0, 0.0], vec![12.0, 2.0, 20.0, 2.0]],
        vec![Geometry::Line, Geometry::Line],
        vec![SketchConstraint::Coincident { entities: [0, 1] }],
    )
    .unwrap();

    let (solved, report) = solver.solve().unwrap();

    assert!(report.cost < 1e-10, "cost: {}", report.cost);
    assert!((solved[0][2] - solved[1][0]).abs() < 1e-5);
    assert!((solved[0][3] - solved[1][1]).abs() < 1e-5);
    // Start of the first line and end of the second are not involved
    assert!(solved[0][0].abs() < 1e-9 && solved[0][1].abs() < 1e-9);
    assert!((solved[1][2] - 20.0).abs() < 1e-9 && (solved[1][3] - 2.0).abs() < 1e-9);
}

#[test]
fn test_solver_orientation() {
    let solver = SketchSolver::new(
        vec![vec![0.0, 0.0, 1.0, 0.0]],
        vec![Geometry::Line],
        vec![SketchConstraint::Orientation { entity: 0, direction: [0.0, 1.0] }],
    )
    .unwrap();

    let (solved, report) = solver.solve().unwrap();

    assert!(report.cost < 1e-10, "cost: {}", report.cost);
    let dx = solved[0][2] - solved[0][0];
    let dy = solved[0][3] - solved[0][1];
    assert!(dy > 0.0);
    assert!(dx.abs() / dy < 1e-5, "direction ({}, {})", dx, dy);
}

#[test]
fn test_solver_fixed_line_pulls_neighbour() {
    let solver = SketchSolver::new(
        vec![vec![0.0, 0.0, 1.0, 0.0], vec![2.0, 1.0, 3.0, 1.0]],
        vec![Geometry::Line, Geometry::Line],
        vec![
            SketchConstraint::Fixed { entity: 0, target: None },
            SketchConstraint::Coincident { entities: [0, 1] },
        ],
    )
    .unwrap();

    let (solved, report) = solver.solve().unwrap();

    assert!(report.cost < 1e-10, "cost: {}", report.cost);
    let expected = [0.0, 0.0, 1.0, 0.0];
    for (a, b) in solved[0].iter().zip(expected) {
        assert!((a - b).abs() < 1e-5, "fixed line moved: {:?}", solved[0]);
    }
    assert!((solved[1][0] - 1.0).abs() < 1e-4);
    assert!(solved[1][1].abs() < 1e-4);
}

#[test]
fn test_solver_tangent_line_into_arc() {
    // Arc is pinned; the line must end at its start point heading along its tangent
    let solver = SketchSolver::new(
        vec![vec![-2.0, 1.5, -0.2, 1.3], vec![0.0, 0.0, 1.0, 0.0, FRAC_PI_2]],
        vec![Geometry::Line, Geometry::Circle],
        vec![
            SketchConstraint::Fixed { entity: 1, target: None },
            SketchConstraint::Coincident { entities: [0, 1] },
            SketchConstraint::Angle { entities: [0, 1], value: 0.0 },
        ],
    )
    .unwrap();

    let (solved, report) = solver.solve().unwrap();
    assert!(report.cost < 1e-10, "cost: {}", report.cost);

    let line = &solved[0];
    assert!(line[2].abs() < 1e-4 && (line[3] - 1.0).abs() < 1e-4, "line: {:?}", line);
    assert!(line[0] < line[2]);
    assert!((line[1] - line[3]).abs() < 1e-4, "line: {:?}", line);
}

#[test]
fn test_solver_length_and_arc_angle() {
    let solver = SketchSolver::new(
        vec![vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 0.0, 1.0, 0.0, 1.0]],
        vec![Geometry::Line, Geometry::Circle],
        vec![
            SketchConstraint::Length { entity: 0, value: 3.0 },
            SketchConstraint::ArcAngle { entity: 1, value: FRAC_PI_2 },
            SketchConstraint::Radius { entity: 1, value: 2.0 },
        ],
    )
    .unwrap();

    let (solved, report) = solver.solve().unwrap();

    assert!(report.cost < 1e-10, "cost: {}", report.cost);
    let length = ((solved[0][2] - solved[0][0]).powi(2) + (solved[0][3] - solved[0][1]).powi(2)).sqrt();
    assert!((length - 3.0).abs() < 1e-5);
    assert!((solved[1][4].abs() - FRAC_PI_2).abs() < 1e-5);
    assert!((solved[1][2] - 2.0).abs() < 1e-5);
}

#[test]
fn test_solver_over_constrained_reports_residual() {
    // The same line cannot be both 1 and 2 long; the best compromise is 1.5
    let solver = SketchSolver::new(
        vec![vec![0.0, 0.0, 1.0, 0.0], vec![3.0, 0.0, 4.0, 0.0]],
        vec![Geometry::Line, Geometry::Line],
        vec![
            SketchConstraint::Length { entity: 0, value: 1.0 },
            SketchConstraint::Length { entity: 0, value: 2.0 },
            SketchConstraint::Distance {
                entities: [0, 1],
                params: [Some(1.0), Some(0.0)],
                value: 2.0,
            },
        ],
    )
    .unwrap();

    let (_, report) = solver.solve().unwrap();

    assert_ne!(report.status, SolveStatus::Success);
    assert_ne!(report.status, SolveStatus::ForcedStop);
    assert!((report.cost - 0.5).abs() < 1e-4, "cost: {}", report.cost);
    assert_eq!(report.residuals.len(), 3);
    assert!(report.residuals[2].abs() < 1e-3);
}

#[test]
fn test_solver_report_fields() {
    let entities = vec![vec![0.0, 0.0, 1.0, 0.0, FRAC_PI_2]];
    let solver = SketchSolver::new(
        entities.clone(),
        vec![Geometry::Circle],
        vec![SketchConstraint::Radius { entity: 0, value: 2.0 }],
    )
    .unwrap();

    let (solved, report) = solver.solve().unwrap();

    assert_eq!(report.initial_entities, entities);
    assert!(report.evaluations > 0);
    assert_eq!(report.residuals.len(), 1);
    assert_eq!(solved.len(), 1);
    assert_eq!(solved[0].len(), 5);

    let json = serde_json::to_string(&report).expect("Failed to serialize report");
    assert!(json.contains("initial_entities"));
}

#[test]
fn test_solver_without_constraints_returns_input() {
    let entities = vec![vec![0.0, 0.0, 1.0, 0.0]];
    let solver = SketchSolver::new(entities.clone(), vec![Geometry::Line], vec![]).unwrap();

    let (solved, report) = solver.solve().unwrap();

    assert_eq!(solved, entities);
    assert_eq!(report.cost, 0.0);
    assert_eq!(report.status, SolveStatus::Success);
}

#[test]
fn test_solver_iteration_cap() {
    let solver = SketchSolver::new(
        vec![vec![0.0, 0.0, 1.0, 0.0]],
        vec![Geometry::Line],
        vec![SketchConstraint::Orientation { entity: 0, direction: [0.0, 1.0] }],
    )
    .unwrap();
    let config = SolverConfig {
        max_iters: 1,
        ..SolverConfig::default()
    };

    let (_, report) = solver.solve_with(&config).unwrap();

    assert_eq!(report.status, SolveStatus::MaxIterationsReached);
    assert_eq!(report.iterations, Some(1));
}

#[test]
fn test_solver_rejects_invalid_config() {
    let solver = SketchSolver::new(vec![], vec![], vec![]).unwrap();
    let config = SolverConfig {
        history: 0,
        ..SolverConfig::default()
    };
    assert!(matches!(solver.solve_with(&config), Err(SketchError::Config(_))));
}

#[test]
fn test_solver_rejects_radius_on_line() {
    let result = SketchSolver::new(
        vec![vec![0.0, 0.0, 1.0, 0.0]],
        vec![Geometry::Line],
        vec![SketchConstraint::Radius { entity: 0, value: 1.0 }],
    );
    assert!(matches!(result, Err(SketchError::InvalidArguments { .. })));
}

#[test]
fn test_solver_stops_on_small_steps() {
    // Conflicting lengths never reach zero cost; with the gradient test off,
    // only the step-size tolerance can end the run early
    let solver = SketchSolver::new(
        vec![vec![0.0, 0.0, 1.0, 0.0]],
        vec![Geometry::Line],
        vec![
            SketchConstraint::Length { entity: 0, value: 1.0 },
            SketchConstraint::Length { entity: 0, value: 2.0 },
        ],
    )
    .unwrap();
    let config = SolverConfig {
        tol_grad: 0.0,
        xtol_rel: 1e-4,
        xtol_abs: 1e-6,
        ..SolverConfig::default()
    };

    let (solved, report) = solver.solve_with(&config).unwrap();

    assert_eq!(report.status, SolveStatus::ToleranceReached);
    assert!(report.iterations.is_some_and(|n| n < 100), "{:?}", report.iterations);
    assert!((report.cost - 0.5).abs() < 1e-4, "cost: {}", report.cost);
    let length = (solved[0][2] - solved[0][0]).hypot(solved[0][3] - solved[0][1]);
    assert!((length - 1.5).abs() < 1e-2);
}

#[test]
fn test_termination_reason_mapping() {
    assert_eq!(status_for(Some(&TerminationReason::TargetCostReached)), SolveStatus::Success);
    assert_eq!(
        status_for(Some(&TerminationReason::SolverConverged)),
        SolveStatus::ToleranceReached
    );
    assert_eq!(
        status_for(Some(&TerminationReason::MaxItersReached)),
        SolveStatus::MaxIterationsReached
    );
    let stalled = TerminationReason::SolverExit("Line search terminated with: 'no progress'".into());
    assert_eq!(status_for(Some(&stalled)), SolveStatus::RoundoffLimited);
    assert_eq!(status_for(Some(&TerminationReason::Interrupt)), SolveStatus::ForcedStop);
    assert_eq!(status_for(Some(&TerminationReason::Timeout)), SolveStatus::ForcedStop);
    assert_eq!(status_for(None), SolveStatus::ForcedStop);
}
