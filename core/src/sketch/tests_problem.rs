use crate::sketch::problem::{Bounds, IndexMap, Problem};
use crate::sketch::types::{Geometry, SketchConstraint};
use crate::sketch::SketchError;

fn line_and_arc() -> (Vec<Vec<f64>>, Vec<Geometry>) {
    (
        vec![
            vec![0.0, 0.0, 1.0, 0.0],
            vec![1.0, 1.0, 2.0, 0.5, 1.5],
            vec![3.0, 3.0, 4.0, 4.0],
        ],
        vec![Geometry::Line, Geometry::Circle, Geometry::Line],
    )
}

#[test]
fn test_index_map_offsets() {
    let (entities, _) = line_and_arc();
    let index = IndexMap::from_entities(&entities);

    assert_eq!(index.offsets(), &[0, 4, 9, 13]);
    assert_eq!(index.len(), 3);
    assert_eq!(index.total(), 13);
    assert_eq!(index.range(1), 4..9);
    assert!(!index.is_empty());
    assert!(IndexMap::from_entities(&[]).is_empty());
}

#[test]
fn test_flatten_split_round_trip() {
    let (entities, geometries) = line_and_arc();
    let problem = Problem::assemble(&entities, &geometries, &[]).unwrap();

    assert_eq!(problem.x0.len(), 13);
    assert_eq!(problem.index.slice(&problem.x0, 1), entities[1].as_slice());
    assert_eq!(problem.index.split(&problem.x0), entities);
}

#[test]
fn test_bounds_only_pin_radius() {
    let (entities, geometries) = line_and_arc();
    let problem = Problem::assemble(&entities, &geometries, &[]).unwrap();
    let bounds = &problem.bounds;

    for (i, lower) in bounds.lower.iter().enumerate() {
        if i == 4 + 2 {
            assert_eq!(*lower, 0.0);
        } else {
            assert_eq!(*lower, f64::NEG_INFINITY);
        }
    }
    assert!(bounds.upper.iter().all(|u| *u == f64::INFINITY));
}

#[test]
fn test_bounds_projection() {
    let index = IndexMap::from_lengths([5]);
    let bounds = Bounds::for_geometries(&index, &[Geometry::Circle]);

    let x = [1.0, -2.0, -0.5, -3.0, -4.0];
    assert!(!bounds.contains(&x));

    let projected = bounds.project(&x);
    assert_eq!(projected, vec![1.0, -2.0, 0.0, -3.0, -4.0]);
    assert!(bounds.contains(&projected));
}

#[test]
fn test_fixed_target_defaults_to_initial_dof() {
    let (entities, geometries) = line_and_arc();
    let constraints = vec![SketchConstraint::Fixed { entity: 1, target: None }];
    let problem = Problem::assemble(&entities, &geometries, &constraints).unwrap();

    assert_eq!(
        problem.constraints[0],
        SketchConstraint::Fixed {
            entity: 1,
            target: Some(entities[1].clone())
        }
    );
}

#[test]
fn test_geometry_count_mismatch() {
    let (entities, _) = line_and_arc();
    let result = Problem::assemble(&entities, &[Geometry::Line], &[]);
    assert_eq!(
        result,
        Err(SketchError::GeometryCountMismatch { entities: 3, geometries: 1 })
    );
}

#[test]
fn test_dof_mismatch() {
    let entities = vec![vec![0.0, 0.0, 1.0, 0.0]];
    let result = Problem::assemble(&entities, &[Geometry::Circle], &[]);
    assert_eq!(
        result,
        Err(SketchError::DofMismatch {
            entity: 0,
            geometry: Geometry::Circle,
            expected: 5,
            actual: 4
        })
    );
}

#[test]
fn test_entity_out_of_range() {
    let (entities, geometries) = line_and_arc();
    let constraints = vec![
        SketchConstraint::Length { entity: 0, value: 1.0 },
        SketchConstraint::Coincident { entities: [2, 7] },
    ];
    let result = Problem::assemble(&entities, &geometries, &constraints);
    assert_eq!(
        result,
        Err(SketchError::EntityOutOfRange { constraint: 1, entity: 7, count: 3 })
    );
}

#[test]
fn test_radius_on_line_is_invalid() {
    let (entities, geometries) = line_and_arc();
    let constraints = vec![SketchConstraint::Radius { entity: 0, value: 1.0 }];
    match Problem::assemble(&entities, &geometries, &constraints) {
        Err(SketchError::InvalidArguments { geometries, .. }) => {
            assert_eq!(geometries, vec![Geometry::Line]);
        }
        other => panic!("expected invalid arguments, got {:?}", other),
    }
}

#[test]
fn test_fixed_target_length_mismatch() {
    let (entities, geometries) = line_and_arc();
    let constraints = vec![SketchConstraint::Fixed {
        entity: 0,
        target: Some(vec![0.0; 5]),
    }];
    assert_eq!(
        Problem::assemble(&entities, &geometries, &constraints),
        Err(SketchError::FixedTargetMismatch { entity: 0, expected: 4, actual: 5 })
    );
}

#[test]
fn test_mask_gradient_on_radius_bound() {
    let index = IndexMap::from_lengths([5]);
    let bounds = Bounds::for_geometries(&index, &[Geometry::Circle]);

    // Outside the bound the clamped objective is flat
    let mut grad = vec![1.0, -1.0, -3.0, 2.0, 2.0];
    bounds.mask_gradient(&[0.0, 0.0, -0.5, 0.0, 0.0], &mut grad);
    assert_eq!(grad, vec![1.0, -1.0, 0.0, 2.0, 2.0]);

    // On the bound, only an outward descent is blocked
    let mut outward = vec![0.0, 0.0, 4.0, 0.0, 0.0];
    bounds.mask_gradient(&[0.0, 0.0, 0.0, 0.0, 0.0], &mut outward);
    assert_eq!(outward[2], 0.0);

    let mut inward = vec![0.0, 0.0, -4.0, 0.0, 0.0];
    bounds.mask_gradient(&[0.0, 0.0, 0.0, 0.0, 0.0], &mut inward);
    assert_eq!(inward[2], -4.0);
}
