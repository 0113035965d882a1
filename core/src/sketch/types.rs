use super::{SketchError, SketchResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Degrees of freedom of one entity.
///
/// LINE: `(p1x, p1y, p2x, p2y)`. CIRCLE (an arc): `(cx, cy, r, a0, da)`, where the
/// sign of `da` gives the sweep direction.
pub type Dof = Vec<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Geometry {
    Line,
    /// Circular arc.
    Circle,
}

impl Geometry {
    /// Number of DOF an entity of this geometry carries.
    pub fn dof_len(&self) -> usize {
        match self {
            Self::Line => 4,
            Self::Circle => 5,
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line => write!(f, "LINE"),
            Self::Circle => write!(f, "CIRCLE"),
        }
    }
}

/// The constraint catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    Fixed,
    Coincident,
    Angle,
    Length,
    Distance,
    Radius,
    Orientation,
    ArcAngle,
}

const BOTH: &[Geometry] = &[Geometry::Line, Geometry::Circle];

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 8] = [
        Self::Fixed,
        Self::Coincident,
        Self::Angle,
        Self::Length,
        Self::Distance,
        Self::Radius,
        Self::Orientation,
        Self::ArcAngle,
    ];

    /// Number of entities a constraint of this kind references.
    pub fn arity(&self) -> usize {
        match self {
            Self::Coincident | Self::Angle | Self::Distance => 2,
            Self::Fixed | Self::Length | Self::Radius | Self::Orientation | Self::ArcAngle => 1,
        }
    }

    /// Geometry tags every referenced entity must carry.
    pub fn allowed_geometries(&self) -> &'static [Geometry] {
        match self {
            Self::Fixed | Self::Coincident | Self::Angle | Self::Length | Self::Distance => BOTH,
            Self::Radius | Self::ArcAngle => &[Geometry::Circle],
            Self::Orientation => &[Geometry::Line],
        }
    }

    pub fn allows(&self, geometry: Geometry) -> bool {
        self.allowed_geometries().contains(&geometry)
    }

    /// Human-readable description of the value this kind carries.
    pub fn value_contract(&self) -> &'static str {
        match self {
            Self::Fixed => "no value or a target DOF vector",
            Self::Coincident => "no value",
            Self::Angle | Self::Length | Self::Radius | Self::ArcAngle => "a scalar value",
            Self::Distance => "a (param1, param2, distance) triple",
            Self::Orientation => "a 2D direction",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Untyped value slot of a `((e1, e2), kind, value)` constraint tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintValue {
    None,
    Scalar(f64),
    Direction([f64; 2]),
    /// Arc/line parameters selecting a point on each entity, then the distance.
    Distance(Option<f64>, Option<f64>, f64),
    Target(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SketchConstraint {
    /// Pin every DOF of an entity. Without a target, the entity stays at its initial DOF.
    Fixed {
        entity: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<Vec<f64>>,
    },
    /// End of the first entity meets the start of the second.
    Coincident { entities: [usize; 2] },
    /// Angle from the start direction of the second entity to the end direction of the first (radians).
    Angle { entities: [usize; 2], value: f64 },
    Length { entity: usize, value: f64 },
    /// Distance between the points at `params` on each entity. `None` selects the start point.
    Distance {
        entities: [usize; 2],
        params: [Option<f64>; 2],
        value: f64,
    },
    Radius { entity: usize, value: f64 },
    /// Line direction matches `direction`.
    Orientation { entity: usize, direction: [f64; 2] },
    /// Absolute angular span of an arc (radians).
    ArcAngle { entity: usize, value: f64 },
}

impl SketchConstraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Self::Fixed { .. } => ConstraintKind::Fixed,
            Self::Coincident { .. } => ConstraintKind::Coincident,
            Self::Angle { .. } => ConstraintKind::Angle,
            Self::Length { .. } => ConstraintKind::Length,
            Self::Distance { .. } => ConstraintKind::Distance,
            Self::Radius { .. } => ConstraintKind::Radius,
            Self::Orientation { .. } => ConstraintKind::Orientation,
            Self::ArcAngle { .. } => ConstraintKind::ArcAngle,
        }
    }

    /// Referenced entity indices; the second is `None` for unary kinds.
    pub fn entities(&self) -> (usize, Option<usize>) {
        match *self {
            Self::Coincident { entities }
            | Self::Angle { entities, .. }
            | Self::Distance { entities, .. } => (entities[0], Some(entities[1])),
            Self::Fixed { entity, .. }
            | Self::Length { entity, .. }
            | Self::Radius { entity, .. }
            | Self::Orientation { entity, .. }
            | Self::ArcAngle { entity, .. } => (entity, None),
        }
    }

    /// The constraint's value in tuple form.
    pub fn value(&self) -> ConstraintValue {
        match self {
            Self::Fixed { target: None, .. } | Self::Coincident { .. } => ConstraintValue::None,
            Self::Fixed { target: Some(t), .. } => ConstraintValue::Target(t.clone()),
            Self::Angle { value, .. }
            | Self::Length { value, .. }
            | Self::Radius { value, .. }
            | Self::ArcAngle { value, .. } => ConstraintValue::Scalar(*value),
            Self::Distance { params, value, .. } => {
                ConstraintValue::Distance(params[0], params[1], *value)
            }
            Self::Orientation { direction, .. } => ConstraintValue::Direction(*direction),
        }
    }

    /// Build a typed constraint from the `((e1, e2), kind, value)` tuple form,
    /// checking arity and value type against the catalog.
    pub fn from_parts(
        entities: (usize, Option<usize>),
        kind: ConstraintKind,
        value: ConstraintValue,
    ) -> SketchResult<Self> {
        let actual = 1 + usize::from(entities.1.is_some());
        let expected = kind.arity();
        let pair = match (entities, expected) {
            ((e1, Some(e2)), 2) => [e1, e2],
            ((_, None), 1) => [entities.0, entities.0],
            _ => return Err(SketchError::ArityMismatch { kind, expected, actual }),
        };
        let entity = entities.0;

        let mismatch = || SketchError::ValueMismatch {
            kind,
            expected: kind.value_contract(),
        };

        let constraint = match (kind, value) {
            (ConstraintKind::Fixed, ConstraintValue::None) => Self::Fixed { entity, target: None },
            (ConstraintKind::Fixed, ConstraintValue::Target(t)) => Self::Fixed {
                entity,
                target: Some(t),
            },
            (ConstraintKind::Coincident, ConstraintValue::None) => {
                Self::Coincident { entities: pair }
            }
            (ConstraintKind::Angle, ConstraintValue::Scalar(value)) => {
                Self::Angle { entities: pair, value }
            }
            (ConstraintKind::Length, ConstraintValue::Scalar(value)) => {
                Self::Length { entity, value }
            }
            (ConstraintKind::Distance, ConstraintValue::Distance(p1, p2, value)) => {
                Self::Distance {
                    entities: pair,
                    params: [p1, p2],
                    value,
                }
            }
            (ConstraintKind::Radius, ConstraintValue::Scalar(value)) => {
                Self::Radius { entity, value }
            }
            (ConstraintKind::Orientation, ConstraintValue::Direction(direction)) => {
                Self::Orientation { entity, direction }
            }
            (ConstraintKind::ArcAngle, ConstraintValue::Scalar(value)) => {
                Self::ArcAngle { entity, value }
            }
            _ => return Err(mismatch()),
        };

        Ok(constraint)
    }
}
