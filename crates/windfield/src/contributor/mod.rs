// Wind contributors: shapes that inject wind into the volume

pub mod params;
pub mod registry;

pub use params::{
    AxisCalculationParams, BoxWindParams, CylinderWindParams, FixedCalculationParams,
    PointCalculationParams, SphereWindParams,
};
pub use registry::{ContributorRegistry, ContributorSnapshot, Registration, RegistrationHandle};

use crate::error::WindFieldError;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Identity of a contributor as seen by its owner (an entity id, a scene node id, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContributorId(pub u64);

/// Volume in which a contributor injects wind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum ContributorShape {
    #[default]
    None,
    /// Oriented box, half extents in local space
    Box { half_extents: Vec3 },
    /// Sphere around the contributor origin, radius before scaling
    Sphere { radius: f32 },
    /// Cylinder along the local Y axis
    Cylinder { radius: f32, half_height: f32 },
}

impl ContributorShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ContributorShape::None => ShapeKind::None,
            ContributorShape::Box { .. } => ShapeKind::Box,
            ContributorShape::Sphere { .. } => ShapeKind::Sphere,
            ContributorShape::Cylinder { .. } => ShapeKind::Cylinder,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    None,
    Box,
    Sphere,
    Cylinder,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [
        ShapeKind::None,
        ShapeKind::Box,
        ShapeKind::Sphere,
        ShapeKind::Cylinder,
    ];

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

/// Whether a fixed wind velocity follows the contributor's rotation and scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VelocitySpace {
    #[default]
    Local,
    World,
}

/// How the wind velocity inside the shape is computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WindCalculation {
    /// Constant velocity everywhere inside the shape
    Fixed { velocity: Vec3, space: VelocitySpace },
    /// Radial wind pushing away from a point, decaying with distance
    Point {
        center_local: Vec3,
        max_speed: f32,
        decay: f32,
    },
    /// Rotation around an axis, decaying with distance from the axis
    AxisVortex {
        axis_point_local: Vec3,
        axis_direction_local: Vec3,
        decay: f32,
        multiplier: f32,
    },
}

impl WindCalculation {
    pub fn kind(&self) -> CalculationKind {
        match self {
            WindCalculation::Fixed { .. } => CalculationKind::Fixed,
            WindCalculation::Point { .. } => CalculationKind::Point,
            WindCalculation::AxisVortex { .. } => CalculationKind::AxisVortex,
        }
    }
}

impl Default for WindCalculation {
    fn default() -> Self {
        WindCalculation::Fixed {
            velocity: Vec3::X,
            space: VelocitySpace::Local,
        }
    }
}

/// Tag stored in shape records to select the calculation buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CalculationKind {
    Fixed = 0,
    Point = 1,
    AxisVortex = 2,
}

impl CalculationKind {
    pub const ALL: [CalculationKind; 3] = [
        CalculationKind::Fixed,
        CalculationKind::Point,
        CalculationKind::AxisVortex,
    ];

    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(CalculationKind::Fixed),
            1 => Some(CalculationKind::Point),
            2 => Some(CalculationKind::AxisVortex),
            _ => None,
        }
    }

    pub fn tag(self) -> u32 {
        self as u32
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

/// Placement of a contributor in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributorTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl ContributorTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn local_to_world(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn world_to_local(&self) -> Mat4 {
        self.local_to_world().inverse()
    }

    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.local_to_world().transform_point3(local)
    }

    /// Rotate and scale a vector (no translation)
    pub fn transform_vector(&self, local: Vec3) -> Vec3 {
        self.rotation * (local * self.scale)
    }

    /// Map a direction through scale and rotation, then renormalize it
    pub fn transform_direction(&self, local: Vec3) -> Vec3 {
        self.transform_vector(local).normalize_or_zero()
    }
}

impl Default for ContributorTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A declared source of wind influence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindContributor {
    pub id: ContributorId,
    pub shape: ContributorShape,
    pub calculation: WindCalculation,
    pub transform: ContributorTransform,
    /// Multiplies the velocity produced by the calculation
    pub intensity: f32,
    pub enabled: bool,
}

impl WindContributor {
    pub fn new(id: ContributorId, shape: ContributorShape, calculation: WindCalculation) -> Self {
        Self {
            id,
            shape,
            calculation,
            transform: ContributorTransform::IDENTITY,
            intensity: 1.0,
            enabled: true,
        }
    }

    pub fn with_transform(mut self, transform: ContributorTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Reject shape/calculation combinations the injection stage cannot evaluate
    pub fn validate(&self) -> Result<(), WindFieldError> {
        let t = &self.transform;
        if !t.translation.is_finite() || !t.rotation.is_finite() || !t.scale.is_finite() {
            return Err(WindFieldError::invalid_contributor(format!(
                "{:?}: transform is not finite",
                self.id
            )));
        }
        if t.scale.abs().min_element() <= 0.0 {
            return Err(WindFieldError::invalid_contributor(format!(
                "{:?}: transform scale must be non-zero on every axis",
                self.id
            )));
        }
        if !self.intensity.is_finite() {
            return Err(WindFieldError::invalid_contributor(format!(
                "{:?}: intensity is not finite",
                self.id
            )));
        }

        match self.shape {
            ContributorShape::None => {}
            ContributorShape::Box { half_extents } => {
                if !half_extents.is_finite() || half_extents.min_element() < 0.0 {
                    return Err(WindFieldError::invalid_contributor(format!(
                        "{:?}: box extents must be finite and non-negative, got {}",
                        self.id, half_extents
                    )));
                }
            }
            ContributorShape::Sphere { radius } => {
                if !radius.is_finite() || radius <= 0.0 {
                    return Err(WindFieldError::invalid_contributor(format!(
                        "{:?}: sphere radius must be positive, got {}",
                        self.id, radius
                    )));
                }
            }
            ContributorShape::Cylinder {
                radius,
                half_height,
            } => {
                if !radius.is_finite() || radius <= 0.0 || !half_height.is_finite() || half_height <= 0.0 {
                    return Err(WindFieldError::invalid_contributor(format!(
                        "{:?}: cylinder radius and half height must be positive, got {} / {}",
                        self.id, radius, half_height
                    )));
                }
            }
        }

        match self.calculation {
            WindCalculation::Fixed { velocity, .. } => {
                if !velocity.is_finite() {
                    return Err(WindFieldError::invalid_contributor(format!(
                        "{:?}: fixed velocity is not finite",
                        self.id
                    )));
                }
            }
            WindCalculation::Point {
                center_local,
                max_speed,
                decay,
            } => {
                if !center_local.is_finite() || !max_speed.is_finite() || !decay.is_finite() || decay < 0.0 {
                    return Err(WindFieldError::invalid_contributor(format!(
                        "{:?}: point wind needs finite centre/speed and non-negative decay",
                        self.id
                    )));
                }
            }
            WindCalculation::AxisVortex {
                axis_point_local,
                axis_direction_local,
                decay,
                multiplier,
            } => {
                if !axis_point_local.is_finite()
                    || !axis_direction_local.is_finite()
                    || !multiplier.is_finite()
                    || !decay.is_finite()
                    || decay < 0.0
                {
                    return Err(WindFieldError::invalid_contributor(format!(
                        "{:?}: axis vortex needs finite axis/multiplier and non-negative decay",
                        self.id
                    )));
                }
            }
        }

        // point and vortex wind are placed relative to the shape
        if self.shape.kind() == ShapeKind::None && self.calculation.kind() != CalculationKind::Fixed {
            return Err(WindFieldError::invalid_contributor(format!(
                "{:?}: {:?} calculation requires a shape",
                self.id,
                self.calculation.kind()
            )));
        }

        Ok(())
    }
}
