// Flat parameter records produced by the registry snapshot.
// Layouts are 16-byte aligned rows so the buffers can be uploaded as-is.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::CalculationKind;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BoxWindParams {
    pub calculation_type: u32,
    pub calculation_index: u32,
    pub _pad: [u32; 2],
    /// Half extents in local space, w unused
    pub extents: [f32; 4],
    pub world_to_local: [[f32; 4]; 4],
}

impl BoxWindParams {
    pub fn new(kind: CalculationKind, index: u32, half_extents: Vec3, world_to_local: Mat4) -> Self {
        Self {
            calculation_type: kind.tag(),
            calculation_index: index,
            _pad: [0; 2],
            extents: half_extents.extend(0.0).to_array(),
            world_to_local: world_to_local.to_cols_array_2d(),
        }
    }

    pub fn half_extents(&self) -> Vec3 {
        Vec3::from_slice(&self.extents[..3])
    }

    pub fn world_to_local(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.world_to_local)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SphereWindParams {
    pub calculation_type: u32,
    pub calculation_index: u32,
    pub radius_squared: f32,
    pub _pad: u32,
    /// World centre, w unused
    pub center: [f32; 4],
}

impl SphereWindParams {
    pub fn new(kind: CalculationKind, index: u32, center: Vec3, radius: f32) -> Self {
        Self {
            calculation_type: kind.tag(),
            calculation_index: index,
            radius_squared: radius * radius,
            _pad: 0,
            center: center.extend(0.0).to_array(),
        }
    }

    pub fn center(&self) -> Vec3 {
        Vec3::from_slice(&self.center[..3])
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CylinderWindParams {
    pub calculation_type: u32,
    pub calculation_index: u32,
    pub radius_squared: f32,
    pub half_height: f32,
    pub world_to_local: [[f32; 4]; 4],
}

impl CylinderWindParams {
    pub fn new(
        kind: CalculationKind,
        index: u32,
        radius: f32,
        half_height: f32,
        world_to_local: Mat4,
    ) -> Self {
        Self {
            calculation_type: kind.tag(),
            calculation_index: index,
            radius_squared: radius * radius,
            half_height,
            world_to_local: world_to_local.to_cols_array_2d(),
        }
    }

    pub fn world_to_local(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.world_to_local)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FixedCalculationParams {
    /// World-space velocity with intensity applied, w unused
    pub velocity: [f32; 4],
}

impl FixedCalculationParams {
    pub fn new(velocity: Vec3) -> Self {
        Self {
            velocity: velocity.extend(0.0).to_array(),
        }
    }

    pub fn velocity(&self) -> Vec3 {
        Vec3::from_slice(&self.velocity[..3])
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointCalculationParams {
    /// World centre in xyz, max speed (with intensity applied) in w
    pub center_and_max_speed: [f32; 4],
    pub decay: f32,
    pub _pad: [f32; 3],
}

impl PointCalculationParams {
    pub fn new(center: Vec3, max_speed: f32, decay: f32) -> Self {
        Self {
            center_and_max_speed: center.extend(max_speed).to_array(),
            decay,
            _pad: [0.0; 3],
        }
    }

    pub fn center(&self) -> Vec3 {
        Vec3::from_slice(&self.center_and_max_speed[..3])
    }

    pub fn max_speed(&self) -> f32 {
        self.center_and_max_speed[3]
    }

    /// Radial wind away from the centre
    pub fn velocity_at(&self, position: Vec3) -> Vec3 {
        let offset = position - self.center();
        let distance = offset.length();
        offset.normalize_or_zero() * self.max_speed() * (-self.decay * distance).exp()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct AxisCalculationParams {
    /// World axis point in xyz, decay in w
    pub point_and_decay: [f32; 4],
    /// Normalized world axis in xyz, multiplier (with intensity applied) in w
    pub direction_and_multiplier: [f32; 4],
}

impl AxisCalculationParams {
    pub fn new(axis_point: Vec3, axis_direction: Vec3, decay: f32, multiplier: f32) -> Self {
        Self {
            point_and_decay: axis_point.extend(decay).to_array(),
            direction_and_multiplier: axis_direction.normalize_or_zero().extend(multiplier).to_array(),
        }
    }

    pub fn axis_point(&self) -> Vec3 {
        Vec3::from_slice(&self.point_and_decay[..3])
    }

    pub fn axis_direction(&self) -> Vec3 {
        Vec3::from_slice(&self.direction_and_multiplier[..3])
    }

    pub fn decay(&self) -> f32 {
        self.point_and_decay[3]
    }

    pub fn multiplier(&self) -> f32 {
        self.direction_and_multiplier[3]
    }

    /// Tangential wind around the axis
    pub fn velocity_at(&self, position: Vec3) -> Vec3 {
        let axis = self.axis_direction().normalize_or_zero();
        if axis == Vec3::ZERO {
            return Vec3::ZERO;
        }
        let relative = position - self.axis_point();
        let radial = relative - axis * relative.dot(axis);
        let multiplier = self.multiplier();
        radial.normalize_or_zero().cross(axis)
            * multiplier.signum()
            * multiplier.abs()
            * (-self.decay() * radial.length()).exp()
    }
}
