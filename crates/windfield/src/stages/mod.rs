// Per-frame pipeline: inheritance -> advection -> injection -> diffusion -> export

pub mod advection;
pub mod diffusion;
pub mod export;
pub mod inheritance;
pub mod injection;

pub use advection::AdvectionStage;
pub use inheritance::InheritanceStage;

use glam::Vec3;

/// Transient scalars for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    /// Volume centre for this frame
    pub center: Vec3,
    /// How far the centre moved since the last simulated frame
    pub delta_center: Vec3,
    pub delta_time: f32,
    /// Simulated time, drives the noise scroll
    pub elapsed: f32,
    /// Displacement advection must undo to keep the field fixed in world space.
    /// Zero when the inheritance stage already shifts the field.
    pub recenter: Vec3,
}

impl FrameState {
    pub fn new(center: Vec3, delta_center: Vec3, delta_time: f32, elapsed: f32) -> Self {
        Self {
            center,
            delta_center,
            delta_time,
            elapsed,
            recenter: delta_center,
        }
    }
}

/// Split a movement plus the carried remainder into whole voxel steps and a new remainder
pub(crate) fn whole_voxel_steps(moved: Vec3, voxel_size: f32) -> (Vec3, Vec3) {
    let steps = (moved / voxel_size).round();
    (steps, moved - steps * voxel_size)
}
