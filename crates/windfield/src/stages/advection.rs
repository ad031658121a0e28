use std::sync::atomic::{AtomicBool, Ordering};

use glam::{IVec3, Vec3};
use rayon::prelude::*;

use super::{whole_voxel_steps, FrameState};
use crate::config::AdvectionConfig;
use crate::fixed_point;
use crate::grid::{AccumulationBuffer, BufferCopy, GridResolution, VoxelGrid3D};

/// Splat weights below this do not mark a voxel as reached
const MIN_WEIGHT: f32 = 1e-6;

/// Transport the field along itself and undo volume movement.
///
/// Volume movement is applied in whole voxels; the remainder is carried to
/// later frames so slow drifts still add up.
#[derive(Debug, Default, Clone)]
pub struct AdvectionStage {
    residual: Vec3,
}

impl AdvectionStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn residual(&self) -> Vec3 {
        self.residual
    }

    pub fn reset(&mut self) {
        self.residual = Vec3::ZERO;
    }

    pub fn run(&mut self, grid: &mut VoxelGrid3D, settings: &AdvectionConfig, frame: &FrameState) {
        let (steps, residual) = whole_voxel_steps(frame.recenter + self.residual, grid.voxel_size());
        self.residual = residual;
        let transport = Transport {
            resolution: grid.resolution(),
            scale: settings.intensity * frame.delta_time / grid.voxel_size(),
            threshold: settings.propagation_threshold,
            steps,
        };
        advect(grid, &transport, 1.0 - settings.attenuation);
    }
}

/// The forward pass splats every voxel trilinearly around `position + offset`,
/// scaled by `keep`. Voxels that received nothing are then filled by a
/// trilinear gather around `position - offset`. The destination copy starts from zero.
fn advect(grid: &mut VoxelGrid3D, transport: &Transport, keep: f32) {
    let res = grid.resolution();
    grid.swap();
    grid.clear(BufferCopy::Current);
    let (previous, current) = grid.split_mut();
    let current: &AccumulationBuffer = current;

    let covered: Vec<AtomicBool> = (0..res.voxel_count()).map(|_| AtomicBool::new(false)).collect();

    (0..res.voxel_count()).into_par_iter().for_each(|index| {
        let raw = previous.load(index);
        if raw == [0, 0, 0] {
            return;
        }
        let target = res.coords(index).as_vec3() + transport.offset(fixed_point::decode_vec3(raw));
        for (corner, weight) in trilinear(target) {
            // deposits leaving the volume are lost
            if weight < MIN_WEIGHT || !res.contains(corner) {
                continue;
            }
            let corner = res.index_of(corner);
            let factor = keep * weight;
            current.add(corner, raw.map(|v| fixed_point::scale(v, factor)));
            covered[corner].store(true, Ordering::Relaxed);
        }
    });

    (0..res.voxel_count()).into_par_iter().for_each(|index| {
        if covered[index].load(Ordering::Relaxed) {
            return;
        }
        let velocity = previous.load_vec3(index);
        let source = (res.coords(index).as_vec3() - transport.offset(velocity))
            .clamp(Vec3::ZERO, res.max_coords().as_vec3());
        let mut gathered = [0i32; 3];
        for (corner, weight) in trilinear(source) {
            if weight < MIN_WEIGHT {
                continue;
            }
            let raw = previous.load(res.index_of(res.clamp(corner)));
            let factor = keep * weight;
            for (sum, v) in gathered.iter_mut().zip(raw) {
                *sum = sum.wrapping_add(fixed_point::scale(v, factor));
            }
        }
        current.add(index, gathered);
    });
}

/// The eight voxels around a continuous coordinate with their trilinear weights
fn trilinear(coords: Vec3) -> [(IVec3, f32); 8] {
    let base = coords.floor();
    let f = coords - base;
    let b = base.as_ivec3();
    let mut out = [(IVec3::ZERO, 0.0); 8];
    for (i, slot) in out.iter_mut().enumerate() {
        let corner = IVec3::new((i & 1) as i32, ((i >> 1) & 1) as i32, ((i >> 2) & 1) as i32);
        let w = Vec3::select(corner.cmpeq(IVec3::ZERO), Vec3::ONE - f, f);
        *slot = (b + corner, w.x * w.y * w.z);
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct Transport {
    resolution: GridResolution,
    /// Voxels travelled per unit of velocity this frame
    scale: f32,
    /// Slower voxels are not carried by their own velocity
    threshold: f32,
    /// Whole voxels the volume moved this frame
    steps: Vec3,
}

impl Transport {
    fn offset(&self, velocity: Vec3) -> Vec3 {
        let motion = if velocity.length() < self.threshold {
            Vec3::ZERO
        } else {
            velocity * self.scale
        };
        // keep far jumps finite
        let bound = self.resolution.as_uvec3().as_vec3() * 2.0;
        (motion - self.steps).clamp(-bound, bound)
    }
}
