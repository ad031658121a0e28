use glam::Vec3;
use half::f16;
use rayon::prelude::*;

use super::FrameState;
use crate::field::ExportedField;
use crate::grid::VoxelGrid3D;
use crate::noise::WindNoise;

/// Decode the current copy and add ambient and noise wind
pub fn run(grid: &VoxelGrid3D, frame: &FrameState, ambient: Vec3, noise: &WindNoise) -> ExportedField {
    let current = grid.current();
    let noisy = noise.is_active();
    let voxels = (0..grid.len())
        .into_par_iter()
        .map(|index| {
            let mut wind = current.load_vec3(index) + ambient;
            if noisy {
                wind += noise.sample(grid.world_position(index, frame.center), frame.elapsed);
            }
            [
                f16::from_f32(wind.x),
                f16::from_f32(wind.y),
                f16::from_f32(wind.z),
                f16::from_f32(wind.length()),
            ]
        })
        .collect();
    ExportedField::new(grid.resolution(), grid.voxel_size(), frame.center, voxels)
}
