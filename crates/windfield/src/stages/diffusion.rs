use std::sync::atomic::Ordering;

use glam::IVec3;
use rayon::prelude::*;

use crate::config::DiffusionConfig;
use crate::grid::VoxelGrid3D;

const AXES: [IVec3; 3] = [IVec3::X, IVec3::Y, IVec3::Z];

/// Blur the field along x, y and z, `iterations` times.
///
/// Skipped when disabled, with zero iterations or with zero intensity.
pub fn run(grid: &mut VoxelGrid3D, settings: &DiffusionConfig) {
    if !settings.enabled || settings.iterations == 0 || settings.intensity == 0.0 {
        return;
    }
    for _ in 0..settings.iterations {
        for axis in AXES {
            pass(grid, axis, settings.intensity);
        }
    }
}

/// One blur pass along `axis`. Edge voxels use themselves as the missing neighbour.
fn pass(grid: &mut VoxelGrid3D, axis: IVec3, intensity: f32) {
    let res = grid.resolution();
    let k = intensity as f64;
    grid.swap();
    let (previous, current) = grid.split_mut();

    for (dst, src) in current.channels_mut().into_iter().zip(previous.channels()) {
        dst.par_iter_mut().enumerate().for_each(|(index, out)| {
            let coords = res.coords(index);
            let left = src[res.index_of(res.clamp(coords - axis))].load(Ordering::Relaxed) as f64;
            let right = src[res.index_of(res.clamp(coords + axis))].load(Ordering::Relaxed) as f64;
            let center = src[index].load(Ordering::Relaxed) as f64;
            let blended = center + k * ((left + right) * 0.5 - center);
            *out.get_mut() = blended.round() as i32;
        });
    }
}
