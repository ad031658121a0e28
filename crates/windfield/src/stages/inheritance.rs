use std::sync::atomic::Ordering;

use glam::{IVec3, Vec3};
use rayon::prelude::*;

use super::whole_voxel_steps;
use crate::grid::VoxelGrid3D;

/// Shifts the whole field by whole voxels when the volume moves, so the wind
/// stays put in world space. The sub-voxel remainder is carried to later frames.
#[derive(Debug, Default, Clone)]
pub struct InheritanceStage {
    residual: Vec3,
}

impl InheritanceStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn residual(&self) -> Vec3 {
        self.residual
    }

    pub fn reset(&mut self) {
        self.residual = Vec3::ZERO;
    }

    /// Returns the shift applied, in voxels
    pub fn run(&mut self, grid: &mut VoxelGrid3D, delta_center: Vec3) -> IVec3 {
        let (steps, residual) = whole_voxel_steps(delta_center + self.residual, grid.voxel_size());
        self.residual = residual;

        let shift = steps.as_ivec3();
        if shift == IVec3::ZERO {
            return shift;
        }

        let res = grid.resolution();
        grid.swap();
        let (previous, current) = grid.split_mut();
        for (dst, src) in current.channels_mut().into_iter().zip(previous.channels()) {
            dst.par_iter_mut().enumerate().for_each(|(index, out)| {
                let source = res.coords(index) + shift;
                *out.get_mut() = if res.contains(source) {
                    src[res.index_of(source)].load(Ordering::Relaxed)
                } else {
                    0
                };
            });
        }
        shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridResolution;

    #[test]
    fn test_shift_keeps_field_in_world_space() {
        let mut grid = VoxelGrid3D::try_new(GridResolution::new(4, 1, 1), 1.0).unwrap();
        let res = grid.resolution();
        grid.current().add(res.index(2, 0, 0), [100, 0, 0]);

        let mut stage = InheritanceStage::new();
        let shift = stage.run(&mut grid, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(shift, IVec3::X);
        // the volume moved +1 so the same world point is one voxel lower
        assert_eq!(grid.current().load(res.index(1, 0, 0)), [100, 0, 0]);
        assert_eq!(grid.current().load(res.index(2, 0, 0)), [0, 0, 0]);
        // the voxel entering at the far edge starts empty
        assert_eq!(grid.current().load(res.index(3, 0, 0)), [0, 0, 0]);
    }

    #[test]
    fn test_fractional_moves_accumulate() {
        let mut grid = VoxelGrid3D::try_new(GridResolution::new(4, 1, 1), 1.0).unwrap();
        let mut stage = InheritanceStage::new();

        assert_eq!(stage.run(&mut grid, Vec3::new(0.3, 0.0, 0.0)), IVec3::ZERO);
        assert_eq!(stage.run(&mut grid, Vec3::new(0.3, 0.0, 0.0)), IVec3::X);
        assert!((stage.residual().x - -0.4).abs() < 1e-5);
    }
}
