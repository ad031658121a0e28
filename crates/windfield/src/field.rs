use glam::{IVec3, Vec3};
use half::f16;

use crate::grid::GridResolution;

/// Read-only wind field of the last completed frame.
///
/// Voxels are `[x, y, z, speed]` in half precision, laid out x fastest, then y, then z.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedField {
    resolution: GridResolution,
    voxel_size: f32,
    center: Vec3,
    voxels: Vec<[f16; 4]>,
}

impl ExportedField {
    pub fn new(resolution: GridResolution, voxel_size: f32, center: Vec3, voxels: Vec<[f16; 4]>) -> Self {
        debug_assert_eq!(voxels.len(), resolution.voxel_count());
        Self {
            resolution,
            voxel_size,
            center,
            voxels,
        }
    }

    /// A field with every voxel at zero
    pub fn zeroed(resolution: GridResolution, voxel_size: f32, center: Vec3) -> Self {
        Self::new(
            resolution,
            voxel_size,
            center,
            vec![[f16::ZERO; 4]; resolution.voxel_count()],
        )
    }

    pub fn resolution(&self) -> GridResolution {
        self.resolution
    }

    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// World-space size of the whole volume
    pub fn extent(&self) -> Vec3 {
        self.resolution.as_uvec3().as_vec3() * self.voxel_size
    }

    pub fn voxels(&self) -> &[[f16; 4]] {
        &self.voxels
    }

    pub fn voxel(&self, x: u32, y: u32, z: u32) -> Vec3 {
        self.at(IVec3::new(x as i32, y as i32, z as i32))
    }

    fn at(&self, coords: IVec3) -> Vec3 {
        let coords = self.resolution.clamp(coords);
        let [x, y, z, _] = self.voxels[self.resolution.index_of(coords)];
        Vec3::new(x.to_f32(), y.to_f32(), z.to_f32())
    }

    /// Trilinear sample, clamped to the edge voxels outside the volume
    pub fn sample(&self, position: Vec3) -> Vec3 {
        let coords = self
            .resolution
            .continuous_coords(position - self.center, self.voxel_size)
            .clamp(Vec3::ZERO, self.resolution.max_coords().as_vec3());
        let base = coords.floor();
        let f = coords - base;
        let b = base.as_ivec3();

        let c00 = self.at(b).lerp(self.at(b + IVec3::X), f.x);
        let c10 = self.at(b + IVec3::Y).lerp(self.at(b + IVec3::new(1, 1, 0)), f.x);
        let c01 = self.at(b + IVec3::Z).lerp(self.at(b + IVec3::new(1, 0, 1)), f.x);
        let c11 = self.at(b + IVec3::new(0, 1, 1)).lerp(self.at(b + IVec3::ONE), f.x);

        let c0 = c00.lerp(c10, f.y);
        let c1 = c01.lerp(c11, f.y);
        c0.lerp(c1, f.z)
    }

    /// Raw voxel bytes in `Rgba16Float` layout
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.voxels)
    }
}
