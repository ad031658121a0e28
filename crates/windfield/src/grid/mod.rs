// Voxel storage for the wind volume

pub mod double_buffer;

pub use double_buffer::{BufferCopy, DoubleBuffer};

use crate::error::WindFieldError;
use crate::fixed_point;
use glam::{IVec3, UVec3, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// Number of voxels along each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridResolution {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridResolution {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    pub fn voxel_count(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    pub fn as_uvec3(&self) -> UVec3 {
        UVec3::new(self.x, self.y, self.z)
    }

    pub fn as_ivec3(&self) -> IVec3 {
        self.as_uvec3().as_ivec3()
    }

    /// Largest valid voxel coordinate on each axis
    pub fn max_coords(&self) -> IVec3 {
        self.as_ivec3() - IVec3::ONE
    }

    /// Linear index, x varies fastest, then y, then z
    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        x as usize + self.x as usize * (y as usize + self.y as usize * z as usize)
    }

    pub fn index_of(&self, coords: IVec3) -> usize {
        self.index(coords.x as u32, coords.y as u32, coords.z as u32)
    }

    pub fn coords(&self, index: usize) -> IVec3 {
        let x = index % self.x as usize;
        let y = (index / self.x as usize) % self.y as usize;
        let z = index / (self.x as usize * self.y as usize);
        IVec3::new(x as i32, y as i32, z as i32)
    }

    pub fn contains(&self, coords: IVec3) -> bool {
        coords.cmpge(IVec3::ZERO).all() && coords.cmplt(self.as_ivec3()).all()
    }

    pub fn clamp(&self, coords: IVec3) -> IVec3 {
        coords.clamp(IVec3::ZERO, self.max_coords())
    }

    /// Offset of a voxel centre from the volume centre, in voxels
    pub fn centered_offset(&self, coords: IVec3) -> Vec3 {
        coords.as_vec3() - self.max_coords().as_vec3() * 0.5
    }

    /// Continuous voxel coordinates of a point expressed relative to the volume centre
    pub fn continuous_coords(&self, offset_from_center: Vec3, voxel_size: f32) -> Vec3 {
        offset_from_center / voxel_size + self.max_coords().as_vec3() * 0.5
    }
}

impl Default for GridResolution {
    fn default() -> Self {
        let [x, y, z] = crate::constants::DEFAULT_RESOLUTION;
        Self { x, y, z }
    }
}

impl fmt::Display for GridResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// Three integer accumulation channels, one per wind component.
///
/// Channels are atomics so that several writers can add into the same voxel
/// without ordering the writes.
#[derive(Debug)]
pub struct AccumulationBuffer {
    pub x: Vec<AtomicI32>,
    pub y: Vec<AtomicI32>,
    pub z: Vec<AtomicI32>,
}

impl AccumulationBuffer {
    pub fn try_new(len: usize, label: &str) -> Result<Self, WindFieldError> {
        Ok(Self {
            x: alloc_channel(len, &format!("{label}.x"))?,
            y: alloc_channel(len, &format!("{label}.y"))?,
            z: alloc_channel(len, &format!("{label}.z"))?,
        })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn load(&self, index: usize) -> [i32; 3] {
        [
            self.x[index].load(Ordering::Relaxed),
            self.y[index].load(Ordering::Relaxed),
            self.z[index].load(Ordering::Relaxed),
        ]
    }

    pub fn load_vec3(&self, index: usize) -> Vec3 {
        fixed_point::decode_vec3(self.load(index))
    }

    /// Atomically add an encoded vector. Overflow wraps.
    pub fn add(&self, index: usize, value: [i32; 3]) {
        if value[0] != 0 {
            self.x[index].fetch_add(value[0], Ordering::Relaxed);
        }
        if value[1] != 0 {
            self.y[index].fetch_add(value[1], Ordering::Relaxed);
        }
        if value[2] != 0 {
            self.z[index].fetch_add(value[2], Ordering::Relaxed);
        }
    }

    pub fn store(&mut self, index: usize, value: [i32; 3]) {
        *self.x[index].get_mut() = value[0];
        *self.y[index].get_mut() = value[1];
        *self.z[index].get_mut() = value[2];
    }

    pub fn clear(&mut self) {
        for channel in self.channels_mut() {
            channel.iter_mut().for_each(|value| *value.get_mut() = 0);
        }
    }

    pub fn copy_from(&mut self, other: &AccumulationBuffer) {
        for (dst, src) in self.channels_mut().into_iter().zip(other.channels()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d.get_mut() = s.load(Ordering::Relaxed);
            }
        }
    }

    pub fn channels(&self) -> [&[AtomicI32]; 3] {
        [&self.x, &self.y, &self.z]
    }

    pub fn channels_mut(&mut self) -> [&mut [AtomicI32]; 3] {
        [&mut self.x, &mut self.y, &mut self.z]
    }
}

fn alloc_channel(len: usize, label: &str) -> Result<Vec<AtomicI32>, WindFieldError> {
    let mut channel = Vec::new();
    channel
        .try_reserve_exact(len)
        .map_err(|_| WindFieldError::allocation(label, len))?;
    channel.extend((0..len).map(|_| AtomicI32::new(0)));
    Ok(channel)
}

/// Double-buffered voxel grid of accumulated wind vectors
#[derive(Debug)]
pub struct VoxelGrid3D {
    resolution: GridResolution,
    voxel_size: f32,
    buffers: DoubleBuffer<AccumulationBuffer>,
}

impl VoxelGrid3D {
    pub fn try_new(resolution: GridResolution, voxel_size: f32) -> Result<Self, WindFieldError> {
        let len = resolution.voxel_count();
        let alpha = AccumulationBuffer::try_new(len, "wind volume alpha")?;
        let beta = AccumulationBuffer::try_new(len, "wind volume beta")?;
        Ok(Self {
            resolution,
            voxel_size,
            buffers: DoubleBuffer::new(alpha, beta),
        })
    }

    pub fn resolution(&self) -> GridResolution {
        self.resolution
    }

    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    pub(crate) fn set_voxel_size(&mut self, voxel_size: f32) {
        self.voxel_size = voxel_size;
    }

    pub fn len(&self) -> usize {
        self.resolution.voxel_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn swap(&mut self) {
        self.buffers.swap();
    }

    /// Zero all accumulation channels of one copy
    pub fn clear(&mut self, copy: BufferCopy) {
        self.buffers.get_mut(copy).clear();
    }

    pub fn current(&self) -> &AccumulationBuffer {
        self.buffers.current()
    }

    pub fn current_mut(&mut self) -> &mut AccumulationBuffer {
        self.buffers.current_mut()
    }

    pub fn previous(&self) -> &AccumulationBuffer {
        self.buffers.previous()
    }

    pub fn split_mut(&mut self) -> (&AccumulationBuffer, &mut AccumulationBuffer) {
        self.buffers.split_mut()
    }

    /// World-space centre of a voxel for a volume centred at `center`
    pub fn world_position(&self, index: usize, center: Vec3) -> Vec3 {
        let coords = self.resolution.coords(index);
        center + self.resolution.centered_offset(coords) * self.voxel_size
    }

    /// Decoded wind vector of a voxel in the current copy
    pub fn velocity(&self, index: usize) -> Vec3 {
        self.current().load_vec3(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_coords_round_trip() {
        let res = GridResolution::new(4, 3, 5);
        for index in 0..res.voxel_count() {
            assert_eq!(res.index_of(res.coords(index)), index);
        }
        assert_eq!(res.index(1, 0, 0), 1);
        assert_eq!(res.index(0, 1, 0), 4);
        assert_eq!(res.index(0, 0, 1), 12);
    }

    #[test]
    fn test_voxel_positions_are_centered() {
        let grid = VoxelGrid3D::try_new(GridResolution::new(4, 4, 4), 1.0).unwrap();
        let res = grid.resolution();
        let first = grid.world_position(res.index(0, 0, 0), Vec3::ZERO);
        let last = grid.world_position(res.index(3, 3, 3), Vec3::ZERO);
        assert_eq!(first, Vec3::splat(-1.5));
        assert_eq!(last, Vec3::splat(1.5));

        let shifted = grid.world_position(res.index(2, 2, 2), Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(shifted, Vec3::new(10.5, 0.5, 0.5));
    }

    #[test]
    fn test_clear_only_touches_one_copy() {
        let mut grid = VoxelGrid3D::try_new(GridResolution::new(2, 2, 2), 1.0).unwrap();
        grid.current().add(0, [5, 6, 7]);
        grid.swap();
        grid.current().add(0, [1, 1, 1]);

        grid.clear(BufferCopy::Previous);
        assert_eq!(grid.previous().load(0), [0, 0, 0]);
        assert_eq!(grid.current().load(0), [1, 1, 1]);
    }

    #[test]
    fn test_concurrent_adds_sum() {
        use rayon::prelude::*;

        let buffer = AccumulationBuffer::try_new(1, "test").unwrap();
        (0..1000).into_par_iter().for_each(|i| {
            let sign = if i % 2 == 0 { 1 } else { -1 };
            buffer.add(0, [sign * 3, 1, 0]);
        });
        assert_eq!(buffer.load(0), [0, 1000, 0]);
    }
}
