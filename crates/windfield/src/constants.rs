/// Default voxel resolution of the wind volume (x, y, z)
pub const DEFAULT_RESOLUTION: [u32; 3] = [32, 16, 32];
pub const DEFAULT_VOXEL_SIZE: f32 = 1.0;

/// Scale applied to wind components before they are stored in the
/// integer accumulation channels. One quantum is `1.0 / FIXED_POINT_SCALE`.
pub const FIXED_POINT_SCALE: f32 = 4096.0;

pub const DEFAULT_DIFFUSION_INTENSITY: f32 = 0.5;
pub const DEFAULT_DIFFUSION_ITERATIONS: u32 = 5;

pub const DEFAULT_ADVECTION_INTENSITY: f32 = 1.0;
pub const DEFAULT_ADVECTION_ATTENUATION: f32 = 0.1;
pub const DEFAULT_PROPAGATION_THRESHOLD: f32 = 0.01;

/// Upper bound on records in a single parameter buffer
pub const DEFAULT_MAX_RECORDS_PER_BUFFER: usize = 4096;

/// Below this length a direction is treated as degenerate
pub const DIRECTION_EPSILON: f32 = 1e-6;
