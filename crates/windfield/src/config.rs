use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::WindFieldError;
use crate::grid::GridResolution;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WindFieldConfig {
    pub volume: VolumeConfig,
    pub diffusion: DiffusionConfig,
    pub advection: AdvectionConfig,
    pub inheritance: InheritanceConfig,
    pub ambient: AmbientConfig,
    pub noise: NoiseConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    pub voxel_size: f32,
    pub resolution: GridResolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffusionConfig {
    pub enabled: bool,
    /// Blend towards the neighbour average, in [0, 1)
    pub intensity: f32,
    pub iterations: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvectionConfig {
    pub enabled: bool,
    pub intensity: f32,
    /// Fraction of the transported value lost per frame, in (0, 1)
    pub attenuation: f32,
    /// Voxels slower than this are not transported
    pub propagation_threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InheritanceConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub direction: Vec3,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NoiseMode {
    #[default]
    Procedural,
    Texture,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub mode: NoiseMode,
    pub intensity: f32,
    pub scroll_direction: Vec3,
    pub scroll_speed: f32,
    pub position_frequency: Vec3,
    pub position_offset: Vec3,
    /// Random when unset
    pub seed: Option<u32>,
    /// PNG loaded for `NoiseMode::Texture`
    pub texture_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_records_per_buffer: usize,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            voxel_size: DEFAULT_VOXEL_SIZE,
            resolution: GridResolution::default(),
        }
    }
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: DEFAULT_DIFFUSION_INTENSITY,
            iterations: DEFAULT_DIFFUSION_ITERATIONS,
        }
    }
}

impl Default for AdvectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: DEFAULT_ADVECTION_INTENSITY,
            attenuation: DEFAULT_ADVECTION_ATTENUATION,
            propagation_threshold: DEFAULT_PROPAGATION_THRESHOLD,
        }
    }
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            direction: Vec3::X,
            intensity: 0.0,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            mode: NoiseMode::Procedural,
            intensity: 0.0,
            scroll_direction: Vec3::X,
            scroll_speed: 1.0,
            position_frequency: Vec3::splat(0.1),
            position_offset: Vec3::ZERO,
            seed: None,
            texture_path: None,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_records_per_buffer: DEFAULT_MAX_RECORDS_PER_BUFFER,
        }
    }
}

impl AmbientConfig {
    /// Ambient wind vector added to every voxel on export
    pub fn velocity(&self) -> Vec3 {
        self.direction.normalize_or_zero() * self.intensity
    }
}

impl WindFieldConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, WindFieldError> {
        let content = std::fs::read_to_string(path)?;
        let config: WindFieldConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), WindFieldError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), WindFieldError> {
        let res = self.volume.resolution;
        if res.x == 0 || res.y == 0 || res.z == 0 {
            return Err(WindFieldError::invalid_config(format!(
                "resolution must be at least 1 on every axis, got {res}"
            )));
        }
        if !self.volume.voxel_size.is_finite() || self.volume.voxel_size <= 0.0 {
            return Err(WindFieldError::invalid_config(format!(
                "voxel size must be positive, got {}",
                self.volume.voxel_size
            )));
        }
        if !(0.0..1.0).contains(&self.diffusion.intensity) {
            return Err(WindFieldError::invalid_config(format!(
                "diffusion intensity must be in [0, 1), got {}",
                self.diffusion.intensity
            )));
        }
        let attenuation = self.advection.attenuation;
        if !(attenuation > 0.0 && attenuation < 1.0) {
            return Err(WindFieldError::invalid_config(format!(
                "advection attenuation must be in (0, 1), got {attenuation}"
            )));
        }
        if !self.advection.intensity.is_finite() || self.advection.intensity < 0.0 {
            return Err(WindFieldError::invalid_config(format!(
                "advection intensity must be non-negative, got {}",
                self.advection.intensity
            )));
        }
        if !self.advection.propagation_threshold.is_finite()
            || self.advection.propagation_threshold < 0.0
        {
            return Err(WindFieldError::invalid_config(
                "propagation threshold must be non-negative",
            ));
        }
        if !self.ambient.direction.is_finite() || !self.ambient.intensity.is_finite() {
            return Err(WindFieldError::invalid_config("ambient wind must be finite"));
        }
        let noise = &self.noise;
        if !noise.intensity.is_finite()
            || !noise.scroll_direction.is_finite()
            || !noise.scroll_speed.is_finite()
            || !noise.position_frequency.is_finite()
            || !noise.position_offset.is_finite()
        {
            return Err(WindFieldError::invalid_config("noise parameters must be finite"));
        }
        Ok(())
    }

    /// True when switching between the two configs needs no grid reallocation
    pub fn same_structure(&self, other: &WindFieldConfig) -> bool {
        self.volume.resolution == other.volume.resolution
    }
}
