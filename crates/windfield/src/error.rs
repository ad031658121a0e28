use thiserror::Error;

use crate::grid::GridResolution;

#[derive(Error, Debug)]
pub enum WindFieldError {
    #[error("Invalid wind contributor configuration: {reason}")]
    InvalidContributorConfiguration { reason: String },
    #[error("Failed to allocate {buffer} for {requested} elements")]
    ResourceAllocationFailure { buffer: String, requested: usize },
    #[error("Grid resolution {requested} differs from allocated {current}; reset the simulator to change it")]
    GridResolutionMismatch {
        current: GridResolution,
        requested: GridResolution,
    },
    #[error("Invalid wind field configuration: {reason}")]
    InvalidConfig { reason: String },
    #[error("Failed to read or write config file: {0}")]
    ConfigIo(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
    #[error("Failed to load noise texture: {0}")]
    NoiseTexture(#[from] image::ImageError),
}

impl WindFieldError {
    pub(crate) fn invalid_contributor(reason: impl Into<String>) -> Self {
        Self::InvalidContributorConfiguration {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub(crate) fn allocation(buffer: impl Into<String>, requested: usize) -> Self {
        Self::ResourceAllocationFailure {
            buffer: buffer.into(),
            requested,
        }
    }
}
