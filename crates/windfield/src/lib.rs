pub mod buffers;
pub mod config;
pub mod constants;
pub mod contributor;
pub mod error;
pub mod field;
pub mod fixed_point;
pub mod grid;
pub mod noise;
pub mod simulator;
pub mod stages;
pub mod tools;

pub use config::WindFieldConfig;
pub use contributor::{
    ContributorId, ContributorShape, ContributorTransform, Registration, RegistrationHandle,
    VelocitySpace, WindCalculation, WindContributor,
};
pub use error::WindFieldError;
pub use field::ExportedField;
pub use grid::GridResolution;
pub use simulator::{FrameOutcome, WindSimulator};
