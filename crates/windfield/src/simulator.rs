use std::sync::Arc;

use glam::Vec3;

use crate::buffers::ContributorBuffers;
use crate::config::WindFieldConfig;
use crate::contributor::{
    ContributorRegistry, ContributorSnapshot, Registration, RegistrationHandle, WindContributor,
};
use crate::error::WindFieldError;
use crate::field::ExportedField;
use crate::grid::{BufferCopy, GridResolution, VoxelGrid3D};
use crate::noise::{NoiseTexture, WindNoise};
use crate::stages::{self, AdvectionStage, FrameState, InheritanceStage};

/// What happened to the last `advance_frame` call
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Simulated,
    /// The frame was dropped and the previous field kept
    Skipped { reason: String },
}

/// Volumetric wind simulator following a moving centre.
///
/// Contributors are registered between frames; [`WindSimulator::advance_frame`]
/// runs the stage pipeline and publishes a new [`ExportedField`].
#[derive(Debug)]
pub struct WindSimulator {
    config: WindFieldConfig,
    grid: VoxelGrid3D,
    registry: ContributorRegistry,
    snapshot: ContributorSnapshot,
    buffers: ContributorBuffers,
    noise: WindNoise,
    inheritance: InheritanceStage,
    advection: AdvectionStage,
    field: Arc<ExportedField>,
    last_center: Option<Vec3>,
    elapsed: f32,
    frame_index: u64,
    last_frame: Option<FrameOutcome>,
}

impl WindSimulator {
    pub fn init(config: WindFieldConfig) -> Result<Self, WindFieldError> {
        config.validate()?;
        let resolution = config.volume.resolution;
        let voxel_size = config.volume.voxel_size;
        let grid = VoxelGrid3D::try_new(resolution, voxel_size)?;
        let noise = WindNoise::from_config(&config.noise)?;

        log::info!(
            "Wind volume initialised: {} voxels of size {}, noise seed {}",
            resolution,
            voxel_size,
            noise.seed()
        );

        Ok(Self {
            buffers: ContributorBuffers::new(config.limits.max_records_per_buffer),
            field: Arc::new(ExportedField::zeroed(resolution, voxel_size, Vec3::ZERO)),
            config,
            grid,
            registry: ContributorRegistry::new(),
            snapshot: ContributorSnapshot::default(),
            noise,
            inheritance: InheritanceStage::new(),
            advection: AdvectionStage::new(),
            last_center: None,
            elapsed: 0.0,
            frame_index: 0,
            last_frame: None,
        })
    }

    /// Release every resource
    pub fn teardown(self) {
        log::info!(
            "Wind volume torn down after {} frames, {} contributors registered",
            self.frame_index,
            self.registry.len()
        );
    }

    /// Reallocate with a new configuration, which may change the resolution.
    /// The field starts over from zero; registrations are kept.
    pub fn reset(&mut self, config: WindFieldConfig) -> Result<(), WindFieldError> {
        config.validate()?;
        let resolution = config.volume.resolution;
        if resolution != self.grid.resolution() {
            self.grid = VoxelGrid3D::try_new(resolution, config.volume.voxel_size)?;
        } else {
            self.grid.set_voxel_size(config.volume.voxel_size);
            self.grid.clear(BufferCopy::Current);
            self.grid.clear(BufferCopy::Previous);
        }
        self.apply_settings(config)?;
        self.inheritance.reset();
        self.advection.reset();
        self.last_center = None;
        self.elapsed = 0.0;
        self.field = Arc::new(ExportedField::zeroed(
            resolution,
            self.config.volume.voxel_size,
            Vec3::ZERO,
        ));
        log::info!("Wind volume reset to {} voxels", resolution);
        Ok(())
    }

    /// Apply settings that do not change the grid allocation
    pub fn reconfigure(&mut self, config: WindFieldConfig) -> Result<(), WindFieldError> {
        config.validate()?;
        let current = self.grid.resolution();
        let requested = config.volume.resolution;
        if current != requested {
            return Err(WindFieldError::GridResolutionMismatch { current, requested });
        }
        self.grid.set_voxel_size(config.volume.voxel_size);
        self.apply_settings(config)
    }

    fn apply_settings(&mut self, config: WindFieldConfig) -> Result<(), WindFieldError> {
        if config.noise.texture_path != self.config.noise.texture_path {
            let texture = match &config.noise.texture_path {
                Some(path) => Some(NoiseTexture::load(path)?),
                None => None,
            };
            self.noise.set_texture(texture);
        }
        self.noise.set_settings(config.noise.clone());
        self.buffers.set_budget(config.limits.max_records_per_buffer);
        if !config.inheritance.enabled {
            self.inheritance.reset();
        }
        if !config.advection.enabled {
            self.advection.reset();
        }
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &WindFieldConfig {
        &self.config
    }

    pub fn resolution(&self) -> GridResolution {
        self.grid.resolution()
    }

    pub fn register(&mut self, contributor: WindContributor) -> Result<Registration, WindFieldError> {
        self.registry.register(contributor)
    }

    pub fn unregister(&mut self, handle: RegistrationHandle) -> Option<WindContributor> {
        self.registry.unregister(handle)
    }

    pub fn update(
        &mut self,
        handle: RegistrationHandle,
        contributor: WindContributor,
    ) -> Result<(), WindFieldError> {
        self.registry.update(handle, contributor)
    }

    pub fn registry(&self) -> &ContributorRegistry {
        &self.registry
    }

    pub fn set_noise_texture(&mut self, texture: Option<NoiseTexture>) {
        self.noise.set_texture(texture);
    }

    pub fn noise(&self) -> &WindNoise {
        &self.noise
    }

    /// Run one frame of the pipeline with the volume centred at `center`.
    ///
    /// On `ResourceAllocationFailure` the frame is skipped, the previous field is
    /// kept and the outcome is reported through [`WindSimulator::last_frame`].
    pub fn advance_frame(&mut self, center: Vec3, delta_time: f32) {
        self.buffers.release_retired();

        let delta_time = if delta_time.is_finite() { delta_time.max(0.0) } else { 0.0 };
        let delta_center = self.last_center.map_or(Vec3::ZERO, |last| center - last);

        self.registry.snapshot_into(&mut self.snapshot);
        if let Err(err) = self.buffers.upload(&self.snapshot) {
            log::warn!("Skipping wind frame {}: {}", self.frame_index, err);
            self.last_frame = Some(FrameOutcome::Skipped {
                reason: err.to_string(),
            });
            return;
        }

        let elapsed = self.elapsed + delta_time;
        let mut frame = FrameState::new(center, delta_center, delta_time, elapsed);

        // last frame's field is carried only through advection
        if !self.config.advection.enabled {
            self.grid.clear(BufferCopy::Current);
        }
        if self.config.inheritance.enabled {
            self.inheritance.run(&mut self.grid, delta_center);
            frame.recenter = Vec3::ZERO;
        }
        if self.config.advection.enabled {
            self.advection.run(&mut self.grid, &self.config.advection, &frame);
        }
        stages::injection::run(&mut self.grid, center, &self.buffers);
        stages::diffusion::run(&mut self.grid, &self.config.diffusion);

        self.noise.check_ready();
        let field = stages::export::run(
            &self.grid,
            &frame,
            self.config.ambient.velocity(),
            &self.noise,
        );
        self.field = Arc::new(field);

        self.last_center = Some(center);
        self.elapsed = elapsed;
        self.frame_index += 1;
        self.last_frame = Some(FrameOutcome::Simulated);
    }

    /// Trilinear sample of the last exported field, clamped to the edges
    pub fn sample(&self, position: Vec3) -> Vec3 {
        self.field.sample(position)
    }

    /// Snapshot of the last exported field
    pub fn field(&self) -> Arc<ExportedField> {
        Arc::clone(&self.field)
    }

    pub fn last_frame(&self) -> Option<&FrameOutcome> {
        self.last_frame.as_ref()
    }

    /// Number of simulated (not skipped) frames
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// World centres of every voxel of the last exported field
    pub fn voxel_positions(&self) -> Vec<Vec3> {
        let center = self.field.center();
        (0..self.grid.len())
            .map(|index| self.grid.world_position(index, center))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiffusionConfig;
    use crate::contributor::{
        ContributorId, ContributorShape, ContributorTransform, VelocitySpace, WindCalculation,
    };

    fn small_config() -> WindFieldConfig {
        let mut config = WindFieldConfig::default();
        config.volume.resolution = GridResolution::new(4, 4, 4);
        config.diffusion = DiffusionConfig {
            enabled: false,
            ..DiffusionConfig::default()
        };
        config.advection.enabled = false;
        config.noise.seed = Some(1);
        config
    }

    fn fixed_box(id: u64) -> WindContributor {
        WindContributor::new(
            ContributorId(id),
            ContributorShape::Box {
                half_extents: Vec3::splat(0.5),
            },
            WindCalculation::Fixed {
                velocity: Vec3::X,
                space: VelocitySpace::World,
            },
        )
        .with_transform(ContributorTransform::from_translation(Vec3::splat(0.5)))
    }

    #[test]
    fn test_init_rejects_invalid_config() {
        let mut config = small_config();
        config.volume.voxel_size = -1.0;
        assert!(matches!(
            WindSimulator::init(config),
            Err(WindFieldError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_field_before_first_frame_is_zero() {
        let sim = WindSimulator::init(small_config()).unwrap();
        assert_eq!(sim.sample(Vec3::ZERO), Vec3::ZERO);
        assert_eq!(sim.last_frame(), None);
        assert_eq!(sim.voxel_positions().len(), 64);
    }

    #[test]
    fn test_reconfigure_rejects_resolution_change() {
        let mut sim = WindSimulator::init(small_config()).unwrap();
        let mut config = small_config();
        config.volume.resolution = GridResolution::new(8, 4, 4);
        assert!(matches!(
            sim.reconfigure(config.clone()),
            Err(WindFieldError::GridResolutionMismatch { .. })
        ));

        sim.reset(config).unwrap();
        assert_eq!(sim.resolution(), GridResolution::new(8, 4, 4));
        assert_eq!(sim.field().resolution(), GridResolution::new(8, 4, 4));
    }

    #[test]
    fn test_reset_keeps_registrations_and_clears_field() {
        let mut sim = WindSimulator::init(small_config()).unwrap();
        sim.register(fixed_box(1)).unwrap();
        sim.advance_frame(Vec3::ZERO, 0.1);
        assert!(sim.sample(Vec3::splat(0.5)).x > 0.9);

        sim.reset(small_config()).unwrap();
        assert_eq!(sim.sample(Vec3::splat(0.5)), Vec3::ZERO);
        assert_eq!(sim.registry().len(), 1);
    }

    #[test]
    fn test_budget_exhaustion_skips_frame_and_keeps_field() {
        let mut config = small_config();
        config.limits.max_records_per_buffer = 1;
        let mut sim = WindSimulator::init(config).unwrap();

        sim.register(fixed_box(1)).unwrap();
        sim.advance_frame(Vec3::ZERO, 0.1);
        assert_eq!(sim.last_frame(), Some(&FrameOutcome::Simulated));
        let before = sim.field();

        sim.register(fixed_box(2)).unwrap();
        sim.advance_frame(Vec3::ZERO, 0.1);
        assert!(matches!(sim.last_frame(), Some(FrameOutcome::Skipped { .. })));
        assert_eq!(sim.frame_index(), 1);
        assert!(Arc::ptr_eq(&before, &sim.field()));
    }

    #[test]
    fn test_field_follows_center() {
        let mut sim = WindSimulator::init(small_config()).unwrap();
        sim.advance_frame(Vec3::new(10.0, 0.0, 0.0), 0.1);
        assert_eq!(sim.field().center(), Vec3::new(10.0, 0.0, 0.0));
        let positions = sim.voxel_positions();
        assert_eq!(positions[0], Vec3::new(8.5, -1.5, -1.5));
    }

    #[test]
    fn test_teardown_after_frames() {
        let mut sim = WindSimulator::init(small_config()).unwrap();
        sim.register(fixed_box(1)).unwrap();
        sim.advance_frame(Vec3::ZERO, 0.1);
        let field = sim.field();
        sim.teardown();
        // published snapshots outlive the simulator
        assert!(field.sample(Vec3::splat(0.5)).x > 0.9);
    }
}
