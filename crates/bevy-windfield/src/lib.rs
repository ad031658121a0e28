//! # Bevy Windfield Crate
//!
//! Drives a [`windfield::WindSimulator`] from the Bevy frame loop.
//!
//! Entities with a [`WindSource`] are registered as contributors, the volume
//! follows the entity tagged [`WindVolumeAnchor`], and after every simulated
//! frame the field is copied into a 3D `Rgba16Float` image ([`WindVolumeTexture`]).
//!
//! ## Usage
//! ```no_run
//! use bevy::prelude::*;
//! use bevy_windfield::*;
//! use windfield::{ContributorShape, VelocitySpace, WindCalculation, WindFieldConfig};
//!
//! fn setup(mut commands: Commands) {
//!     commands.spawn((Transform::default(), WindVolumeAnchor));
//!     commands.spawn((
//!         WindSource::new(
//!             ContributorShape::Sphere { radius: 4.0 },
//!             WindCalculation::Fixed {
//!                 velocity: Vec3::X * 3.0,
//!                 space: VelocitySpace::World,
//!             },
//!         ),
//!         Transform::from_xyz(0.0, 1.0, 0.0),
//!     ));
//! }
//!
//! App::new()
//!     .add_plugins((DefaultPlugins, WindFieldPlugin::new(WindFieldConfig::default())))
//!     .add_systems(Startup, setup)
//!     .run();
//! ```

use std::collections::HashMap;

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::transform::TransformSystems;
use windfield::{
    ContributorId, ContributorShape, ContributorTransform, ExportedField, GridResolution,
    Registration, RegistrationHandle, WindCalculation, WindContributor, WindFieldConfig,
    WindFieldError, WindSimulator,
};

/// Adds the wind volume resources and systems
pub struct WindFieldPlugin {
    pub config: WindFieldConfig,
}

impl WindFieldPlugin {
    pub fn new(config: WindFieldConfig) -> Self {
        Self { config }
    }
}

impl Plugin for WindFieldPlugin {
    fn build(&self, app: &mut App) {
        let simulator = match WindSimulator::init(self.config.clone()) {
            Ok(simulator) => simulator,
            Err(err) => {
                error!("Wind volume config rejected ({err}), using defaults");
                match WindSimulator::init(WindFieldConfig::default()) {
                    Ok(simulator) => simulator,
                    Err(err) => {
                        error!("Wind volume disabled: {err}");
                        return;
                    }
                }
            }
        };

        app.insert_resource(WindVolume::new(simulator))
            .init_resource::<WindDebugSettings>()
            .add_systems(Startup, setup_wind_texture)
            .add_systems(
                PostUpdate,
                (refresh_wind_texture, draw_wind_arrows.run_if(arrows_enabled))
                    .chain()
                    .in_set(WindFieldSystems::Upload),
            )
            .add_systems(Last, teardown_on_exit);
        add_simulation_systems(app);
    }
}

/// Wind systems run in `PostUpdate`, once transforms of this frame are propagated
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum WindFieldSystems {
    /// Register changed sources and advance the simulator
    Simulate,
    /// Copy the new field to the GPU texture and debug gizmos
    Upload,
}

fn add_simulation_systems(app: &mut App) {
    app.configure_sets(
        PostUpdate,
        (
            WindFieldSystems::Simulate.after(TransformSystems::Propagate),
            WindFieldSystems::Upload,
        )
            .chain(),
    )
    .add_systems(
        PostUpdate,
        (sync_wind_sources, advance_wind_volume)
            .chain()
            .in_set(WindFieldSystems::Simulate),
    );
}

/// Owns the simulator and the entity -> registration mapping
#[derive(Resource)]
pub struct WindVolume {
    simulator: WindSimulator,
    handles: HashMap<Entity, RegistrationHandle>,
}

impl WindVolume {
    pub fn new(simulator: WindSimulator) -> Self {
        Self {
            simulator,
            handles: HashMap::new(),
        }
    }

    /// Wind velocity at a world position, from the last completed frame
    pub fn sample(&self, position: Vec3) -> Vec3 {
        self.simulator.sample(position)
    }

    pub fn field(&self) -> std::sync::Arc<ExportedField> {
        self.simulator.field()
    }

    pub fn simulator(&self) -> &WindSimulator {
        &self.simulator
    }

    pub fn config(&self) -> &WindFieldConfig {
        self.simulator.config()
    }

    /// Apply new settings; a resolution change goes through a full reset
    pub fn apply_config(&mut self, config: WindFieldConfig) -> Result<(), WindFieldError> {
        if config.same_structure(self.simulator.config()) {
            self.simulator.reconfigure(config)
        } else {
            self.simulator.reset(config)
        }
    }

    pub fn registered_sources(&self) -> usize {
        self.handles.len()
    }

    fn sync_source(&mut self, entity: Entity, contributor: WindContributor) {
        let result = match self.handles.get(&entity) {
            Some(handle) => self.simulator.update(*handle, contributor),
            None => self.simulator.register(contributor).map(|registration| {
                if let Registration::Registered(handle) | Registration::AlreadyRegistered(handle) =
                    registration
                {
                    self.handles.insert(entity, handle);
                }
            }),
        };
        if let Err(err) = result {
            warn!("Wind source {entity} ignored: {err}");
        }
    }

    fn remove_source(&mut self, entity: Entity) {
        if let Some(handle) = self.handles.remove(&entity) {
            self.simulator.unregister(handle);
        }
    }
}

/// 3D image holding the exported field, refreshed after each simulated frame
#[derive(Resource)]
pub struct WindVolumeTexture {
    pub handle: Handle<Image>,
    uploaded_frame: Option<u64>,
}

#[derive(Resource)]
pub struct WindDebugSettings {
    pub show_arrows: bool,
    /// Arrow length per unit of wind speed
    pub arrow_scale: f32,
    /// Draw one arrow every `stride` voxels on each axis
    pub stride: u32,
}

impl Default for WindDebugSettings {
    fn default() -> Self {
        Self {
            show_arrows: false,
            arrow_scale: 0.25,
            stride: 2,
        }
    }
}

/// Wind contributor attached to an entity; placement comes from its `GlobalTransform`
#[derive(Component, Debug, Clone, Copy, PartialEq)]
#[require(Transform)]
pub struct WindSource {
    pub shape: ContributorShape,
    pub calculation: WindCalculation,
    pub intensity: f32,
    pub enabled: bool,
}

impl WindSource {
    pub fn new(shape: ContributorShape, calculation: WindCalculation) -> Self {
        Self {
            shape,
            calculation,
            intensity: 1.0,
            enabled: true,
        }
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn contributor(&self, entity: Entity, transform: &GlobalTransform) -> WindContributor {
        let (scale, rotation, translation) = transform.to_scale_rotation_translation();
        WindContributor {
            id: ContributorId(entity.to_bits()),
            shape: self.shape,
            calculation: self.calculation,
            transform: ContributorTransform {
                translation,
                rotation,
                scale,
            },
            intensity: self.intensity,
            enabled: self.enabled,
        }
    }
}

/// The wind volume is centred on this entity
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct WindVolumeAnchor;

fn arrows_enabled(settings: Res<WindDebugSettings>) -> bool {
    settings.show_arrows
}

fn volume_image(field: &ExportedField) -> Image {
    let GridResolution { x, y, z } = field.resolution();
    Image::new(
        Extent3d {
            width: x,
            height: y,
            depth_or_array_layers: z,
        },
        TextureDimension::D3,
        field.as_bytes().to_vec(),
        TextureFormat::Rgba16Float,
        RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
    )
}

pub fn setup_wind_texture(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    volume: Res<WindVolume>,
) {
    let handle = images.add(volume_image(&volume.field()));
    commands.insert_resource(WindVolumeTexture {
        handle,
        uploaded_frame: None,
    });
    info!("Wind volume texture created ({})", volume.simulator.resolution());
}

pub fn sync_wind_sources(
    mut volume: ResMut<WindVolume>,
    changed: Query<
        (Entity, &WindSource, &GlobalTransform),
        Or<(Changed<WindSource>, Changed<GlobalTransform>)>,
    >,
    mut removed: RemovedComponents<WindSource>,
) {
    for entity in removed.read() {
        volume.remove_source(entity);
    }
    for (entity, source, transform) in &changed {
        volume.sync_source(entity, source.contributor(entity, transform));
    }
}

pub fn advance_wind_volume(
    mut volume: ResMut<WindVolume>,
    anchor: Query<&GlobalTransform, With<WindVolumeAnchor>>,
    time: Res<Time>,
) {
    let center = anchor
        .single()
        .map(|transform| transform.translation())
        .unwrap_or(Vec3::ZERO);
    volume.simulator.advance_frame(center, time.delta_secs());
}

pub fn refresh_wind_texture(
    volume: Res<WindVolume>,
    texture: Option<ResMut<WindVolumeTexture>>,
    mut images: ResMut<Assets<Image>>,
) {
    let Some(mut texture) = texture else {
        return;
    };
    let frame = volume.simulator.frame_index();
    if texture.uploaded_frame == Some(frame) {
        return;
    }
    let field = volume.field();
    let Some(image) = images.get_mut(&texture.handle) else {
        return;
    };
    let size = image.texture_descriptor.size;
    let GridResolution { x, y, z } = field.resolution();
    if (size.width, size.height, size.depth_or_array_layers) == (x, y, z) {
        image.data = Some(field.as_bytes().to_vec());
    } else {
        *image = volume_image(&field);
    }
    texture.uploaded_frame = Some(frame);
}

pub fn draw_wind_arrows(volume: Res<WindVolume>, settings: Res<WindDebugSettings>, mut gizmos: Gizmos) {
    let field = volume.field();
    let res = field.resolution();
    let stride = settings.stride.max(1) as usize;
    for (index, position) in volume.simulator.voxel_positions().into_iter().enumerate() {
        let coords = res.coords(index);
        if [coords.x, coords.y, coords.z]
            .iter()
            .any(|c| *c as usize % stride != 0)
        {
            continue;
        }
        let wind = field.sample(position);
        if wind.length_squared() < 1e-4 {
            continue;
        }
        let speed = wind.length();
        let color = Color::srgb((speed / 10.0).min(1.0), 0.6, 1.0 - (speed / 10.0).min(1.0));
        gizmos.arrow(position, position + wind * settings.arrow_scale, color);
    }
}

pub fn teardown_on_exit(mut exits: MessageReader<AppExit>, mut commands: Commands) {
    if exits.read().next().is_none() {
        return;
    }
    commands.queue(|world: &mut World| {
        if let Some(volume) = world.remove_resource::<WindVolume>() {
            volume.simulator.teardown();
        }
    });
}
