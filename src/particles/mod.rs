pub(crate) mod components;
mod logic;
mod systems;

use bevy::prelude::*;
use components::*;
use systems::*;

pub const PARTICLE_COUNT: usize = 600;

pub(crate) struct ParticlesPlugin;

impl Plugin for ParticlesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WindParticleSettings>()
            .add_systems(Startup, setup_particle_assets)
            .add_systems(
                Update,
                (
                    sync_particle_count,
                    update_particles,
                    update_particle_fade,
                )
                    .chain(),
            );
    }
}
