use bevy::prelude::*;

/// Tracer carried by the wind field
#[derive(Component, Debug)]
pub struct WindParticle {
    pub velocity: Vec3,
    pub age: f32,
    pub lifetime: f32,
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct WindParticleSettings {
    pub enabled: bool,
    pub count: usize,
    pub lifespan: f32,
    pub size: f32,
    pub fade_in_duration: f32,
    pub fade_out_duration: f32,
}

impl Default for WindParticleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            count: super::PARTICLE_COUNT,
            lifespan: 6.0,
            size: 0.08,
            fade_in_duration: 0.5,
            fade_out_duration: 1.0,
        }
    }
}

/// Shared mesh and material for every particle
#[derive(Resource)]
pub struct ParticleAssets {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}
