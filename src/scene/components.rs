use bevy::prelude::*;

/// Rotates the entity around its local Y axis, in radians per second
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub(crate) struct Spinner {
    pub speed: f32,
}
