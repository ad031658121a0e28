pub(crate) mod components;
mod systems;

use bevy::prelude::*;
use components::Spinner;
use systems::*;

pub(crate) struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Spinner>()
            .add_systems(Startup, spawn_scene)
            .add_systems(Update, spin_sources);
    }
}
