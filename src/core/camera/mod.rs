pub(crate) mod components;
mod logic;
mod systems;

use crate::core::camera::components::*;
use crate::core::camera::systems::*;
use bevy::prelude::*;
use bevy::transform::TransformSystems;
use bevy_egui::input::egui_wants_any_pointer_input;

pub(crate) struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<MainCamera>()
            .add_systems(Startup, spawn_camera)
            .add_systems(
                PostUpdate,
                camera_control
                    .run_if(not(egui_wants_any_pointer_input))
                    .before(TransformSystems::Propagate),
            );
    }
}
