mod logic;
mod systems;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;
use systems::*;

pub(crate) struct UIPlugin;

impl Plugin for UIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_settings_draft)
            .add_systems(EguiPrimaryContextPass, render_wind_settings_ui)
            .add_systems(Update, apply_settings_draft);
    }
}
