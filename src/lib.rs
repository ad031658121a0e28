mod core;
mod particles;
mod scene;
mod ui;

use std::path::{Path, PathBuf};

use crate::core::camera::CameraPlugin;
use crate::particles::ParticlesPlugin;
use crate::scene::ScenePlugin;
use crate::ui::UIPlugin;
use bevy::app::App;
#[cfg(debug_assertions)]
use bevy::diagnostic::LogDiagnosticsPlugin;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_windfield::WindFieldPlugin;
use windfield::WindFieldConfig;

pub const DEFAULT_CONFIG_PATH: &str = "windfield_config.toml";

/// Wind volume demo: a free camera drags the volume through a scene of wind sources
pub struct WindscapePlugin {
    pub config_path: PathBuf,
}

impl Default for WindscapePlugin {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }
}

impl Plugin for WindscapePlugin {
    fn build(&self, app: &mut App) {
        let config = load_config(&self.config_path);
        app.insert_resource(ConfigPath(self.config_path.clone()))
            .add_plugins((
                EguiPlugin::default(),
                WindFieldPlugin::new(config),
                CameraPlugin,
                ScenePlugin,
                ParticlesPlugin,
                UIPlugin,
            ));

        #[cfg(debug_assertions)]
        {
            app.add_plugins(LogDiagnosticsPlugin::default());
        }
    }
}

/// Where the settings panel saves the wind configuration
#[derive(Resource, Clone, Debug)]
pub(crate) struct ConfigPath(pub PathBuf);

fn load_config(path: &Path) -> WindFieldConfig {
    if !path.exists() {
        info!("No wind config at {}, using defaults", path.display());
        return WindFieldConfig::default();
    }
    match WindFieldConfig::load_from_file(path) {
        Ok(config) => {
            info!("Wind config loaded from {}", path.display());
            config
        }
        Err(err) => {
            warn!("Failed to load wind config {}: {err}, using defaults", path.display());
            WindFieldConfig::default()
        }
    }
}
