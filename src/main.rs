// disable console on windows for release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use bevy::DefaultPlugins;
use bevy::prelude::*;
use bevy::window::{PresentMode, WindowResolution};
use windscape::WindscapePlugin;

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::linear_rgb(0.55, 0.62, 0.7)))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Windscape".into(),
                resolution: WindowResolution::new(1500, 900),
                present_mode: PresentMode::AutoVsync,
                resize_constraints: WindowResizeConstraints {
                    min_width: 800.0,
                    min_height: 600.0,
                    max_width: 100000.0,
                    max_height: 100000.0,
                },
                ..default()
            }),
            ..default()
        }))
        .add_plugins(WindscapePlugin::default())
        .run();
}
