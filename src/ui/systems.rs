use super::logic::live_config;
use crate::ConfigPath;
use crate::particles::components::WindParticleSettings;
use bevy::app::AppExit;
use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};
use bevy_windfield::{WindDebugSettings, WindVolume};
use windfield::WindFieldConfig;
use windfield::config::NoiseMode;
use windfield::simulator::FrameOutcome;

/// Settings being edited in the panel
#[derive(Resource, Clone, Debug)]
pub struct SettingsDraft {
    pub config: WindFieldConfig,
    /// Set by the panel when the resolution should be applied with a reset
    pub reset_requested: bool,
    rejected: Option<WindFieldConfig>,
}

pub fn setup_settings_draft(mut commands: Commands, volume: Res<WindVolume>) {
    commands.insert_resource(SettingsDraft {
        config: volume.config().clone(),
        reset_requested: false,
        rejected: None,
    });
}

/// Push panel edits into the running volume
pub fn apply_settings_draft(
    draft: Option<ResMut<SettingsDraft>>,
    volume: Option<ResMut<WindVolume>>,
) {
    let (Some(mut draft), Some(mut volume)) = (draft, volume) else {
        return;
    };
    if draft.reset_requested {
        draft.reset_requested = false;
        match volume.apply_config(draft.config.clone()) {
            Ok(()) => info!("Wind volume resized to {}", draft.config.volume.resolution),
            Err(err) => warn!("Wind settings rejected: {err}"),
        }
        return;
    }

    let live = live_config(&draft.config, volume.config());
    if live == *volume.config() || draft.rejected.as_ref() == Some(&live) {
        return;
    }
    if let Err(err) = volume.apply_config(live.clone()) {
        warn!("Wind settings rejected: {err}");
        draft.rejected = Some(live);
    }
}

pub fn render_wind_settings_ui(
    mut contexts: EguiContexts,
    draft: Option<ResMut<SettingsDraft>>,
    volume: Option<Res<WindVolume>>,
    mut debug: ResMut<WindDebugSettings>,
    mut particles: ResMut<WindParticleSettings>,
    config_path: Res<ConfigPath>,
    mut app_exit_events: MessageWriter<AppExit>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };
    let (Some(mut draft), Some(volume)) = (draft, volume) else {
        return;
    };

    egui::SidePanel::right("wind_settings_panel")
        .default_width(320.0)
        .resizable(true)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Wind Volume");
                ui.add_space(6.0);
                render_status(ui, &volume);

                ui.add_space(10.0);
                ui.separator();
                render_volume_section(ui, &mut draft);

                ui.separator();
                render_simulation_section(ui, &mut draft.config);

                ui.separator();
                render_ambient_section(ui, &mut draft.config);

                ui.separator();
                render_noise_section(ui, &mut draft.config);

                ui.separator();
                ui.label("Debug");
                ui.checkbox(&mut debug.show_arrows, "Show wind arrows");
                ui.add(egui::Slider::new(&mut debug.arrow_scale, 0.05..=2.0).text("Arrow scale"));
                ui.add(egui::Slider::new(&mut debug.stride, 1..=8).text("Arrow stride"));
                ui.checkbox(&mut particles.enabled, "Show particles");
                ui.add(egui::Slider::new(&mut particles.count, 0..=3000).text("Particles"));
                ui.add(
                    egui::Slider::new(&mut particles.lifespan, 0.5..=20.0)
                        .step_by(0.5)
                        .text("Lifespan"),
                );

                ui.add_space(20.0);
                ui.separator();
                ui.add_space(10.0);

                ui.horizontal(|ui| {
                    if ui.button("Save settings").clicked() {
                        match volume.config().save_to_file(&config_path.0) {
                            Ok(()) => info!("Wind config saved to {}", config_path.0.display()),
                            Err(err) => warn!("Failed to save wind config: {err}"),
                        }
                    }
                    if ui.button("Quit").clicked() {
                        app_exit_events.write(AppExit::Success);
                    }
                });
            });
        });
}

fn render_status(ui: &mut egui::Ui, volume: &WindVolume) {
    let simulator = volume.simulator();
    ui.label(format!("Resolution: {}", simulator.resolution()));
    ui.label(format!("Frames simulated: {}", simulator.frame_index()));
    ui.label(format!("Sources registered: {}", volume.registered_sources()));
    match simulator.last_frame() {
        Some(FrameOutcome::Skipped { reason }) => {
            ui.colored_label(egui::Color32::from_rgb(230, 120, 60), format!("Frame skipped: {reason}"));
        }
        Some(FrameOutcome::Simulated) => {
            ui.label("Last frame simulated");
        }
        None => {
            ui.label("Waiting for first frame");
        }
    }
}

fn render_volume_section(ui: &mut egui::Ui, draft: &mut SettingsDraft) {
    let volume = &mut draft.config.volume;
    ui.label("Volume");
    ui.add(
        egui::Slider::new(&mut volume.voxel_size, 0.25..=4.0)
            .step_by(0.25)
            .text("Voxel size"),
    );
    ui.add(egui::Slider::new(&mut volume.resolution.x, 4..=96).text("Resolution X"));
    ui.add(egui::Slider::new(&mut volume.resolution.y, 4..=64).text("Resolution Y"));
    ui.add(egui::Slider::new(&mut volume.resolution.z, 4..=96).text("Resolution Z"));
    if ui.button("Apply resolution").clicked() {
        draft.reset_requested = true;
    }
}

fn render_simulation_section(ui: &mut egui::Ui, config: &mut WindFieldConfig) {
    ui.label("Diffusion");
    ui.checkbox(&mut config.diffusion.enabled, "Enabled");
    ui.add(
        egui::Slider::new(&mut config.diffusion.intensity, 0.0..=0.95)
            .step_by(0.05)
            .text("Intensity"),
    );
    ui.add(egui::Slider::new(&mut config.diffusion.iterations, 0..=16).text("Iterations"));

    ui.add_space(6.0);
    ui.label("Advection");
    ui.push_id("advection", |ui| {
        ui.checkbox(&mut config.advection.enabled, "Enabled");
        ui.add(
            egui::Slider::new(&mut config.advection.intensity, 0.0..=4.0)
                .step_by(0.1)
                .text("Intensity"),
        );
        ui.add(
            egui::Slider::new(&mut config.advection.attenuation, 0.01..=0.99)
                .step_by(0.01)
                .text("Attenuation"),
        );
        ui.add(
            egui::Slider::new(&mut config.advection.propagation_threshold, 0.0..=1.0)
                .step_by(0.01)
                .text("Threshold"),
        );
    });
    ui.checkbox(&mut config.inheritance.enabled, "Shift field with the volume");
}

fn render_ambient_section(ui: &mut egui::Ui, config: &mut WindFieldConfig) {
    ui.label("Ambient");
    let ambient = &mut config.ambient;
    ui.add(egui::Slider::new(&mut ambient.intensity, 0.0..=10.0).step_by(0.1).text("Speed"));
    ui.add(egui::Slider::new(&mut ambient.direction.x, -1.0..=1.0).text("Direction X"));
    ui.add(egui::Slider::new(&mut ambient.direction.y, -1.0..=1.0).text("Direction Y"));
    ui.add(egui::Slider::new(&mut ambient.direction.z, -1.0..=1.0).text("Direction Z"));
}

fn render_noise_section(ui: &mut egui::Ui, config: &mut WindFieldConfig) {
    ui.label("Noise");
    let noise = &mut config.noise;
    ui.horizontal(|ui| {
        ui.selectable_value(&mut noise.mode, NoiseMode::Procedural, "Procedural");
        ui.selectable_value(&mut noise.mode, NoiseMode::Texture, "Texture");
    });
    ui.push_id("noise", |ui| {
        ui.add(egui::Slider::new(&mut noise.intensity, 0.0..=5.0).step_by(0.05).text("Intensity"));
        ui.add(egui::Slider::new(&mut noise.scroll_speed, 0.0..=10.0).step_by(0.1).text("Scroll speed"));
        let mut frequency = noise.position_frequency.x;
        if ui
            .add(egui::Slider::new(&mut frequency, 0.01..=1.0).text("Frequency"))
            .changed()
        {
            noise.position_frequency = bevy::math::Vec3::splat(frequency);
        }
    });
}
