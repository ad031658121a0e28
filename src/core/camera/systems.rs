use crate::core::camera::components::MainCamera;
use crate::core::camera::logic::{CameraInput, calculate_camera_transform};
use bevy::input::ButtonInput;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::light::DirectionalLight;
use bevy::log::info;
use bevy::math::{EulerRot, Quat, Vec3};
use bevy::prelude::*;
use bevy_windfield::WindVolumeAnchor;
use std::f32::consts::PI;

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 6.0, 24.0).looking_at(Vec3::new(0.0, 2.0, 0.0), Vec3::Y),
        MainCamera,
        WindVolumeAnchor,
    ));

    commands.spawn((
        Transform::from_rotation(Quat::from_euler(EulerRot::ZYX, 0.0, 1.0, -PI / 4.)),
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
    ));

    info!("Camera spawned");
}

pub fn camera_control(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mouse_input: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    time: Res<Time>,
    mut camera_q: Query<&mut Transform, With<MainCamera>>,
) {
    let dt = time.delta_secs();
    let Ok(mut transform) = camera_q.single_mut() else {
        return;
    };

    let mut total_mouse_delta = Vec3::ZERO;
    for ev in mouse_motion.read() {
        total_mouse_delta.x += ev.delta.x;
        total_mouse_delta.y += ev.delta.y;
    }

    let mut total_wheel_delta = 0.0;
    for ev in mouse_wheel.read() {
        total_wheel_delta += ev.y;
    }

    let input = CameraInput {
        move_forward: keyboard_input.pressed(KeyCode::KeyW),
        move_backward: keyboard_input.pressed(KeyCode::KeyS),
        move_left: keyboard_input.pressed(KeyCode::KeyA),
        move_right: keyboard_input.pressed(KeyCode::KeyD),
        move_up: keyboard_input.pressed(KeyCode::KeyE),
        move_down: keyboard_input.pressed(KeyCode::KeyQ),
        sprint: keyboard_input.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]),
        mouse_right_pressed: mouse_input.pressed(MouseButton::Right),
        mouse_delta: total_mouse_delta,
        mouse_wheel_delta: total_wheel_delta,
    };

    let update = calculate_camera_transform(transform.translation, transform.rotation, &input, dt);

    transform.translation = update.translation;
    transform.rotation = update.rotation;
}
