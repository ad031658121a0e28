use bevy::math::{Quat, Vec3};

pub const BASE_SPEED: f32 = 8.0;
pub const SPRINT_MULTIPLIER: f32 = 4.0;
const MOUSE_SENSITIVITY: f32 = 0.002;
const WHEEL_STEP: f32 = 0.5;
/// Keeps the camera from flipping over the vertical axis
const MAX_PITCH: f32 = 1.5;

pub struct CameraInput {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub sprint: bool,
    pub mouse_right_pressed: bool,
    pub mouse_delta: Vec3,
    pub mouse_wheel_delta: f32,
}

impl Default for CameraInput {
    fn default() -> Self {
        Self {
            move_forward: false,
            move_backward: false,
            move_left: false,
            move_right: false,
            move_up: false,
            move_down: false,
            sprint: false,
            mouse_right_pressed: false,
            mouse_delta: Vec3::ZERO,
            mouse_wheel_delta: 0.0,
        }
    }
}

pub struct CameraTransformUpdate {
    pub translation: Vec3,
    pub rotation: Quat,
}

/// Fly camera step. Vertical movement follows the world Y axis so the wind
/// volume can be dragged up and down without tilting the view.
pub fn calculate_camera_transform(
    current_translation: Vec3,
    current_rotation: Quat,
    input: &CameraInput,
    delta_time: f32,
) -> CameraTransformUpdate {
    let mut translation = current_translation;
    let mut rotation = current_rotation;

    let mut speed = BASE_SPEED;
    if input.sprint {
        speed *= SPRINT_MULTIPLIER;
    }

    let forward = rotation.mul_vec3(Vec3::NEG_Z);
    let right = rotation.mul_vec3(Vec3::X);
    let mut dir = Vec3::ZERO;

    if input.move_forward {
        dir += forward;
    }
    if input.move_backward {
        dir -= forward;
    }
    if input.move_left {
        dir -= right;
    }
    if input.move_right {
        dir += right;
    }
    if input.move_up {
        dir += Vec3::Y;
    }
    if input.move_down {
        dir -= Vec3::Y;
    }
    if dir.length_squared() > 0.0 {
        translation += dir.normalize() * speed * delta_time;
    }

    if input.mouse_right_pressed && input.mouse_delta.length_squared() > 0.0 {
        let (yaw, pitch, _) = rotation.to_euler(bevy::math::EulerRot::YXZ);
        let yaw = yaw - input.mouse_delta.x * MOUSE_SENSITIVITY;
        let pitch = (pitch - input.mouse_delta.y * MOUSE_SENSITIVITY).clamp(-MAX_PITCH, MAX_PITCH);
        rotation = Quat::from_euler(bevy::math::EulerRot::YXZ, yaw, pitch, 0.0);
    }

    if input.mouse_wheel_delta.abs() > 0.0 {
        translation += forward * input.mouse_wheel_delta * WHEEL_STEP;
    }

    CameraTransformUpdate {
        translation,
        rotation,
    }
}
