use bevy::math::Vec3;
use rand::Rng;

/// Uniform point inside the axis-aligned box of size `extent` centred on `center`
pub fn random_point_in_volume(rng: &mut impl Rng, center: Vec3, extent: Vec3) -> Vec3 {
    let unit = Vec3::new(rng.random(), rng.random(), rng.random());
    center + (unit - 0.5) * extent
}

/// Lifespan with a ±20% variation
pub fn random_lifetime(rng: &mut impl Rng, lifespan: f32) -> f32 {
    lifespan * rng.random_range(0.8..1.2)
}

pub fn is_outside_volume(position: Vec3, center: Vec3, extent: Vec3) -> bool {
    ((position - center).abs() - extent * 0.5).max_element() > 0.0
}

/// Combined fade-in and fade-out factor in [0, 1]
pub fn fade_factor(age: f32, lifetime: f32, fade_in: f32, fade_out: f32) -> f32 {
    let fade_in_progress = if fade_in > 0.0 {
        (age / fade_in).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let fade_out_progress = if fade_out > 0.0 {
        ((lifetime - age) / fade_out).clamp(0.0, 1.0)
    } else {
        1.0
    };
    fade_in_progress.min(fade_out_progress)
}
