use super::components::{ParticleAssets, WindParticle, WindParticleSettings};
use super::logic::{fade_factor, is_outside_volume, random_lifetime, random_point_in_volume};
use bevy::prelude::*;
use bevy_windfield::WindVolume;
use rand::Rng;

pub fn setup_particle_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(1.0, 1.0, 0.8),
        emissive: LinearRgba::rgb(1.0, 1.0, 0.8) * 2.0,
        ..default()
    });
    commands.insert_resource(ParticleAssets {
        mesh: meshes.add(Sphere::new(1.0).mesh().uv(8, 6)),
        material,
    });
}

fn respawn_particle(
    particle: &mut WindParticle,
    transform: &mut Transform,
    settings: &WindParticleSettings,
    volume: &WindVolume,
    rng: &mut impl Rng,
) {
    let field = volume.field();
    let position = random_point_in_volume(rng, field.center(), field.extent());
    particle.velocity = volume.sample(position);
    particle.lifetime = random_lifetime(rng, settings.lifespan);
    particle.age = 0.0;
    transform.translation = position;
}

/// Spawn or despawn particles until the live count matches the settings
pub fn sync_particle_count(
    mut commands: Commands,
    settings: Res<WindParticleSettings>,
    assets: Option<Res<ParticleAssets>>,
    volume: Res<WindVolume>,
    particles: Query<Entity, With<WindParticle>>,
) {
    let Some(assets) = assets else {
        return;
    };
    let target = if settings.enabled { settings.count } else { 0 };
    let live = particles.iter().count();
    if live > target {
        for entity in particles.iter().take(live - target) {
            commands.entity(entity).despawn();
        }
        return;
    }
    if live == target {
        return;
    }

    let field = volume.field();
    let mut rng = rand::rng();
    for _ in live..target {
        let position = random_point_in_volume(&mut rng, field.center(), field.extent());
        let lifetime = random_lifetime(&mut rng, settings.lifespan);
        // staggered start so the tracers do not all respawn together
        let age = rng.random_range(0.0..lifetime);
        commands.spawn((
            Mesh3d(assets.mesh.clone()),
            MeshMaterial3d(assets.material.clone()),
            Transform::from_translation(position).with_scale(Vec3::splat(settings.size)),
            WindParticle {
                velocity: volume.sample(position),
                age,
                lifetime,
            },
        ));
    }
    debug!("Wind particles: {} -> {}", live, target);
}

/// Move particles along the sampled wind and respawn the expired or escaped ones
pub fn update_particles(
    mut particles: Query<(&mut Transform, &mut WindParticle)>,
    time: Res<Time>,
    settings: Res<WindParticleSettings>,
    volume: Res<WindVolume>,
) {
    if !settings.enabled {
        return;
    }

    let delta = time.delta_secs();
    let field = volume.field();
    let mut rng = rand::rng();

    for (mut transform, mut particle) in &mut particles {
        particle.age += delta;

        if particle.age >= particle.lifetime
            || is_outside_volume(transform.translation, field.center(), field.extent())
        {
            respawn_particle(&mut particle, &mut transform, &settings, &volume, &mut rng);
            continue;
        }

        particle.velocity = field.sample(transform.translation);
        transform.translation += particle.velocity * delta;
    }
}

/// Shrink particles in and out instead of fading a per-particle material
pub fn update_particle_fade(
    mut particles: Query<(&WindParticle, &mut Transform)>,
    settings: Res<WindParticleSettings>,
) {
    if !settings.enabled {
        return;
    }

    for (particle, mut transform) in &mut particles {
        let fade = fade_factor(
            particle.age,
            particle.lifetime,
            settings.fade_in_duration,
            settings.fade_out_duration,
        );
        transform.scale = Vec3::splat(settings.size * fade);
    }
}
