use super::components::Spinner;
use bevy::prelude::*;
use bevy_windfield::WindSource;
use windfield::{ContributorShape, VelocitySpace, WindCalculation};

fn source_material(color: Color) -> StandardMaterial {
    StandardMaterial {
        base_color: color.with_alpha(0.18),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    }
}

pub fn spawn_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(200.0, 200.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.32, 0.4, 0.3))),
        Transform::from_xyz(0.0, -0.01, 0.0),
    ));

    // Fan: a spinning box blowing along its local X axis
    let half_extents = Vec3::new(3.0, 1.5, 1.5);
    commands.spawn((
        Name::new("Fan"),
        WindSource::new(
            ContributorShape::Box { half_extents },
            WindCalculation::Fixed {
                velocity: Vec3::X * 6.0,
                space: VelocitySpace::Local,
            },
        ),
        Spinner { speed: 0.4 },
        Mesh3d(meshes.add(Cuboid::from_size(half_extents * 2.0))),
        MeshMaterial3d(materials.add(source_material(Color::srgb(0.9, 0.5, 0.2)))),
        Transform::from_xyz(-8.0, 2.0, 0.0),
    ));

    // Blast: pushes air away from its centre
    commands.spawn((
        Name::new("Blast"),
        WindSource::new(
            ContributorShape::Sphere { radius: 4.0 },
            WindCalculation::Point {
                center_local: Vec3::ZERO,
                max_speed: 8.0,
                decay: 0.3,
            },
        ),
        Mesh3d(meshes.add(Sphere::new(4.0).mesh().uv(32, 16))),
        MeshMaterial3d(materials.add(source_material(Color::srgb(0.9, 0.2, 0.2)))),
        Transform::from_xyz(8.0, 3.0, -4.0),
    ));

    // Twister
    commands.spawn((
        Name::new("Twister"),
        WindSource::new(
            ContributorShape::Cylinder {
                radius: 5.0,
                half_height: 6.0,
            },
            WindCalculation::AxisVortex {
                axis_point_local: Vec3::ZERO,
                axis_direction_local: Vec3::Y,
                decay: 0.2,
                multiplier: 7.0,
            },
        ),
        Mesh3d(meshes.add(Cylinder::new(5.0, 12.0))),
        MeshMaterial3d(materials.add(source_material(Color::srgb(0.3, 0.5, 0.9)))),
        Transform::from_xyz(2.0, 6.0, 8.0),
    ));

    info!("Wind scene spawned");
}

pub fn spin_sources(time: Res<Time>, mut spinners: Query<(&Spinner, &mut Transform)>) {
    for (spinner, mut transform) in &mut spinners {
        transform.rotate_local_y(spinner.speed * time.delta_secs());
    }
}
