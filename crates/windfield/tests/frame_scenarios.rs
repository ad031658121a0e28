use glam::Vec3;
use rstest::rstest;
use windfield::config::NoiseMode;
use windfield::noise::NoiseTexture;
use windfield::{
    ContributorId, ContributorShape, ContributorTransform, FrameOutcome, GridResolution,
    VelocitySpace, WindCalculation, WindContributor, WindFieldConfig, WindSimulator,
};

const QUANTUM: f32 = 1.0 / 4096.0;
/// Exported voxels are half precision
const HALF_TOLERANCE: f32 = 1e-3;
const AMBIENT: Vec3 = Vec3::new(0.0, 0.0, 0.25);

fn config() -> WindFieldConfig {
    let mut config = WindFieldConfig::default();
    config.volume.resolution = GridResolution::new(4, 4, 4);
    config.volume.voxel_size = 1.0;
    config.diffusion.enabled = false;
    config.advection.enabled = false;
    config.ambient.direction = Vec3::Z;
    config.ambient.intensity = AMBIENT.z;
    config.noise.seed = Some(99);
    config
}

/// Box covering exactly the voxel (2, 2, 2) of a 4x4x4 grid centred at the origin
fn box_over_voxel(id: u64, velocity: Vec3) -> WindContributor {
    WindContributor::new(
        ContributorId(id),
        ContributorShape::Box {
            half_extents: Vec3::splat(0.5),
        },
        WindCalculation::Fixed {
            velocity,
            space: VelocitySpace::World,
        },
    )
    .with_transform(ContributorTransform::from_translation(Vec3::splat(0.5)))
}

fn voxel_centre(x: i32, y: i32, z: i32) -> Vec3 {
    Vec3::new(x as f32, y as f32, z as f32) - Vec3::splat(1.5)
}

fn assert_near(actual: Vec3, expected: Vec3, tolerance: f32) {
    assert!(
        (actual - expected).abs().max_element() <= tolerance,
        "{} is not within {} of {}",
        actual,
        tolerance,
        expected
    );
}

#[test]
fn fixed_box_over_one_voxel() {
    let mut sim = WindSimulator::init(config()).unwrap();
    sim.register(box_over_voxel(1, Vec3::X)).unwrap();
    sim.advance_frame(Vec3::ZERO, 1.0 / 60.0);

    assert_eq!(sim.last_frame(), Some(&FrameOutcome::Simulated));
    assert_near(sim.sample(voxel_centre(2, 2, 2)), Vec3::X + AMBIENT, 2.0 * QUANTUM);
    for (x, y, z) in [(0, 0, 0), (1, 2, 2), (3, 2, 2), (2, 1, 2), (2, 2, 3)] {
        assert_near(sim.sample(voxel_centre(x, y, z)), AMBIENT, QUANTUM);
    }
}

#[test]
fn opposite_fixed_velocities_cancel() {
    let mut sim = WindSimulator::init(config()).unwrap();
    sim.register(box_over_voxel(1, Vec3::new(1.0, 2.0, -3.0))).unwrap();
    sim.register(box_over_voxel(2, Vec3::new(-1.0, -2.0, 3.0))).unwrap();
    sim.advance_frame(Vec3::ZERO, 1.0 / 60.0);

    assert_near(sim.sample(voxel_centre(2, 2, 2)), AMBIENT, QUANTUM);
}

#[test]
fn vortex_with_zero_multiplier_contributes_nothing() {
    let mut sim = WindSimulator::init(config()).unwrap();
    sim.register(WindContributor::new(
        ContributorId(1),
        ContributorShape::Cylinder {
            radius: 5.0,
            half_height: 5.0,
        },
        WindCalculation::AxisVortex {
            axis_point_local: Vec3::ZERO,
            axis_direction_local: Vec3::Y,
            decay: 0.0,
            multiplier: 0.0,
        },
    ))
    .unwrap();
    sim.advance_frame(Vec3::ZERO, 1.0 / 60.0);

    for index in 0..64 {
        let p = GridResolution::new(4, 4, 4).coords(index);
        assert_near(sim.sample(voxel_centre(p.x, p.y, p.z)), AMBIENT, QUANTUM);
    }
}

#[test]
fn register_then_unregister_equals_never_registering() {
    let mut noisy = config();
    noisy.noise.intensity = 0.5;
    noisy.diffusion.enabled = true;

    let mut untouched = WindSimulator::init(noisy.clone()).unwrap();
    let mut churned = WindSimulator::init(noisy).unwrap();
    let handle = churned
        .register(box_over_voxel(1, Vec3::X))
        .unwrap()
        .handle()
        .unwrap();
    churned.unregister(handle);

    untouched.advance_frame(Vec3::ZERO, 0.1);
    churned.advance_frame(Vec3::ZERO, 0.1);
    assert_eq!(*untouched.field(), *churned.field());
}

#[rstest]
#[case(Vec3::new(-50.0, 0.5, 0.5), voxel_centre(0, 2, 2))]
#[case(Vec3::new(50.0, 0.5, 0.5), voxel_centre(3, 2, 2))]
#[case(Vec3::new(0.5, 0.5, 1e6), voxel_centre(2, 2, 3))]
fn sampling_outside_clamps_to_edge(#[case] outside: Vec3, #[case] edge: Vec3) {
    let mut config = config();
    config.noise.intensity = 1.0;
    let mut sim = WindSimulator::init(config).unwrap();
    sim.advance_frame(Vec3::ZERO, 0.1);

    assert_eq!(sim.sample(outside), sim.sample(edge));
}

#[test]
fn disabled_contributor_is_excluded_while_registered() {
    let mut sim = WindSimulator::init(config()).unwrap();
    let handle = sim
        .register(box_over_voxel(1, Vec3::X))
        .unwrap()
        .handle()
        .unwrap();
    sim.update(handle, box_over_voxel(1, Vec3::X).with_enabled(false))
        .unwrap();
    sim.advance_frame(Vec3::ZERO, 0.1);

    assert_eq!(sim.registry().len(), 1);
    assert_near(sim.sample(voxel_centre(2, 2, 2)), AMBIENT, QUANTUM);
}

#[test]
fn zero_diffusion_iterations_match_disabled_diffusion() {
    let mut disabled = config();
    disabled.noise.intensity = 0.3;
    let mut zero = disabled.clone();
    zero.diffusion.enabled = true;
    zero.diffusion.iterations = 0;

    let mut a = WindSimulator::init(disabled).unwrap();
    let mut b = WindSimulator::init(zero).unwrap();
    for sim in [&mut a, &mut b] {
        sim.register(box_over_voxel(1, Vec3::new(0.3, -1.0, 2.0))).unwrap();
        sim.advance_frame(Vec3::ZERO, 0.1);
    }
    assert_eq!(*a.field(), *b.field());
}

#[rstest]
#[case::advection_recentring(false)]
#[case::inheritance_shift(true)]
fn wind_stays_in_world_space_when_volume_moves(#[case] inheritance: bool) {
    let mut config = config();
    config.ambient.intensity = 0.0;
    config.advection.enabled = true;
    config.advection.attenuation = 0.1;
    config.inheritance.enabled = inheritance;

    let mut sim = WindSimulator::init(config).unwrap();
    let handle = sim
        .register(box_over_voxel(1, Vec3::X))
        .unwrap()
        .handle()
        .unwrap();
    // zero delta time keeps velocity transport out of the picture
    sim.advance_frame(Vec3::ZERO, 0.0);
    let injected = sim.sample(Vec3::splat(0.5));
    sim.unregister(handle);

    sim.advance_frame(Vec3::new(1.0, 0.0, 0.0), 0.0);
    let carried = sim.sample(Vec3::splat(0.5));
    assert_near(carried, injected * 0.9, HALF_TOLERANCE);
    assert_near(sim.sample(Vec3::new(1.5, 0.5, 0.5)), Vec3::ZERO, QUANTUM);
}

#[test]
fn advection_carries_field_across_frames() {
    let mut config = config();
    config.ambient.intensity = 0.0;
    config.advection.enabled = true;
    config.advection.attenuation = 0.5;

    let mut sim = WindSimulator::init(config).unwrap();
    let handle = sim
        .register(box_over_voxel(1, Vec3::X))
        .unwrap()
        .handle()
        .unwrap();
    sim.advance_frame(Vec3::ZERO, 0.0);
    sim.unregister(handle);
    sim.advance_frame(Vec3::ZERO, 0.0);
    sim.advance_frame(Vec3::ZERO, 0.0);

    // one advection pass per later frame at half attenuation: 0.5^2
    assert_near(sim.sample(voxel_centre(2, 2, 2)), Vec3::X * 0.25, QUANTUM);
}

#[rstest]
#[case::advection_recentring(false)]
#[case::inheritance_shift(true)]
fn quarter_voxel_moves_keep_wind_in_place(#[case] inheritance: bool) {
    let mut config = config();
    config.ambient.intensity = 0.0;
    config.advection.enabled = true;
    config.advection.attenuation = 0.1;
    config.inheritance.enabled = inheritance;

    let mut sim = WindSimulator::init(config).unwrap();
    let handle = sim
        .register(box_over_voxel(1, Vec3::X))
        .unwrap()
        .handle()
        .unwrap();
    sim.advance_frame(Vec3::ZERO, 0.0);
    sim.unregister(handle);

    let mut center = Vec3::ZERO;
    for _ in 0..8 {
        center.x += 0.25;
        sim.advance_frame(center, 0.0);
    }

    // two whole voxels later the wind is still at its world point
    assert_eq!(sim.field().center(), Vec3::new(2.0, 0.0, 0.0));
    assert_near(sim.sample(Vec3::splat(0.5)), Vec3::X * 0.9f32.powi(8), 2.0 * HALF_TOLERANCE);
    assert_near(sim.sample(Vec3::new(2.5, 0.5, 0.5)), Vec3::ZERO, QUANTUM);
}

#[test]
fn wind_travels_downstream_at_sixty_frames_per_second() {
    let mut config = config();
    config.volume.resolution = GridResolution::new(8, 4, 4);
    config.ambient.intensity = 0.0;
    config.advection.enabled = true;

    let mut sim = WindSimulator::init(config).unwrap();
    // box over the voxel (1, 2, 2) of the 8x4x4 grid
    sim.register(
        box_over_voxel(1, Vec3::X * 10.0)
            .with_transform(ContributorTransform::from_translation(Vec3::new(-2.5, 0.5, 0.5))),
    )
    .unwrap();
    for _ in 0..30 {
        sim.advance_frame(Vec3::ZERO, 1.0 / 60.0);
    }

    let along: Vec<f32> = (0..8)
        .map(|x| sim.sample(Vec3::new(x as f32 - 3.5, 0.5, 0.5)).x)
        .collect();
    assert!((along[1] - 10.0).abs() <= HALF_TOLERANCE * 10.0, "{:?}", along);
    assert!(along[0].abs() <= QUANTUM, "{:?}", along);
    assert!(along[3] > 4.0 && along[3] < 5.0, "{:?}", along);
    assert!(along[4] > 1.0, "{:?}", along);
    assert!(along[1..6].windows(2).all(|w| w[0] > w[1]), "{:?}", along);
}

#[test]
fn fixed_source_holds_its_velocity_in_steady_state() {
    let mut config = config();
    config.ambient.intensity = 0.0;
    config.advection = Default::default();

    let mut sim = WindSimulator::init(config).unwrap();
    sim.register(box_over_voxel(1, Vec3::X)).unwrap();
    for _ in 0..120 {
        sim.advance_frame(Vec3::ZERO, 1.0 / 60.0);
    }

    assert_near(sim.sample(voxel_centre(2, 2, 2)), Vec3::X, HALF_TOLERANCE);
    // carried wind spills downstream only
    assert!(sim.sample(voxel_centre(3, 2, 2)).x > 0.0);
    assert_near(sim.sample(voxel_centre(1, 2, 2)), Vec3::ZERO, QUANTUM);
}

#[test]
fn skipped_frame_retains_previous_field() {
    let mut config = config();
    config.limits.max_records_per_buffer = 2;
    let mut sim = WindSimulator::init(config).unwrap();
    sim.register(box_over_voxel(1, Vec3::X)).unwrap();
    sim.advance_frame(Vec3::ZERO, 0.1);
    let before = sim.field();

    for id in 2..=3 {
        sim.register(box_over_voxel(id, Vec3::Y)).unwrap();
    }
    sim.advance_frame(Vec3::new(3.0, 0.0, 0.0), 0.1);

    assert!(matches!(sim.last_frame(), Some(FrameOutcome::Skipped { .. })));
    assert_eq!(*sim.field(), *before);
    assert_near(sim.sample(voxel_centre(2, 2, 2)), Vec3::X + AMBIENT, 2.0 * QUANTUM);
}

#[test]
fn texture_noise_is_added_on_export() {
    let mut config = config();
    config.ambient.intensity = 0.0;
    config.noise.mode = NoiseMode::Texture;
    config.noise.intensity = 2.0;
    let mut sim = WindSimulator::init(config).unwrap();

    // no texture bound yet
    sim.advance_frame(Vec3::ZERO, 0.1);
    assert_eq!(sim.sample(Vec3::ZERO), Vec3::ZERO);

    let texture = NoiseTexture::from_texels(1, 1, vec![[0.75, 0.5, 0.25]]).unwrap();
    sim.set_noise_texture(Some(texture));
    sim.advance_frame(Vec3::ZERO, 0.1);
    assert_near(sim.sample(Vec3::new(0.7, -1.2, 0.3)), Vec3::new(1.0, 0.0, -1.0), 1e-3);
}
