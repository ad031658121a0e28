use std::sync::atomic::{AtomicBool, Ordering};

use glam::{IVec3, Mat4, Vec3, Vec3Swizzles};
use rayon::prelude::*;

use crate::buffers::ContributorBuffers;
use crate::contributor::params::*;
use crate::contributor::CalculationKind;
use crate::fixed_point;
use crate::grid::{AccumulationBuffer, BufferCopy, GridResolution, VoxelGrid3D};

/// Tolerance on shape boundaries so voxels sitting exactly on a face are included
const SHAPE_EPSILON: f32 = 1e-4;

/// Placement of the volume for this frame
#[derive(Debug, Clone, Copy)]
struct Volume {
    resolution: GridResolution,
    voxel_size: f32,
    center: Vec3,
}

impl Volume {
    /// Voxel coordinate range whose centres can lie inside a world-space box
    fn voxel_range(&self, min: Vec3, max: Vec3) -> Option<(IVec3, IVec3)> {
        let slack = Vec3::splat(SHAPE_EPSILON);
        let lo = self
            .resolution
            .continuous_coords(min - self.center, self.voxel_size)
            - slack;
        let hi = self
            .resolution
            .continuous_coords(max - self.center, self.voxel_size)
            + slack;
        let lo = lo.ceil().max(Vec3::ZERO).as_ivec3();
        let hi = hi.floor().min(self.resolution.max_coords().as_vec3()).as_ivec3();
        lo.cmple(hi).all().then_some((lo, hi))
    }

    fn for_each_voxel(&self, min: Vec3, max: Vec3, mut f: impl FnMut(usize, Vec3)) {
        let Some((lo, hi)) = self.voxel_range(min, max) else {
            return;
        };
        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    let coords = IVec3::new(x, y, z);
                    let position =
                        self.center + self.resolution.centered_offset(coords) * self.voxel_size;
                    f(self.resolution.index_of(coords), position);
                }
            }
        }
    }
}

/// World-space bounds of a local box `[-half, half]` placed by `local_to_world`
fn world_bounds(local_to_world: Mat4, half: Vec3) -> (Vec3, Vec3) {
    let center = local_to_world.transform_point3(Vec3::ZERO);
    let reach = local_to_world.x_axis.truncate().abs() * half.x
        + local_to_world.y_axis.truncate().abs() * half.y
        + local_to_world.z_axis.truncate().abs() * half.z;
    (center - reach, center + reach)
}

/// Calculation buffers for this frame
#[derive(Clone, Copy)]
struct Calculations<'a> {
    fixed: &'a [FixedCalculationParams],
    points: &'a [PointCalculationParams],
    axes: &'a [AxisCalculationParams],
}

impl Calculations<'_> {
    fn velocity(&self, calculation_type: u32, index: u32, position: Vec3) -> Vec3 {
        let index = index as usize;
        let velocity = match CalculationKind::from_tag(calculation_type) {
            Some(CalculationKind::Fixed) => self.fixed.get(index).map(|c| c.velocity()),
            Some(CalculationKind::Point) => self.points.get(index).map(|c| c.velocity_at(position)),
            Some(CalculationKind::AxisVortex) => {
                self.axes.get(index).map(|c| c.velocity_at(position))
            }
            None => None,
        };
        velocity.unwrap_or(Vec3::ZERO)
    }
}

/// Fresh sums for this frame plus the voxels they reached
struct Deposits<'a> {
    target: &'a AccumulationBuffer,
    covered: Vec<AtomicBool>,
}

impl Deposits<'_> {
    fn add(&self, index: usize, velocity: Vec3) {
        let encoded = fixed_point::encode_vec3(velocity);
        if encoded != [0, 0, 0] {
            self.target.add(index, encoded);
            self.covered[index].store(true, Ordering::Relaxed);
        }
    }
}

/// Rasterize every shape record and replace the carried field where shapes deposit.
///
/// Shape sums are accumulated with atomic adds into a zeroed copy, so the result
/// does not depend on record order. Voxels no shape reached keep the carried value.
pub fn run(grid: &mut VoxelGrid3D, center: Vec3, buffers: &ContributorBuffers) {
    let volume = Volume {
        resolution: grid.resolution(),
        voxel_size: grid.voxel_size(),
        center,
    };
    let calculations = Calculations {
        fixed: buffers.fixed.as_slice(),
        points: buffers.points.as_slice(),
        axes: buffers.axes.as_slice(),
    };

    grid.swap();
    grid.clear(BufferCopy::Current);
    let (carried, current) = grid.split_mut();
    let deposits = Deposits {
        target: &*current,
        covered: (0..volume.resolution.voxel_count())
            .map(|_| AtomicBool::new(false))
            .collect(),
    };
    rasterize(&volume, &calculations, buffers, &deposits);

    let covered: Vec<bool> = deposits.covered.into_iter().map(AtomicBool::into_inner).collect();
    for (dst, src) in current.channels_mut().into_iter().zip(carried.channels()) {
        dst.par_iter_mut()
            .zip(covered.par_iter())
            .enumerate()
            .for_each(|(index, (out, reached))| {
                if !reached {
                    *out.get_mut() = src[index].load(Ordering::Relaxed);
                }
            });
    }
}

fn rasterize(
    volume: &Volume,
    calculations: &Calculations,
    buffers: &ContributorBuffers,
    deposits: &Deposits,
) {
    buffers.boxes.as_slice().par_iter().for_each(|record| {
        let world_to_local = record.world_to_local();
        let half = record.half_extents();
        let (min, max) = world_bounds(world_to_local.inverse(), half);
        let limit = half + Vec3::splat(SHAPE_EPSILON);
        volume.for_each_voxel(min, max, |index, position| {
            let local = world_to_local.transform_point3(position);
            if local.abs().cmple(limit).all() {
                let v = calculations.velocity(record.calculation_type, record.calculation_index, position);
                deposits.add(index, v);
            }
        });
    });

    buffers.spheres.as_slice().par_iter().for_each(|record| {
        let center = record.center();
        let radius = record.radius_squared.sqrt();
        let reach = Vec3::splat(radius);
        volume.for_each_voxel(center - reach, center + reach, |index, position| {
            if position.distance_squared(center) <= record.radius_squared + SHAPE_EPSILON {
                let v = calculations.velocity(record.calculation_type, record.calculation_index, position);
                deposits.add(index, v);
            }
        });
    });

    buffers.cylinders.as_slice().par_iter().for_each(|record| {
        let world_to_local = record.world_to_local();
        let radius = record.radius_squared.sqrt();
        let half = Vec3::new(radius, record.half_height, radius);
        let (min, max) = world_bounds(world_to_local.inverse(), half);
        volume.for_each_voxel(min, max, |index, position| {
            let local = world_to_local.transform_point3(position);
            let inside = local.xz().length_squared() <= record.radius_squared + SHAPE_EPSILON
                && local.y.abs() <= record.half_height + SHAPE_EPSILON;
            if inside {
                let v = calculations.velocity(record.calculation_type, record.calculation_index, position);
                deposits.add(index, v);
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contributor::{
        ContributorId, ContributorRegistry, ContributorShape, ContributorTransform, VelocitySpace,
        WindCalculation, WindContributor,
    };

    fn inject(res: GridResolution, contributors: &[WindContributor]) -> VoxelGrid3D {
        let mut grid = VoxelGrid3D::try_new(res, 1.0).unwrap();
        let mut registry = ContributorRegistry::new();
        for c in contributors {
            registry.register(*c).unwrap();
        }
        let mut buffers = ContributorBuffers::new(64);
        buffers.upload(&registry.snapshot()).unwrap();
        run(&mut grid, Vec3::ZERO, &buffers);
        grid
    }

    fn fixed_box(id: u64, at: Vec3, velocity: Vec3) -> WindContributor {
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
        .with_transform(ContributorTransform::from_translation(at))
    }

    #[test]
    fn test_fixed_box_injects_exact_vector_into_one_voxel() {
        let res = GridResolution::new(4, 4, 4);
        let grid = inject(res, &[fixed_box(1, Vec3::splat(0.5), Vec3::new(1.0, 0.0, 0.0))]);

        let hit = res.index(2, 2, 2);
        assert_eq!(grid.current().load(hit), fixed_point::encode_vec3(Vec3::X));
        let touched = (0..res.voxel_count())
            .filter(|i| grid.current().load(*i) != [0, 0, 0])
            .count();
        assert_eq!(touched, 1);
        // the carried copy is only read
        assert_eq!(grid.previous().load(hit), [0, 0, 0]);
    }

    #[test]
    fn test_opposite_fixed_velocities_cancel() {
        let res = GridResolution::new(4, 4, 4);
        let grid = inject(
            res,
            &[
                fixed_box(1, Vec3::splat(0.5), Vec3::new(0.7, -0.2, 1.3)),
                fixed_box(2, Vec3::splat(0.5), Vec3::new(-0.7, 0.2, -1.3)),
            ],
        );
        assert_eq!(grid.current().load(res.index(2, 2, 2)), [0, 0, 0]);
    }

    #[test]
    fn test_sphere_covers_voxels_within_radius() {
        let res = GridResolution::new(5, 5, 5);
        let sphere = WindContributor::new(
            ContributorId(1),
            ContributorShape::Sphere { radius: 1.0 },
            WindCalculation::Fixed {
                velocity: Vec3::Y,
                space: VelocitySpace::World,
            },
        );
        let grid = inject(res, &[sphere]);
        // centre voxel plus its six face neighbours
        let touched = (0..res.voxel_count())
            .filter(|i| grid.current().load(*i) != [0, 0, 0])
            .count();
        assert_eq!(touched, 7);
        assert_eq!(grid.velocity(res.index(2, 2, 2)), Vec3::Y);
        assert_eq!(grid.velocity(res.index(1, 1, 2)), Vec3::ZERO);
    }

    #[test]
    fn test_cylinder_is_bounded_by_height_and_radius() {
        let res = GridResolution::new(5, 5, 5);
        let cylinder = WindContributor::new(
            ContributorId(1),
            ContributorShape::Cylinder {
                radius: 0.5,
                half_height: 1.0,
            },
            WindCalculation::Fixed {
                velocity: Vec3::Z,
                space: VelocitySpace::World,
            },
        );
        let grid = inject(res, &[cylinder]);
        // a column of three voxels along y
        for y in 1..=3 {
            assert_eq!(grid.velocity(res.index(2, y, 2)), Vec3::Z);
        }
        assert_eq!(grid.velocity(res.index(2, 0, 2)), Vec3::ZERO);
        assert_eq!(grid.velocity(res.index(3, 2, 2)), Vec3::ZERO);
    }

    #[test]
    fn test_vortex_with_zero_multiplier_contributes_nothing() {
        let res = GridResolution::new(4, 4, 4);
        let vortex = WindContributor::new(
            ContributorId(1),
            ContributorShape::Sphere { radius: 10.0 },
            WindCalculation::AxisVortex {
                axis_point_local: Vec3::ZERO,
                axis_direction_local: Vec3::Y,
                decay: 0.2,
                multiplier: 0.0,
            },
        );
        let grid = inject(res, &[vortex]);
        assert!((0..res.voxel_count()).all(|i| grid.current().load(i) == [0, 0, 0]));
    }

    #[test]
    fn test_rotated_box_uses_local_extents() {
        let res = GridResolution::new(5, 5, 5);
        let long_box = WindContributor::new(
            ContributorId(1),
            ContributorShape::Box {
                half_extents: Vec3::new(2.0, 0.4, 0.4),
            },
            WindCalculation::Fixed {
                velocity: Vec3::X,
                space: VelocitySpace::World,
            },
        )
        .with_transform(
            ContributorTransform::IDENTITY
                .with_rotation(glam::Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
        );
        let grid = inject(res, &[long_box]);
        // the long axis now runs along z
        for z in 0..5 {
            assert_eq!(grid.velocity(res.index(2, 2, z)), Vec3::X);
        }
        assert_eq!(grid.velocity(res.index(1, 2, 2)), Vec3::ZERO);
    }

    #[test]
    fn test_shape_outside_volume_is_ignored() {
        let res = GridResolution::new(4, 4, 4);
        let grid = inject(res, &[fixed_box(1, Vec3::splat(50.0), Vec3::X)]);
        assert!((0..res.voxel_count()).all(|i| grid.current().load(i) == [0, 0, 0]));
    }

    #[test]
    fn test_shapes_replace_the_carried_field() {
        let res = GridResolution::new(4, 4, 4);
        let mut grid = VoxelGrid3D::try_new(res, 1.0).unwrap();
        let inside = res.index(2, 2, 2);
        let outside = res.index(0, 1, 3);
        for index in [inside, outside] {
            grid.current().add(index, fixed_point::encode_vec3(Vec3::new(0.0, 3.0, 0.0)));
        }

        let mut registry = ContributorRegistry::new();
        registry.register(fixed_box(1, Vec3::splat(0.5), Vec3::X)).unwrap();
        let mut buffers = ContributorBuffers::new(64);
        buffers.upload(&registry.snapshot()).unwrap();

        // repeated frames settle on the configured vector instead of piling up
        for _ in 0..3 {
            run(&mut grid, Vec3::ZERO, &buffers);
        }
        assert_eq!(grid.velocity(inside), Vec3::X);
        assert_eq!(grid.velocity(outside), Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(grid.velocity(res.index(1, 1, 1)), Vec3::ZERO);
    }
}
