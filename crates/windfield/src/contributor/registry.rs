use std::collections::HashMap;

use super::params::*;
use super::{
    CalculationKind, ContributorId, ContributorShape, ShapeKind, VelocitySpace, WindCalculation,
    WindContributor,
};
use crate::error::WindFieldError;

/// Opaque handle returned on registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationHandle(u64);

impl RegistrationHandle {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered(RegistrationHandle),
    /// The id was already registered, the existing handle is returned unchanged
    AlreadyRegistered(RegistrationHandle),
    /// Disabled contributors are not added
    Inactive,
}

impl Registration {
    pub fn handle(&self) -> Option<RegistrationHandle> {
        match self {
            Registration::Registered(handle) | Registration::AlreadyRegistered(handle) => {
                Some(*handle)
            }
            Registration::Inactive => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    handle: RegistrationHandle,
    contributor: WindContributor,
}

/// Parameter arrays for one frame, in registration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContributorSnapshot {
    pub boxes: Vec<BoxWindParams>,
    pub spheres: Vec<SphereWindParams>,
    pub cylinders: Vec<CylinderWindParams>,
    pub fixed: Vec<FixedCalculationParams>,
    pub points: Vec<PointCalculationParams>,
    pub axes: Vec<AxisCalculationParams>,
}

impl ContributorSnapshot {
    pub fn shape_count(&self) -> usize {
        self.boxes.len() + self.spheres.len() + self.cylinders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shape_count() == 0
    }

    pub fn clear(&mut self) {
        self.boxes.clear();
        self.spheres.clear();
        self.cylinders.clear();
        self.fixed.clear();
        self.points.clear();
        self.axes.clear();
    }

    /// Push the calculation record and return its index in its buffer
    fn push_calculation(&mut self, contributor: &WindContributor) -> u32 {
        let t = &contributor.transform;
        let intensity = contributor.intensity;
        match contributor.calculation {
            WindCalculation::Fixed { velocity, space } => {
                let world = match space {
                    VelocitySpace::Local => t.transform_vector(velocity),
                    VelocitySpace::World => velocity,
                };
                self.fixed.push(FixedCalculationParams::new(world * intensity));
                (self.fixed.len() - 1) as u32
            }
            WindCalculation::Point {
                center_local,
                max_speed,
                decay,
            } => {
                self.points.push(PointCalculationParams::new(
                    t.transform_point(center_local),
                    max_speed * intensity,
                    decay,
                ));
                (self.points.len() - 1) as u32
            }
            WindCalculation::AxisVortex {
                axis_point_local,
                axis_direction_local,
                decay,
                multiplier,
            } => {
                self.axes.push(AxisCalculationParams::new(
                    t.transform_point(axis_point_local),
                    t.transform_direction(axis_direction_local),
                    decay,
                    multiplier * intensity,
                ));
                (self.axes.len() - 1) as u32
            }
        }
    }

    fn push(&mut self, contributor: &WindContributor) {
        let t = &contributor.transform;
        let kind = contributor.calculation.kind();
        match contributor.shape {
            ContributorShape::None => {}
            ContributorShape::Box { half_extents } => {
                let index = self.push_calculation(contributor);
                self.boxes
                    .push(BoxWindParams::new(kind, index, half_extents, t.world_to_local()));
            }
            ContributorShape::Sphere { radius } => {
                let index = self.push_calculation(contributor);
                let scaled = radius * t.scale.abs().max_element();
                self.spheres
                    .push(SphereWindParams::new(kind, index, t.translation, scaled));
            }
            ContributorShape::Cylinder {
                radius,
                half_height,
            } => {
                let index = self.push_calculation(contributor);
                self.cylinders.push(CylinderWindParams::new(
                    kind,
                    index,
                    radius,
                    half_height,
                    t.world_to_local(),
                ));
            }
        }
    }
}

/// Tracks the contributors that feed the wind volume.
///
/// Owned by the simulator. Changes must happen between frames.
#[derive(Debug, Default)]
pub struct ContributorRegistry {
    entries: Vec<Entry>,
    by_id: HashMap<ContributorId, RegistrationHandle>,
    next_handle: u64,
    shape_counts: [usize; 4],
    calculation_counts: [usize; 3],
}

impl ContributorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, contributor: WindContributor) -> Result<Registration, WindFieldError> {
        if let Some(handle) = self.by_id.get(&contributor.id) {
            return Ok(Registration::AlreadyRegistered(*handle));
        }
        contributor.validate()?;
        if !contributor.enabled {
            return Ok(Registration::Inactive);
        }

        let handle = RegistrationHandle(self.next_handle);
        self.next_handle += 1;
        self.count(&contributor, true);
        self.by_id.insert(contributor.id, handle);
        self.entries.push(Entry {
            handle,
            contributor,
        });
        Ok(Registration::Registered(handle))
    }

    /// Remove a registration. Unknown handles are ignored.
    pub fn unregister(&mut self, handle: RegistrationHandle) -> Option<WindContributor> {
        let position = self.entries.iter().position(|e| e.handle == handle)?;
        let entry = self.entries.remove(position);
        self.by_id.remove(&entry.contributor.id);
        self.count(&entry.contributor, false);
        Some(entry.contributor)
    }

    /// Replace the parameters of a registered contributor. The contributor keeps
    /// its place in registration order.
    pub fn update(
        &mut self,
        handle: RegistrationHandle,
        contributor: WindContributor,
    ) -> Result<(), WindFieldError> {
        contributor.validate()?;
        let Some(position) = self.entries.iter().position(|e| e.handle == handle) else {
            return Err(WindFieldError::invalid_contributor(format!(
                "no contributor registered for handle {}",
                handle.raw()
            )));
        };
        if let Some(other) = self.by_id.get(&contributor.id).filter(|other| **other != handle) {
            return Err(WindFieldError::invalid_contributor(format!(
                "{:?} is already registered under handle {}",
                contributor.id,
                other.raw()
            )));
        }

        let previous = self.entries[position].contributor;
        self.count(&previous, false);
        self.count(&contributor, true);
        if previous.id != contributor.id {
            self.by_id.remove(&previous.id);
            self.by_id.insert(contributor.id, handle);
        }
        self.entries[position].contributor = contributor;
        Ok(())
    }

    pub fn get(&self, handle: RegistrationHandle) -> Option<&WindContributor> {
        self.entries
            .iter()
            .find(|e| e.handle == handle)
            .map(|e| &e.contributor)
    }

    pub fn handle_of(&self, id: ContributorId) -> Option<RegistrationHandle> {
        self.by_id.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shape_count(&self, kind: ShapeKind) -> usize {
        self.shape_counts[kind.slot()]
    }

    pub fn calculation_count(&self, kind: CalculationKind) -> usize {
        self.calculation_counts[kind.slot()]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_id.clear();
        self.shape_counts = [0; 4];
        self.calculation_counts = [0; 3];
    }

    pub fn snapshot(&self) -> ContributorSnapshot {
        let mut snapshot = ContributorSnapshot::default();
        self.snapshot_into(&mut snapshot);
        snapshot
    }

    /// Rebuild the per-frame arrays into an existing snapshot, reusing its storage
    pub fn snapshot_into(&self, snapshot: &mut ContributorSnapshot) {
        snapshot.clear();
        for entry in self.entries.iter().filter(|e| e.contributor.enabled) {
            snapshot.push(&entry.contributor);
        }
    }

    fn count(&mut self, contributor: &WindContributor, add: bool) {
        let shape = &mut self.shape_counts[contributor.shape.kind().slot()];
        let calculation = &mut self.calculation_counts[contributor.calculation.kind().slot()];
        if add {
            *shape += 1;
            *calculation += 1;
        } else {
            *shape = shape.saturating_sub(1);
            *calculation = calculation.saturating_sub(1);
        }
    }
}
