// Growable parameter buffers fed from the registry snapshot

use bytemuck::Pod;

use crate::contributor::params::*;
use crate::contributor::ContributorSnapshot;
use crate::error::WindFieldError;

/// Flat array of parameter records with a capacity that only grows.
///
/// When an upload needs more room, the buffer moves to new storage and keeps
/// the old one as "retired" until [`ParamBuffer::release_retired`] is called
/// between frames.
#[derive(Debug)]
pub struct ParamBuffer<T: Pod> {
    label: &'static str,
    data: Vec<T>,
    capacity: usize,
    budget: usize,
    retired: Vec<Vec<T>>,
}

impl<T: Pod> ParamBuffer<T> {
    pub fn new(label: &'static str, budget: usize) -> Self {
        Self {
            label,
            data: Vec::new(),
            capacity: 0,
            budget,
            retired: Vec::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    pub fn set_budget(&mut self, budget: usize) {
        self.budget = budget;
    }

    /// Replace the buffer contents, growing the storage if needed
    pub fn upload(&mut self, records: &[T]) -> Result<(), WindFieldError> {
        self.check_budget(records.len())?;
        self.reserve(records.len())?;
        self.write(records);
        Ok(())
    }

    fn check_budget(&self, required: usize) -> Result<(), WindFieldError> {
        if required > self.budget {
            return Err(WindFieldError::allocation(self.label, required));
        }
        Ok(())
    }

    /// Grow to hold `required` records. The current contents move to the new storage.
    fn reserve(&mut self, required: usize) -> Result<(), WindFieldError> {
        if required <= self.capacity {
            return Ok(());
        }
        let target = required.max(self.capacity * 3 / 2).min(self.budget);
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(target)
            .map_err(|_| WindFieldError::allocation(self.label, target))?;
        storage.extend_from_slice(&self.data);
        log::debug!(
            "Growing {} parameter buffer from {} to {} records",
            self.label,
            self.capacity,
            target
        );
        let old = std::mem::replace(&mut self.data, storage);
        self.retired.push(old);
        self.capacity = target;
        Ok(())
    }

    /// Overwrite the contents; capacity must already be reserved
    fn write(&mut self, records: &[T]) {
        self.data.clear();
        self.data.extend_from_slice(records);
    }

    /// Drop storage replaced by earlier growth. Call between frames.
    pub fn release_retired(&mut self) {
        if !self.retired.is_empty() {
            log::debug!(
                "Releasing {} retired {} buffer(s)",
                self.retired.len(),
                self.label
            );
            self.retired.clear();
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

/// One parameter buffer per shape and per calculation type
#[derive(Debug)]
pub struct ContributorBuffers {
    pub boxes: ParamBuffer<BoxWindParams>,
    pub spheres: ParamBuffer<SphereWindParams>,
    pub cylinders: ParamBuffer<CylinderWindParams>,
    pub fixed: ParamBuffer<FixedCalculationParams>,
    pub points: ParamBuffer<PointCalculationParams>,
    pub axes: ParamBuffer<AxisCalculationParams>,
}

impl ContributorBuffers {
    pub fn new(budget: usize) -> Self {
        Self {
            boxes: ParamBuffer::new("box shape", budget),
            spheres: ParamBuffer::new("sphere shape", budget),
            cylinders: ParamBuffer::new("cylinder shape", budget),
            fixed: ParamBuffer::new("fixed calculation", budget),
            points: ParamBuffer::new("point calculation", budget),
            axes: ParamBuffer::new("axis calculation", budget),
        }
    }

    /// Upload every buffer or none: budgets and storage are settled before
    /// any contents are replaced, so a failed upload leaves the last frame's records.
    pub fn upload(&mut self, snapshot: &ContributorSnapshot) -> Result<(), WindFieldError> {
        self.boxes.check_budget(snapshot.boxes.len())?;
        self.spheres.check_budget(snapshot.spheres.len())?;
        self.cylinders.check_budget(snapshot.cylinders.len())?;
        self.fixed.check_budget(snapshot.fixed.len())?;
        self.points.check_budget(snapshot.points.len())?;
        self.axes.check_budget(snapshot.axes.len())?;

        self.boxes.reserve(snapshot.boxes.len())?;
        self.spheres.reserve(snapshot.spheres.len())?;
        self.cylinders.reserve(snapshot.cylinders.len())?;
        self.fixed.reserve(snapshot.fixed.len())?;
        self.points.reserve(snapshot.points.len())?;
        self.axes.reserve(snapshot.axes.len())?;

        self.boxes.write(&snapshot.boxes);
        self.spheres.write(&snapshot.spheres);
        self.cylinders.write(&snapshot.cylinders);
        self.fixed.write(&snapshot.fixed);
        self.points.write(&snapshot.points);
        self.axes.write(&snapshot.axes);
        Ok(())
    }

    pub fn release_retired(&mut self) {
        self.boxes.release_retired();
        self.spheres.release_retired();
        self.cylinders.release_retired();
        self.fixed.release_retired();
        self.points.release_retired();
        self.axes.release_retired();
    }

    pub fn set_budget(&mut self, budget: usize) {
        self.boxes.set_budget(budget);
        self.spheres.set_budget(budget);
        self.cylinders.set_budget(budget);
        self.fixed.set_budget(budget);
        self.points.set_budget(budget);
        self.axes.set_budget(budget);
    }
}
