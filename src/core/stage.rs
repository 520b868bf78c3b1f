//! Stage: a named collection of work units (or bare tasks) bound for one
//! execution queue.
//!
//! A stage is homogeneous: it holds either work units or bare tasks, never
//! both. It never reorders its entries; iteration order at submission time
//! equals insertion order, which the builder keeps equal to the sorted order
//! of tier keys. The stage name doubles as the namespace prefix for derived
//! artifact names, so tier keys may repeat across stages without collision.

use serde::{Deserialize, Serialize};

use crate::config::ResourceHints;
use crate::core::task::Task;
use crate::core::unit::WorkUnit;
use crate::error::{Error, Result};

/// One entry of a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StageEntry {
    Unit(WorkUnit),
    Task(Task),
}

impl StageEntry {
    pub fn name(&self) -> &str {
        match self {
            StageEntry::Unit(unit) => &unit.name,
            StageEntry::Task(task) => &task.name,
        }
    }
}

/// A named, homogeneous collection of work units or bare tasks with shared
/// resource hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Globally unique stage name.
    pub name: String,
    entries: Vec<StageEntry>,
    resources: ResourceHints,
}

impl Stage {
    pub fn new(name: &str, resources: ResourceHints) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
            resources,
        }
    }

    fn check_duplicate(&self, name: &str) -> Result<()> {
        if self.entries.iter().any(|e| e.name() == name) {
            return Err(Error::DuplicateTask {
                scope: self.name.clone(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Append a work unit, stamping this stage as its owner.
    pub fn add_unit(&mut self, mut unit: WorkUnit) -> Result<()> {
        if self.entries.iter().any(|e| matches!(e, StageEntry::Task(_))) {
            return Err(Error::MixedStage(self.name.clone()));
        }
        self.check_duplicate(&unit.name)?;
        unit.stage = Some(self.name.clone());
        for task in &mut unit.tasks {
            task.stage = Some(self.name.clone());
        }
        self.entries.push(StageEntry::Unit(unit));
        Ok(())
    }

    /// Append a bare task, stamping this stage as its owner.
    pub fn add_task(&mut self, mut task: Task) -> Result<()> {
        if self.entries.iter().any(|e| matches!(e, StageEntry::Unit(_))) {
            return Err(Error::MixedStage(self.name.clone()));
        }
        self.check_duplicate(&task.name)?;
        task.stage = Some(self.name.clone());
        self.entries.push(StageEntry::Task(task));
        Ok(())
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[StageEntry] {
        &self.entries
    }

    /// Work units in insertion order (empty for a task-bearing stage).
    pub fn units(&self) -> impl Iterator<Item = &WorkUnit> {
        self.entries.iter().filter_map(|e| match e {
            StageEntry::Unit(unit) => Some(unit),
            StageEntry::Task(_) => None,
        })
    }

    pub fn unit(&self, name: &str) -> Option<&WorkUnit> {
        self.units().find(|u| u.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Thread-count hint for the execution adapter.
    pub fn threads(&self) -> usize {
        self.resources.threads
    }

    /// Memory hint (MiB) for the execution adapter.
    pub fn memory_mb(&self) -> u64 {
        self.resources.memory_mb
    }

    pub fn resources(&self) -> ResourceHints {
        self.resources
    }
}
