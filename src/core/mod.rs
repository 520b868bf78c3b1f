//! Core domain models for pipeline orchestration.
//!
//! This module contains the fundamental data structures of the engine:
//! tasks, checkpointed work units, stages, and the dependency graph that
//! ties them together.

pub mod dag;
pub mod stage;
pub mod task;
pub mod unit;

pub use dag::PipelineDag;
pub use stage::{Stage, StageEntry};
pub use task::Task;
pub use unit::{UnitDescriptor, WorkUnit, DESCRIPTOR_FORMAT, DESCRIPTOR_VERSION};
