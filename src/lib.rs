pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod error;
pub mod executor;
pub mod log;
pub mod naming;
pub mod recipes;
pub mod sample;

pub use builder::{Pipeline, PipelineBuilder, Recipe};
pub use config::{PipelineConfig, ResourceHints};
pub use core::{PipelineDag, Stage, StageEntry, Task, UnitDescriptor, WorkUnit};
pub use error::{Error, Result};
pub use executor::{Executor, JobHandle, LocalExecutor};
pub use sample::{ReadPair, Sample};
