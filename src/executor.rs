//! Execution adapter boundary.
//!
//! The engine hands stages to an [`Executor`] and never looks behind the
//! contract: submit a unit with its dependency handles, get a job handle
//! back, block on a handle for an exit status, ask for a stage's resource
//! hints. A cluster adapter would translate these calls into scheduler
//! submissions; [`LocalExecutor`] runs everything on the local host with
//! tokio, in parallel where the dependency edges allow.
//!
//! The core imposes no retry and no timeout; both are adapter policy.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::config::ResourceHints;
use crate::core::stage::{Stage, StageEntry};
use crate::core::unit::WorkUnit;
use crate::error::{Error, Result};
use crate::{slog, slog_debug, slog_error, slog_warn};

/// Opaque per-job handle returned by an executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobHandle(pub Uuid);

impl JobHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for JobHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Runs work units in dependency order.
///
/// Implementations may run independent units in parallel but must serialize
/// the task list inside a single unit, and must not start a unit whose
/// dependency has not completed successfully.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Submit one unit with the handles of its already-submitted
    /// dependencies. Returns immediately with a handle.
    async fn submit(&self, unit: WorkUnit, dependencies: &[JobHandle]) -> Result<JobHandle>;

    /// Block until the job finishes and return its exit status. A unit that
    /// was never started because a dependency failed is reported as
    /// [`Error::DependencyFailed`].
    async fn wait(&self, handle: JobHandle) -> Result<i32>;

    /// Resource hints the adapter should apply to a stage's jobs.
    fn resources(&self, stage: &Stage) -> ResourceHints {
        stage.resources()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum JobOutcome {
    Pending,
    Success(i32),
    Failed { task: String, status: i32 },
    NotStarted { dependency: String },
}

#[derive(Clone)]
struct JobRecord {
    unit: String,
    outcome: watch::Receiver<JobOutcome>,
}

/// In-process executor backed by tokio tasks.
///
/// Each submitted unit becomes a spawned task that first waits on its
/// dependencies' outcome channels. A failed or never-started dependency
/// marks the unit as not started; sibling branches keep running. Units whose
/// submit flag is false resolve immediately as already satisfied, without
/// spawning any process.
#[derive(Default)]
pub struct LocalExecutor {
    jobs: Mutex<HashMap<Uuid, JobRecord>>,
}

impl LocalExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Wait for a dependency's final outcome.
async fn final_outcome(record: &mut JobRecord) -> JobOutcome {
    loop {
        let current = record.outcome.borrow().clone();
        if current != JobOutcome::Pending {
            return current;
        }
        if record.outcome.changed().await.is_err() {
            // Sender dropped; whatever is in the channel is final.
            return record.outcome.borrow().clone();
        }
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn submit(&self, unit: WorkUnit, dependencies: &[JobHandle]) -> Result<JobHandle> {
        // Preflight program lookup for units that will actually run, so a
        // missing binary fails at submission instead of mid-pipeline.
        if unit.submit {
            for task in &unit.tasks {
                which::which(&task.program)
                    .map_err(|_| Error::ProgramNotFound(task.program.clone()))?;
            }
        }

        let mut jobs = self.jobs.lock().await;
        let mut upstream = Vec::with_capacity(dependencies.len());
        for handle in dependencies {
            let record = jobs
                .get(&handle.0)
                .cloned()
                .ok_or_else(|| Error::UnknownHandle(handle.to_string()))?;
            upstream.push(record);
        }

        let handle = JobHandle::new();
        let (tx, rx) = watch::channel(JobOutcome::Pending);
        jobs.insert(
            handle.0,
            JobRecord {
                unit: unit.name.clone(),
                outcome: rx,
            },
        );
        drop(jobs);

        slog_debug!("submit {} as job {}", unit.name, handle.short());

        tokio::spawn(async move {
            let mut unit = unit;
            for mut dep in upstream {
                match final_outcome(&mut dep).await {
                    JobOutcome::Success(_) => {}
                    _ => {
                        slog_warn!("{} not started: dependency {} failed", unit.name, dep.unit);
                        let _ = tx.send(JobOutcome::NotStarted {
                            dependency: dep.unit,
                        });
                        return;
                    }
                }
            }

            if !unit.submit {
                slog!("{}: checkpoint satisfied, nothing to run", unit.name);
                let _ = tx.send(JobOutcome::Success(0));
                return;
            }

            let outcome = match unit.run().await {
                Ok(()) => JobOutcome::Success(0),
                Err(Error::ExecutionFailed { task, status }) => {
                    JobOutcome::Failed { task, status }
                }
                Err(err) => {
                    slog_error!("{} failed: {}", unit.name, err);
                    JobOutcome::Failed {
                        task: unit.name.clone(),
                        status: -1,
                    }
                }
            };
            let _ = tx.send(outcome);
        });

        Ok(handle)
    }

    async fn wait(&self, handle: JobHandle) -> Result<i32> {
        let mut record = {
            let jobs = self.jobs.lock().await;
            jobs.get(&handle.0)
                .cloned()
                .ok_or_else(|| Error::UnknownHandle(handle.to_string()))?
        };

        match final_outcome(&mut record).await {
            JobOutcome::Success(status) => Ok(status),
            JobOutcome::Failed { task, status } => Err(Error::ExecutionFailed { task, status }),
            JobOutcome::NotStarted { dependency } => Err(Error::DependencyFailed {
                unit: record.unit,
                dependency,
            }),
            JobOutcome::Pending => Err(Error::TaskJoin(format!(
                "job for {} ended without reporting an outcome",
                record.unit
            ))),
        }
    }
}

/// Submit every entry of a stage in insertion order, threading job handles
/// by name through `handles`.
///
/// A dependency that was not submitted in this run (for example when a
/// single stage is submitted in isolation) is assumed satisfied and logged.
/// Bare tasks are wrapped in a single-task unit. Returns the handles
/// submitted for this stage, in order.
pub async fn submit_stage<E>(
    executor: &E,
    stage: &Stage,
    handles: &mut HashMap<String, JobHandle>,
) -> Result<Vec<JobHandle>>
where
    E: Executor + ?Sized,
{
    let hints = executor.resources(stage);
    slog!(
        "stage {}: submitting {} entr(y/ies) with {} thread(s), {} MiB",
        stage.name,
        stage.len(),
        hints.threads,
        hints.memory_mb
    );

    let mut submitted = Vec::new();
    for entry in stage.entries() {
        let unit = match entry {
            StageEntry::Unit(unit) => unit.clone(),
            StageEntry::Task(task) => {
                let mut unit = WorkUnit::new(&task.name, std::env::current_dir()?);
                unit.submit = task.submit;
                for dependency in &task.dependencies {
                    unit.add_dependency(dependency);
                }
                unit.add_task(task.clone())?;
                unit
            }
        };

        let mut dependency_handles = Vec::new();
        for dependency in &unit.dependencies {
            match handles.get(dependency) {
                Some(handle) => dependency_handles.push(*handle),
                None => slog_warn!(
                    "{}: dependency {} not submitted in this run, assuming satisfied",
                    unit.name,
                    dependency
                ),
            }
        }

        let name = unit.name.clone();
        let handle = executor.submit(unit, &dependency_handles).await?;
        handles.insert(name, handle);
        submitted.push(handle);
    }
    Ok(submitted)
}
