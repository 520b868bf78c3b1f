//! Work unit: an ordered, checkpointed bundle of tasks.
//!
//! A work unit is one resumable logical step. It owns a registry mapping
//! symbolic artifact roles ("aligned", "metrics") to concrete paths, a
//! working directory, and a terminal role whose artifact decides whether the
//! unit may be skipped on resume. Units serialize to a tagged, versioned
//! descriptor so they can be executed in a separate process or on another
//! host; dependency names stay symbolic across that boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use crate::core::task::Task;
use crate::error::{Error, Result};
use crate::{checkpoint, slog, slog_debug};

/// Descriptor format tag; rejected descriptors fail loudly instead of being
/// best-effort parsed.
pub const DESCRIPTOR_FORMAT: &str = "seqflow/work-unit";
/// Current descriptor schema version.
pub const DESCRIPTOR_VERSION: u32 = 1;

/// One checkpointed bundle of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkUnit {
    /// Globally unique name, derived from stage name + tier key.
    pub name: String,
    /// Directory all of the unit's artifacts live under.
    pub working_directory: PathBuf,
    /// Tasks in execution order.
    pub tasks: Vec<Task>,
    /// Symbolic role -> concrete artifact path.
    pub artifacts: BTreeMap<String, PathBuf>,
    /// Role of the artifact consulted by the checkpoint policy.
    pub terminal_role: Option<String>,
    /// Names of upstream units this unit depends on.
    pub dependencies: Vec<String>,
    /// Derived by the checkpoint policy: false when the terminal artifact
    /// already exists non-empty.
    pub submit: bool,
    /// Name of the owning stage, stamped on registration.
    pub stage: Option<String>,
}

impl WorkUnit {
    pub fn new(name: &str, working_directory: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            working_directory,
            tasks: Vec::new(),
            artifacts: BTreeMap::new(),
            terminal_role: None,
            dependencies: Vec::new(),
            submit: true,
            stage: None,
        }
    }

    /// Append a task. Order is significant: it is the execution order when
    /// the unit runs on a single host.
    pub fn add_task(&mut self, task: Task) -> Result<()> {
        if self.tasks.iter().any(|t| t.name == task.name) {
            return Err(Error::DuplicateTask {
                scope: self.name.clone(),
                name: task.name,
            });
        }
        self.tasks.push(task);
        Ok(())
    }

    /// Register an artifact under a symbolic role, replacing any previous
    /// path for that role.
    pub fn register_artifact(&mut self, role: &str, path: PathBuf) {
        self.artifacts.insert(role.to_string(), path);
    }

    pub fn artifact(&self, role: &str) -> Option<&PathBuf> {
        self.artifacts.get(role)
    }

    /// Declare which registered role is the unit's terminal artifact.
    pub fn set_terminal_role(&mut self, role: &str) {
        self.terminal_role = Some(role.to_string());
    }

    /// Resolve the terminal artifact path through the registry.
    pub fn terminal_artifact(&self) -> Result<&PathBuf> {
        let role = self.terminal_role.as_deref().ok_or_else(|| {
            Error::Config(format!("unit {} declares no terminal artifact role", self.name))
        })?;
        self.artifacts.get(role).ok_or_else(|| Error::MissingArtifact {
            unit: self.name.clone(),
            role: role.to_string(),
        })
    }

    /// Declare a dependency on an upstream unit by name. Duplicates are
    /// ignored.
    pub fn add_dependency(&mut self, name: &str) {
        if !self.dependencies.iter().any(|d| d == name) {
            self.dependencies.push(name.to_string());
        }
    }

    /// Evaluate the checkpoint policy against the terminal artifact and set
    /// the submit flag accordingly. Called once, at graph-construction time.
    /// Returns the resulting submit flag.
    pub fn apply_checkpoint(&mut self) -> Result<bool> {
        let terminal = self.terminal_artifact()?.clone();
        self.submit = checkpoint::should_run(&terminal);
        if !self.submit {
            slog!("unit {}: terminal artifact {} complete, skipping", self.name, terminal.display());
        }
        Ok(self.submit)
    }

    /// Seal every task ahead of execution; mutators fail afterwards.
    pub fn seal(&mut self) {
        for task in &mut self.tasks {
            task.seal();
        }
    }

    /// Build the serializable descriptor for out-of-process execution.
    pub fn descriptor(&self) -> UnitDescriptor {
        UnitDescriptor {
            format: DESCRIPTOR_FORMAT.to_string(),
            schema_version: DESCRIPTOR_VERSION,
            created_at: Utc::now(),
            unit: self.clone(),
        }
    }

    /// Serialize the unit to its JSON descriptor.
    pub fn to_descriptor_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.descriptor())?)
    }

    /// Deserialize a unit from a JSON descriptor, validating the format tag
    /// and schema version.
    pub fn from_descriptor_json(json: &str) -> Result<Self> {
        let descriptor: UnitDescriptor = serde_json::from_str(json)?;
        descriptor.into_unit()
    }

    /// Execute the contained tasks strictly in list order, aborting the
    /// whole unit on the first non-zero exit status.
    ///
    /// The working directory is created first; a task with a declared
    /// stdout path has its standard output redirected there. This call
    /// blocks (asynchronously) on each child's exit before starting the
    /// next task.
    pub async fn run(&mut self) -> Result<()> {
        tokio::fs::create_dir_all(&self.working_directory).await?;
        self.seal();

        for task in &self.tasks {
            slog_debug!("unit {}: running task {} ({})", self.name, task.name, task.program);

            let mut command = tokio::process::Command::new(&task.program);
            command.args(&task.arguments);
            command.current_dir(&self.working_directory);
            if let Some(stdout_path) = &task.stdout_path {
                let file = std::fs::File::create(stdout_path)?;
                command.stdout(Stdio::from(file));
            }

            let status = command.status().await?;
            if !status.success() {
                let status = status.code().unwrap_or(-1);
                slog_debug!("unit {}: task {} exited with {}", self.name, task.name, status);
                return Err(Error::ExecutionFailed {
                    task: task.name.clone(),
                    status,
                });
            }
        }

        slog_debug!("unit {}: completed {} task(s)", self.name, self.tasks.len());
        Ok(())
    }
}

/// Self-contained, tagged, versioned work-unit record.
///
/// Carries every task definition and the artifact registry; dependency
/// names stay symbolic and are resolved by name at the consuming end, never
/// by pointer, so the descriptor can cross a process boundary safely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDescriptor {
    pub format: String,
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub unit: WorkUnit,
}

impl UnitDescriptor {
    /// Validate the envelope and unwrap the unit.
    pub fn into_unit(self) -> Result<WorkUnit> {
        if self.format != DESCRIPTOR_FORMAT {
            return Err(Error::DescriptorFormat(self.format));
        }
        if self.schema_version != DESCRIPTOR_VERSION {
            return Err(Error::DescriptorVersion {
                found: self.schema_version,
                expected: DESCRIPTOR_VERSION,
            });
        }
        Ok(self.unit)
    }
}
