//! Task data model.
//!
//! A task is one external-process invocation: a program, its ordered
//! arguments, an optional captured output stream, and a list of dependency
//! names. Dependencies are symbolic (by name, not reference) so a task can
//! cross a serialization boundary and be re-linked at the consuming end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// A single external-process invocation.
///
/// A task is mutable only while the graph is being constructed. Once it is
/// handed to an execution adapter it is sealed; any further mutation is
/// rejected. The submit flag and dependency list may be appended to during
/// construction, everything else is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Name, unique within the owning stage.
    pub name: String,
    /// Program to execute.
    pub program: String,
    /// Ordered argument list.
    pub arguments: Vec<String>,
    /// Path the process's standard output is redirected to, if declared.
    pub stdout_path: Option<PathBuf>,
    /// Names of tasks or units that must complete before this task starts.
    pub dependencies: Vec<String>,
    /// Whether the task should be submitted for execution. False when the
    /// checkpoint policy found its work already done.
    pub submit: bool,
    /// Name of the owning stage, stamped when the task is registered.
    pub stage: Option<String>,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// Set when the task is handed to an execution adapter.
    #[serde(default)]
    sealed: bool,
}

impl Task {
    /// Create a new task invoking `program`, submitted by default.
    pub fn new(name: &str, program: &str) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            arguments: Vec::new(),
            stdout_path: None,
            dependencies: Vec::new(),
            submit: true,
            stage: None,
            created_at: Utc::now(),
            sealed: false,
        }
    }

    fn check_mutable(&self) -> Result<()> {
        if self.sealed {
            return Err(Error::TaskSealed(self.name.clone()));
        }
        Ok(())
    }

    /// Append one argument.
    pub fn add_argument(&mut self, argument: &str) -> Result<()> {
        self.check_mutable()?;
        self.arguments.push(argument.to_string());
        Ok(())
    }

    /// Append several arguments in order.
    pub fn add_arguments<I, S>(&mut self, arguments: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.check_mutable()?;
        for argument in arguments {
            self.arguments.push(argument.as_ref().to_string());
        }
        Ok(())
    }

    /// Declare a dependency by name. Duplicate names are ignored.
    pub fn add_dependency(&mut self, name: &str) -> Result<()> {
        self.check_mutable()?;
        if !self.dependencies.iter().any(|d| d == name) {
            self.dependencies.push(name.to_string());
        }
        Ok(())
    }

    /// Set the submit flag.
    pub fn set_submit(&mut self, submit: bool) -> Result<()> {
        self.check_mutable()?;
        self.submit = submit;
        Ok(())
    }

    /// Redirect the process's standard output to a file.
    pub fn set_stdout_path(&mut self, path: PathBuf) -> Result<()> {
        self.check_mutable()?;
        self.stdout_path = Some(path);
        Ok(())
    }

    /// Seal the task ahead of handing it to an execution adapter. All
    /// mutators fail afterwards.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}
