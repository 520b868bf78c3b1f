use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::sample::Sample;
use crate::{slog_debug, Error, Result};

/// Resource hints for one pipeline tier, consumed by execution adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHints {
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_memory_mb")]
    pub memory_mb: u64,
}

fn default_threads() -> usize {
    1
}

fn default_memory_mb() -> u64 {
    2048
}

impl Default for ResourceHints {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            memory_mb: default_memory_mb(),
        }
    }
}

/// Per-tier resource hints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierResources {
    #[serde(default)]
    pub replicate: ResourceHints,
    #[serde(default)]
    pub sample: ResourceHints,
    #[serde(default)]
    pub cohort: ResourceHints,
}

/// Pipeline configuration, loaded from a TOML file and passed explicitly to
/// the builder. There is no process-wide default configuration; every
/// consumer receives the value it should use.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Project name, used for the default working directory.
    pub project: String,
    /// Cohort name; defaults to the project name when absent.
    pub cohort: Option<String>,
    /// Working directory for all artifacts; defaults to
    /// `~/.seqflow/work/<project>`.
    pub working_directory: Option<String>,
    /// Externally produced artifacts merged into the cohort step after all
    /// sample-tier artifacts.
    #[serde(default)]
    pub accessory_artifacts: Vec<PathBuf>,
    #[serde(default)]
    pub resources: TierResources,
    #[serde(default)]
    pub samples: Vec<Sample>,
}

impl PipelineConfig {
    pub fn app_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".seqflow"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        slog_debug!("PipelineConfig::load path={}", path.display());
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        if config.project.trim().is_empty() {
            return Err(Error::Config("project name must not be empty".to_string()));
        }
        slog_debug!(
            "Config loaded: project={}, samples={}, accessory_artifacts={}",
            config.project,
            config.samples.len(),
            config.accessory_artifacts.len()
        );
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        slog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    /// Cohort name, falling back to the project name.
    pub fn effective_cohort(&self) -> &str {
        self.cohort.as_deref().unwrap_or(&self.project)
    }

    /// Resolved working directory for artifacts.
    pub fn working_directory(&self) -> Result<PathBuf> {
        match &self.working_directory {
            Some(dir) => Ok(expand_tilde(dir)),
            None => Ok(Self::app_dir()?.join("work").join(&self.project)),
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
