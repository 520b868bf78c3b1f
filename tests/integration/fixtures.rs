//! Test fixtures for integration tests.
//!
//! Provides a temporary project layout (data directory with read files,
//! working directory for artifacts), configuration builders, and helpers
//! for building and locally executing pipelines with the concat recipe.

use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

use seqflow::builder::{Pipeline, PipelineBuilder};
use seqflow::config::PipelineConfig;
use seqflow::executor::{submit_stage, Executor, JobHandle, LocalExecutor};
use seqflow::recipes::ConcatRecipe;
use seqflow::sample::{ReadPair, Sample};
use seqflow::Result;

/// A temporary project with separate data and working directories.
pub struct TestProject {
    /// Keeps the directory alive for the test's duration.
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
    pub work_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let data_dir = temp_dir.path().join("data");
        let work_dir = temp_dir.path().join("work");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");
        std::fs::create_dir_all(&work_dir).expect("Failed to create work dir");
        Self {
            temp_dir,
            data_dir,
            work_dir,
        }
    }

    /// Write a reads file and return its path.
    pub fn write_reads(&self, file_name: &str, content: &str) -> PathBuf {
        let path = self.data_dir.join(file_name);
        std::fs::write(&path, content).expect("Failed to write reads file");
        path
    }

    /// A sample whose replicates each get one real single-ended reads file
    /// with recognizable content (`reads:<sample>:<replicate>`).
    pub fn sample(&self, name: &str, replicate_keys: &[&str]) -> Sample {
        let mut sample = Sample::new(name);
        for key in replicate_keys {
            let path = self.write_reads(
                &format!("{}_{}.fq", name, key),
                &format!("reads:{}:{}\n", name, key),
            );
            sample.add_read_pair(key, ReadPair::single(path));
        }
        sample
    }

    pub fn config(&self, samples: Vec<Sample>) -> PipelineConfig {
        PipelineConfig {
            project: "itest".to_string(),
            cohort: Some("cohort".to_string()),
            working_directory: Some(self.work_dir.to_string_lossy().into_owned()),
            samples,
            ..Default::default()
        }
    }
}

pub fn build(config: &PipelineConfig) -> Result<Pipeline> {
    let recipe = ConcatRecipe;
    PipelineBuilder::new(config, &recipe).build()
}

/// Submit every stage of the pipeline to a fresh local executor and wait for
/// all units, returning per-unit results in submission order.
pub async fn run_locally(pipeline: &Pipeline) -> Vec<(String, Result<i32>)> {
    let executor = LocalExecutor::new();
    let mut handles: HashMap<String, JobHandle> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for stage in pipeline.stages() {
        submit_stage(&executor, stage, &mut handles)
            .await
            .expect("Failed to submit stage");
        for unit in stage.units() {
            order.push(unit.name.clone());
        }
    }

    let mut results = Vec::new();
    for name in order {
        let outcome = executor.wait(handles[&name]).await;
        results.push((name, outcome));
    }
    results
}
