//! Dependency resolver / pipeline builder.
//!
//! Drives the three-tier fan-in: one work unit per replicate, one per sample
//! collecting its replicates' outputs, and exactly one cohort unit
//! collecting every sample's output (optionally with externally supplied
//! accessory artifacts merged in). Stage and unit construction happens in a
//! single deterministic pass — samples sorted lexicographically, replicate
//! keys already sorted — so two runs over identical input produce an
//! identical graph, which is what makes path-based checkpoint resume sound.
//!
//! Tool knowledge lives behind the [`Recipe`] trait: a recipe populates each
//! unit's tasks and artifact registry and names the terminal artifact role;
//! the builder owns naming, checkpointing, ordering, and dependency wiring.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::core::dag::PipelineDag;
use crate::core::stage::Stage;
use crate::core::unit::WorkUnit;
use crate::error::{Error, Result};
use crate::naming;
use crate::sample::{ReadPair, Sample};
use crate::{slog, slog_warn};

/// Stage name of the per-replicate tier.
pub const REPLICATE_STAGE: &str = "process_replicate";
/// Stage name of the per-sample tier.
pub const SAMPLE_STAGE: &str = "process_sample";
/// Stage name of the per-cohort tier.
pub const COHORT_STAGE: &str = "process_cohort";

/// Read-only view handed to a recipe when building a replicate-tier unit.
pub struct ReplicateInput<'a> {
    pub sample_name: &'a str,
    pub replicate_key: &'a str,
    pub read_pairs: &'a [ReadPair],
    /// Unique unit prefix, the namespace for every artifact of this unit.
    pub prefix: &'a str,
    pub working_directory: &'a Path,
}

/// Read-only view handed to a recipe when building a sample-tier unit.
pub struct SampleInput<'a> {
    pub sample_name: &'a str,
    pub prefix: &'a str,
    pub working_directory: &'a Path,
    /// Terminal artifacts of this sample's replicate units, in replicate-key
    /// order.
    pub replicate_artifacts: &'a [PathBuf],
}

/// Read-only view handed to a recipe when building the cohort unit.
pub struct CohortInput<'a> {
    pub cohort_name: &'a str,
    pub prefix: &'a str,
    pub working_directory: &'a Path,
    /// Terminal artifacts of all sample units, in sample-name order.
    pub sample_artifacts: &'a [PathBuf],
    /// Sample names in the same order, for per-sample fan-out inside the
    /// cohort unit.
    pub sample_names: &'a [String],
    /// Externally supplied artifacts merged in after the sample artifacts.
    pub accessory_artifacts: &'a [PathBuf],
}

/// Populates work units with tasks and artifacts for one concrete toolchain.
///
/// Each method fills the given (empty) unit and returns the artifact role
/// the checkpoint policy should consult. Recipes must register every
/// artifact a downstream tier consumes; the builder validates that the
/// returned role resolves to a registered path.
pub trait Recipe {
    fn replicate_unit(&self, input: &ReplicateInput, unit: &mut WorkUnit) -> Result<String>;
    fn sample_unit(&self, input: &SampleInput, unit: &mut WorkUnit) -> Result<String>;
    fn cohort_unit(&self, input: &CohortInput, unit: &mut WorkUnit) -> Result<String>;
}

/// An immutable built pipeline: stages in creation order plus the validated
/// dependency graph. Stages are never altered retroactively once built.
pub struct Pipeline {
    stages: Vec<Stage>,
    dag: PipelineDag,
}

impl Pipeline {
    /// Stages in creation (submission) order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn dag(&self) -> &PipelineDag {
        &self.dag
    }

    /// All work units across all stages, in stage then insertion order.
    pub fn units(&self) -> impl Iterator<Item = &WorkUnit> {
        self.stages.iter().flat_map(|s| s.units())
    }

    pub fn find_unit(&self, name: &str) -> Option<&WorkUnit> {
        self.units().find(|u| u.name == name)
    }
}

/// Builds a [`Pipeline`] from explicit configuration and a recipe.
pub struct PipelineBuilder<'a, R: Recipe> {
    config: &'a PipelineConfig,
    recipe: &'a R,
}

impl<'a, R: Recipe> PipelineBuilder<'a, R> {
    pub fn new(config: &'a PipelineConfig, recipe: &'a R) -> Self {
        Self { config, recipe }
    }

    /// Run the fan-in algorithm once, top to bottom.
    ///
    /// Construction is synchronous and submits nothing; the only filesystem
    /// access is the checkpoint policy's metadata lookup per unit. Any
    /// configuration error aborts the whole build — no partial pipeline is
    /// ever returned.
    pub fn build(&self) -> Result<Pipeline> {
        let working_directory = self.config.working_directory()?;

        let mut samples: Vec<&Sample> = self.config.samples.iter().collect();
        samples.sort_by(|a, b| a.name.cmp(&b.name));
        for pair in samples.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(Error::Config(format!(
                    "duplicate sample name: {}",
                    pair[0].name
                )));
            }
        }

        let mut dag = PipelineDag::new();
        let mut seen_folded: HashMap<String, String> = HashMap::new();
        let mut replicate_stage = Stage::new(REPLICATE_STAGE, self.config.resources.replicate);
        let mut sample_stage = Stage::new(SAMPLE_STAGE, self.config.resources.sample);
        let mut cohort_stage = Stage::new(COHORT_STAGE, self.config.resources.cohort);

        let mut cohort_dependencies: Vec<String> = Vec::new();
        let mut cohort_artifacts: Vec<PathBuf> = Vec::new();
        let mut cohort_sample_names: Vec<String> = Vec::new();

        for sample in samples {
            if sample.is_empty() {
                slog_warn!("sample {} has no replicates, skipping all tiers", sample.name);
                continue;
            }

            let mut sample_dependencies: Vec<String> = Vec::new();
            let mut sample_artifacts: Vec<PathBuf> = Vec::new();

            for (replicate_key, read_pairs) in &sample.replicates {
                let tier_key = format!("{}_{}", sample.name, replicate_key);
                let prefix = naming::unit_prefix(REPLICATE_STAGE, &tier_key);
                check_case_collision(&mut seen_folded, &prefix)?;

                let mut unit = WorkUnit::new(&prefix, working_directory.clone());
                let input = ReplicateInput {
                    sample_name: &sample.name,
                    replicate_key,
                    read_pairs,
                    prefix: &prefix,
                    working_directory: &working_directory,
                };
                let terminal_role = self.recipe.replicate_unit(&input, &mut unit)?;
                unit.set_terminal_role(&terminal_role);
                let terminal = unit.terminal_artifact()?.clone();
                unit.apply_checkpoint()?;

                dag.add_node(&unit.name)?;
                sample_dependencies.push(unit.name.clone());
                sample_artifacts.push(terminal);
                replicate_stage.add_unit(unit)?;
            }

            let prefix = naming::unit_prefix(SAMPLE_STAGE, &sample.name);
            check_case_collision(&mut seen_folded, &prefix)?;

            let mut unit = WorkUnit::new(&prefix, working_directory.clone());
            let input = SampleInput {
                sample_name: &sample.name,
                prefix: &prefix,
                working_directory: &working_directory,
                replicate_artifacts: &sample_artifacts,
            };
            let terminal_role = self.recipe.sample_unit(&input, &mut unit)?;
            unit.set_terminal_role(&terminal_role);
            let terminal = unit.terminal_artifact()?.clone();
            for dependency in &sample_dependencies {
                unit.add_dependency(dependency);
            }
            unit.apply_checkpoint()?;

            dag.add_node(&unit.name)?;
            for dependency in &sample_dependencies {
                dag.add_dependency(&unit.name, dependency)?;
            }
            cohort_dependencies.push(unit.name.clone());
            cohort_artifacts.push(terminal);
            cohort_sample_names.push(sample.name.clone());
            sample_stage.add_unit(unit)?;
        }

        if cohort_dependencies.is_empty() {
            return Err(Error::EmptyCohort);
        }

        let cohort_name = self.config.effective_cohort();
        let prefix = naming::unit_prefix(COHORT_STAGE, cohort_name);
        check_case_collision(&mut seen_folded, &prefix)?;

        let mut unit = WorkUnit::new(&prefix, working_directory.clone());
        let input = CohortInput {
            cohort_name,
            prefix: &prefix,
            working_directory: &working_directory,
            sample_artifacts: &cohort_artifacts,
            sample_names: &cohort_sample_names,
            accessory_artifacts: &self.config.accessory_artifacts,
        };
        let terminal_role = self.recipe.cohort_unit(&input, &mut unit)?;
        unit.set_terminal_role(&terminal_role);
        unit.terminal_artifact()?;
        for dependency in &cohort_dependencies {
            unit.add_dependency(dependency);
        }
        unit.apply_checkpoint()?;

        dag.add_node(&unit.name)?;
        for dependency in &cohort_dependencies {
            dag.add_dependency(&unit.name, dependency)?;
        }
        cohort_stage.add_unit(unit)?;

        slog!(
            "built pipeline: {} replicate unit(s), {} sample unit(s), 1 cohort unit",
            replicate_stage.len(),
            sample_stage.len()
        );

        Ok(Pipeline {
            stages: vec![replicate_stage, sample_stage, cohort_stage],
            dag,
        })
    }
}

/// Reject unit names that differ only in case: artifact paths must stay
/// unique on case-insensitive filesystems.
fn check_case_collision(seen: &mut HashMap<String, String>, name: &str) -> Result<()> {
    let folded = name.to_lowercase();
    if let Some(existing) = seen.get(&folded) {
        if existing != name {
            return Err(Error::Config(format!(
                "unit names {} and {} collide after case folding",
                existing, name
            )));
        }
    } else {
        seen.insert(folded, name.to_string());
    }
    Ok(())
}
