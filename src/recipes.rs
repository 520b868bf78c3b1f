//! Reference recipe built on coreutils.
//!
//! `ConcatRecipe` exercises every seam of the engine — per-replicate units,
//! per-sample fan-in, the cohort combine with accessory merge-in, and the
//! per-sample fan-out — using nothing but `cat` and `cp`, so a pipeline can
//! be smoke-tested end to end on any machine without scientific tooling.
//! Production toolchains implement [`Recipe`] the same way with their own
//! programs.

use crate::builder::{CohortInput, Recipe, ReplicateInput, SampleInput};
use crate::core::task::Task;
use crate::core::unit::WorkUnit;
use crate::error::Result;
use crate::naming;

#[derive(Debug, Default)]
pub struct ConcatRecipe;

impl Recipe for ConcatRecipe {
    fn replicate_unit(&self, input: &ReplicateInput, unit: &mut WorkUnit) -> Result<String> {
        let merged = naming::artifact_path(input.working_directory, input.prefix, "merged.txt");

        let mut cat = Task::new(&format!("{}_cat", input.prefix), "cat");
        for pair in input.read_pairs {
            cat.add_argument(&pair.reads1.to_string_lossy())?;
            if let Some(reads2) = &pair.reads2 {
                cat.add_argument(&reads2.to_string_lossy())?;
            }
        }
        cat.set_stdout_path(merged.clone())?;
        unit.add_task(cat)?;

        unit.register_artifact("merged", merged);
        Ok("merged".to_string())
    }

    fn sample_unit(&self, input: &SampleInput, unit: &mut WorkUnit) -> Result<String> {
        let merged = naming::artifact_path(input.working_directory, input.prefix, "merged.txt");

        let mut cat = Task::new(&format!("{}_cat", input.prefix), "cat");
        for artifact in input.replicate_artifacts {
            cat.add_argument(&artifact.to_string_lossy())?;
        }
        cat.set_stdout_path(merged.clone())?;
        unit.add_task(cat)?;

        unit.register_artifact("merged", merged);
        Ok("merged".to_string())
    }

    fn cohort_unit(&self, input: &CohortInput, unit: &mut WorkUnit) -> Result<String> {
        let combined = naming::artifact_path(input.working_directory, input.prefix, "combined.txt");

        let combine_name = format!("{}_combine", input.prefix);
        let mut combine = Task::new(&combine_name, "cat");
        for artifact in input.sample_artifacts {
            combine.add_argument(&artifact.to_string_lossy())?;
        }
        for artifact in input.accessory_artifacts {
            combine.add_argument(&artifact.to_string_lossy())?;
        }
        combine.set_stdout_path(combined.clone())?;
        unit.add_task(combine)?;
        unit.register_artifact("combined", combined.clone());

        // Fan back out once per sample: a per-sample view of the combined
        // result, inside this same unit.
        for sample_name in input.sample_names {
            let view = naming::artifact_path(
                input.working_directory,
                input.prefix,
                &format!("{}_view.txt", sample_name),
            );
            let mut extract = Task::new(&format!("{}_view_{}", input.prefix, sample_name), "cp");
            extract.add_argument(&combined.to_string_lossy())?;
            extract.add_argument(&view.to_string_lossy())?;
            extract.add_dependency(&combine_name)?;
            unit.add_task(extract)?;
            unit.register_artifact(&format!("view_{}", sample_name), view);
        }

        Ok("combined".to_string())
    }
}
