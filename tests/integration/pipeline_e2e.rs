//! End-to-end pipeline tests: graph shape, deterministic ordering, and full
//! local execution with the concat recipe.

use crate::fixtures::{build, run_locally, TestProject};
use seqflow::builder::{COHORT_STAGE, REPLICATE_STAGE, SAMPLE_STAGE};

#[test]
fn test_three_tier_graph_shape() {
    let project = TestProject::new();
    let config = project.config(vec![
        project.sample("A", &["L1", "L2"]),
        project.sample("B", &["L1"]),
    ]);
    let pipeline = build(&config).unwrap();

    let replicate_names: Vec<&str> = pipeline
        .stage(REPLICATE_STAGE)
        .unwrap()
        .units()
        .map(|u| u.name.as_str())
        .collect();
    assert_eq!(
        replicate_names,
        vec![
            "process_replicate_A_L1",
            "process_replicate_A_L2",
            "process_replicate_B_L1",
        ]
    );

    let sample_a = pipeline.find_unit("process_sample_A").unwrap();
    assert_eq!(
        sample_a.dependencies,
        vec!["process_replicate_A_L1", "process_replicate_A_L2"]
    );
    let sample_b = pipeline.find_unit("process_sample_B").unwrap();
    assert_eq!(sample_b.dependencies, vec!["process_replicate_B_L1"]);

    let cohort_stage = pipeline.stage(COHORT_STAGE).unwrap();
    assert_eq!(cohort_stage.len(), 1);
    let cohort = pipeline.find_unit("process_cohort_cohort").unwrap();
    assert_eq!(cohort.dependencies, vec!["process_sample_A", "process_sample_B"]);
}

#[test]
fn test_unit_order_is_lexicographic_regardless_of_insertion() {
    let project = TestProject::new();
    // Deliberately inserted out of order.
    let config = project.config(vec![
        project.sample("zulu", &["L2", "L1"]),
        project.sample("alpha", &["L9", "L10"]),
        project.sample("mike", &["L1"]),
    ]);
    let pipeline = build(&config).unwrap();

    let names: Vec<&str> = pipeline
        .stage(REPLICATE_STAGE)
        .unwrap()
        .units()
        .map(|u| u.name.as_str())
        .collect();
    // Lexicographic on (sample, replicate key); note L10 < L9 as strings.
    assert_eq!(
        names,
        vec![
            "process_replicate_alpha_L10",
            "process_replicate_alpha_L9",
            "process_replicate_mike_L1",
            "process_replicate_zulu_L1",
            "process_replicate_zulu_L2",
        ]
    );

    let sample_names: Vec<&str> = pipeline
        .stage(SAMPLE_STAGE)
        .unwrap()
        .units()
        .map(|u| u.name.as_str())
        .collect();
    assert_eq!(
        sample_names,
        vec![
            "process_sample_alpha",
            "process_sample_mike",
            "process_sample_zulu",
        ]
    );
}

#[test]
fn test_cohort_dependencies_are_exactly_the_sample_units() {
    let project = TestProject::new();
    let config = project.config(vec![
        project.sample("c", &["L1"]),
        project.sample("a", &["L1"]),
        project.sample("b", &["L1"]),
    ]);
    let pipeline = build(&config).unwrap();

    let cohort = pipeline.find_unit("process_cohort_cohort").unwrap();
    assert_eq!(
        cohort.dependencies,
        vec!["process_sample_a", "process_sample_b", "process_sample_c"]
    );
    // No duplicates.
    let mut deduped = cohort.dependencies.clone();
    deduped.dedup();
    assert_eq!(deduped, cohort.dependencies);
}

#[tokio::test]
async fn test_full_local_execution() {
    let project = TestProject::new();
    let config = project.config(vec![
        project.sample("A", &["L1", "L2"]),
        project.sample("B", &["L1"]),
    ]);
    let pipeline = build(&config).unwrap();

    let results = run_locally(&pipeline).await;
    assert_eq!(results.len(), 6);
    for (name, outcome) in &results {
        assert_eq!(*outcome.as_ref().unwrap(), 0, "unit {} failed", name);
    }

    // The cohort's combined artifact concatenates everything in
    // deterministic sample order.
    let cohort = pipeline.find_unit("process_cohort_cohort").unwrap();
    let combined = std::fs::read_to_string(cohort.artifact("combined").unwrap()).unwrap();
    assert_eq!(combined, "reads:A:L1\nreads:A:L2\nreads:B:L1\n");

    // Per-sample fan-out views exist and equal the combined result.
    let view_a = std::fs::read_to_string(cohort.artifact("view_A").unwrap()).unwrap();
    assert_eq!(view_a, combined);
    assert!(cohort.artifact("view_B").unwrap().exists());
}

#[tokio::test]
async fn test_rebuild_after_execution_skips_everything() {
    let project = TestProject::new();
    let config = project.config(vec![project.sample("A", &["L1"])]);

    let first = build(&config).unwrap();
    assert!(first.units().all(|u| u.submit));
    let results = run_locally(&first).await;
    assert!(results.iter().all(|(_, r)| r.is_ok()));

    // Every terminal artifact now exists non-empty, so a rebuild produces an
    // identical graph with nothing to run.
    let second = build(&config).unwrap();
    let first_names: Vec<String> = first.units().map(|u| u.name.clone()).collect();
    let second_names: Vec<String> = second.units().map(|u| u.name.clone()).collect();
    assert_eq!(first_names, second_names);
    assert!(second.units().all(|u| !u.submit));

    // Dependency edges survive even though every unit is skipped.
    let sample = second.find_unit("process_sample_A").unwrap();
    assert_eq!(sample.dependencies, vec!["process_replicate_A_L1"]);
}
