//! Work-unit descriptor serialization for out-of-process execution.

use crate::fixtures::{build, TestProject};
use seqflow::core::unit::{WorkUnit, DESCRIPTOR_FORMAT, DESCRIPTOR_VERSION};
use seqflow::Error;

#[test]
fn test_every_built_unit_round_trips_losslessly() {
    let project = TestProject::new();
    let config = project.config(vec![
        project.sample("A", &["L1", "L2"]),
        project.sample("B", &["L1"]),
    ]);
    let pipeline = build(&config).unwrap();

    for unit in pipeline.units() {
        let json = unit.to_descriptor_json().unwrap();
        let parsed = WorkUnit::from_descriptor_json(&json).unwrap();
        assert_eq!(&parsed, unit, "descriptor round-trip changed {}", unit.name);
        // Dependencies stay symbolic names, resolvable at the consuming end.
        assert_eq!(parsed.dependencies, unit.dependencies);
    }
}

#[test]
fn test_descriptor_envelope_is_tagged_and_versioned() {
    let project = TestProject::new();
    let config = project.config(vec![project.sample("A", &["L1"])]);
    let pipeline = build(&config).unwrap();

    let unit = pipeline.find_unit("process_replicate_A_L1").unwrap();
    let json = unit.to_descriptor_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["format"], DESCRIPTOR_FORMAT);
    assert_eq!(value["schema_version"], DESCRIPTOR_VERSION);
}

#[test]
fn test_descriptor_from_wrong_version_is_rejected() {
    let project = TestProject::new();
    let config = project.config(vec![project.sample("A", &["L1"])]);
    let pipeline = build(&config).unwrap();

    let unit = pipeline.find_unit("process_replicate_A_L1").unwrap();
    let mut descriptor = unit.descriptor();
    descriptor.schema_version = 99;
    let json = serde_json::to_string(&descriptor).unwrap();
    assert!(matches!(
        WorkUnit::from_descriptor_json(&json),
        Err(Error::DescriptorVersion { found: 99, .. })
    ));
}

#[tokio::test]
async fn test_deserialized_unit_executes_identically() {
    let project = TestProject::new();
    let config = project.config(vec![project.sample("A", &["L1"])]);
    let pipeline = build(&config).unwrap();

    // Ship the replicate unit across a (simulated) process boundary and run
    // the deserialized copy.
    let original = pipeline.find_unit("process_replicate_A_L1").unwrap();
    let json = original.to_descriptor_json().unwrap();
    let mut shipped = WorkUnit::from_descriptor_json(&json).unwrap();
    shipped.run().await.unwrap();

    let merged = std::fs::read_to_string(original.artifact("merged").unwrap()).unwrap();
    assert_eq!(merged, "reads:A:L1\n");
}
