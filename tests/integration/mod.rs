//! Integration test suite for seqflow.
//!
//! These tests exercise the full path from configuration to executed
//! pipeline: the three-tier fan-in, checkpoint-based resume, descriptor
//! round-trips, and dependency gating in the local executor.
//!
//! # Test Categories
//!
//! - `pipeline_e2e`: Graph shape, ordering, and full local execution
//! - `resume`: Checkpoint policy behavior across rebuilds
//! - `descriptor`: Out-of-process work-unit serialization
//! - `execution`: Executor dependency contracts and failure isolation
//!
//! # CI Compatibility
//!
//! All external processes are coreutils (`cat`, `cp`, `sh`), so the suite
//! runs on any POSIX host without scientific tooling installed.

mod fixtures;

mod descriptor;
mod pipeline_e2e;
mod resume;
