//! Sample entity boundary.
//!
//! The engine consumes only replicate keys and opaque read-file paths from
//! the entity model. Replicates live in a `BTreeMap` so key iteration is
//! already the deterministic lexicographic order the builder requires.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One sequencing read pair (or a single-ended read when `reads2` is absent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadPair {
    /// Path to the first (or only) reads file.
    pub reads1: PathBuf,
    /// Path to the second reads file for paired-end data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reads2: Option<PathBuf>,
}

impl ReadPair {
    pub fn single(reads1: impl Into<PathBuf>) -> Self {
        Self {
            reads1: reads1.into(),
            reads2: None,
        }
    }

    pub fn paired(reads1: impl Into<PathBuf>, reads2: impl Into<PathBuf>) -> Self {
        Self {
            reads1: reads1.into(),
            reads2: Some(reads2.into()),
        }
    }
}

/// A named sample with its replicate groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub name: String,
    /// Replicate key -> read pairs for that replicate.
    #[serde(default)]
    pub replicates: BTreeMap<String, Vec<ReadPair>>,
}

impl Sample {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            replicates: BTreeMap::new(),
        }
    }

    /// Add a read pair under a replicate key, creating the group on first use.
    pub fn add_read_pair(&mut self, replicate_key: &str, pair: ReadPair) {
        self.replicates
            .entry(replicate_key.to_string())
            .or_default()
            .push(pair);
    }

    /// Replicate keys in lexicographic order.
    pub fn replicate_keys(&self) -> Vec<&str> {
        self.replicates.keys().map(String::as_str).collect()
    }

    /// True when the sample carries no replicates at all.
    pub fn is_empty(&self) -> bool {
        self.replicates.is_empty()
    }
}
