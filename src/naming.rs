//! Deterministic artifact naming.
//!
//! Every artifact path is a pure function of (stage name, tier key, role
//! suffix). Re-running the builder against the same inputs reproduces
//! identical paths, which is what makes checkpoint-based resume work without
//! any database: file presence on disk is the only ledger. Path uniqueness
//! per (stage, tier key, role) is also the concurrency-safety mechanism —
//! independent units never write the same path, so no locking is needed.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"))
}

/// Normalize a tier key so equal logical keys never diverge in path.
///
/// Trims surrounding whitespace and collapses every run of characters that
/// are not path-safe (anything outside `[A-Za-z0-9._-]`, including internal
/// whitespace) into a single underscore. Case is preserved; the builder
/// rejects keys that collide case-insensitively instead.
pub fn normalize_key(key: &str) -> String {
    unsafe_chars().replace_all(key.trim(), "_").into_owned()
}

/// Derive the unique prefix for a unit: `{stage}_{normalized key}`.
///
/// The stage name acts as a namespace, so replicate/sample/cohort keys may
/// repeat across tiers without colliding.
pub fn unit_prefix(stage: &str, tier_key: &str) -> String {
    format!("{}_{}", stage, normalize_key(tier_key))
}

/// Derive an artifact path: `{workdir}/{prefix}_{suffix}`.
pub fn artifact_path(working_directory: &Path, prefix: &str, suffix: &str) -> PathBuf {
    working_directory.join(format!("{}_{}", prefix, suffix))
}
