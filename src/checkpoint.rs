//! Checkpoint policy for idempotent resume.
//!
//! A work unit may be skipped when its declared terminal artifact already
//! exists with non-zero size; it must run when the artifact is missing or
//! empty. The policy is evaluated exactly once, at graph-construction time,
//! never re-evaluated mid-execution.
//!
//! Known risk: a process killed after creating its terminal artifact but
//! before finishing it can leave a truncated non-empty file, which this
//! policy will treat as success. The ambiguity is accepted and documented;
//! resolving it would require a manifest or content check this engine does
//! not keep.

use std::path::Path;

use crate::slog_debug;

/// Returns true when the producing unit must run: the artifact is missing or
/// has zero length. Returns false when the artifact exists non-empty and the
/// unit may be skipped.
pub fn should_run(terminal_artifact: &Path) -> bool {
    let run = match std::fs::metadata(terminal_artifact) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };
    slog_debug!(
        "checkpoint: {} -> {}",
        terminal_artifact.display(),
        if run { "run" } else { "skip" }
    );
    run
}
