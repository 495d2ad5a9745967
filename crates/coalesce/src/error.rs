//! Failure escalation for fire-and-forget writes
//!
//! The public API returns nothing, so a failed physical write cannot be
//! reported to the caller. It is handed to a [`FatalHook`] instead.

use std::sync::Arc;
use thiserror::Error;

/// A physical write reported an error.
///
/// Never retried: the content handed to the failed write is gone. The
/// path's busy marker is cleared before escalation, so later requests for
/// the same path are still accepted.
#[derive(Debug, Error)]
#[error("write to {key:?} failed: {source}")]
pub struct WriteFailure {
    /// Path the write was addressed to
    pub key: String,
    /// Error reported by the write sink
    #[source]
    pub source: std::io::Error,
}

/// Out-of-band channel for unrecoverable write failures.
///
/// Invoked from the completion path of a failed write, after the busy
/// marker has been cleared. See [`default_fatal_hook`] for the default.
pub type FatalHook = Arc<dyn Fn(WriteFailure) + Send + Sync>;

/// Default fatal hook: log the failure and abort the process.
///
/// A panic here would be contained by the spawned completion task and
/// silently dropped, which would turn a lost write into a no-op. Aborting
/// keeps the failure loud. Tests and embedders that want different
/// escalation install their own hook via
/// [`CoalescerConfig`](crate::CoalescerConfig).
pub fn default_fatal_hook() -> FatalHook {
    Arc::new(|failure: WriteFailure| {
        tracing::error!(key = %failure.key, error = %failure.source, "unrecoverable write failure");
        std::process::abort();
    })
}
