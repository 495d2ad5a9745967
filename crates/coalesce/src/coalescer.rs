//! Write scheduling: busy tracking, staging, and debounced follow-up writes
//!
//! One write cycle per path at a time. Requests that land on a busy path
//! are staged in a pending job and flushed by a debounce timer; the timer
//! re-enters the same submission path as external callers, so a drain that
//! fires while the original write is still running simply re-stages.

use crate::error::{default_fatal_hook, FatalHook, WriteFailure};
use crate::sink::{DiskSink, WriteSink};
use crate::DEBOUNCE_INTERVAL;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;

/// How a request's content combines with what is already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Concatenate after the existing file content
    Append,
    /// Substitute the file content entirely
    Replace,
}

/// Tuning knobs for a [`Coalescer`].
pub struct CoalescerConfig {
    /// Physical write collaborator
    pub sink: Arc<dyn WriteSink>,
    /// Follow-up write delay; restarted by every request to a busy path
    pub debounce: Duration,
    /// Escalation channel for failed writes
    pub fatal: FatalHook,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            sink: Arc::new(DiskSink),
            debounce: DEBOUNCE_INTERVAL,
            fatal: default_fatal_hook(),
        }
    }
}

/// Content staged for a busy path, waiting for the next write cycle.
struct PendingJob {
    /// Fragments in arrival order; flushed as one concatenated string
    segments: Vec<String>,
    /// Mode the next cycle will use; only creation or a Replace set it
    mode: WriteMode,
    /// Armed debounce timer; re-arming aborts the previous one
    timer: Option<AbortHandle>,
    /// Identifies the arming this job last saw; a timer task whose epoch
    /// is older lost an abort race and must not drain
    epoch: u64,
}

/// Fire-and-forget text writer with per-path write coalescing.
///
/// Cheap to clone; clones share the same busy set and pending jobs. All
/// methods must be called from within a tokio runtime, since write cycles
/// and debounce timers run as spawned tasks.
#[derive(Clone)]
pub struct Coalescer {
    inner: Arc<Inner>,
}

struct Inner {
    sink: Arc<dyn WriteSink>,
    debounce: Duration,
    fatal: FatalHook,
    /// Monotonic source for job epochs, shared across all paths
    clock: AtomicU64,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    /// Paths with a write cycle currently executing
    busy: HashSet<String>,
    /// Staged content per busy path
    pending: HashMap<String, PendingJob>,
}

impl Coalescer {
    /// Coalescer writing to disk with the default debounce interval.
    pub fn new() -> Self {
        Self::with_config(CoalescerConfig::default())
    }

    pub fn with_config(config: CoalescerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                sink: config.sink,
                debounce: config.debounce,
                fatal: config.fatal,
                clock: AtomicU64::new(0),
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Append `content` to the file at `key`, asynchronously.
    ///
    /// Returns before any I/O happens. If a write for `key` is already
    /// running, the content is staged and lands in the next write cycle
    /// together with anything else staged in the meantime.
    pub fn append(&self, key: impl Into<String>, content: impl Into<String>) {
        self.inner.submit(key.into(), content.into(), WriteMode::Append);
    }

    /// Replace the file at `key` with `content`, asynchronously.
    ///
    /// Returns before any I/O happens. If a write for `key` is already
    /// running, the content is staged; staged content from earlier
    /// requests is discarded, so only the newest replacement survives.
    pub fn write(&self, key: impl Into<String>, content: impl Into<String>) {
        self.inner.submit(key.into(), content.into(), WriteMode::Replace);
    }

    /// True when no path has a running write cycle or staged content.
    ///
    /// Introspection only, with no ordering guarantee. Useful to quiesce
    /// before shutdown, since fire-and-forget has no flush.
    pub fn idle(&self) -> bool {
        let state = self.inner.state.lock();
        state.busy.is_empty() && state.pending.is_empty()
    }
}

impl Default for Coalescer {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    /// Single submission path, shared by the public API and timer drains.
    fn submit(self: &Arc<Self>, key: String, content: String, mode: WriteMode) {
        let mut state = self.state.lock();
        self.submit_locked(&mut state, key, content, mode);
    }

    /// Body of [`submit`], run under the state lock. Drains call this with
    /// the guard they already hold, so removing a job and resubmitting its
    /// content is one atomic step and `idle()` never reads true in between.
    fn submit_locked(self: &Arc<Self>, state: &mut State, key: String, content: String, mode: WriteMode) {
        if !state.busy.contains(&key) {
            state.busy.insert(key.clone());
            self.start_cycle(key, content, mode);
            return;
        }

        // Busy path: stage the content and restart the debounce timer.
        let epoch = self.clock.fetch_add(1, Ordering::Relaxed);
        match state.pending.get_mut(&key) {
            Some(job) => {
                if let Some(timer) = job.timer.take() {
                    timer.abort();
                }
                match mode {
                    WriteMode::Replace => {
                        // A replacement makes earlier staged content moot.
                        job.segments.clear();
                        job.segments.push(content);
                        job.mode = WriteMode::Replace;
                    }
                    WriteMode::Append => {
                        // Appending to a staged replacement keeps the
                        // replacement first and does not change the mode.
                        job.segments.push(content);
                    }
                }
                job.epoch = epoch;
            }
            None => {
                state.pending.insert(
                    key.clone(),
                    PendingJob {
                        segments: vec![content],
                        mode,
                        timer: None,
                        epoch,
                    },
                );
            }
        }

        let inner = Arc::clone(self);
        let timer_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            inner.drain(&timer_key, epoch);
        });
        if let Some(job) = state.pending.get_mut(&key) {
            job.timer = Some(handle.abort_handle());
        }
    }

    /// Run one physical write cycle for `key`, clearing the busy marker
    /// on completion. A failed write escalates through the fatal hook
    /// after the marker is cleared, so the path is not left locked.
    fn start_cycle(self: &Arc<Self>, key: String, content: String, mode: WriteMode) {
        tracing::debug!(key = %key, ?mode, bytes = content.len(), "starting write cycle");
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let result = inner.sink.persist(&key, &content, mode).await;
            inner.state.lock().busy.remove(&key);
            if let Err(source) = result {
                (inner.fatal)(WriteFailure { key, source });
            }
        });
    }

    /// Timer callback: flush the staged job through the shared submission
    /// path, which re-stages if the path is still busy.
    fn drain(self: &Arc<Self>, key: &str, epoch: u64) {
        let mut state = self.state.lock();
        let stale = state.pending.get(key).map_or(true, |job| job.epoch != epoch);
        if stale {
            // A newer request re-armed after this timer fired.
            return;
        }
        let Some(job) = state.pending.remove(key) else { return };

        tracing::debug!(key = %key, segments = job.segments.len(), "draining staged content");
        self.submit_locked(&mut state, key.to_owned(), job.segments.concat(), job.mode);
    }
}
