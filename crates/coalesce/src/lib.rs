//! Debounced, fire-and-forget text writes keyed by file path
//!
//! This crate provides two entry points, [`Coalescer::append`] and
//! [`Coalescer::write`], that return before any I/O happens. If requests
//! for the same path arrive while a previous write for that path is still
//! running, their content is staged and flushed in a single follow-up
//! write once the stream of requests pauses.
//!
//! It is useful when many small writes are requested for the same file in
//! a short time, for example a log file fed by a burst of events:
//!
//! ```no_run
//! use coalesce::Coalescer;
//!
//! # #[tokio::main] async fn main() {
//! let writer = Coalescer::new();
//!
//! writer.append("log.txt", "foo\n");
//! writer.append("log.txt", "bar\n");
//! // log.txt eventually contains "foo\nbar\n", in at most two writes
//! # }
//! ```
//!
//! [`Coalescer::write`] replaces instead of appending; staged content from
//! earlier replace requests is discarded:
//!
//! ```no_run
//! use coalesce::Coalescer;
//!
//! # #[tokio::main] async fn main() {
//! let writer = Coalescer::new();
//!
//! writer.write("state.txt", "foo\n");
//! writer.write("state.txt", "bar\n");
//! // state.txt eventually contains "bar\n"
//! # }
//! ```
//!
//! Writes never overlap for the same path, and different paths never wait
//! on each other. Callers get no acknowledgment: a failed disk write is
//! escalated through the configured fatal hook (process abort by default),
//! never retried and never swallowed.

pub mod coalescer;
pub mod error;
pub mod sink;

pub use coalescer::{Coalescer, CoalescerConfig, WriteMode};
pub use error::{FatalHook, WriteFailure};
pub use sink::{DiskSink, WriteSink};

use std::time::Duration;

/// Delay between a request hitting a busy path and the follow-up write
/// attempt. Every new request for that path restarts the countdown.
pub const DEBOUNCE_INTERVAL: Duration = Duration::from_millis(100);
