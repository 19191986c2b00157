//! Prefetch telemetry for observability and host feedback.
//!
//! Two layers:
//!
//! ```text
//! Request task ─────► ProgressSink ─────► host (log, closure, channel)
//!      │
//!      └────────────► PrefetchMetrics ─────► PrefetchSnapshot
//!                     (atomic counters)      (point-in-time copy)
//! ```
//!
//! Sinks see one request at a time; metrics aggregate over the lifetime of
//! a scheduler.
//!
//! # Example
//!
//! ```ignore
//! use tileahead::telemetry::PrefetchMetrics;
//!
//! let metrics = PrefetchMetrics::new();
//! metrics.request_started();
//! metrics.request_completed();
//!
//! let snapshot = metrics.snapshot();
//! println!("{}", snapshot);
//! ```

mod metrics;
mod sink;
mod snapshot;

pub use metrics::PrefetchMetrics;
pub use sink::{CallbackSink, LoggingSink, PrefetchProgress, ProgressEvent, ProgressSink};
pub use snapshot::PrefetchSnapshot;
