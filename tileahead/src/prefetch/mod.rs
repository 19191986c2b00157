//! Request scheduling and fetch execution.
//!
//! # Architecture
//!
//! - [`PrefetchScheduler`] - per-map entry point; admits one request at a
//!   time and cancels the previous one first
//! - [`PrefetchHandle`] - caller-side view of a request (state, report,
//!   cancel)
//! - `TileSubmitter` - fans the fetch queue out with a sliding window and
//!   enforces the deadline
//! - `RequestRegistry` - cancellation tokens of live requests
//!
//! # Example
//!
//! ```ignore
//! let scheduler = PrefetchScheduler::new(host, fetcher, PrefetchConfig::default())?;
//!
//! let handle = scheduler
//!     .request_prefetch(AnimationKind::Fly, AnimationOptions::new().center(2.35, 48.85).zoom(12.0))
//!     .await?;
//! // ... run the camera animation ...
//! scheduler.on_movement_ended();
//!
//! let report = handle.wait().await?;
//! println!("{} of {} tiles loaded", report.loaded, report.total);
//! ```

mod handle;
mod registry;
mod request;
mod scheduler;
mod submitter;

pub use handle::PrefetchHandle;
pub use request::{CancelReason, PrefetchReport, RequestState};
pub use scheduler::PrefetchScheduler;
