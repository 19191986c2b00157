//! tileahead - path-aware tile prefetching for animated map cameras
//!
//! When a map camera pans, zooms or flies from one view to another, the
//! tiles it will pass over can be requested before the animation shows
//! them. This crate samples the camera path, resolves the tiles visible at
//! each sampled pose (shrinking oversized views to a burst limit), and
//! fetches them concurrently under a cancellation token and deadline.
//!
//! # Overview
//!
//! ```text
//! request_prefetch(kind, options)
//!        │
//!        ▼
//!  camera::sample_path ──► resolver::TilePlan ──► FetchQueue ──► TileFetcher
//!   (pan/zoom/ease/fly)     (end view first,       (unique        (reqwest or
//!                            burst-limited path)    URLs)          host-provided)
//! ```
//!
//! The host supplies the camera state and tile sources through
//! [`host::MapHost`]; fetched responses are discarded so they land in the
//! host's HTTP cache.
//!
//! ```ignore
//! use std::sync::Arc;
//! use tileahead::prelude::*;
//!
//! let host = Arc::new(StaticMapHost::new(pose, Viewport::new(1024, 768), sources));
//! let scheduler = PrefetchScheduler::new(host, Arc::new(ReqwestFetcher::new()?), PrefetchConfig::default())?;
//! let report = scheduler
//!     .request_prefetch(AnimationKind::Ease, AnimationOptions::new().zoom(10.0))
//!     .await?
//!     .wait()
//!     .await?;
//! ```

pub mod camera;
pub mod config;
pub mod coord;
pub mod error;
pub mod fetch;
pub mod host;
pub mod logging;
pub mod prefetch;
pub mod resolver;
pub mod telemetry;

/// Version of the tileahead library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports for hosts.
pub mod prelude {
    pub use crate::camera::{AnimationKind, AnimationOptions, CameraPose, LngLat};
    pub use crate::config::PrefetchConfig;
    pub use crate::error::PrefetchError;
    pub use crate::fetch::{ReqwestFetcher, TileFetcher};
    pub use crate::host::{MapHost, StaticMapHost, TileScheme, TileSource, Viewport};
    pub use crate::prefetch::{PrefetchHandle, PrefetchReport, PrefetchScheduler, RequestState};
    pub use crate::resolver::PathStrategy;
    pub use crate::telemetry::{LoggingSink, ProgressSink};
}
