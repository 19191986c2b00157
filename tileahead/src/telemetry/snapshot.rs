//! Point-in-time metrics snapshot.

use std::fmt;
use std::time::Duration;

/// Immutable copy of [`PrefetchMetrics`](super::PrefetchMetrics).
///
/// Rates are computed at snapshot time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrefetchSnapshot {
    /// Time since the metrics were created
    pub uptime: Duration,

    // === Requests ===
    pub requests_started: u64,
    pub requests_completed: u64,
    pub requests_cancelled: u64,
    pub requests_timed_out: u64,
    /// Requests refused because of an invalid pose
    pub requests_rejected: u64,
    pub requests_active: usize,

    // === Resolution ===
    pub poses_sampled: u64,
    /// Intermediate poses shrunk to fit the burst limit
    pub poses_shrunk: u64,
    /// Intermediate poses that needed the hard cap
    pub poses_capped: u64,

    // === Fetches ===
    pub tiles_requested: u64,
    pub tiles_succeeded: u64,
    pub tiles_failed: u64,
    /// In-flight fetches dropped by cancellation or timeout
    pub tiles_aborted: u64,
    pub fetches_in_flight: usize,

    // === Computed ===
    pub tiles_per_second: f64,
    /// Successful share of settled fetches (0.0 - 1.0)
    pub success_rate: f64,
    pub avg_fetch_ms: f64,
}

impl fmt::Display for PrefetchSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requests {} started / {} completed / {} cancelled / {} timed out, \
             tiles {} ok / {} failed / {} aborted ({:.0}% ok, {:.1} ms avg)",
            self.requests_started,
            self.requests_completed,
            self.requests_cancelled,
            self.requests_timed_out,
            self.tiles_succeeded,
            self.tiles_failed,
            self.tiles_aborted,
            self.success_rate * 100.0,
            self.avg_fetch_ms
        )
    }
}
