//! Lock-free atomic prefetch metrics.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::PrefetchSnapshot;

/// Lock-free counters shared by every request of a scheduler.
///
/// All operations use `Relaxed` ordering; the counters are independent
/// measurements and a snapshot is allowed to be slightly torn.
#[derive(Debug)]
pub struct PrefetchMetrics {
    start_time: Instant,

    // === Request metrics ===
    requests_started: AtomicU64,
    requests_completed: AtomicU64,
    requests_cancelled: AtomicU64,
    requests_timed_out: AtomicU64,
    requests_rejected: AtomicU64,
    requests_active: AtomicUsize,

    // === Resolution metrics ===
    poses_sampled: AtomicU64,
    poses_shrunk: AtomicU64,
    poses_capped: AtomicU64,

    // === Fetch metrics ===
    tiles_requested: AtomicU64,
    tiles_succeeded: AtomicU64,
    tiles_failed: AtomicU64,
    tiles_aborted: AtomicU64,
    fetches_in_flight: AtomicUsize,
    /// Total time spent in settled fetches, in microseconds
    fetch_time_us: AtomicU64,
}

impl PrefetchMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            requests_started: AtomicU64::new(0),
            requests_completed: AtomicU64::new(0),
            requests_cancelled: AtomicU64::new(0),
            requests_timed_out: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            requests_active: AtomicUsize::new(0),
            poses_sampled: AtomicU64::new(0),
            poses_shrunk: AtomicU64::new(0),
            poses_capped: AtomicU64::new(0),
            tiles_requested: AtomicU64::new(0),
            tiles_succeeded: AtomicU64::new(0),
            tiles_failed: AtomicU64::new(0),
            tiles_aborted: AtomicU64::new(0),
            fetches_in_flight: AtomicUsize::new(0),
            fetch_time_us: AtomicU64::new(0),
        }
    }

    // === Request tracking ===

    pub fn request_started(&self) {
        self.requests_started.fetch_add(1, Ordering::Relaxed);
        self.requests_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_completed(&self) {
        self.requests_completed.fetch_add(1, Ordering::Relaxed);
        self.requests_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn request_cancelled(&self) {
        self.requests_cancelled.fetch_add(1, Ordering::Relaxed);
        self.requests_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn request_timed_out(&self) {
        self.requests_timed_out.fetch_add(1, Ordering::Relaxed);
        self.requests_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a request refused before it started (invalid pose).
    pub fn request_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // === Resolution tracking ===

    /// Record the outcome of resolving one request's poses.
    pub fn poses_resolved(&self, sampled: usize, shrunk: usize, capped: usize) {
        self.poses_sampled.fetch_add(sampled as u64, Ordering::Relaxed);
        self.poses_shrunk.fetch_add(shrunk as u64, Ordering::Relaxed);
        self.poses_capped.fetch_add(capped as u64, Ordering::Relaxed);
    }

    // === Fetch tracking ===

    pub fn fetch_started(&self) {
        self.tiles_requested.fetch_add(1, Ordering::Relaxed);
        self.fetches_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_succeeded(&self, elapsed: Duration) {
        self.tiles_succeeded.fetch_add(1, Ordering::Relaxed);
        self.fetch_settled(elapsed);
    }

    pub fn fetch_failed(&self, elapsed: Duration) {
        self.tiles_failed.fetch_add(1, Ordering::Relaxed);
        self.fetch_settled(elapsed);
    }

    /// Record in-flight fetches dropped by a cancellation or timeout.
    pub fn fetches_aborted(&self, count: usize) {
        self.tiles_aborted.fetch_add(count as u64, Ordering::Relaxed);
        self.fetches_in_flight.fetch_sub(count, Ordering::Relaxed);
    }

    fn fetch_settled(&self, elapsed: Duration) {
        self.fetches_in_flight.fetch_sub(1, Ordering::Relaxed);
        self.fetch_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of every counter.
    pub fn snapshot(&self) -> PrefetchSnapshot {
        let uptime = self.start_time.elapsed();
        let uptime_secs = uptime.as_secs_f64().max(0.001);

        let tiles_succeeded = self.tiles_succeeded.load(Ordering::Relaxed);
        let tiles_failed = self.tiles_failed.load(Ordering::Relaxed);
        let settled = tiles_succeeded + tiles_failed;
        let fetch_time_us = self.fetch_time_us.load(Ordering::Relaxed);

        PrefetchSnapshot {
            uptime,
            requests_started: self.requests_started.load(Ordering::Relaxed),
            requests_completed: self.requests_completed.load(Ordering::Relaxed),
            requests_cancelled: self.requests_cancelled.load(Ordering::Relaxed),
            requests_timed_out: self.requests_timed_out.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            requests_active: self.requests_active.load(Ordering::Relaxed),
            poses_sampled: self.poses_sampled.load(Ordering::Relaxed),
            poses_shrunk: self.poses_shrunk.load(Ordering::Relaxed),
            poses_capped: self.poses_capped.load(Ordering::Relaxed),
            tiles_requested: self.tiles_requested.load(Ordering::Relaxed),
            tiles_succeeded,
            tiles_failed,
            tiles_aborted: self.tiles_aborted.load(Ordering::Relaxed),
            fetches_in_flight: self.fetches_in_flight.load(Ordering::Relaxed),
            tiles_per_second: settled as f64 / uptime_secs,
            success_rate: if settled > 0 {
                tiles_succeeded as f64 / settled as f64
            } else {
                0.0
            },
            avg_fetch_ms: if settled > 0 {
                fetch_time_us as f64 / settled as f64 / 1000.0
            } else {
                0.0
            },
        }
    }
}

impl Default for PrefetchMetrics {
    fn default() -> Self {
        Self::new()
    }
}
