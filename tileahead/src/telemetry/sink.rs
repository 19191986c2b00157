//! Progress reporting for individual requests.

use tokio::sync::mpsc;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::prefetch::{PrefetchReport, RequestState};

/// Fetch progress of one request, emitted every time a fetch settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchProgress {
    pub request_id: Uuid,
    /// Fetches that succeeded so far
    pub loaded: usize,
    /// Fetches that failed so far
    pub failed: usize,
    /// Fetches queued for the request
    pub total: usize,
}

impl PrefetchProgress {
    /// Fetches settled either way.
    pub fn settled(&self) -> usize {
        self.loaded + self.failed
    }

    /// Settled share of the queue (0.0 - 1.0).
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.settled() as f64 / self.total as f64
        }
    }
}

/// Event delivered through a channel sink.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Progress(PrefetchProgress),
    Finished(PrefetchReport),
}

/// Observer of request progress.
///
/// Called from the request's control task; implementations must not
/// block. Progress is only reported for outcomes accepted before the
/// request was cancelled.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, progress: &PrefetchProgress);

    /// Called exactly once when the request reaches a terminal state.
    fn on_finished(&self, _report: &PrefetchReport) {}
}

/// Sink that writes progress to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl ProgressSink for LoggingSink {
    fn on_progress(&self, progress: &PrefetchProgress) {
        trace!(
            request_id = %progress.request_id,
            loaded = progress.loaded,
            failed = progress.failed,
            total = progress.total,
            "Prefetch progress"
        );
    }

    fn on_finished(&self, report: &PrefetchReport) {
        match report.state {
            RequestState::Completed => info!(
                request_id = %report.request_id,
                kind = %report.kind,
                loaded = report.loaded,
                failed = report.failed,
                total = report.total,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Prefetch finished"
            ),
            state => debug!(
                request_id = %report.request_id,
                kind = %report.kind,
                state = %state,
                loaded = report.loaded,
                failed = report.failed,
                total = report.total,
                "Prefetch ended early"
            ),
        }
    }
}

/// Sink forwarding progress to a closure.
pub struct CallbackSink<F>
where
    F: Fn(&PrefetchProgress) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackSink<F>
where
    F: Fn(&PrefetchProgress) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressSink for CallbackSink<F>
where
    F: Fn(&PrefetchProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &PrefetchProgress) {
        (self.callback)(progress);
    }
}

/// Channel sink. A closed receiver is ignored.
impl ProgressSink for mpsc::UnboundedSender<ProgressEvent> {
    fn on_progress(&self, progress: &PrefetchProgress) {
        let _ = self.send(ProgressEvent::Progress(*progress));
    }

    fn on_finished(&self, report: &PrefetchReport) {
        let _ = self.send(ProgressEvent::Finished(report.clone()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn progress(loaded: usize, failed: usize, total: usize) -> PrefetchProgress {
        PrefetchProgress {
            request_id: Uuid::new_v4(),
            loaded,
            failed,
            total,
        }
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(progress(3, 1, 8).fraction(), 0.5);
        assert_eq!(progress(0, 0, 0).fraction(), 1.0);
    }

    #[test]
    fn test_callback_sink_invoked() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let sink = CallbackSink::new(move |p: &PrefetchProgress| {
            seen.fetch_add(p.loaded, Ordering::SeqCst);
        });

        sink.on_progress(&progress(2, 0, 5));
        sink.on_progress(&progress(3, 0, 5));
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_channel_sink_forwards_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.on_progress(&progress(1, 0, 2));

        match rx.try_recv() {
            Ok(ProgressEvent::Progress(p)) => assert_eq!(p.loaded, 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        tx.on_progress(&progress(1, 0, 2));
    }
}
