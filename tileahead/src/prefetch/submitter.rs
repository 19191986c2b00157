//! Fetch fan-out with deadline and cancellation.
//!
//! The submitter keeps a sliding window of fetches in flight:
//! 1. Issue the first `window` requests of the queue
//! 2. As each fetch settles, record it and issue the next queued request
//! 3. Stop on cancellation or deadline, dropping whatever is still in flight
//!
//! Without a configured ceiling the window is the whole queue, so every
//! fetch starts at once. Once the movement has ended no further requests
//! are issued, but fetches already in flight are still awaited.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::fetch::{FetchError, TileFetcher};
use crate::resolver::FetchQueue;
use crate::telemetry::{PrefetchMetrics, PrefetchProgress, ProgressSink};

use super::registry::RequestControl;
use super::request::{CancelReason, RequestState};

/// Counts and terminal state of one fetch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SubmissionResult {
    pub state: RequestState,
    pub issued: usize,
    pub loaded: usize,
    pub failed: usize,
}

/// Issues the fetches of one request.
pub(crate) struct TileSubmitter {
    fetcher: Arc<dyn TileFetcher>,
    metrics: Arc<PrefetchMetrics>,
    sink: Option<Arc<dyn ProgressSink>>,
    max_in_flight: Option<usize>,
}

impl TileSubmitter {
    pub fn new(
        fetcher: Arc<dyn TileFetcher>,
        metrics: Arc<PrefetchMetrics>,
        sink: Option<Arc<dyn ProgressSink>>,
        max_in_flight: Option<usize>,
    ) -> Self {
        Self {
            fetcher,
            metrics,
            sink,
            max_in_flight,
        }
    }

    /// Runs every fetch of `queue` until all settle, the request is
    /// cancelled, or `deadline` passes.
    pub async fn submit_and_track(
        &self,
        queue: &FetchQueue,
        control: &RequestControl,
        deadline: Instant,
    ) -> SubmissionResult {
        let total = queue.len();
        let token = control.token();
        let window = self.max_in_flight.unwrap_or(total).max(1);

        let mut pending = FuturesUnordered::new();
        let mut requests = queue.requests.iter();
        let mut result = SubmissionResult {
            state: RequestState::Completed,
            issued: 0,
            loaded: 0,
            failed: 0,
        };

        if control.is_cancelled() {
            result.state = cancelled_state(control);
            return result;
        }

        for request in requests.by_ref().take(window) {
            pending.push(self.issue(&request.url, token));
            result.issued += 1;
        }
        debug!(
            request_id = %control.id(),
            in_flight = pending.len(),
            queued = requests.len(),
            "Initial fetch batch issued"
        );

        let sleep = tokio::time::sleep_until(deadline);
        tokio::pin!(sleep);

        while !pending.is_empty() {
            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    self.abort(&mut pending, control.id(), "cancelled");
                    result.state = cancelled_state(control);
                    return result;
                }

                _ = &mut sleep => {
                    // Stop fetchers that watch the token
                    token.cancel();
                    self.abort(&mut pending, control.id(), "deadline");
                    result.state = RequestState::TimedOut;
                    return result;
                }

                Some((url, outcome, elapsed)) = pending.next() => {
                    match outcome {
                        Ok(()) => {
                            result.loaded += 1;
                            self.metrics.fetch_succeeded(elapsed);
                        }
                        Err(e) => {
                            result.failed += 1;
                            self.metrics.fetch_failed(elapsed);
                            trace!(url = %url, error = %e, "Tile fetch failed");
                        }
                    }
                    self.report_progress(control.id(), &result, total);

                    if !control.movement_ended() {
                        if let Some(request) = requests.next() {
                            pending.push(self.issue(&request.url, token));
                            result.issued += 1;
                        }
                    }
                }
            }
        }

        if result.issued < total {
            debug!(
                request_id = %control.id(),
                skipped = total - result.issued,
                "Movement ended before the queue was drained"
            );
            result.state = RequestState::Cancelled(CancelReason::MovementEnded);
        }
        result
    }

    fn issue<'a>(
        &'a self,
        url: &'a str,
        cancel: &'a CancellationToken,
    ) -> impl Future<Output = (&'a str, Result<(), FetchError>, Duration)> + Send + 'a {
        self.metrics.fetch_started();
        let started = Instant::now();
        let fetch = self.fetcher.fetch(url, cancel);
        async move {
            let outcome = fetch.await;
            (url, outcome, started.elapsed())
        }
    }

    fn abort<S>(&self, pending: &mut FuturesUnordered<S>, request_id: Uuid, cause: &str) {
        let in_flight = pending.len();
        pending.clear();
        self.metrics.fetches_aborted(in_flight);
        debug!(
            request_id = %request_id,
            in_flight,
            cause,
            "Dropped in-flight fetches"
        );
    }

    fn report_progress(&self, request_id: Uuid, result: &SubmissionResult, total: usize) {
        if let Some(sink) = &self.sink {
            sink.on_progress(&PrefetchProgress {
                request_id,
                loaded: result.loaded,
                failed: result.failed,
                total,
            });
        }
    }
}

fn cancelled_state(control: &RequestControl) -> RequestState {
    RequestState::Cancelled(control.reason().unwrap_or(CancelReason::Aborted))
}
