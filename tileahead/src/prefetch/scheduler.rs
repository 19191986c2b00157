//! Prefetch scheduler: one live request per map, newest wins.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::camera::{sample_path, AnimationKind, AnimationOptions, AnimationParams, CameraPose};
use crate::config::PrefetchConfig;
use crate::error::PrefetchError;
use crate::fetch::TileFetcher;
use crate::host::MapHost;
use crate::resolver::{PathStrategy, TilePlan, VisibleTileResolver};
use crate::telemetry::{PrefetchMetrics, PrefetchSnapshot, ProgressSink};

use super::handle::PrefetchHandle;
use super::registry::{RequestControl, RequestRegistry};
use super::request::{CancelReason, PrefetchReport, RequestState};
use super::submitter::{SubmissionResult, TileSubmitter};

/// Prefetches the tiles a camera movement will show.
///
/// Call [`request_prefetch`](Self::request_prefetch) right before starting
/// the camera movement and [`on_movement_ended`](Self::on_movement_ended)
/// when it finishes. A new request always cancels the previous one first.
///
/// Dropping the scheduler cancels outstanding work.
pub struct PrefetchScheduler {
    host: Arc<dyn MapHost>,
    fetcher: Arc<dyn TileFetcher>,
    config: PrefetchConfig,
    sink: Option<Arc<dyn ProgressSink>>,
    metrics: Arc<PrefetchMetrics>,
    registry: Arc<RequestRegistry>,
}

impl PrefetchScheduler {
    /// Creates a scheduler for one map.
    ///
    /// # Errors
    ///
    /// [`PrefetchError::InvalidConfig`] if `config` fails validation.
    pub fn new(
        host: Arc<dyn MapHost>,
        fetcher: Arc<dyn TileFetcher>,
        config: PrefetchConfig,
    ) -> Result<Self, PrefetchError> {
        config.validate()?;
        Ok(Self {
            host,
            fetcher,
            config,
            sink: None,
            metrics: Arc::new(PrefetchMetrics::new()),
            registry: Arc::new(RequestRegistry::new()),
        })
    }

    /// Reports progress and outcomes to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &PrefetchConfig {
        &self.config
    }

    pub fn metrics(&self) -> PrefetchSnapshot {
        self.metrics.snapshot()
    }

    /// Number of requests that have not reached a terminal state.
    pub fn active_requests(&self) -> usize {
        self.registry.len()
    }

    /// Starts prefetching for a movement of `kind` from the host's current
    /// camera pose to the target described by `options`.
    ///
    /// The request always runs on a spawned task. In blocking mode this
    /// also waits for it to become terminal; dropping that wait does not
    /// cancel the request.
    ///
    /// # Errors
    ///
    /// [`PrefetchError::InvalidPose`] if the current or target pose has a
    /// non-finite or out-of-range field. Nothing is fetched in that case,
    /// but the previous request has already been cancelled.
    pub async fn request_prefetch(
        &self,
        kind: AnimationKind,
        options: AnimationOptions,
    ) -> Result<PrefetchHandle, PrefetchError> {
        let mut superseded = self.registry.cancel_all(CancelReason::Superseded);

        let start = self.host.camera_pose();
        let end = options.target(&start);
        if let Err(e) = start.validate().and_then(|_| end.validate()) {
            self.metrics.request_rejected();
            warn!(kind = %kind, error = %e, "Rejected prefetch request");
            return Err(e);
        }

        let params = options.params(kind, &self.config.animation_defaults(kind));
        let control = Arc::new(RequestControl::new());
        let (state_tx, state_rx) = watch::channel(RequestState::Created);
        let report = Arc::new(Mutex::new(None));
        let handle = PrefetchHandle::new(Arc::clone(&control), state_rx, Arc::clone(&report));

        // Requests admitted by other callers since the first cancel_all
        // are cancelled here, atomically with the insert.
        superseded += self
            .registry
            .admit(Arc::clone(&control), CancelReason::Superseded);
        self.metrics.request_started();
        if superseded > 0 {
            debug!(superseded, "Cancelled previous prefetch");
        }
        debug!(
            request_id = %handle.id(),
            kind = %kind,
            from = ?start.center.as_tuple(),
            to = ?end.center.as_tuple(),
            zoom_from = start.zoom,
            zoom_to = end.zoom,
            blocking = self.config.blocking,
            "Prefetch requested"
        );

        let run = RequestRun {
            control,
            kind,
            start,
            end,
            deadline: Instant::now() + self.config.deadline(params.duration_ms),
            params,
            strategy: self.config.strategy,
            telemetry: self.config.telemetry,
            resolver: VisibleTileResolver::new(
                Arc::clone(&self.host),
                self.config.resolver_settings(),
            ),
            submitter: TileSubmitter::new(
                Arc::clone(&self.fetcher),
                Arc::clone(&self.metrics),
                self.sink.clone(),
                self.config.max_in_flight,
            ),
            metrics: Arc::clone(&self.metrics),
            sink: self.sink.clone(),
            registry: Arc::clone(&self.registry),
            state: state_tx,
            report,
            finished: false,
        };

        tokio::spawn(run.execute());
        if self.config.blocking {
            let _ = handle.wait().await;
        }
        Ok(handle)
    }

    /// Signals that the camera movement finished.
    ///
    /// Fetches already in flight continue, but no further fetches are
    /// issued for the live request.
    pub fn on_movement_ended(&self) {
        let live = self.registry.end_movement_all();
        if live > 0 {
            debug!(live, "Movement ended before prefetch finished");
        } else if let Some(finished) = self.registry.last_finished() {
            debug!(
                after_ms = finished.elapsed().as_millis() as u64,
                "Movement ended after prefetch finished"
            );
        }
    }

    /// Cancels every live request.
    pub fn shutdown(&self) {
        let cancelled = self.registry.cancel_all(CancelReason::Shutdown);
        if cancelled > 0 {
            debug!(cancelled, "Prefetch scheduler shut down");
        }
    }
}

impl Drop for PrefetchScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Everything one request needs, owned so it can run on a spawned task.
struct RequestRun {
    control: Arc<RequestControl>,
    kind: AnimationKind,
    start: CameraPose,
    end: CameraPose,
    params: AnimationParams,
    deadline: Instant,
    strategy: PathStrategy,
    telemetry: bool,
    resolver: VisibleTileResolver,
    submitter: TileSubmitter,
    metrics: Arc<PrefetchMetrics>,
    sink: Option<Arc<dyn ProgressSink>>,
    registry: Arc<RequestRegistry>,
    state: watch::Sender<RequestState>,
    report: Arc<Mutex<Option<PrefetchReport>>>,
    finished: bool,
}

impl RequestRun {
    async fn execute(mut self) {
        let started = Instant::now();
        let id = self.control.id();
        self.state.send_replace(RequestState::Resolving);

        let poses = sample_path(&self.start, &self.end, &self.params, &self.resolver.viewport());
        let plan = match self.strategy {
            PathStrategy::Sampled => TilePlan::sampled(&self.resolver, &poses),
            PathStrategy::Diagonal => {
                TilePlan::diagonal(&self.resolver, &self.start, &self.end, &self.params)
            }
        };
        self.metrics
            .poses_resolved(poses.len(), plan.shrunk_poses, plan.capped_poses);
        let queue = plan.fetch_queue(self.resolver.sources());
        debug!(
            request_id = %id,
            strategy = %self.strategy,
            poses = poses.len(),
            end_tiles = queue.end_count,
            total = queue.len(),
            shrunk = plan.shrunk_poses,
            capped = plan.capped_poses,
            "Prefetch resolved"
        );

        let result = if self.control.is_cancelled() {
            SubmissionResult {
                state: RequestState::Cancelled(
                    self.control.reason().unwrap_or(CancelReason::Aborted),
                ),
                issued: 0,
                loaded: 0,
                failed: 0,
            }
        } else {
            self.state.send_replace(RequestState::Fetching);
            self.submitter
                .submit_and_track(&queue, &self.control, self.deadline)
                .await
        };

        let report = PrefetchReport {
            request_id: id,
            kind: self.kind,
            state: result.state,
            poses: poses.len(),
            total: queue.len(),
            end_tiles: queue.end_count,
            issued: result.issued,
            loaded: result.loaded,
            failed: result.failed,
            elapsed: started.elapsed(),
        };
        self.finish(report);
    }

    fn finish(&mut self, report: PrefetchReport) {
        self.finished = true;
        match report.state {
            RequestState::Completed => self.metrics.request_completed(),
            RequestState::TimedOut => self.metrics.request_timed_out(),
            _ => self.metrics.request_cancelled(),
        }

        if self.telemetry {
            info!(
                request_id = %report.request_id,
                kind = %report.kind,
                state = %report.state,
                loaded = report.loaded,
                failed = report.failed,
                aborted = report.aborted(),
                skipped = report.skipped(),
                total = report.total,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Prefetch outcome"
            );
        }

        // Release the token before anyone sees the terminal state
        self.control.token().cancel();
        self.registry.finish(report.request_id);
        if let Some(sink) = &self.sink {
            sink.on_finished(&report);
        }
        let state = report.state;
        *self.report.lock() = Some(report);
        self.state.send_replace(state);
    }
}

impl Drop for RequestRun {
    /// Releases a run whose task was dropped before it finished, for
    /// example because the runtime shut down.
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let id = self.control.id();
        self.control.cancel(CancelReason::Shutdown);
        let reason = self.control.reason().unwrap_or(CancelReason::Shutdown);
        self.metrics.request_cancelled();
        self.registry.finish(id);
        warn!(request_id = %id, "Prefetch task dropped before finishing");
        self.state.send_replace(RequestState::Cancelled(reason));
    }
}
