//! End-to-end prefetch behaviour through the public API.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tileahead::camera::{sample_path, AnimationKind, AnimationOptions, AnimationParams, CameraPose, LngLat};
use tileahead::config::PrefetchConfig;
use tileahead::fetch::{BoxFuture, FetchError, TileFetcher};
use tileahead::host::{MapHost, StaticMapHost, TileScheme, TileSource, Viewport};
use tileahead::prefetch::{CancelReason, PrefetchScheduler, RequestState};
use tileahead::resolver::{PathStrategy, ResolverSettings, VisibleTileResolver};
use tileahead::telemetry::ProgressEvent;

// ==================== Fixtures ====================

#[derive(Default)]
struct RecordingFetcher {
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
    hang: bool,
}

impl RecordingFetcher {
    fn instant() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    fn hanging() -> Arc<Self> {
        Arc::new(Self {
            hang: true,
            ..Default::default()
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl TileFetcher for RecordingFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<(), FetchError>> {
        Box::pin(async move {
            self.calls.lock().push(url.to_string());
            if self.hang {
                cancel.cancelled().await;
                return Err(FetchError::Cancelled);
            }
            if let Some(delay) = self.delay {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Ok(())
        })
    }
}

fn base_source() -> TileSource {
    TileSource::new("base", "https://tiles.example/{z}/{x}/{y}.png")
}

fn host_at(center: LngLat, zoom: f64, viewport: Viewport) -> Arc<StaticMapHost> {
    Arc::new(StaticMapHost::new(
        CameraPose::new(center, zoom),
        viewport,
        vec![base_source()],
    ))
}

fn default_host() -> Arc<StaticMapHost> {
    host_at(LngLat::new(0.0, 0.0), 5.0, Viewport::new(512, 512))
}

fn settings() -> ResolverSettings {
    PrefetchConfig::default().resolver_settings()
}

// ==================== Sampling ====================

#[test]
fn test_pan_example_path_and_end_view() {
    let start = CameraPose::new(LngLat::new(0.0, 0.0), 5.0);
    let end = CameraPose::new(LngLat::new(10.0, 0.0), 5.0);
    let params = AnimationParams::new(AnimationKind::Pan)
        .with_duration_ms(1000.0)
        .with_fps(10.0);
    let viewport = Viewport::new(512, 512);

    let poses = sample_path(&start, &end, &params, &viewport);
    assert_eq!(poses.len(), 11);
    for (i, pose) in poses.iter().take(10).enumerate() {
        assert!((pose.center.lng - i as f64).abs() < 1e-9);
        assert_eq!(pose.zoom, 5.0);
    }
    assert_eq!(poses[10], end);

    // Centered on a tile corner: two tiles each side plus one buffer tile
    let resolver = VisibleTileResolver::new(default_host(), settings());
    let range = resolver.tile_range(&start, 0.0);
    assert_eq!(range.max_x - range.min_x + 1, 4);
}

#[test]
fn test_fly_with_equal_centers_zooms_monotonically() {
    let start = CameraPose::new(LngLat::new(13.4, 52.5), 4.0);
    let end = CameraPose::new(LngLat::new(13.4, 52.5), 11.0);
    let params = AnimationParams::new(AnimationKind::Fly).with_fps(30.0);

    let poses = sample_path(&start, &end, &params, &Viewport::new(800, 600));

    assert!(poses.iter().all(|p| p.zoom.is_finite()));
    for pair in poses.windows(2) {
        assert!(pair[1].zoom >= pair[0].zoom - 1e-9);
    }
    assert_eq!(*poses.last().unwrap(), end);
}

// ==================== Resolution ====================

#[test]
fn test_huge_intermediate_view_is_bounded() {
    let host = host_at(LngLat::new(0.0, 0.0), 10.0, Viewport::new(20_000, 16_000));
    let resolver = VisibleTileResolver::new(host, settings());
    let pose = CameraPose::new(LngLat::new(0.0, 0.0), 10.0);

    assert!(resolver.resolve(&pose, 0.0).max_len() > 1000);
    let bounded = resolver.resolve_bounded(&pose);
    assert!(bounded.tiles.max_len() <= 220);
    assert!(bounded.retries > 0);
}

#[test]
fn test_resolution_is_idempotent() {
    let resolver = VisibleTileResolver::new(default_host(), settings());
    let pose = CameraPose::new(LngLat::new(7.5, 45.0), 8.3).with_bearing(30.0);

    let first = resolver.resolve(&pose, 0.0);
    let second = resolver.resolve(&pose, 0.0);
    assert_eq!(first, second);

    let mut union = first.clone();
    union.union(&second);
    assert_eq!(union, first);
}

// ==================== Scheduling ====================

#[tokio::test]
async fn test_fetch_urls_are_unique() {
    let fetcher = RecordingFetcher::instant();
    let scheduler =
        PrefetchScheduler::new(default_host(), fetcher.clone(), PrefetchConfig::default()).unwrap();

    let report = scheduler
        .request_prefetch(AnimationKind::Ease, AnimationOptions::new().center(20.0, 10.0).zoom(7.0))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    let calls = fetcher.calls();
    let unique: HashSet<_> = calls.iter().collect();
    assert_eq!(unique.len(), calls.len());
    assert_eq!(calls.len(), report.total);
    assert_eq!(report.state, RequestState::Completed);
}

#[tokio::test]
async fn test_end_view_fetched_first() {
    let fetcher = RecordingFetcher::instant();
    let host = default_host();
    let config = PrefetchConfig::default().with_max_in_flight(1);
    let scheduler = PrefetchScheduler::new(host.clone(), fetcher.clone(), config).unwrap();

    let report = scheduler
        .request_prefetch(AnimationKind::Pan, AnimationOptions::new().center(30.0, 0.0))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    let resolver = VisibleTileResolver::new(host, settings());
    let end = CameraPose::new(LngLat::new(30.0, 0.0), 5.0);
    let end_urls: HashSet<String> = resolver
        .resolve(&end, 0.0)
        .get("base")
        .unwrap()
        .iter()
        .map(|t| base_source().tile_url(t))
        .collect();

    let calls = fetcher.calls();
    assert_eq!(report.end_tiles, end_urls.len());
    for url in &calls[..report.end_tiles] {
        assert!(end_urls.contains(url));
    }
}

#[tokio::test]
async fn test_new_request_cancels_previous() {
    let fetcher = RecordingFetcher::slow(Duration::from_millis(200));
    let config = PrefetchConfig::default().with_blocking(false);
    let scheduler = PrefetchScheduler::new(default_host(), fetcher, config).unwrap();

    let first = scheduler
        .request_prefetch(AnimationKind::Pan, AnimationOptions::new().center(10.0, 0.0))
        .await
        .unwrap();
    tokio::task::yield_now().await;
    let second = scheduler
        .request_prefetch(AnimationKind::Pan, AnimationOptions::new().center(-10.0, 0.0))
        .await
        .unwrap();

    let first = first.wait().await.unwrap();
    assert_eq!(first.state, RequestState::Cancelled(CancelReason::Superseded));
    assert_eq!(first.loaded + first.failed, 0);

    let second = second.wait().await.unwrap();
    assert_eq!(second.state, RequestState::Completed);
    assert_eq!(second.loaded, second.total);

    let snapshot = scheduler.metrics();
    assert_eq!(snapshot.requests_cancelled, 1);
    assert_eq!(snapshot.requests_completed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_request_times_out_after_five_durations() {
    let fetcher = RecordingFetcher::hanging();
    let scheduler =
        PrefetchScheduler::new(default_host(), fetcher, PrefetchConfig::default()).unwrap();

    let handle = scheduler
        .request_prefetch(
            AnimationKind::Ease,
            AnimationOptions::new().center(3.0, 3.0).duration_ms(400.0),
        )
        .await
        .unwrap();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.state, RequestState::TimedOut);
    assert!(report.elapsed >= Duration::from_millis(2000));
    assert!(report.elapsed < Duration::from_millis(2100));
    assert_eq!(scheduler.active_requests(), 0);
}

#[tokio::test]
async fn test_movement_end_stops_queued_fetches() {
    let fetcher = RecordingFetcher::instant();
    let config = PrefetchConfig::default()
        .with_blocking(false)
        .with_max_in_flight(2);
    let scheduler = PrefetchScheduler::new(default_host(), fetcher.clone(), config).unwrap();

    let handle = scheduler
        .request_prefetch(AnimationKind::Pan, AnimationOptions::new().center(10.0, 0.0))
        .await
        .unwrap();
    scheduler.on_movement_ended();

    let report = handle.wait().await.unwrap();
    assert_eq!(report.state, RequestState::Cancelled(CancelReason::MovementEnded));
    assert_eq!(report.issued, 2);
    assert_eq!(report.loaded, 2);
    assert_eq!(fetcher.calls().len(), 2);
    assert_eq!(report.skipped(), report.total - 2);
}

#[tokio::test]
async fn test_channel_sink_sees_progress_then_one_finish() {
    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let scheduler = PrefetchScheduler::new(
        default_host(),
        RecordingFetcher::instant(),
        PrefetchConfig::default(),
    )
    .unwrap()
    .with_sink(Arc::new(tx));

    let report = scheduler
        .request_prefetch(AnimationKind::Zoom, AnimationOptions::new().zoom(6.5))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    let mut progress = 0;
    let mut finished = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            ProgressEvent::Progress(p) => {
                assert_eq!(finished, 0);
                assert_eq!(p.request_id, report.request_id);
                progress += 1;
            }
            ProgressEvent::Finished(r) => {
                assert_eq!(r, report);
                finished += 1;
            }
        }
    }
    assert_eq!(progress, report.total);
    assert_eq!(finished, 1);
}

#[tokio::test]
async fn test_diagonal_strategy_covers_corridor() {
    let host = host_at(LngLat::new(-10.0, 40.0), 6.0, Viewport::new(800, 600));
    let config = PrefetchConfig::default().with_strategy(PathStrategy::Diagonal);
    let scheduler = PrefetchScheduler::new(host, RecordingFetcher::instant(), config).unwrap();

    let report = scheduler
        .request_prefetch(
            AnimationKind::Fly,
            AnimationOptions::new().center(25.0, 55.0).zoom(9.0),
        )
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(report.state, RequestState::Completed);
    assert!(report.total > report.end_tiles);
}

#[tokio::test]
async fn test_tms_source_requests_flipped_rows() {
    let host = Arc::new(StaticMapHost::new(
        CameraPose::new(LngLat::new(0.0, 60.0), 3.0),
        Viewport::new(256, 256),
        vec![TileSource::new("tms", "https://tms.example/{z}/{x}/{y}.png")
            .with_scheme(TileScheme::Tms)],
    ));
    assert_eq!(host.tile_sources().len(), 1);
    let fetcher = RecordingFetcher::instant();
    let scheduler =
        PrefetchScheduler::new(host, fetcher.clone(), PrefetchConfig::default()).unwrap();

    scheduler
        .request_prefetch(AnimationKind::Jump, AnimationOptions::new())
        .await
        .unwrap();

    // Visible XYZ rows 0..=3 become TMS rows 7..=4
    let calls = fetcher.calls();
    assert!(!calls.is_empty());
    for url in &calls {
        let row: u32 = url
            .rsplit('/')
            .next()
            .and_then(|name| name.strip_suffix(".png"))
            .and_then(|y| y.parse().ok())
            .unwrap();
        assert!((4..=7).contains(&row), "unexpected row in {}", url);
    }
    assert!(calls.iter().any(|u| u.ends_with("/3/4/5.png")));
}
