//! Camera path sampling.
//!
//! Turns a start pose, an end pose and animation parameters into the
//! sequence of poses the host is expected to render. Sampling is pure and
//! deterministic: identical inputs always yield identical output.

use tracing::warn;

use crate::host::Viewport;

use super::animation::{AnimationKind, AnimationParams};
use super::fly::FlyCurve;
use super::pose::{lerp, CameraPose};

/// Samples the camera path from `start` to `end`.
///
/// With `N = ceil(duration_ms / 1000 * fps)` frames, returns the poses at
/// `t = i / N` for `i in 0..N` followed by `end` itself, so the output
/// always has `N + 1` elements and the last one equals `end` exactly.
/// Jumps and movements without frames yield `[end]`. `N` is capped at
/// [`MAX_FRAMES`](super::MAX_FRAMES).
pub fn sample_path(
    start: &CameraPose,
    end: &CameraPose,
    params: &AnimationParams,
    viewport: &Viewport,
) -> Vec<CameraPose> {
    let frames = params.frame_count();
    if frames == 0 {
        return vec![*end];
    }
    if params.exceeds_frame_limit() {
        warn!(
            kind = %params.kind,
            duration_ms = params.duration_ms,
            fps = params.fps,
            frames,
            "Frame count capped"
        );
    }

    let mut poses = Vec::with_capacity(frames + 1);
    match params.kind {
        AnimationKind::Jump => {}
        AnimationKind::Pan => {
            for i in 0..frames {
                let t = i as f64 / frames as f64;
                poses.push(pan_frame(start, end, t));
            }
        }
        AnimationKind::Ease | AnimationKind::Zoom => {
            for i in 0..frames {
                let t = i as f64 / frames as f64;
                poses.push(ease_frame(start, end, t));
            }
        }
        AnimationKind::Fly => {
            let curve = FlyCurve::new(start, end, viewport, params.curve_rho, params.min_zoom);
            for i in 0..frames {
                let k = i as f64 / frames as f64;
                poses.push(fly_frame(start, end, &curve, k));
            }
        }
    }
    poses.push(*end);
    poses
}

/// Builds the fly curve for a movement, for callers that need its shape
/// (e.g. the lowest zoom reached) without sampling frames.
pub fn fly_curve(
    start: &CameraPose,
    end: &CameraPose,
    params: &AnimationParams,
    viewport: &Viewport,
) -> FlyCurve {
    FlyCurve::new(start, end, viewport, params.curve_rho, params.min_zoom)
}

fn pan_frame(start: &CameraPose, end: &CameraPose, t: f64) -> CameraPose {
    CameraPose {
        center: start.center.lerp(&end.center, t),
        ..*start
    }
}

fn ease_frame(start: &CameraPose, end: &CameraPose, t: f64) -> CameraPose {
    CameraPose {
        center: start.center.lerp(&end.center, t),
        zoom: lerp(start.zoom, end.zoom, t),
        bearing: lerp(start.bearing, end.bearing, t),
        pitch: lerp(start.pitch, end.pitch, t),
    }
}

fn fly_frame(start: &CameraPose, end: &CameraPose, curve: &FlyCurve, k: f64) -> CameraPose {
    CameraPose {
        center: start.center.lerp(&end.center, k),
        zoom: curve.zoom_at(k),
        bearing: lerp(start.bearing, end.bearing, k),
        pitch: lerp(start.pitch, end.pitch, k),
    }
}
