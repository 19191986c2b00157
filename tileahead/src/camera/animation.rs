//! Animation kinds, caller options and resolved parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::pose::{CameraPose, LngLat};

/// Default animation duration in milliseconds.
pub const DEFAULT_DURATION_MS: f64 = 1000.0;

/// Default sampling rate in frames per second.
pub const DEFAULT_FPS: f64 = 60.0;

/// Default fly curve parameter (rho).
pub const DEFAULT_CURVE: f64 = 1.42;

/// Default screen padding in pixels.
pub const DEFAULT_PADDING: f64 = 0.0;

/// Upper bound on sampled frames per movement (one minute at 60 fps).
///
/// Longer or denser movements are sampled at a coarser step instead.
pub const MAX_FRAMES: usize = 3600;

/// The kind of camera movement being predicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    /// Center moves linearly, everything else stays.
    Pan,
    /// Zoom-only movement around a fixed center.
    Zoom,
    /// Instant move, no intermediate frames.
    Jump,
    /// Center, zoom, bearing and pitch move linearly.
    Ease,
    /// Zoom out, pan, zoom in along the "smooth and zoom" curve.
    Fly,
}

impl AnimationKind {
    /// Short lowercase name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            AnimationKind::Pan => "pan",
            AnimationKind::Zoom => "zoom",
            AnimationKind::Jump => "jump",
            AnimationKind::Ease => "ease",
            AnimationKind::Fly => "fly",
        }
    }
}

impl fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options supplied with a movement request.
///
/// Every field is optional. Target fields left unset default to the
/// current camera; tuning fields left unset default to the scheduler's
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationOptions {
    pub center: Option<LngLat>,
    pub zoom: Option<f64>,
    pub bearing: Option<f64>,
    pub pitch: Option<f64>,
    pub duration_ms: Option<f64>,
    pub fps: Option<f64>,
    /// Fly curve parameter (rho)
    pub curve: Option<f64>,
    pub padding: Option<f64>,
    /// Lowest zoom the fly curve may reach
    pub min_zoom: Option<f64>,
    /// `Some(false)` turns the movement into a jump
    pub animate: Option<bool>,
}

impl AnimationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn center(mut self, lng: f64, lat: f64) -> Self {
        self.center = Some(LngLat::new(lng, lat));
        self
    }

    pub fn zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    pub fn pitch(mut self, pitch: f64) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn curve(mut self, curve: f64) -> Self {
        self.curve = Some(curve);
        self
    }

    pub fn padding(mut self, padding: f64) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn min_zoom(mut self, min_zoom: f64) -> Self {
        self.min_zoom = Some(min_zoom);
        self
    }

    pub fn animate(mut self, animate: bool) -> Self {
        self.animate = Some(animate);
        self
    }

    /// Builds the target pose, filling unset fields from `start`.
    pub fn target(&self, start: &CameraPose) -> CameraPose {
        CameraPose {
            center: self.center.unwrap_or(start.center),
            zoom: self.zoom.unwrap_or(start.zoom),
            bearing: self.bearing.unwrap_or(start.bearing),
            pitch: self.pitch.unwrap_or(start.pitch),
        }
    }

    /// Resolves the sampling parameters, falling back to `base` for any
    /// field not set here.
    pub fn params(&self, kind: AnimationKind, base: &AnimationParams) -> AnimationParams {
        let curve = self
            .curve
            .filter(|c| c.is_finite() && *c > 0.0)
            .unwrap_or(base.curve_rho);
        AnimationParams {
            kind,
            duration_ms: self.duration_ms.unwrap_or(base.duration_ms),
            fps: self.fps.unwrap_or(base.fps),
            curve_rho: curve,
            padding: self.padding.unwrap_or(base.padding),
            min_zoom: self.min_zoom.or(base.min_zoom),
            animate: self.animate.unwrap_or(base.animate),
        }
    }
}

/// Fully resolved sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationParams {
    pub kind: AnimationKind,
    pub duration_ms: f64,
    pub fps: f64,
    pub curve_rho: f64,
    /// Screen padding in pixels. Carried for the host; tile selection
    /// always covers the full viewport.
    pub padding: f64,
    pub min_zoom: Option<f64>,
    pub animate: bool,
}

impl AnimationParams {
    /// Parameters with the default duration, rate and curve.
    pub fn new(kind: AnimationKind) -> Self {
        Self {
            kind,
            duration_ms: DEFAULT_DURATION_MS,
            fps: DEFAULT_FPS,
            curve_rho: DEFAULT_CURVE,
            padding: DEFAULT_PADDING,
            min_zoom: None,
            animate: true,
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_curve(mut self, rho: f64) -> Self {
        self.curve_rho = rho;
        self
    }

    pub fn with_min_zoom(mut self, min_zoom: f64) -> Self {
        self.min_zoom = Some(min_zoom);
        self
    }

    pub fn with_animate(mut self, animate: bool) -> Self {
        self.animate = animate;
        self
    }

    /// Number of sampled frames before the final pose, at most
    /// [`MAX_FRAMES`].
    ///
    /// Zero when the movement has no intermediate frames: jumps,
    /// non-animated movements, or non-positive duration or rate.
    pub fn frame_count(&self) -> usize {
        let frames = self.requested_frames();
        if frames > MAX_FRAMES as f64 {
            MAX_FRAMES
        } else {
            frames as usize
        }
    }

    /// Whether duration and rate ask for more than [`MAX_FRAMES`] frames.
    pub fn exceeds_frame_limit(&self) -> bool {
        self.requested_frames() > MAX_FRAMES as f64
    }

    fn requested_frames(&self) -> f64 {
        if !self.animate || self.kind == AnimationKind::Jump {
            return 0.0;
        }
        if !(self.duration_ms > 0.0 && self.fps > 0.0) {
            return 0.0;
        }
        (self.duration_ms / 1000.0 * self.fps).ceil()
    }
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self::new(AnimationKind::Ease)
    }
}
