//! Prefetch configuration.
//!
//! [`PrefetchConfig`] holds every tunable of a scheduler. Values come from
//! the `DEFAULT_*` constants, the `with_*` builders, or an INI file with a
//! `[prefetch]` section (see [`PrefetchConfig::load_from`]).

mod file;

pub use file::ConfigError;

use std::time::Duration;

use crate::camera::{
    AnimationKind, AnimationParams, DEFAULT_CURVE, DEFAULT_DURATION_MS, DEFAULT_FPS,
    DEFAULT_PADDING,
};
use crate::error::PrefetchError;
use crate::resolver::{PathStrategy, ResolverSettings, MAX_SHRINK_RETRIES};

// ==================== Defaults ====================

/// Default tile count per source for one intermediate pose.
pub const DEFAULT_BURST_LIMIT: usize = 200;

/// Default for waiting on prefetch before returning to the caller.
pub const DEFAULT_BLOCKING: bool = true;

/// Default deadline as a multiple of the animation duration.
pub const DEFAULT_TIMEOUT_MULTIPLIER: f64 = 5.0;

/// Longest deadline a request can get.
pub const MAX_DEADLINE: Duration = Duration::from_secs(24 * 60 * 60);

/// Default number of shrink attempts for oversized poses.
pub const DEFAULT_MAX_SHRINK_RETRIES: u32 = MAX_SHRINK_RETRIES;

/// Default extra tiles around each resolved viewport.
pub const DEFAULT_EDGE_BUFFER: u32 = 1;

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefetchConfig {
    /// Target tile count per source for one intermediate pose.
    ///
    /// Poses above 110% of this are shrunk. Default: 200.
    pub burst_limit: usize,

    /// Whether `request_prefetch` waits for the request to finish.
    ///
    /// Default: true.
    pub blocking: bool,

    /// Animation duration used when a request does not give one.
    ///
    /// Default: 1000 ms.
    pub duration_ms: f64,

    /// Sampling rate used when a request does not give one.
    ///
    /// Default: 60 fps.
    pub fps: f64,

    /// Fly curve parameter used when a request does not give one.
    ///
    /// Default: 1.42.
    pub curve: f64,

    /// Screen padding in pixels. Default: 0.
    pub padding: f64,

    /// Deadline as a multiple of the animation duration. Default: 5.
    pub timeout_multiplier: f64,

    /// Shrink attempts before the hard cap. At most 9. Default: 9.
    pub max_shrink_retries: u32,

    /// Extra tiles on every side of a resolved viewport. Default: 1.
    pub edge_buffer: u32,

    /// Optional ceiling on concurrent fetches.
    ///
    /// `None` issues the whole queue at once. Default: `None`.
    pub max_in_flight: Option<usize>,

    /// How intermediate tiles are chosen. Default: sampled.
    pub strategy: PathStrategy,

    /// Log request outcomes, including cancellations. Default: false.
    pub telemetry: bool,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            burst_limit: DEFAULT_BURST_LIMIT,
            blocking: DEFAULT_BLOCKING,
            duration_ms: DEFAULT_DURATION_MS,
            fps: DEFAULT_FPS,
            curve: DEFAULT_CURVE,
            padding: DEFAULT_PADDING,
            timeout_multiplier: DEFAULT_TIMEOUT_MULTIPLIER,
            max_shrink_retries: DEFAULT_MAX_SHRINK_RETRIES,
            edge_buffer: DEFAULT_EDGE_BUFFER,
            max_in_flight: None,
            strategy: PathStrategy::default(),
            telemetry: false,
        }
    }
}

impl PrefetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_burst_limit(mut self, burst_limit: usize) -> Self {
        self.burst_limit = burst_limit;
        self
    }

    pub fn with_blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_curve(mut self, curve: f64) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_timeout_multiplier(mut self, multiplier: f64) -> Self {
        self.timeout_multiplier = multiplier;
        self
    }

    pub fn with_max_shrink_retries(mut self, retries: u32) -> Self {
        self.max_shrink_retries = retries;
        self
    }

    pub fn with_edge_buffer(mut self, edge_buffer: u32) -> Self {
        self.edge_buffer = edge_buffer;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = Some(max_in_flight);
        self
    }

    pub fn with_strategy(mut self, strategy: PathStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_telemetry(mut self, telemetry: bool) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`PrefetchError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> Result<(), PrefetchError> {
        if self.burst_limit == 0 {
            return Err(PrefetchError::InvalidConfig(
                "burst_limit must be at least 1".to_string(),
            ));
        }
        if !self.duration_ms.is_finite() || !self.fps.is_finite() {
            return Err(PrefetchError::InvalidConfig(
                "duration_ms and fps must be finite".to_string(),
            ));
        }
        if !(self.curve.is_finite() && self.curve > 0.0) {
            return Err(PrefetchError::InvalidConfig(format!(
                "curve must be positive, got {}",
                self.curve
            )));
        }
        if !(self.timeout_multiplier.is_finite() && self.timeout_multiplier > 0.0) {
            return Err(PrefetchError::InvalidConfig(format!(
                "timeout_multiplier must be positive, got {}",
                self.timeout_multiplier
            )));
        }
        if self.max_shrink_retries > MAX_SHRINK_RETRIES {
            return Err(PrefetchError::InvalidConfig(format!(
                "max_shrink_retries must be at most {}, got {}",
                MAX_SHRINK_RETRIES, self.max_shrink_retries
            )));
        }
        if self.max_in_flight == Some(0) {
            return Err(PrefetchError::InvalidConfig(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Animation parameters to fall back on for a movement of `kind`.
    pub fn animation_defaults(&self, kind: AnimationKind) -> AnimationParams {
        AnimationParams {
            kind,
            duration_ms: self.duration_ms,
            fps: self.fps,
            curve_rho: self.curve,
            padding: self.padding,
            min_zoom: None,
            animate: true,
        }
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            burst_limit: self.burst_limit,
            max_shrink_retries: self.max_shrink_retries,
            edge_buffer: self.edge_buffer,
        }
    }

    /// Deadline for a movement lasting `duration_ms`.
    ///
    /// Non-animated movements still get the deadline of the configured
    /// default duration. Capped at [`MAX_DEADLINE`].
    pub fn deadline(&self, duration_ms: f64) -> Duration {
        let base = if duration_ms.is_finite() && duration_ms > 0.0 {
            duration_ms
        } else {
            self.duration_ms.max(0.0)
        };
        Duration::try_from_secs_f64(base * self.timeout_multiplier / 1000.0)
            .map_or(MAX_DEADLINE, |d| d.min(MAX_DEADLINE))
    }
}
