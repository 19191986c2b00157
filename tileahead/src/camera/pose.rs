//! Camera pose snapshots.

use serde::{Deserialize, Serialize};

use crate::error::PrefetchError;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    /// Creates a point from longitude and latitude in degrees.
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Linear interpolation in (lng, lat) space.
    #[inline]
    pub fn lerp(&self, to: &LngLat, t: f64) -> LngLat {
        LngLat::new(lerp(self.lng, to.lng, t), lerp(self.lat, to.lat, t))
    }

    /// Returns the point as an `(lng, lat)` tuple.
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lng, self.lat)
    }
}

impl From<(f64, f64)> for LngLat {
    fn from((lng, lat): (f64, f64)) -> Self {
        LngLat::new(lng, lat)
    }
}

/// Immutable snapshot of the camera.
///
/// Produced by the host (current camera) or by the path sampler
/// (predicted frames). Never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraPose {
    /// Map center
    pub center: LngLat,
    /// Fractional zoom level
    pub zoom: f64,
    /// Rotation in degrees, clockwise from north
    pub bearing: f64,
    /// Tilt in degrees from straight down
    pub pitch: f64,
}

impl CameraPose {
    /// Creates a pose with the given center and zoom, no rotation or tilt.
    pub fn new(center: LngLat, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            bearing: 0.0,
            pitch: 0.0,
        }
    }

    /// Returns a copy with the given bearing.
    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = bearing;
        self
    }

    /// Returns a copy with the given pitch.
    pub fn with_pitch(mut self, pitch: f64) -> Self {
        self.pitch = pitch;
        self
    }

    /// Rejects poses containing non-finite numbers.
    ///
    /// # Errors
    ///
    /// [`PrefetchError::InvalidPose`] naming the first offending field.
    pub fn validate(&self) -> Result<(), PrefetchError> {
        let fields = [
            ("center.lng", self.center.lng),
            ("center.lat", self.center.lat),
            ("zoom", self.zoom),
            ("bearing", self.bearing),
            ("pitch", self.pitch),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(PrefetchError::InvalidPose { field, value });
            }
        }
        Ok(())
    }
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
