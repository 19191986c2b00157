//! Viewport geometry and the default screen-to-geographic projector.

use serde::{Deserialize, Serialize};

use crate::camera::{CameraPose, LngLat};
use crate::coord::{project_world, unproject_world, world_size};

/// Default tile size in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Rendered map area in pixels plus the source tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
}

impl Viewport {
    /// Creates a viewport with the default tile size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// The larger of width and height, in pixels.
    pub fn max_side(&self) -> f64 {
        self.width.max(self.height) as f64
    }
}

/// A point on screen, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Flat Web Mercator screen projection.
///
/// Places the pose center at the middle of the viewport and rotates
/// screen offsets by the pose bearing. Pitch is ignored here; the tile
/// resolver compensates for it when choosing screen corners.
#[derive(Debug, Clone, Copy)]
pub struct MercatorProjector {
    viewport: Viewport,
}

impl MercatorProjector {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    /// Converts a screen point to a geographic location for `pose`.
    ///
    /// Locations east of the antimeridian come back with longitudes past
    /// ±180; callers wrap tile columns themselves.
    pub fn screen_to_location(&self, pose: &CameraPose, point: ScreenPoint) -> LngLat {
        let ws = world_size(self.viewport.tile_size, pose.zoom);
        let (cx, cy) = project_world(pose.center.lng, pose.center.lat, ws);

        let dx = point.x - self.viewport.width as f64 / 2.0;
        let dy = point.y - self.viewport.height as f64 / 2.0;
        let (sin, cos) = pose.bearing.to_radians().sin_cos();
        let wx = dx * cos - dy * sin;
        let wy = dx * sin + dy * cos;

        let (lng, lat) = unproject_world(cx + wx, cy + wy, ws);
        LngLat::new(lng, lat)
    }
}
