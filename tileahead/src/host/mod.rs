//! Host map interface.
//!
//! The prefetcher never renders anything itself. It reads the camera,
//! viewport and tile sources from a [`MapHost`], which the embedding map
//! implements. [`StaticMapHost`] is a ready-made implementation for hosts
//! that push their state in rather than exposing it through callbacks.

mod projector;
mod source;

pub use projector::{MercatorProjector, ScreenPoint, Viewport, DEFAULT_TILE_SIZE};
pub use source::{TileScheme, TileSource};

use parking_lot::RwLock;

use crate::camera::{CameraPose, LngLat};

/// Read access to the map the prefetcher serves.
///
/// Implementations must be cheap to call; the resolver queries the
/// projection several times per sampled pose.
pub trait MapHost: Send + Sync {
    /// Current camera pose.
    fn camera_pose(&self) -> CameraPose;

    /// Canvas size in pixels as `(width, height)`.
    fn viewport_size(&self) -> (u32, u32);

    /// Tile size in pixels.
    fn tile_size(&self) -> u32 {
        DEFAULT_TILE_SIZE
    }

    /// Tiled sources currently in use.
    fn tile_sources(&self) -> Vec<TileSource>;

    /// Projects a screen point to a geographic location as seen from
    /// `pose` (not necessarily the current camera).
    fn screen_to_location(&self, pose: &CameraPose, point: ScreenPoint) -> LngLat {
        MercatorProjector::new(self.viewport()).screen_to_location(pose, point)
    }

    /// Viewport assembled from [`viewport_size`](Self::viewport_size) and
    /// [`tile_size`](Self::tile_size).
    fn viewport(&self) -> Viewport {
        let (width, height) = self.viewport_size();
        Viewport::new(width, height).with_tile_size(self.tile_size())
    }
}

/// A host whose state is set explicitly.
#[derive(Debug)]
pub struct StaticMapHost {
    pose: RwLock<CameraPose>,
    viewport: RwLock<Viewport>,
    sources: RwLock<Vec<TileSource>>,
}

impl StaticMapHost {
    pub fn new(pose: CameraPose, viewport: Viewport, sources: Vec<TileSource>) -> Self {
        Self {
            pose: RwLock::new(pose),
            viewport: RwLock::new(viewport),
            sources: RwLock::new(sources),
        }
    }

    /// Updates the camera, typically after the host finished a movement.
    pub fn set_camera_pose(&self, pose: CameraPose) {
        *self.pose.write() = pose;
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        *self.viewport.write() = viewport;
    }

    pub fn set_tile_sources(&self, sources: Vec<TileSource>) {
        *self.sources.write() = sources;
    }
}

impl MapHost for StaticMapHost {
    fn camera_pose(&self) -> CameraPose {
        *self.pose.read()
    }

    fn viewport_size(&self) -> (u32, u32) {
        let viewport = self.viewport.read();
        (viewport.width, viewport.height)
    }

    fn tile_size(&self) -> u32 {
        self.viewport.read().tile_size
    }

    fn tile_sources(&self) -> Vec<TileSource> {
        self.sources.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_host_reports_state() {
        let host = StaticMapHost::new(
            CameraPose::new(LngLat::new(1.0, 2.0), 3.0),
            Viewport::new(640, 480).with_tile_size(512),
            vec![TileSource::new("a", "https://a/{z}/{x}/{y}")],
        );

        assert_eq!(host.viewport_size(), (640, 480));
        assert_eq!(host.tile_size(), 512);
        assert_eq!(host.viewport(), Viewport::new(640, 480).with_tile_size(512));
        assert_eq!(host.tile_sources().len(), 1);

        host.set_camera_pose(CameraPose::new(LngLat::new(5.0, 6.0), 7.0));
        assert_eq!(host.camera_pose().zoom, 7.0);
    }

    #[test]
    fn test_default_projection_uses_pose() {
        let host = StaticMapHost::new(CameraPose::default(), Viewport::new(100, 100), vec![]);
        let pose = CameraPose::new(LngLat::new(20.0, 10.0), 6.0);
        let loc = host.screen_to_location(&pose, ScreenPoint::new(50.0, 50.0));
        assert!((loc.lng - 20.0).abs() < 1e-9);
        assert!((loc.lat - 10.0).abs() < 1e-9);
    }
}
