//! Visible tile resolution for a single camera pose.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::camera::CameraPose;
use crate::coord::{fractional_tile, tiles_per_axis, zoom_level, GeoBounds, TileCoord};
use crate::host::{MapHost, ScreenPoint, TileSource, Viewport};

use super::tile_set::{TileSet, TileSets};

/// Screen-height fraction hidden per degree of pitch at the top corners.
const PITCH_DIVISOR: f64 = 150.0;

/// Shrink step applied per retry when a pose needs too many tiles.
const SHRINK_STEP: f64 = 1.0 / 20.0;

/// Largest usable retry count; one more step would collapse the viewport.
pub const MAX_SHRINK_RETRIES: u32 = 9;

/// Slack allowed over the burst limit before shrinking.
const BURST_TOLERANCE: f64 = 1.1;

/// Tuning knobs for [`VisibleTileResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Target tile count per source for one intermediate pose
    pub burst_limit: usize,
    /// Shrink attempts before falling back to a hard cap
    pub max_shrink_retries: u32,
    /// Extra tiles added on every side of the visible range
    pub edge_buffer: u32,
}

impl ResolverSettings {
    /// Tile count above which an intermediate pose gets shrunk.
    pub fn burst_threshold(&self) -> f64 {
        BURST_TOLERANCE * self.burst_limit as f64
    }
}

/// Visible tile rectangle at one zoom level, in XYZ numbering.
///
/// Columns are kept unwrapped so a range crossing the antimeridian stays
/// contiguous; [`TileRange::tiles`] wraps them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRange {
    pub z: u8,
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: u32,
    pub max_y: u32,
    /// Fractional tile position of the pose center
    pub center: (f64, f64),
}

impl TileRange {
    /// Tiles in column-major order, columns wrapped modulo `2^z`.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let n = tiles_per_axis(self.z) as i64;
        // A range wider than the world would only repeat columns.
        let max_x = self.max_x.min(self.min_x + n - 1);
        (self.min_x..=max_x).flat_map(move |x| {
            let wrapped = x.rem_euclid(n) as u32;
            (self.min_y..=self.max_y).map(move |y| TileCoord::new(self.z, wrapped, y))
        })
    }

    /// Squared distance from the pose center to a tile's center, taking
    /// the shorter way around the antimeridian.
    fn distance_sq(&self, tile: &TileCoord) -> f64 {
        let n = tiles_per_axis(self.z) as f64;
        let cx = self.center.0.rem_euclid(n);
        let mut dx = (tile.x as f64 + 0.5 - cx).abs();
        if dx > n / 2.0 {
            dx = n - dx;
        }
        let dy = tile.y as f64 + 0.5 - self.center.1;
        dx * dx + dy * dy
    }
}

/// Outcome of [`VisibleTileResolver::resolve_bounded`].
#[derive(Debug, Clone)]
pub struct BoundedTiles {
    pub tiles: TileSets,
    /// Shrink factor finally used
    pub factor: f64,
    pub retries: u32,
    /// Whether the nearest-first hard cap had to be applied
    pub capped: bool,
}

/// Maps camera poses to the tiles a host would load for them.
///
/// Viewport and tile sources are captured at construction so one request
/// resolves every pose against the same host state.
pub struct VisibleTileResolver {
    host: Arc<dyn MapHost>,
    viewport: Viewport,
    sources: Vec<TileSource>,
    settings: ResolverSettings,
}

impl VisibleTileResolver {
    pub fn new(host: Arc<dyn MapHost>, settings: ResolverSettings) -> Self {
        let viewport = host.viewport();
        let sources = host.tile_sources();
        Self {
            host,
            viewport,
            sources,
            settings,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn sources(&self) -> &[TileSource] {
        &self.sources
    }

    pub fn settings(&self) -> ResolverSettings {
        self.settings
    }

    fn corners(&self, pose: &CameraPose, factor: f64) -> [ScreenPoint; 4] {
        let w = self.viewport.width as f64;
        let h = self.viewport.height as f64;
        let top = h * (factor + pose.pitch / PITCH_DIVISOR);
        [
            ScreenPoint::new(w * factor, top),
            ScreenPoint::new(w * (1.0 - factor), top),
            ScreenPoint::new(w * (1.0 - factor), h * (1.0 - factor)),
            ScreenPoint::new(w * factor, h * (1.0 - factor)),
        ]
    }

    /// Geographic bounds of the screen area at `factor`.
    pub fn view_bounds(&self, pose: &CameraPose, factor: f64) -> Option<GeoBounds> {
        GeoBounds::from_points(
            self.corners(pose, factor)
                .iter()
                .map(|p| self.host.screen_to_location(pose, *p).as_tuple()),
        )
    }

    /// Visible tile rectangle for `pose` with its screen corners moved
    /// inward by `factor` of the viewport size.
    pub fn tile_range(&self, pose: &CameraPose, factor: f64) -> TileRange {
        let z = zoom_level(pose.zoom);
        let (mut min_fx, mut max_fx) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_fy, mut max_fy) = (f64::INFINITY, f64::NEG_INFINITY);
        for point in self.corners(pose, factor) {
            let loc = self.host.screen_to_location(pose, point);
            let (fx, fy) = fractional_tile(loc.lng, loc.lat, z);
            min_fx = min_fx.min(fx);
            max_fx = max_fx.max(fx);
            min_fy = min_fy.min(fy);
            max_fy = max_fy.max(fy);
        }

        let buffer = self.settings.edge_buffer as i64;
        let last_row = tiles_per_axis(z) as i64 - 1;

        let lo_x = min_fx.floor() as i64;
        let hi_x = (max_fx.ceil() as i64 - 1).max(lo_x);
        let lo_y = min_fy.floor() as i64;
        let hi_y = (max_fy.ceil() as i64 - 1).max(lo_y);

        let center = fractional_tile(pose.center.lng, pose.center.lat, z);
        TileRange {
            z,
            min_x: lo_x - buffer,
            max_x: hi_x + buffer,
            min_y: (lo_y - buffer).clamp(0, last_row) as u32,
            max_y: (hi_y + buffer).clamp(0, last_row) as u32,
            center,
        }
    }

    fn resolve_xyz(&self, pose: &CameraPose, factor: f64) -> (TileRange, TileSet) {
        let range = self.tile_range(pose, factor);
        let set = range.tiles().collect();
        (range, set)
    }

    /// Copies XYZ tiles into one set per source, flipping rows for TMS.
    fn per_source(&self, xyz: &TileSet) -> TileSets {
        let mut sets = TileSets::new();
        for source in &self.sources {
            let set = sets.entry(&source.id);
            if source.flips_y() {
                set.extend(xyz.iter().map(TileCoord::flip_y));
            } else {
                set.union(xyz);
            }
        }
        sets
    }

    /// Tiles visible at `pose`, per source, without any burst control.
    pub fn resolve(&self, pose: &CameraPose, factor: f64) -> TileSets {
        let (_, xyz) = self.resolve_xyz(pose, factor);
        self.per_source(&xyz)
    }

    /// Tiles visible at `pose`, shrunk until they fit the burst limit.
    ///
    /// Each retry moves the corners inward by another twentieth of the
    /// viewport. If the retries run out the tiles nearest the pose center
    /// are kept, up to the threshold.
    pub fn resolve_bounded(&self, pose: &CameraPose) -> BoundedTiles {
        let threshold = self.settings.burst_threshold();
        let max_retries = self.settings.max_shrink_retries.min(MAX_SHRINK_RETRIES);

        let mut retries = 0;
        let mut factor = 0.0;
        let (mut range, mut xyz) = self.resolve_xyz(pose, factor);
        while xyz.len() as f64 > threshold && retries < max_retries {
            retries += 1;
            factor = retries as f64 * SHRINK_STEP;
            (range, xyz) = self.resolve_xyz(pose, factor);
        }

        let capped = xyz.len() as f64 > threshold;
        if capped {
            xyz = nearest_tiles(&range, &xyz, threshold.floor() as usize);
        }

        BoundedTiles {
            tiles: self.per_source(&xyz),
            factor,
            retries,
            capped,
        }
    }
}

/// The `limit` tiles closest to the range center, nearest first.
fn nearest_tiles(range: &TileRange, tiles: &TileSet, limit: usize) -> TileSet {
    let mut ranked: Vec<(f64, TileCoord)> = tiles
        .iter()
        .map(|t| (range.distance_sq(t), *t))
        .collect();
    ranked.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    });
    ranked.into_iter().take(limit).map(|(_, t)| t).collect()
}
