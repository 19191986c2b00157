//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (longitude/latitude)
//! and Web Mercator slippy tile coordinates, plus the small set of tile
//! neighbourhood helpers the prefetcher needs (bounding boxes, rectangular
//! ranges, quad siblings and diagonal corridors).

mod types;

pub use types::{tiles_per_axis, GeoBounds, TileCoord, MAX_LAT, MAX_ZOOM, MIN_LAT, MIN_ZOOM};

use std::collections::{BTreeSet, HashSet};
use std::f64::consts::PI;

/// Converts a fractional zoom to the integer tile zoom level.
///
/// The zoom is floored and clamped to `[MIN_ZOOM, MAX_ZOOM]`.
#[inline]
pub fn zoom_level(zoom: f64) -> u8 {
    debug_assert!(zoom.is_finite(), "zoom must be finite");
    zoom.floor().clamp(MIN_ZOOM as f64, MAX_ZOOM as f64) as u8
}

/// Converts geographic coordinates to fractional tile coordinates.
///
/// The integer part of each component is the tile column/row and the
/// fractional part is the position inside that tile. Latitude is clamped
/// to the Web Mercator range so the poles map to the first/last row.
///
/// # Arguments
///
/// * `lng` - Longitude in degrees
/// * `lat` - Latitude in degrees
/// * `z` - Integer zoom level
#[inline]
pub fn fractional_tile(lng: f64, lat: f64, z: u8) -> (f64, f64) {
    debug_assert!(lng.is_finite() && lat.is_finite(), "coordinates must be finite");
    let n = tiles_per_axis(z) as f64;
    let lat_rad = lat.clamp(MIN_LAT, MAX_LAT).to_radians();

    let x = (lng + 180.0) / 360.0 * n;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;
    (x, y)
}

/// Converts geographic coordinates to the tile containing them.
///
/// # Arguments
///
/// * `lng` - Longitude in degrees
/// * `lat` - Latitude in degrees
/// * `zoom` - Zoom level; floored and clamped to `>= 0`
///
/// # Returns
///
/// The tile coordinate. Columns wrap modulo `2^z`, so longitudes past
/// ±180 land on the column they show; rows are clamped into `[0, 2^z)`.
#[inline]
pub fn point_to_tile(lng: f64, lat: f64, zoom: f64) -> TileCoord {
    let z = zoom_level(zoom);
    let (fx, fy) = fractional_tile(lng, lat, z);
    TileCoord::new(z, wrap_column(fx.floor() as i64, z), clamp_row(fy.floor(), z))
}

/// Returns the geographic bounding box of a tile.
///
/// Inverse Web Mercator projection of the tile's north-west and
/// south-east corners.
pub fn tile_bbox(tile: &TileCoord) -> GeoBounds {
    let n = tiles_per_axis(tile.z) as f64;
    let west = tile.x as f64 / n * 360.0 - 180.0;
    let east = (tile.x + 1) as f64 / n * 360.0 - 180.0;
    let north = row_to_lat(tile.y as f64, n);
    let south = row_to_lat((tile.y + 1) as f64, n);
    GeoBounds::new(west, south, east, north)
}

/// Returns the longitude/latitude of a tile's center.
pub fn tile_center(tile: &TileCoord) -> (f64, f64) {
    let n = tiles_per_axis(tile.z) as f64;
    let lng = (tile.x as f64 + 0.5) / n * 360.0 - 180.0;
    let lat = row_to_lat(tile.y as f64 + 0.5, n);
    (lng, lat)
}

fn row_to_lat(row: f64, n: f64) -> f64 {
    (PI * (1.0 - 2.0 * row / n)).sinh().atan().to_degrees()
}

/// Projects a point to world pixel coordinates.
///
/// `world_size` is the width of the whole world in pixels, i.e.
/// `tile_size * 2^zoom` for a fractional zoom. Unlike [`fractional_tile`]
/// the zoom need not be an integer.
#[inline]
pub fn project_world(lng: f64, lat: f64, world_size: f64) -> (f64, f64) {
    let lat_rad = lat.clamp(MIN_LAT, MAX_LAT).to_radians();
    let x = (lng + 180.0) / 360.0 * world_size;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * world_size;
    (x, y)
}

/// Inverse of [`project_world`].
#[inline]
pub fn unproject_world(x: f64, y: f64, world_size: f64) -> (f64, f64) {
    let lng = x / world_size * 360.0 - 180.0;
    let lat = row_to_lat(y, world_size);
    (lng, lat)
}

/// World size in pixels at a fractional zoom.
#[inline]
pub fn world_size(tile_size: u32, zoom: f64) -> f64 {
    tile_size as f64 * zoom.exp2()
}

/// Wraps an unwrapped tile column into `[0, 2^z)`.
#[inline]
fn wrap_column(x: i64, z: u8) -> u32 {
    x.rem_euclid(tiles_per_axis(z) as i64) as u32
}

/// Clamps a floored tile row into `[0, 2^z)`.
#[inline]
fn clamp_row(value: f64, z: u8) -> u32 {
    let max = (tiles_per_axis(z) - 1) as f64;
    value.clamp(0.0, max) as u32
}

/// Returns every tile covering a bounding box, with a one tile buffer.
///
/// Takes the tiles under the south-west and north-east corners at `zoom`,
/// enumerates the full inclusive rectangle between them and grows it by
/// exactly one tile on every side. The buffer guards against edge tiles
/// lost to floating point error at the viewport boundary. Rows are clipped
/// to the valid range. Columns wrap around the antimeridian, whether the
/// box extends past ±180 or has `east < west`.
pub fn tiles_in_bbox(bounds: &GeoBounds, zoom: u8) -> BTreeSet<TileCoord> {
    let z = zoom.min(MAX_ZOOM);
    let n = tiles_per_axis(z) as i64;
    let (west_x, south_y) = fractional_tile(bounds.west, bounds.south, z);
    let (east_x, north_y) = fractional_tile(bounds.east, bounds.north, z);

    let mut east_col = east_x.floor() as i64;
    let west_col = west_x.floor() as i64;
    if east_col < west_col {
        east_col += n;
    }
    let min_x = west_col - 1;
    // Wider than the world would only repeat columns
    let max_x = (east_col + 1).min(min_x + n - 1);

    let max = tiles_per_axis(z) - 1;
    let min_y = clamp_row(north_y.floor(), z).saturating_sub(1);
    let max_y = (clamp_row(south_y.floor(), z) + 1).min(max);

    let mut tiles = BTreeSet::new();
    for x in min_x..=max_x {
        let wrapped = wrap_column(x, z);
        for y in min_y..=max_y {
            tiles.insert(TileCoord::new(z, wrapped, y));
        }
    }
    tiles
}

/// Returns the tiles along the straight line between two points, plus
/// each visited tile's quad siblings.
///
/// Walks the tile grid from the tile of `from` to the tile of `to` with
/// Bresenham's line algorithm. This is a much cheaper approximation of a
/// pan path than resolving full viewports along it. The result keeps walk
/// order and contains no duplicates.
pub fn diagonal_tiles(from: (f64, f64), to: (f64, f64), zoom: u8) -> Vec<TileCoord> {
    let z = zoom.min(MAX_ZOOM);
    let (fx0, fy0) = fractional_tile(from.0, from.1, z);
    let (fx1, fy1) = fractional_tile(to.0, to.1, z);

    // Columns stay unwrapped while walking so a line across the
    // antimeridian takes the direct route.
    let (x0, y0) = (fx0.floor() as i64, clamp_row(fy0.floor(), z) as i64);
    let (x1, y1) = (fx1.floor() as i64, clamp_row(fy1.floor(), z) as i64);
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = (if dx > dy { dx } else { -dy }) / 2;
    let (mut x, mut y) = (x0, y0);

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut visit = |x: i64, y: i64| {
        let tile = TileCoord::new(z, wrap_column(x, z), y as u32);
        for t in std::iter::once(tile).chain(tile.siblings()) {
            if seen.insert(t) {
                out.push(t);
            }
        }
    };

    while x != x1 || y != y1 {
        visit(x, y);
        let e2 = err;
        if e2 > -dx {
            err -= dy;
            x += sx;
        }
        if e2 < dy {
            err += dx;
            y += sy;
        }
    }
    visit(x1, y1);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let tile = point_to_tile(-74.0060, 40.7128, 16.0);
        assert_eq!(tile.y, 24640);
        assert_eq!(tile.x, 19295);
        assert_eq!(tile.z, 16);
    }

    #[test]
    fn test_zoom_is_floored_and_clamped() {
        assert_eq!(point_to_tile(0.0, 0.0, 5.9).z, 5);
        assert_eq!(point_to_tile(0.0, 0.0, -3.0).z, 0);
        assert_eq!(point_to_tile(0.0, 0.0, 99.0).z, MAX_ZOOM);
    }

    #[test]
    fn test_poles_and_antimeridian_stay_in_range() {
        let north = point_to_tile(179.9, 90.0, 3.0);
        assert_eq!(north, TileCoord::new(3, 7, 0));

        let south = point_to_tile(-180.0, -90.0, 3.0);
        assert_eq!(south, TileCoord::new(3, 0, 7));

        // +180 is the same meridian as -180
        assert_eq!(point_to_tile(180.0, 0.0, 3.0).x, 0);
    }

    #[test]
    fn test_longitudes_past_antimeridian_wrap() {
        assert_eq!(point_to_tile(190.0, 10.0, 4.0), point_to_tile(-170.0, 10.0, 4.0));
        assert_eq!(point_to_tile(-200.0, 10.0, 4.0), point_to_tile(160.0, 10.0, 4.0));
        assert_eq!(point_to_tile(540.0, 0.0, 2.0).x, 0);
    }

    #[test]
    fn test_tiles_in_bbox_wraps_across_antimeridian() {
        // View centered on 180 projected without normalizing longitudes
        let bounds = GeoBounds::new(170.0, -5.0, 190.0, 5.0);
        let tiles = tiles_in_bbox(&bounds, 4);
        let columns: BTreeSet<u32> = tiles.iter().map(|t| t.x).collect();

        assert!(columns.contains(&0));
        assert!(columns.contains(&15));
        assert_eq!(columns, BTreeSet::from([0, 1, 14, 15]));
        assert!(tiles.iter().all(|t| t.is_valid()));

        // The same box with a wrapped east edge
        let wrapped = GeoBounds::new(170.0, -5.0, -170.0, 5.0);
        assert_eq!(tiles_in_bbox(&wrapped, 4), tiles);
    }

    #[test]
    fn test_tiles_in_bbox_world_wide_lists_each_column_once() {
        let bounds = GeoBounds::new(-200.0, -1.0, 200.0, 1.0);
        let tiles = tiles_in_bbox(&bounds, 2);
        let columns: BTreeSet<u32> = tiles.iter().map(|t| t.x).collect();
        assert_eq!(columns, BTreeSet::from([0, 1, 2, 3]));
    }

    #[test]
    fn test_diagonal_tiles_cross_antimeridian_directly() {
        let tiles = diagonal_tiles((175.0, 0.0), (185.0, 0.0), 5);
        // Direct route: only the columns at the seam and their siblings
        assert!(tiles.iter().all(|t| t.x <= 1 || t.x >= 30));
        assert!(tiles.contains(&point_to_tile(185.0, 0.0, 5.0)));
        assert!(tiles.iter().all(|t| t.is_valid()));
    }

    #[test]
    fn test_diagonal_tiles_at_zoom_zero() {
        let tiles = diagonal_tiles((-100.0, 40.0), (120.0, -30.0), 0);
        assert_eq!(tiles, vec![TileCoord::new(0, 0, 0)]);
    }

    #[test]
    fn test_tile_bbox_roundtrip() {
        let tile = point_to_tile(-0.1278, 51.5074, 12.0);
        let bbox = tile_bbox(&tile);
        assert!(bbox.contains(-0.1278, 51.5074));
        assert!(bbox.west < bbox.east);
        assert!(bbox.south < bbox.north);
    }

    #[test]
    fn test_tile_bbox_world() {
        let bbox = tile_bbox(&TileCoord::new(0, 0, 0));
        assert_eq!(bbox.west, -180.0);
        assert_eq!(bbox.east, 180.0);
        assert!((bbox.north - MAX_LAT).abs() < 1e-9);
        assert!((bbox.south - MIN_LAT).abs() < 1e-9);
    }

    #[test]
    fn test_tile_center_inside_tile() {
        let tile = TileCoord::new(10, 512, 340);
        let (lng, lat) = tile_center(&tile);
        assert_eq!(point_to_tile(lng, lat, 10.0), tile);
    }

    #[test]
    fn test_world_projection_roundtrip() {
        let ws = world_size(256, 3.5);
        let (x, y) = project_world(12.5, -33.9, ws);
        let (lng, lat) = unproject_world(x, y, ws);
        assert!((lng - 12.5).abs() < 1e-9);
        assert!((lat + 33.9).abs() < 1e-9);

        let (cx, cy) = project_world(0.0, 0.0, ws);
        assert!((cx - ws / 2.0).abs() < 1e-9);
        assert!((cy - ws / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_neighbouring_tiles_touch() {
        let a = TileCoord::new(6, 20, 20);
        let b = TileCoord::new(6, 21, 20);
        assert!(a.intersects(&tile_bbox(&b)));
        let far = TileCoord::new(6, 23, 20);
        assert!(!a.intersects(&tile_bbox(&far)));
    }

    #[test]
    fn test_tiles_in_bbox_has_one_tile_buffer() {
        // A box strictly inside tile (5, 16, 16)
        let inner = tile_bbox(&TileCoord::new(5, 16, 16));
        let shrunk = GeoBounds::new(
            inner.west + 0.1,
            inner.south + 0.1,
            inner.east - 0.1,
            inner.north - 0.1,
        );
        let tiles = tiles_in_bbox(&shrunk, 5);
        assert_eq!(tiles.len(), 9);
        assert!(tiles.contains(&TileCoord::new(5, 15, 15)));
        assert!(tiles.contains(&TileCoord::new(5, 17, 17)));
    }

    #[test]
    fn test_tiles_in_bbox_clipped_at_world_edge() {
        let bounds = GeoBounds::new(-180.0, 80.0, -179.0, 85.0);
        let tiles = tiles_in_bbox(&bounds, 4);
        assert!(tiles.iter().all(|t| t.is_valid()));
        assert!(tiles.contains(&TileCoord::new(4, 0, 0)));
    }

    #[test]
    fn test_diagonal_tiles_endpoints_and_no_duplicates() {
        let from = (-10.0, 10.0);
        let to = (30.0, -20.0);
        let tiles = diagonal_tiles(from, to, 6);

        assert!(tiles.contains(&point_to_tile(from.0, from.1, 6.0)));
        assert!(tiles.contains(&point_to_tile(to.0, to.1, 6.0)));

        let unique: HashSet<_> = tiles.iter().collect();
        assert_eq!(unique.len(), tiles.len());
    }

    #[test]
    fn test_diagonal_tiles_same_tile() {
        let tiles = diagonal_tiles((1.0, 1.0), (1.0001, 1.0001), 4);
        // The tile itself plus its three siblings
        assert_eq!(tiles.len(), 4);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_point_to_tile_in_bounds(
                lng in -180.0..180.0_f64,
                lat in -89.0..89.0_f64,
                zoom in 0.0..24.0_f64
            ) {
                let tile = point_to_tile(lng, lat, zoom);
                prop_assert!(tile.is_valid(), "tile {} out of range", tile);
                prop_assert_eq!(tile.z, zoom.floor() as u8);
            }

            #[test]
            fn test_point_inside_its_tile_bbox(
                lng in -179.9..179.9_f64,
                lat in -85.0..85.0_f64,
                zoom in 0u8..=18
            ) {
                let tile = point_to_tile(lng, lat, zoom as f64);
                let bbox = tile_bbox(&tile);
                let inside = bbox.contains(lng, lat) || {
                    // Allow for floating point error at the edges.
                    let eps = 1e-9;
                    lng >= bbox.west - eps && lng <= bbox.east + eps
                        && lat >= bbox.south - eps && lat <= bbox.north + eps
                };
                prop_assert!(inside);
            }

            #[test]
            fn test_longitude_monotonic(
                lat in 0.0..1.0_f64,
                lng1 in -180.0..-91.0_f64,
                lng2 in -90.0..0.0_f64,
                zoom in 10u8..=15
            ) {
                let tile1 = point_to_tile(lng1, lat, zoom as f64);
                let tile2 = point_to_tile(lng2, lat, zoom as f64);
                prop_assert!(tile1.x < tile2.x);
            }

            #[test]
            fn test_tiles_in_bbox_contains_corner_tiles(
                west in -170.0..0.0_f64,
                south in -60.0..0.0_f64,
                width in 0.1..10.0_f64,
                height in 0.1..10.0_f64,
                zoom in 0u8..=10
            ) {
                let bounds = GeoBounds::new(west, south, west + width, south + height);
                let tiles = tiles_in_bbox(&bounds, zoom);
                prop_assert!(tiles.contains(&point_to_tile(west, south, zoom as f64)));
                prop_assert!(tiles.contains(&point_to_tile(west + width, south + height, zoom as f64)));
                prop_assert!(tiles.iter().all(|t| t.is_valid()));
            }
        }
    }
}
