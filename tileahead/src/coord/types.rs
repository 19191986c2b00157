//! Coordinate types for slippy map tiles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum latitude representable in Web Mercator (degrees).
pub const MAX_LAT: f64 = 85.051_128_779_806_59;

/// Minimum latitude representable in Web Mercator (degrees).
pub const MIN_LAT: f64 = -MAX_LAT;

/// Minimum supported zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Maximum supported zoom level.
///
/// Matches the deepest zoom common map renderers will request.
pub const MAX_ZOOM: u8 = 24;

/// A slippy map tile address.
///
/// Equality, ordering and hashing are exact integer comparisons so tile
/// coordinates can be used directly as set keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u8,
    /// Column (west to east)
    pub x: u32,
    /// Row (north to south for XYZ sources)
    pub y: u32,
}

impl TileCoord {
    /// Creates a tile coordinate.
    ///
    /// Callers are responsible for keeping `x` and `y` below `2^z`;
    /// use [`TileCoord::is_valid`] to check.
    pub const fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one axis at this tile's zoom level.
    #[inline]
    pub fn axis_len(&self) -> u32 {
        tiles_per_axis(self.z)
    }

    /// Whether `x` and `y` are inside `[0, 2^z)`.
    pub fn is_valid(&self) -> bool {
        self.z <= MAX_ZOOM && self.x < self.axis_len() && self.y < self.axis_len()
    }

    /// Returns the other members of this tile's 2×2 quad.
    ///
    /// The quad is the set of tiles sharing the same parent. Tiles are
    /// yielded row-major and never include `self`. At zoom 0 the quad is
    /// the single world tile, so nothing is yielded.
    pub fn siblings(&self) -> impl Iterator<Item = TileCoord> {
        let origin = *self;
        let base_x = self.x & !1;
        let base_y = self.y & !1;
        (0..2)
            .flat_map(move |dy| {
                (0..2).map(move |dx| TileCoord::new(origin.z, base_x + dx, base_y + dy))
            })
            .filter(move |candidate| *candidate != origin && candidate.is_valid())
    }

    /// Returns the parent tile one zoom level up, or `None` at zoom 0.
    pub fn parent(&self) -> Option<TileCoord> {
        if self.z == 0 {
            return None;
        }
        Some(TileCoord::new(self.z - 1, self.x >> 1, self.y >> 1))
    }

    /// Returns the four child tiles one zoom level down, or `None` at
    /// [`MAX_ZOOM`].
    pub fn children(&self) -> Option<[TileCoord; 4]> {
        if self.z >= MAX_ZOOM {
            return None;
        }
        let z = self.z + 1;
        let x = self.x * 2;
        let y = self.y * 2;
        Some([
            TileCoord::new(z, x, y),
            TileCoord::new(z, x + 1, y),
            TileCoord::new(z, x, y + 1),
            TileCoord::new(z, x + 1, y + 1),
        ])
    }

    /// Returns this tile with its row flipped between XYZ and TMS numbering.
    ///
    /// Rows outside the axis map to row 0.
    pub fn flip_y(&self) -> TileCoord {
        TileCoord::new(self.z, self.x, (self.axis_len() - 1).saturating_sub(self.y))
    }

    /// Tests whether this tile's bounding box intersects `bounds`.
    ///
    /// Intervals are closed: a tile that only touches the edge of `bounds`
    /// counts as intersecting, so seams between tiles are never dropped.
    pub fn intersects(&self, bounds: &GeoBounds) -> bool {
        super::tile_bbox(self).intersects(bounds)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Number of tiles along one axis at `zoom`.
#[inline]
pub fn tiles_per_axis(zoom: u8) -> u32 {
    1u32 << zoom.min(MAX_ZOOM)
}

/// A geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBounds {
    /// Creates a bounding box from its four edges.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Smallest box containing every `(lng, lat)` point.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (lng, lat) = iter.next()?;
        let mut bounds = GeoBounds::new(lng, lat, lng, lat);
        for (lng, lat) in iter {
            bounds.west = bounds.west.min(lng);
            bounds.east = bounds.east.max(lng);
            bounds.south = bounds.south.min(lat);
            bounds.north = bounds.north.max(lat);
        }
        Some(bounds)
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &GeoBounds) -> GeoBounds {
        GeoBounds::new(
            self.west.min(other.west),
            self.south.min(other.south),
            self.east.max(other.east),
            self.north.max(other.north),
        )
    }

    /// Closed-interval point containment.
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        lng >= self.west && lng <= self.east && lat >= self.south && lat <= self.north
    }

    fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.west, self.south),
            (self.east, self.south),
            (self.east, self.north),
            (self.west, self.north),
        ]
    }

    /// Closed-interval intersection test.
    ///
    /// True when any corner of one box lies inside the other, or when the
    /// boxes cross without containing each other's corners.
    pub fn intersects(&self, other: &GeoBounds) -> bool {
        if self.corners().iter().any(|&(x, y)| other.contains(x, y)) {
            return true;
        }
        if other.corners().iter().any(|&(x, y)| self.contains(x, y)) {
            return true;
        }
        // Cross shape: neither box holds a corner of the other.
        self.west <= other.east
            && other.west <= self.east
            && self.south <= other.north
            && other.south <= self.north
    }
}
