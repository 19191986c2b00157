//! Diagonal corridor strategy.
//!
//! Rather than resolving a viewport for every sampled frame, prefetch the
//! final view as a pyramid down to the lowest zoom the movement reaches,
//! plus the straight tile line between the two centers at that zoom. Much
//! cheaper for long pans where per-frame viewports mostly overlap.

use crate::camera::{fly_curve, AnimationKind, AnimationParams, CameraPose};
use crate::coord::{diagonal_tiles, tiles_in_bbox, zoom_level, GeoBounds, TileCoord, MAX_ZOOM};

use super::tile_set::TileSet;
use super::visible::VisibleTileResolver;

/// Tiles chosen by the diagonal strategy, in XYZ numbering.
#[derive(Debug, Clone)]
pub struct DiagonalPlan {
    /// Final view from its own zoom down to `zmin`
    pub pyramid: TileSet,
    /// Bresenham line between the centers plus quad siblings
    pub corridor: TileSet,
    /// Lowest zoom covered
    pub zmin: u8,
}

/// Lowest integer zoom the camera passes through.
///
/// For fly movements this is the top of the curve rather than the lower
/// endpoint; a `min_zoom` in `params` shapes that curve.
pub fn corridor_zoom(
    start: &CameraPose,
    end: &CameraPose,
    params: &AnimationParams,
    resolver: &VisibleTileResolver,
) -> u8 {
    let mut lowest = start.zoom.min(end.zoom);
    if params.kind == AnimationKind::Fly {
        let peak = fly_curve(start, end, params, &resolver.viewport()).peak_zoom_out();
        if peak.is_finite() {
            lowest = lowest.min(peak);
        }
    }
    zoom_level(lowest)
}

/// Builds the pyramid and corridor for a movement.
pub fn plan_diagonal(
    start: &CameraPose,
    end: &CameraPose,
    params: &AnimationParams,
    resolver: &VisibleTileResolver,
) -> DiagonalPlan {
    let zmin = corridor_zoom(start, end, params, resolver);
    let top = zoom_level(end.zoom).max(zmin);

    let mut pyramid = TileSet::new();
    if let Some(bounds) = resolver.view_bounds(end, 0.0) {
        for z in (zmin..=top).rev() {
            pyramid.extend(tiles_in_bbox(&bounds, z));
        }
    }

    let mut zooms = vec![zmin];
    // The curve top is an estimate; cover one level either side of it.
    if params.kind == AnimationKind::Fly {
        if zmin > 0 {
            zooms.push(zmin - 1);
        }
        if zmin < MAX_ZOOM {
            zooms.push(zmin + 1);
        }
    }

    let mut corridor = TileSet::new();
    for z in zooms {
        corridor.extend(corridor_tiles(start, end, z));
    }

    DiagonalPlan {
        pyramid,
        corridor,
        zmin,
    }
}

/// Line tiles at `z` whose boxes touch the rectangle spanned by the two
/// centers. Tiles on the line always do; this drops the quad siblings
/// that fall beside the path.
fn corridor_tiles(start: &CameraPose, end: &CameraPose, z: u8) -> Vec<TileCoord> {
    let from = start.center.as_tuple();
    let to = end.center.as_tuple();
    let bounds = GeoBounds::new(
        from.0.min(to.0),
        from.1.min(to.1),
        from.0.max(to.0),
        from.1.max(to.1),
    );

    diagonal_tiles(from, to, z)
        .into_iter()
        .filter(|tile| tile.intersects(&bounds))
        .collect()
}
