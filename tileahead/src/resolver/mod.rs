//! Visible tile resolution.
//!
//! Maps camera poses to the tiles each host tile source would load,
//! keeping intermediate poses under the burst limit, and turns the result
//! into an ordered, de-duplicated fetch queue.
//!
//! # Strategies
//!
//! - [`PathStrategy::Sampled`] resolves the full viewport of every sampled
//!   frame, shrinking frames that would need too many tiles.
//! - [`PathStrategy::Diagonal`] prefetches the final view down to the
//!   lowest zoom reached, plus a Bresenham tile corridor between the
//!   centers.

mod diagonal;
mod plan;
mod tile_set;
mod visible;

pub use diagonal::{corridor_zoom, plan_diagonal, DiagonalPlan};
pub use plan::{FetchQueue, PathStrategy, TilePlan, TileRequest};
pub use tile_set::{TileSet, TileSets};
pub use visible::{BoundedTiles, ResolverSettings, TileRange, VisibleTileResolver, MAX_SHRINK_RETRIES};
