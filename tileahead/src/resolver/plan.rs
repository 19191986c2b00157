//! Per-request tile plans and the resulting fetch queue.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::camera::{AnimationParams, CameraPose};
use crate::coord::TileCoord;
use crate::host::TileSource;

use super::diagonal::plan_diagonal;
use super::tile_set::{TileSet, TileSets};
use super::visible::VisibleTileResolver;

/// How intermediate tiles are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStrategy {
    /// Resolve the viewport of every sampled frame.
    #[default]
    Sampled,
    /// End view pyramid plus a straight corridor between the centers.
    Diagonal,
}

impl PathStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            PathStrategy::Sampled => "sampled",
            PathStrategy::Diagonal => "diagonal",
        }
    }
}

impl fmt::Display for PathStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PathStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sampled" | "path" => Ok(PathStrategy::Sampled),
            "diagonal" | "corridor" => Ok(PathStrategy::Diagonal),
            other => Err(format!("unknown strategy '{}'", other)),
        }
    }
}

/// One tile fetch, ready to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    pub source_id: String,
    pub tile: TileCoord,
    pub url: String,
}

/// Fetches in issue order: final view first, then the path.
#[derive(Debug, Clone, Default)]
pub struct FetchQueue {
    pub requests: Vec<TileRequest>,
    /// Number of leading requests belonging to the final view
    pub end_count: usize,
}

impl FetchQueue {
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Tiles selected for one movement, per source.
#[derive(Debug, Clone, Default)]
pub struct TilePlan {
    /// Final view, never shrunk
    pub end: TileSets,
    /// Everything else the movement passes through
    pub path: TileSets,
    /// Intermediate poses that needed shrinking
    pub shrunk_poses: usize,
    /// Intermediate poses that hit the hard cap
    pub capped_poses: usize,
}

impl TilePlan {
    /// Plans from sampled poses. The last pose is the final view.
    pub fn sampled(resolver: &VisibleTileResolver, poses: &[CameraPose]) -> Self {
        let mut plan = TilePlan::default();
        let Some((end, intermediate)) = poses.split_last() else {
            return plan;
        };

        plan.end = resolver.resolve(end, 0.0);
        for pose in intermediate {
            let bounded = resolver.resolve_bounded(pose);
            if bounded.retries > 0 {
                plan.shrunk_poses += 1;
            }
            if bounded.capped {
                plan.capped_poses += 1;
            }
            plan.path.union(&bounded.tiles);
        }
        trace!(
            poses = poses.len(),
            end_tiles = plan.end.total_len(),
            path_tiles = plan.path.total_len(),
            shrunk = plan.shrunk_poses,
            capped = plan.capped_poses,
            "Sampled tile plan"
        );
        plan
    }

    /// Plans with the diagonal corridor strategy.
    pub fn diagonal(
        resolver: &VisibleTileResolver,
        start: &CameraPose,
        end: &CameraPose,
        params: &AnimationParams,
    ) -> Self {
        let diagonal = plan_diagonal(start, end, params, resolver);
        let mut plan = TilePlan {
            end: resolver.resolve(end, 0.0),
            ..Default::default()
        };
        for source in resolver.sources() {
            let set = plan.path.entry(&source.id);
            for xyz in [&diagonal.pyramid, &diagonal.corridor] {
                extend_for_source(set, xyz, source);
            }
        }
        trace!(
            zmin = diagonal.zmin,
            pyramid = diagonal.pyramid.len(),
            corridor = diagonal.corridor.len(),
            "Diagonal tile plan"
        );
        plan
    }

    /// Builds the fetch queue for `sources`, dropping duplicate URLs.
    pub fn fetch_queue(&self, sources: &[TileSource]) -> FetchQueue {
        let mut seen = HashSet::new();
        let mut queue = FetchQueue::default();

        for (sets, is_end) in [(&self.end, true), (&self.path, false)] {
            for source in sources {
                let Some(set) = sets.get(&source.id) else {
                    continue;
                };
                for tile in set {
                    let url = source.tile_url(tile);
                    if seen.insert(url.clone()) {
                        queue.requests.push(TileRequest {
                            source_id: source.id.clone(),
                            tile: *tile,
                            url,
                        });
                    }
                }
            }
            if is_end {
                queue.end_count = queue.requests.len();
            }
        }
        queue
    }
}

fn extend_for_source(set: &mut TileSet, xyz: &TileSet, source: &TileSource) {
    if source.flips_y() {
        set.extend(xyz.iter().map(TileCoord::flip_y));
    } else {
        set.union(xyz);
    }
}
