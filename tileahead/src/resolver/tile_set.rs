//! Ordered, de-duplicated tile collections.

use std::collections::{BTreeMap, HashSet};

use crate::coord::TileCoord;

/// Tiles in priority order without duplicates.
///
/// Insertion order is kept so earlier tiles are fetched first; the
/// companion hash set makes inserts idempotent.
#[derive(Debug, Clone, Default)]
pub struct TileSet {
    order: Vec<TileCoord>,
    seen: HashSet<TileCoord>,
}

impl TileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tile, returning `false` if it was already present.
    pub fn insert(&mut self, tile: TileCoord) -> bool {
        if self.seen.insert(tile) {
            self.order.push(tile);
            true
        } else {
            false
        }
    }

    /// Appends every tile of `other` not already present.
    pub fn union(&mut self, other: &TileSet) {
        for tile in other.iter() {
            self.insert(*tile);
        }
    }

    pub fn contains(&self, tile: &TileCoord) -> bool {
        self.seen.contains(tile)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tiles in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, TileCoord> {
        self.order.iter()
    }
}

impl PartialEq for TileSet {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl Eq for TileSet {}

impl FromIterator<TileCoord> for TileSet {
    fn from_iter<I: IntoIterator<Item = TileCoord>>(iter: I) -> Self {
        let mut set = TileSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<TileCoord> for TileSet {
    fn extend<I: IntoIterator<Item = TileCoord>>(&mut self, iter: I) {
        for tile in iter {
            self.insert(tile);
        }
    }
}

impl<'a> IntoIterator for &'a TileSet {
    type Item = &'a TileCoord;
    type IntoIter = std::slice::Iter<'a, TileCoord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Tile sets keyed by source id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileSets {
    sets: BTreeMap<String, TileSet>,
}

impl TileSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable set for a source, created on first use.
    pub fn entry(&mut self, source_id: &str) -> &mut TileSet {
        self.sets.entry(source_id.to_string()).or_default()
    }

    pub fn get(&self, source_id: &str) -> Option<&TileSet> {
        self.sets.get(source_id)
    }

    /// Merges `other` into `self`, source by source.
    pub fn union(&mut self, other: &TileSets) {
        for (id, set) in &other.sets {
            self.entry(id).union(set);
        }
    }

    /// Largest per-source tile count.
    pub fn max_len(&self) -> usize {
        self.sets.values().map(TileSet::len).max().unwrap_or(0)
    }

    /// Total tile count over all sources.
    pub fn total_len(&self) -> usize {
        self.sets.values().map(TileSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TileSet)> {
        self.sets.iter().map(|(id, set)| (id.as_str(), set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent_and_ordered() {
        let mut set = TileSet::new();
        assert!(set.insert(TileCoord::new(3, 1, 1)));
        assert!(set.insert(TileCoord::new(3, 0, 1)));
        assert!(!set.insert(TileCoord::new(3, 1, 1)));

        let tiles: Vec<_> = set.iter().copied().collect();
        assert_eq!(tiles, vec![TileCoord::new(3, 1, 1), TileCoord::new(3, 0, 1)]);
    }

    #[test]
    fn test_self_union_is_noop() {
        let set: TileSet = (0..5).map(|x| TileCoord::new(4, x, 2)).collect();
        let mut merged = set.clone();
        merged.union(&set);
        assert_eq!(merged, set);
    }

    #[test]
    fn test_tile_sets_union_per_source() {
        let mut a = TileSets::new();
        a.entry("roads").insert(TileCoord::new(2, 0, 0));
        let mut b = TileSets::new();
        b.entry("roads").insert(TileCoord::new(2, 0, 0));
        b.entry("roads").insert(TileCoord::new(2, 1, 0));
        b.entry("labels").insert(TileCoord::new(2, 1, 0));

        a.union(&b);
        assert_eq!(a.get("roads").map(TileSet::len), Some(2));
        assert_eq!(a.get("labels").map(TileSet::len), Some(1));
        assert_eq!(a.max_len(), 2);
        assert_eq!(a.total_len(), 3);
    }
}
