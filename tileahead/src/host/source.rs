//! Tile source descriptions.

use serde::{Deserialize, Serialize};

use crate::coord::TileCoord;

/// Row numbering used by a tile source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileScheme {
    /// Rows counted from the north (slippy map / XYZ).
    #[default]
    Xyz,
    /// Rows counted from the south.
    Tms,
}

/// A tiled layer the host renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileSource {
    /// Identifier unique within the host.
    pub id: String,
    /// URL with `{z}`, `{x}`, `{y}` (or `{-y}`) placeholders.
    pub url_template: String,
    #[serde(default)]
    pub scheme: TileScheme,
}

impl TileSource {
    /// Creates an XYZ source.
    pub fn new(id: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url_template: url_template.into(),
            scheme: TileScheme::Xyz,
        }
    }

    pub fn with_scheme(mut self, scheme: TileScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Whether tile rows must be flipped from XYZ numbering.
    pub fn flips_y(&self) -> bool {
        self.scheme != TileScheme::Xyz
    }

    /// Builds the URL for a tile already expressed in this source's row
    /// numbering.
    ///
    /// `{-y}` expands to the opposite numbering, so a template written for
    /// the other scheme still resolves to the same tile.
    pub fn tile_url(&self, tile: &TileCoord) -> String {
        let mut url = self.url_template.replace("{z}", &tile.z.to_string());
        url = url.replace("{x}", &tile.x.to_string());
        if url.contains("{-y}") {
            url = url.replace("{-y}", &tile.flip_y().y.to_string());
        }
        url.replace("{y}", &tile.y.to_string())
    }
}
