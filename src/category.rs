//! Static grouping of global tile ids by the layer they are meant for.
//!
//! A [`TileCategoryIndex`] is built once (built-in table or a JSON file), then
//! passed by reference to whatever builds palettes. Editing never mutates it.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::atlas::Atlas;
use crate::error::MapError;
use crate::grid::DEFAULT_LAYER;
use crate::Gid;

/// Tiles considered appropriate for one layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TileCategory {
    /// Display name
    pub name: String,
    /// Layer the tiles belong on
    pub layer: String,
    /// Canonical global ids
    #[serde(default, rename = "tiles")]
    pub tile_ids: BTreeSet<Gid>,
    /// Free text
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
struct JsonCategory {
    key: String,
    #[serde(flatten)]
    category: TileCategory,
}

/// Ordered table of categories keyed by name.
#[derive(Debug, Clone)]
pub struct TileCategoryIndex {
    categories: Vec<(String, TileCategory)>,
}

impl TileCategoryIndex {
    /// Build from explicit entries; earlier entries win in [`Self::category_for_tile`].
    pub fn new(categories: Vec<(String, TileCategory)>) -> Self {
        TileCategoryIndex { categories }
    }

    /// Parse a JSON list of `{key, name, layer, tiles, description}`.
    pub fn from_json_str(json: &str) -> Result<Self, MapError> {
        let entries: Vec<JsonCategory> = serde_json::from_str(json)?;
        Ok(Self::new(
            entries.into_iter().map(|e| (e.key, e.category)).collect(),
        ))
    }

    /// Read a category table file.
    pub fn from_file(path: &Path) -> Result<Self, MapError> {
        let txt = std::fs::read_to_string(path).map_err(|source| MapError::io(path, source))?;
        let entries: Vec<JsonCategory> =
            serde_json::from_str(&txt).map_err(|source| MapError::json(path, source))?;
        Ok(Self::new(
            entries.into_iter().map(|e| (e.key, e.category)).collect(),
        ))
    }

    /// Category by key.
    pub fn category(&self, key: &str) -> Option<&TileCategory> {
        self.categories
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| c)
    }

    /// All categories in table order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &TileCategory)> {
        self.categories.iter().map(|(k, c)| (k.as_str(), c))
    }

    /// Every gid meant for `layer`; empty for unknown layers.
    pub fn tiles_for_layer(&self, layer: &str) -> BTreeSet<Gid> {
        self.categories
            .iter()
            .filter(|(_, c)| c.layer == layer)
            .flat_map(|(_, c)| c.tile_ids.iter().copied())
            .collect()
    }

    /// Layer of the first category containing `gid`, or the ground layer.
    pub fn category_for_tile(&self, gid: Gid) -> &str {
        self.categories
            .iter()
            .find(|(_, c)| c.tile_ids.contains(&gid))
            .map(|(_, c)| c.layer.as_str())
            .unwrap_or(DEFAULT_LAYER)
    }

    /// Initialization-time extension of a category. Unknown keys are ignored.
    pub fn add_tile_to_category(&mut self, gid: Gid, key: &str) {
        if let Some((_, c)) = self.categories.iter_mut().find(|(k, _)| k == key) {
            c.tile_ids.insert(gid);
        }
    }

    /// Local ids of `atlas` whose gid is categorized for `layer`, ascending.
    ///
    /// An empty result is a real answer; callers wanting the unfiltered
    /// palette in that case use [`Self::palette_or_all`].
    pub fn build_layer_palette(&self, atlas: &Atlas, layer: &str) -> Vec<u32> {
        let range = atlas.gid_range();
        // BTreeSet iterates ascending, so the result is already sorted
        self.tiles_for_layer(layer)
            .range(range.clone())
            .map(|gid| gid - range.start)
            .collect()
    }

    /// The filtered palette, or every local id of the atlas when nothing matches.
    pub fn palette_or_all(&self, atlas: &Atlas, layer: &str) -> Vec<u32> {
        let palette = self.build_layer_palette(atlas, layer);
        if palette.is_empty() {
            atlas.local_ids().collect()
        } else {
            palette
        }
    }
}

fn category(name: &str, layer: &str, tiles: &[Gid], description: &str) -> (String, TileCategory) {
    (
        layer.to_owned(),
        TileCategory {
            name: name.to_owned(),
            layer: layer.to_owned(),
            tile_ids: tiles.iter().copied().collect(),
            description: description.to_owned(),
        },
    )
}

impl Default for TileCategoryIndex {
    /// Built-in table for the bundled dungeon tilesets.
    fn default() -> Self {
        let ground: Vec<Gid> = (589..=599)
            .chain(562..=585)
            .chain(625..=635)
            .chain(1..=10)
            .chain(656..=664)
            .collect();
        let obstacles: Vec<Gid> = (847..=858)
            .chain(911..=920)
            .chain(783..=792)
            .chain(821..=825)
            .chain(101..=105)
            .collect();
        let allies: Vec<Gid> = [1099, 1093, 1094, 1095, 1096]
            .into_iter()
            .chain(22..=26)
            .chain(8..=12)
            .collect();
        let foes: Vec<Gid> = (800..=805).chain(900..=905).collect();

        Self::new(vec![
            category("Ground Tiles", "ground", &ground, "Base terrain and floor tiles"),
            category(
                "Obstacle Tiles",
                "obstacles",
                &obstacles,
                "Walls, rocks, and blocking elements",
            ),
            category("Ally Markers", "allies", &allies, "Player and ally placement markers"),
            category("Foe Markers", "foes", &foes, "Enemy placement markers"),
        ])
    }
}
