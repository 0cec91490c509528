//! Tiled-style JSON tileset files.
use crate::atlas::{AtlasDescription, AtlasImages, TileImageRef};
use crate::error::MapError;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
struct JsonTileset {
    #[serde(default)]
    name: Option<String>,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    tilecount: u32,
    #[serde(default)]
    columns: u32,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    image: Option<String>,
}

fn is_tileset_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json") | Some("tsj")
    )
}

/// Parse a tileset file into an atlas description. Image paths are resolved
/// against the tileset file's directory; `source` is left for the caller.
pub fn decode_tileset_file(path: &Path) -> Result<AtlasDescription, MapError> {
    if !is_tileset_file(path) {
        return Err(MapError::UnsupportedFormat(path.display().to_string()));
    }

    let txt = std::fs::read_to_string(path).map_err(|source| MapError::io(path, source))?;
    let j: JsonTileset = serde_json::from_str(&txt).map_err(|source| MapError::json(path, source))?;

    let dir = path.parent().unwrap_or_else(|| Path::new("./"));
    let name = j.name.filter(|n| !n.is_empty()).unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_owned()
    });

    // A sheet image wins over per-tile entries, as Tiled only writes one or the other
    let images = match j.image.filter(|s| !s.is_empty()) {
        Some(sheet) => AtlasImages::Sheet(dir.join(sheet)),
        None => AtlasImages::PerTile(
            j.tiles
                .into_iter()
                .map(|t| TileImageRef {
                    id: t.id,
                    image: t.image.filter(|s| !s.is_empty()).map(|s| dir.join(s)),
                })
                .collect(),
        ),
    };

    Ok(AtlasDescription {
        name,
        source: None,
        tile_width: j.tilewidth,
        tile_height: j.tileheight,
        tile_count: j.tilecount,
        columns: (j.columns > 0).then_some(j.columns),
        images,
    })
}
