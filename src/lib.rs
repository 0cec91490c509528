#![warn(missing_docs)]

//! Tileset registry, layered tile grid and editing operations for a
//! Macroquad level editor.

mod atlas;
mod category;
mod config;
pub mod edit;
mod error;
mod grid;
/// Decoding of tileset files (JSON and TSX) and level documents.
pub mod loader {
    pub mod document;
    pub mod tileset_json;
    pub mod tileset_tsx;

    use crate::atlas::AtlasDescription;
    use crate::error::MapError;
    use std::path::Path;

    /// Decode a tileset file, picking the reader by extension.
    pub fn decode_tileset(path: &Path) -> Result<AtlasDescription, MapError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") => tileset_tsx::decode_tsx_file(path),
            _ => tileset_json::decode_tileset_file(path),
        }
    }
}
mod registry;
mod session;

/// Global tile id; `0` is an empty cell.
pub type Gid = u32;

pub use atlas::{load_atlas, Atlas, AtlasDescription, AtlasImages, TileImage, TileImageRef};
pub use category::{TileCategory, TileCategoryIndex};
pub use config::EditorConfig;
pub use edit::{fill_rectangle, flood_fill, paint};
pub use error::MapError;
pub use grid::{Layer, LayeredGrid, CANONICAL_LAYERS, DEFAULT_LAYER};
pub use registry::AtlasRegistry;
pub use session::{discover_atlas_sources, EditorSession};
