//! Editor defaults loaded from an optional JSON config file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::MapError;
use crate::Gid;

/// Editor defaults. Every field is optional in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditorConfig {
    /// Width of a new document, in cells
    #[serde(default = "default_width")]
    pub width: usize,
    /// Height of a new document, in cells
    #[serde(default = "default_height")]
    pub height: usize,
    /// Ground fill of a new document
    #[serde(default)]
    pub fill: Gid,
    /// Directory scanned for tileset files when a document lists none,
    /// relative to the project root
    #[serde(default = "default_atlas_dir")]
    pub atlas_dir: PathBuf,
    /// Where documents are saved when no path was given
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,
    /// Category table file; the built-in table is used when absent
    #[serde(default)]
    pub categories: Option<PathBuf>,
}

fn default_width() -> usize {
    22
}
fn default_height() -> usize {
    14
}
fn default_atlas_dir() -> PathBuf {
    PathBuf::from("imgs/tiled_tilesets")
}
fn default_template_path() -> PathBuf {
    PathBuf::from("maps/editor_templates/template.json")
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            width: default_width(),
            height: default_height(),
            fill: 0,
            atlas_dir: default_atlas_dir(),
            template_path: default_template_path(),
            categories: None,
        }
    }
}

impl EditorConfig {
    /// Parse from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, MapError> {
        let txt = std::fs::read_to_string(path).map_err(|source| MapError::io(path, source))?;
        serde_json::from_str(&txt).map_err(|source| MapError::json(path, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_the_default() {
        let cfg = EditorConfig::from_json_str("{}").expect("parse");
        assert_eq!(cfg, EditorConfig::default());
        assert_eq!((cfg.width, cfg.height), (22, 14));
    }

    #[test]
    fn overrides_only_what_is_given() {
        let cfg = EditorConfig::from_json_str(r#"{"width": 40, "categories": "cfg/categories.json"}"#)
            .expect("parse");
        assert_eq!(cfg.width, 40);
        assert_eq!(cfg.height, 14);
        assert_eq!(cfg.categories, Some(PathBuf::from("cfg/categories.json")));
    }
}
