//! The editor's open/save workflow, without any UI.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::category::TileCategoryIndex;
use crate::config::EditorConfig;
use crate::grid::LayeredGrid;
use crate::registry::AtlasRegistry;

/// Tileset files directly inside `root/dir`, sorted by file name, as ids
/// relative to `root`. A missing directory yields no sources.
pub fn discover_atlas_sources(root: &Path, dir: &Path) -> anyhow::Result<Vec<String>> {
    let abs = root.join(dir);
    if !abs.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(&abs).with_context(|| format!("Reading {}", abs.display()))? {
        let path = entry?.path();
        let is_tileset = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("json") | Some("tsj") | Some("tsx")
        );
        if path.is_file() && is_tileset {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_owned());
            }
        }
    }
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| dir.join(name).to_string_lossy().replace('\\', "/"))
        .collect())
}

/// One open document with the atlases and categories used to edit it.
#[derive(Debug)]
pub struct EditorSession {
    /// Document being edited
    pub grid: LayeredGrid,
    /// Atlases in the document's gid order
    pub registry: AtlasRegistry,
    /// Palette filter table
    pub categories: TileCategoryIndex,
    root: PathBuf,
    path: PathBuf,
}

impl EditorSession {
    /// Open `template` (or the configured default path) under `root`.
    ///
    /// An existing document is loaded and its tileset list, when present,
    /// decides atlas order. Otherwise tilesets are discovered in
    /// `config.atlas_dir` and a fresh grid of the configured size is created.
    pub fn open(root: &Path, config: &EditorConfig, template: Option<&Path>) -> anyhow::Result<Self> {
        let path = root.join(template.unwrap_or(config.template_path.as_path()));

        let categories = match &config.categories {
            Some(file) => TileCategoryIndex::from_file(&root.join(file))
                .with_context(|| format!("Loading tile categories {}", file.display()))?,
            None => TileCategoryIndex::default(),
        };

        let grid = if path.exists() {
            let mut grid = LayeredGrid::load_from_file(&path)
                .with_context(|| format!("Loading document {}", path.display()))?;
            if grid.tilesets.is_empty() {
                grid.tilesets = discover_atlas_sources(root, &config.atlas_dir)?;
                info!(
                    count = grid.tilesets.len(),
                    "document lists no tilesets, using discovery order"
                );
            }
            grid
        } else {
            let sources = discover_atlas_sources(root, &config.atlas_dir)?;
            LayeredGrid::create(config.width, config.height, config.fill, sources)
        };

        let registry = AtlasRegistry::load_files(root, grid.tilesets.as_slice())
            .with_context(|| format!("Loading tilesets for {}", path.display()))?;

        info!(
            path = %path.display(),
            atlases = registry.len(),
            width = grid.width(),
            height = grid.height(),
            "opened document"
        );

        Ok(EditorSession {
            grid,
            registry,
            categories,
            root: root.to_path_buf(),
            path,
        })
    }

    /// Current save path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Project root that tileset ids are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filtered palette of one atlas for `layer`, or all its tiles when the
    /// category table has none for it.
    pub fn palette(&self, atlas_index: usize, layer: &str) -> Vec<u32> {
        self.registry
            .get(atlas_index)
            .map(|atlas| self.categories.palette_or_all(atlas, layer))
            .unwrap_or_default()
    }

    /// Save to the current path.
    pub fn save(&self) -> anyhow::Result<()> {
        self.grid
            .save_to_file(&self.path)
            .with_context(|| format!("Saving document {}", self.path.display()))?;
        info!(path = %self.path.display(), "saved document");
        Ok(())
    }

    /// Save under a new name (forced to `.json`, relative to the root) and
    /// keep using it.
    pub fn save_as(&mut self, path: &Path) -> anyhow::Result<&Path> {
        let mut target = self.root.join(path);
        if target.extension().and_then(|e| e.to_str()) != Some("json") {
            target.set_extension("json");
        }
        self.path = target;
        self.save()?;
        Ok(&self.path)
    }
}
