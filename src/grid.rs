//! Layered tile grid: the in-memory document the editor mutates.

use crate::error::MapError;
use crate::Gid;

/// Layer addressed when the caller does not name one.
pub const DEFAULT_LAYER: &str = "ground";

/// Layers every document carries, bottom to top.
pub const CANONICAL_LAYERS: [&str; 4] = ["ground", "obstacles", "allies", "foes"];

/// One named grid of global ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    name: String,
    width: usize,
    height: usize,
    /// Hidden layers are still edited and saved; hosts decide what to draw
    pub visible: bool,
    data: Vec<Gid>,
}

impl Layer {
    /// Empty, visible layer.
    pub fn new(name: impl Into<String>, width: usize, height: usize) -> Self {
        Self::filled(name, width, height, 0)
    }

    /// Visible layer with every cell set to `fill`.
    pub fn filled(name: impl Into<String>, width: usize, height: usize, fill: Gid) -> Self {
        Layer {
            name: name.into(),
            width,
            height,
            visible: true,
            data: vec![fill; width * height],
        }
    }

    /// Build from `height` rows of `width` cells.
    pub fn from_rows(
        name: impl Into<String>,
        width: usize,
        height: usize,
        rows: Vec<Vec<Gid>>,
    ) -> Result<Self, MapError> {
        let name = name.into();
        if rows.len() != height {
            return Err(MapError::InvalidLayerSize {
                reason: format!("expected {} rows, found {}", height, rows.len()),
                layer: name,
            });
        }
        if let Some((y, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(MapError::InvalidLayerSize {
                reason: format!("row {} has {} columns, expected {}", y, row.len(), width),
                layer: name,
            });
        }

        Ok(Layer {
            name,
            width,
            height,
            visible: true,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// Layer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Whether `(x, y)` is a cell of this layer.
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// Cell value; `0` outside the layer.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Gid {
        self.index(x, y).map_or(0, |i| self.data[i])
    }

    /// Overwrite a cell; no-op outside the layer.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: Gid) {
        if let Some(i) = self.index(x, y) {
            self.data[i] = value;
        }
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Gid]> {
        // not chunks(): a zero-width layer still has `height` (empty) rows
        (0..self.height).map(move |y| &self.data[y * self.width..(y + 1) * self.width])
    }

    /// All cells, row-major.
    pub fn cells(&self) -> &[Gid] {
        &self.data
    }
}

/// Multi-layer document: fixed dimensions, ordered layers and the atlas
/// sources that reproduce its global ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayeredGrid {
    width: usize,
    height: usize,
    layers: Vec<Layer>,
    /// Atlas source ids in `first_gid` order
    pub tilesets: Vec<String>,
}

impl LayeredGrid {
    /// New document with the canonical layers; only ground starts as `fill`.
    pub fn create(width: usize, height: usize, fill: Gid, tilesets: Vec<String>) -> Self {
        let layers = CANONICAL_LAYERS
            .iter()
            .map(|&name| {
                let fill = if name == DEFAULT_LAYER { fill } else { 0 };
                Layer::filled(name, width, height, fill)
            })
            .collect();
        LayeredGrid {
            width,
            height,
            layers,
            tilesets,
        }
    }

    /// Assemble from already validated layers. Layers whose size differs from
    /// the document are rejected.
    pub(crate) fn from_layers(
        width: usize,
        height: usize,
        layers: Vec<Layer>,
        tilesets: Vec<String>,
    ) -> Result<Self, MapError> {
        if let Some(bad) = layers
            .iter()
            .find(|l| l.width != width || l.height != height)
        {
            return Err(MapError::InvalidLayerSize {
                layer: bad.name.clone(),
                reason: format!(
                    "layer is {}x{}, document is {}x{}",
                    bad.width, bad.height, width, height
                ),
            });
        }
        Ok(LayeredGrid {
            width,
            height,
            layers,
            tilesets,
        })
    }

    /// Columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Layer by name, creating an empty visible one if missing.
    pub fn get_layer(&mut self, name: &str) -> &mut Layer {
        let idx = match self.layers.iter().position(|l| l.name == name) {
            Some(idx) => idx,
            None => {
                self.layers.push(Layer::new(name, self.width, self.height));
                self.layers.len() - 1
            }
        };
        &mut self.layers[idx]
    }

    /// Layer by name without materializing it.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Whether the layer exists yet.
    pub fn has_layer(&self, name: &str) -> bool {
        self.layer(name).is_some()
    }

    /// Layers in draw order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layer names in draw order.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(Layer::name)
    }

    /// Show or hide a layer (materializing it if needed).
    pub fn set_visible(&mut self, name: &str, visible: bool) {
        self.get_layer(name).visible = visible;
    }

    /// Ground cell, `0` when out of bounds.
    pub fn get(&self, x: i32, y: i32) -> Gid {
        self.get_on(DEFAULT_LAYER, x, y)
    }

    /// Cell of `layer`; `0` when out of bounds or the layer does not exist.
    pub fn get_on(&self, layer: &str, x: i32, y: i32) -> Gid {
        self.layer(layer).map_or(0, |l| l.get(x, y))
    }

    /// Write a ground cell.
    pub fn set(&mut self, x: i32, y: i32, value: Gid) {
        self.set_on(DEFAULT_LAYER, x, y, value);
    }

    /// Write a cell of `layer`. The layer is materialized even when the
    /// coordinates are out of bounds and the write itself is dropped.
    pub fn set_on(&mut self, layer: &str, x: i32, y: i32, value: Gid) {
        self.get_layer(layer).set(x, y, value);
    }
}
