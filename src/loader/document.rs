//! Level documents: current `layers` schema plus the legacy single `grid`.
use crate::error::MapError;
use crate::grid::{Layer, LayeredGrid, CANONICAL_LAYERS, DEFAULT_LAYER};
use crate::Gid;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::path::Path;
use tracing::{debug, info};

/// Largest `width * height` a document may declare (16M cells per layer).
pub const MAX_CELLS: usize = 1 << 24;

#[derive(Serialize, Deserialize)]
struct JsonLayer {
    data: Vec<Vec<Gid>>,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    visible: bool,
}

fn default_true() -> bool {
    true
}

fn null_as_true<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(de)?.unwrap_or(true))
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// Current schema: named layers.
#[derive(Deserialize)]
struct CurrentDoc {
    width: usize,
    height: usize,
    // kept as a JSON map so layer order survives (preserve_order)
    layers: JsonMap<String, JsonValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    tilesets: Vec<String>,
}

/// Legacy schema: one flat grid that becomes the ground layer.
#[derive(Deserialize)]
struct LegacyDoc {
    width: usize,
    height: usize,
    grid: Vec<Vec<Gid>>,
    #[serde(default, deserialize_with = "null_as_default")]
    tilesets: Vec<String>,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    width: usize,
    height: usize,
    layers: JsonMap<String, JsonValue>,
    tilesets: &'a [String],
}

enum RawDocument {
    Current(CurrentDoc),
    Legacy(LegacyDoc),
}

impl RawDocument {
    fn detect(value: JsonValue) -> Result<Self, MapError> {
        let Some((has_layers, has_grid)) = value
            .as_object()
            .map(|obj| (obj.contains_key("layers"), obj.contains_key("grid")))
        else {
            return Err(MapError::InvalidDocument(
                "document must be a JSON object".to_owned(),
            ));
        };

        if has_layers {
            Ok(RawDocument::Current(serde_json::from_value(value)?))
        } else if has_grid {
            Ok(RawDocument::Legacy(serde_json::from_value(value)?))
        } else {
            Err(MapError::InvalidDocument(
                "expected a `layers` map or a legacy `grid`".to_owned(),
            ))
        }
    }

    fn dimensions(&self) -> (usize, usize) {
        match self {
            RawDocument::Current(doc) => (doc.width, doc.height),
            RawDocument::Legacy(doc) => (doc.width, doc.height),
        }
    }

    fn normalize(self) -> Result<LayeredGrid, MapError> {
        let (width, height) = self.dimensions();
        check_dimensions(width, height)?;

        match self {
            RawDocument::Current(doc) => {
                let mut layers = Vec::with_capacity(doc.layers.len().max(CANONICAL_LAYERS.len()));
                for (name, raw) in doc.layers {
                    let JsonLayer { data, visible } = serde_json::from_value(raw)?;
                    let mut layer = Layer::from_rows(name, doc.width, doc.height, data)?;
                    layer.visible = visible;
                    layers.push(layer);
                }
                let layers = with_canonical_layers(layers, doc.width, doc.height);
                LayeredGrid::from_layers(doc.width, doc.height, layers, doc.tilesets)
            }
            RawDocument::Legacy(doc) => {
                info!(
                    width = doc.width,
                    height = doc.height,
                    "upgrading legacy single-grid document"
                );
                let ground = Layer::from_rows(DEFAULT_LAYER, doc.width, doc.height, doc.grid)?;
                let layers = with_canonical_layers(vec![ground], doc.width, doc.height);
                LayeredGrid::from_layers(doc.width, doc.height, layers, doc.tilesets)
            }
        }
    }
}

/// Reject declared sizes whose cell count overflows or exceeds [`MAX_CELLS`]
/// before any layer is allocated.
fn check_dimensions(width: usize, height: usize) -> Result<(), MapError> {
    match width.checked_mul(height) {
        Some(cells) if cells <= MAX_CELLS => Ok(()),
        Some(cells) => Err(MapError::InvalidDocument(format!(
            "{}x{} is {} cells, more than the {} allowed",
            width, height, cells, MAX_CELLS
        ))),
        None => Err(MapError::InvalidDocument(format!(
            "{}x{} cells overflows",
            width, height
        ))),
    }
}

/// Canonical layers first (synthesized empty when missing), then the rest in
/// document order.
fn with_canonical_layers(mut layers: Vec<Layer>, width: usize, height: usize) -> Vec<Layer> {
    let mut ordered = Vec::with_capacity(layers.len() + CANONICAL_LAYERS.len());
    for name in CANONICAL_LAYERS {
        match layers.iter().position(|l| l.name() == name) {
            Some(idx) => ordered.push(layers.remove(idx)),
            None => ordered.push(Layer::new(name, width, height)),
        }
    }
    ordered.extend(layers);
    ordered
}

/// Encode a grid in the current schema. Every present layer is written,
/// in draw order.
pub fn to_value(grid: &LayeredGrid) -> Result<JsonValue, MapError> {
    let mut layers = JsonMap::new();
    for layer in grid.layers() {
        let json = JsonLayer {
            data: layer.rows().map(<[Gid]>::to_vec).collect(),
            visible: layer.visible,
        };
        layers.insert(layer.name().to_owned(), serde_json::to_value(json)?);
    }

    Ok(serde_json::to_value(JsonDocument {
        width: grid.width(),
        height: grid.height(),
        layers,
        tilesets: &grid.tilesets,
    })?)
}

/// Pretty-printed current-schema JSON.
pub fn to_string_pretty(grid: &LayeredGrid) -> Result<String, MapError> {
    Ok(serde_json::to_string_pretty(&to_value(grid)?)?)
}

/// Decode either schema into a grid. Nothing is returned on validation failure.
pub fn from_value(value: JsonValue) -> Result<LayeredGrid, MapError> {
    RawDocument::detect(value)?.normalize()
}

/// Decode a document from JSON text.
pub fn from_str(json: &str) -> Result<LayeredGrid, MapError> {
    from_value(serde_json::from_str(json)?)
}

/// Read a `.json` document file.
pub fn load_file(path: &Path) -> Result<LayeredGrid, MapError> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::UnsupportedFormat(path.display().to_string()));
    }

    let txt = std::fs::read_to_string(path).map_err(|source| MapError::io(path, source))?;
    let value: JsonValue =
        serde_json::from_str(&txt).map_err(|source| MapError::json(path, source))?;
    let grid = from_value(value)?;
    debug!(path = %path.display(), layers = grid.layers().len(), "loaded document");
    Ok(grid)
}

/// Write a document file, creating parent directories as needed.
pub fn save_file(grid: &LayeredGrid, path: &Path) -> Result<(), MapError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| MapError::io(dir, source))?;
    }
    let txt = to_string_pretty(grid)?;
    std::fs::write(path, txt).map_err(|source| MapError::io(path, source))?;
    debug!(path = %path.display(), "saved document");
    Ok(())
}

impl LayeredGrid {
    /// Load a document from JSON text (current or legacy schema).
    pub fn load_from_str(json: &str) -> Result<Self, MapError> {
        from_str(json)
    }

    /// Load a document from a file path, only supporting JSON.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        load_file(path.as_ref())
    }

    /// Save in the current schema.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MapError> {
        save_file(self, path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn saves_every_layer_in_draw_order() {
        let mut grid = LayeredGrid::create(2, 1, 3, vec!["a.json".into(), "b.json".into()]);
        grid.get_layer("decals");
        grid.set_visible("allies", false);

        let value = to_value(&grid).expect("encode");
        let names: Vec<&str> = value["layers"]
            .as_object()
            .expect("layers map")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["ground", "obstacles", "allies", "foes", "decals"]);
        assert_eq!(value["layers"]["ground"]["data"], json!([[3, 3]]));
        assert_eq!(value["layers"]["allies"]["visible"], json!(false));
        assert_eq!(value["tilesets"], json!(["a.json", "b.json"]));
        assert_eq!(value["width"], json!(2));
    }

    #[test]
    fn visible_defaults_to_true_and_missing_canonical_layers_are_added() {
        let grid = from_value(json!({
            "width": 2,
            "height": 2,
            "layers": {
                "decals": { "data": [[0, 1], [1, 0]] },
                "ground": { "data": [[5, 5], [5, 5]], "visible": false }
            }
        }))
        .expect("decode");

        assert_eq!(
            grid.layer_names().collect::<Vec<_>>(),
            vec!["ground", "obstacles", "allies", "foes", "decals"]
        );
        assert_eq!(grid.layer("decals").map(|l| l.visible), Some(true));
        assert_eq!(grid.layer("ground").map(|l| l.visible), Some(false));
        assert!(grid.tilesets.is_empty());
    }

    #[test]
    fn legacy_grid_becomes_ground() {
        let grid = from_value(json!({
            "width": 3,
            "height": 2,
            "grid": [[1, 2, 3], [4, 5, 6]],
            "tilesets": ["imgs/tiled_tilesets/dungeon.json"]
        }))
        .expect("decode");

        assert_eq!(grid.layer("ground").map(|l| l.cells().to_vec()), Some(vec![1, 2, 3, 4, 5, 6]));
        for name in ["obstacles", "allies", "foes"] {
            let layer = grid.layer(name).expect("synthesized layer");
            assert!(layer.visible);
            assert!(layer.cells().iter().all(|&g| g == 0));
        }
        assert_eq!(grid.tilesets, vec!["imgs/tiled_tilesets/dungeon.json".to_owned()]);

        // re-saving writes the current schema
        let value = to_value(&grid).expect("encode");
        assert!(value.get("grid").is_none());
        assert!(value.get("layers").is_some());
    }

    #[test]
    fn row_count_mismatch_fails_the_whole_load() {
        let err = from_value(json!({
            "width": 2, "height": 2,
            "layers": {
                "ground": { "data": [[0, 0], [0, 0]] },
                "foes": { "data": [[0, 0]] }
            }
        }))
        .unwrap_err();
        assert!(matches!(err, MapError::InvalidLayerSize { ref layer, .. } if layer == "foes"));
    }

    #[test]
    fn column_count_mismatch_fails_legacy_load() {
        let err = from_value(json!({ "width": 2, "height": 1, "grid": [[0, 0, 0]] })).unwrap_err();
        assert!(matches!(err, MapError::InvalidLayerSize { ref layer, .. } if layer == "ground"));
    }

    #[test]
    fn unknown_shape_is_rejected() {
        assert!(matches!(
            from_value(json!({ "width": 1, "height": 1 })),
            Err(MapError::InvalidDocument(_))
        ));
        assert!(matches!(from_value(json!([1, 2])), Err(MapError::InvalidDocument(_))));
        assert!(matches!(
            from_str(r#"{"width": 1, "height": 1, "grid": [[-4]]}"#),
            Err(MapError::Decode(_))
        ));
    }

    #[test]
    fn oversized_dimensions_are_rejected_before_allocating() {
        let overflowing = from_str(r#"{"width": 4294967296, "height": 4294967297, "layers": {}}"#);
        assert!(matches!(overflowing, Err(MapError::InvalidDocument(ref m)) if m.contains("overflows")));

        let huge = from_value(json!({ "width": 100000, "height": 100000, "layers": {} }));
        assert!(matches!(huge, Err(MapError::InvalidDocument(_))));

        let legacy = from_value(json!({ "width": 100000, "height": 100000, "grid": [] }));
        assert!(matches!(legacy, Err(MapError::InvalidDocument(_))));

        // the limit itself is still accepted
        let edge = from_value(json!({ "width": MAX_CELLS, "height": 0, "layers": {} }));
        assert!(edge.is_ok());
    }

    #[test]
    fn null_tilesets_and_visible_fall_back_to_defaults() {
        let grid = from_value(json!({
            "width": 1,
            "height": 1,
            "layers": { "ground": { "data": [[2]], "visible": null } },
            "tilesets": null
        }))
        .expect("decode");
        assert!(grid.tilesets.is_empty());
        assert_eq!(grid.layer("ground").map(|l| l.visible), Some(true));

        let legacy = from_value(json!({ "width": 1, "height": 1, "grid": [[0]], "tilesets": null }))
            .expect("decode legacy");
        assert!(legacy.tilesets.is_empty());
    }

    #[test]
    fn rejects_non_json_paths() {
        let err = load_file(Path::new("level.tmx")).unwrap_err();
        assert!(matches!(err, MapError::UnsupportedFormat(ref p) if p == "level.tmx"));
    }
}
