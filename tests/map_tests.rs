// tests/map_tests.rs

use macroquad_level_grid::{LayeredGrid, MapError, CANONICAL_LAYERS};

const BAD_LAYER_SIZE: &str = r#"
{
  "width": 2,
  "height": 2,
  "layers": {
    "ground": { "data": [[1, 2], [3, 4]] },
    "oops": { "data": [[1, 2], [3]] }
  }
}
"#;

#[test]
fn error_on_layer_size_mismatch() {
    let err = LayeredGrid::load_from_str(BAD_LAYER_SIZE).unwrap_err();
    assert!(matches!(err, MapError::InvalidLayerSize { layer, .. } if layer == "oops"));
}

const JSON_WITH_EXTRA: &str = r#"
{
  "width": 1, "height": 1,
  "dummyField": "ignored",
  "layers": {
    "ground": { "data": [[5]], "opacity": 0.5 }
  }
}
"#;

#[test]
fn load_ignores_extra_fields() {
    let grid = LayeredGrid::load_from_str(JSON_WITH_EXTRA).expect("Should ignore unknown fields");
    assert_eq!(grid.get(0, 0), 5);
}

const LEGACY: &str = r#"
{
  "width": 3,
  "height": 2,
  "grid": [[1, 2, 3], [4, 5, 6]],
  "tilesets": ["imgs/tiled_tilesets/dungeon.json"]
}
"#;

#[test]
fn legacy_document_gets_all_canonical_layers() {
    let grid = LayeredGrid::load_from_str(LEGACY).expect("legacy loads");
    assert_eq!(grid.layer_names().collect::<Vec<_>>(), CANONICAL_LAYERS.to_vec());
    assert_eq!(
        grid.layer("ground").map(|l| l.rows().map(<[u32]>::to_vec).collect::<Vec<_>>()),
        Some(vec![vec![1, 2, 3], vec![4, 5, 6]])
    );
    for name in &CANONICAL_LAYERS[1..] {
        let layer = grid.layer(name).expect("canonical layer");
        assert!(layer.visible);
        assert!(layer.cells().iter().all(|&g| g == 0));
    }
}

#[test]
fn nonexistent_layer_reads_empty_everywhere() {
    let mut grid = LayeredGrid::load_from_str(LEGACY).expect("legacy loads");
    for y in 0..2 {
        for x in 0..3 {
            assert_eq!(grid.get_on("nonexistent_layer", x, y), 0);
        }
    }
    grid.set_on("nonexistent_layer", 0, 0, 0);
    let layer = grid.layer("nonexistent_layer").expect("now queryable");
    assert!(layer.cells().iter().all(|&g| g == 0));
}

#[test]
fn document_without_layers_or_grid_is_rejected() {
    let err = LayeredGrid::load_from_str(r#"{ "width": 1, "height": 1 }"#).unwrap_err();
    assert!(matches!(err, MapError::InvalidDocument(_)));
}
