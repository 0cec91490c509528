//! Tiled TSX (XML) tileset files, read through the `tiled` crate.
use crate::atlas::{AtlasDescription, AtlasImages, TileImageRef};
use crate::error::MapError;
use std::path::Path;
use tracing::debug;

/// Parse a `.tsx` tileset into an atlas description.
///
/// `tiled` already resolves image sources against the tileset's directory.
/// A sheet image wins over per-tile images; `source` is left for the caller.
pub fn decode_tsx_file(path: &Path) -> Result<AtlasDescription, MapError> {
    if path.extension().and_then(|e| e.to_str()) != Some("tsx") {
        return Err(MapError::UnsupportedFormat(path.display().to_string()));
    }

    let mut loader = tiled::Loader::new();
    let tileset = loader.load_tsx_tileset(path).map_err(|err| MapError::Tsx {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let images = match &tileset.image {
        Some(sheet) => AtlasImages::Sheet(sheet.source.clone()),
        None => {
            let mut entries: Vec<TileImageRef> = tileset
                .tiles()
                .map(|(id, tile)| TileImageRef {
                    id,
                    image: tile.image.as_ref().map(|img| img.source.clone()),
                })
                .collect();
            // tile order out of `tiled` is unspecified
            entries.sort_by_key(|e| e.id);
            AtlasImages::PerTile(entries)
        }
    };

    let name = if tileset.name.is_empty() {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_owned()
    } else {
        tileset.name.clone()
    };

    debug!(path = %path.display(), name = %name, tiles = tileset.tilecount, "decoded tsx tileset");

    Ok(AtlasDescription {
        name,
        source: None,
        tile_width: tileset.tile_width,
        tile_height: tileset.tile_height,
        tile_count: tileset.tilecount,
        columns: (tileset.columns > 0).then_some(tileset.columns),
        images,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock went backwards")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("mq_level_tsx_{nanos}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    #[test]
    fn parses_sheet_tsx() {
        let dir = temp_dir();
        let path = dir.join("dungeon.tsx");
        fs::write(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" tiledversion="1.10.2" name="Dungeon" tilewidth="16" tileheight="16" tilecount="12" columns="4">
 <image source="dungeon.png" width="64" height="48"/>
</tileset>
"#,
        )
        .expect("write");

        let desc = decode_tsx_file(&path).expect("decode");
        assert_eq!(desc.name, "Dungeon");
        assert_eq!((desc.tile_width, desc.tile_height), (16, 16));
        assert_eq!(desc.tile_count, 12);
        assert_eq!(desc.columns, Some(4));
        assert_eq!(desc.images, AtlasImages::Sheet(dir.join("dungeon.png")));
    }

    #[test]
    fn parses_image_collection_tsx_sorted_by_id() {
        let dir = temp_dir();
        let path = dir.join("units.tsx");
        fs::write(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" tiledversion="1.10.2" name="Units" tilewidth="32" tileheight="32" tilecount="2" columns="0">
 <grid orientation="orthogonal" width="1" height="1"/>
 <tile id="3">
  <image source="knight.png" width="24" height="30"/>
 </tile>
 <tile id="0">
  <image source="sprites/archer.png" width="20" height="28"/>
 </tile>
</tileset>
"#,
        )
        .expect("write");

        let desc = decode_tsx_file(&path).expect("decode");
        assert_eq!(desc.columns, None);
        match desc.images {
            AtlasImages::PerTile(entries) => {
                let ids: Vec<u32> = entries.iter().map(|e| e.id).collect();
                assert_eq!(ids, vec![0, 3]);
                assert_eq!(entries[0].image, Some(dir.join("sprites/archer.png")));
                assert_eq!(entries[1].image, Some(dir.join("knight.png")));
            }
            other => panic!("expected per-tile images, got {:?}", other),
        }
    }

    #[test]
    fn broken_tsx_is_a_tsx_error() {
        let dir = temp_dir();
        let path = dir.join("bad.tsx");
        fs::write(&path, "<tileset name=\"half\"").expect("write");
        assert!(matches!(decode_tsx_file(&path), Err(MapError::Tsx { .. })));
        assert!(matches!(
            decode_tsx_file(&dir.join("missing.tsx")),
            Err(MapError::Tsx { .. })
        ));
    }

    #[test]
    fn rejects_non_tsx_paths() {
        let err = decode_tsx_file(Path::new("tiles/dungeon.json")).unwrap_err();
        assert!(matches!(err, MapError::UnsupportedFormat(_)));
    }
}
