//! Atlas loading: turns an [`AtlasDescription`] into an [`Atlas`] whose
//! `tiles` are indexed by local id.

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use macroquad::prelude::{Image, BLANK};
use tracing::debug;

use crate::error::MapError;
use crate::Gid;

const BYTES_PER_PIXEL: usize = 4;

/// Opaque tile image handle.
///
/// The core only builds these (slicing sheets, centering per-tile images);
/// hosts hand [`TileImage::image`] to their renderer.
#[derive(Clone)]
pub struct TileImage(Image);

impl TileImage {
    fn blank(width: u16, height: u16) -> Self {
        TileImage(Image::gen_image_color(width, height, BLANK))
    }

    /// Wrap an already decoded image.
    pub fn from_image(image: Image) -> Self {
        TileImage(image)
    }

    /// Underlying RGBA image.
    pub fn image(&self) -> &Image {
        &self.0
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.0.width as u32
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.0.height as u32
    }
}

impl fmt::Debug for TileImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileImage")
            .field("width", &self.0.width)
            .field("height", &self.0.height)
            .finish()
    }
}

/// One per-tile image entry of an atlas description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImageRef {
    /// Local tile id
    pub id: u32,
    /// Image file; `None` keeps the transparent placeholder
    pub image: Option<PathBuf>,
}

/// Where an atlas gets its pixels from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtlasImages {
    /// One spritesheet sliced into a regular grid
    Sheet(PathBuf),
    /// One image per declared tile id
    PerTile(Vec<TileImageRef>),
}

/// Input describing one atlas, as produced by the asset description layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasDescription {
    /// Display name
    pub name: String,
    /// Source identifier to persist in documents (usually the tileset file path)
    pub source: Option<String>,
    /// Cell width in pixels
    pub tile_width: u32,
    /// Cell height in pixels
    pub tile_height: u32,
    /// Declared tile count (sheet mode)
    pub tile_count: u32,
    /// Sheet columns; derived from the image width when absent or zero
    pub columns: Option<u32>,
    /// Pixel source
    pub images: AtlasImages,
}

/// A loaded tile atlas.
#[derive(Debug, Clone)]
pub struct Atlas {
    name: String,
    source: Option<String>,
    tile_width: u32,
    tile_height: u32,
    tile_count: u32,
    columns: u32,
    tiles: Vec<TileImage>,
    first_gid: Gid,
}

impl Atlas {
    /// Build an atlas from already prepared tile images. `first_gid` stays `1`
    /// until the atlas is placed in a registry.
    pub fn new(
        name: impl Into<String>,
        tile_width: u32,
        tile_height: u32,
        columns: u32,
        tiles: Vec<TileImage>,
    ) -> Self {
        Atlas {
            name: name.into(),
            source: None,
            tile_width,
            tile_height,
            tile_count: tiles.len() as u32,
            columns: columns.max(1),
            tiles,
            first_gid: 1,
        }
    }

    /// Attach the source identifier used in documents.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source identifier, if the atlas came from a file.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Cell width in pixels.
    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    /// Cell height in pixels.
    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Number of tiles.
    pub fn tile_count(&self) -> u32 {
        self.tile_count
    }

    /// Columns used for sheet math.
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// First global id owned by this atlas.
    pub fn first_gid(&self) -> Gid {
        self.first_gid
    }

    pub(crate) fn set_first_gid(&mut self, first_gid: Gid) {
        self.first_gid = first_gid;
    }

    /// `[first_gid, first_gid + tile_count)`.
    pub fn gid_range(&self) -> Range<Gid> {
        self.first_gid..self.first_gid + self.tile_count
    }

    /// Whether `gid` falls inside this atlas.
    #[inline]
    pub fn contains(&self, gid: Gid) -> bool {
        self.gid_range().contains(&gid)
    }

    /// Every local id, ascending.
    pub fn local_ids(&self) -> Range<u32> {
        0..self.tile_count
    }

    /// Tile image by local id.
    pub fn tile(&self, local_id: u32) -> Option<&TileImage> {
        self.tiles.get(local_id as usize)
    }

    /// All tile images, indexed by local id.
    pub fn tiles(&self) -> &[TileImage] {
        &self.tiles
    }
}

/// Load one atlas from its description.
pub fn load_atlas(desc: &AtlasDescription) -> Result<Atlas, MapError> {
    let (tw, th) = cell_size(desc)?;

    let (tiles, columns) = match &desc.images {
        AtlasImages::Sheet(path) => {
            let sheet = read_image(path)?;
            let columns = match desc.columns {
                Some(c) if c > 0 => c,
                _ => (sheet.width as u32 / desc.tile_width).max(1),
            };
            let tiles = slice_sheet(&sheet, tw, th, columns, desc.tile_count);
            (tiles, columns)
        }
        AtlasImages::PerTile(entries) => {
            let tiles = load_per_tile(entries, tw, th)?;
            let columns = (tiles.len() as u32).max(1);
            (tiles, columns)
        }
    };

    debug!(
        atlas = %desc.name,
        tiles = tiles.len(),
        columns,
        "loaded atlas"
    );

    let mut atlas = Atlas::new(desc.name.clone(), desc.tile_width, desc.tile_height, columns, tiles);
    atlas.source = desc.source.clone();
    Ok(atlas)
}

fn cell_size(desc: &AtlasDescription) -> Result<(u16, u16), MapError> {
    let invalid = |reason: &str| MapError::InvalidAtlas {
        name: desc.name.clone(),
        reason: reason.to_owned(),
    };
    if desc.tile_width == 0 || desc.tile_height == 0 {
        return Err(invalid("tile width and height must be positive"));
    }
    let tw = u16::try_from(desc.tile_width).map_err(|_| invalid("tile width exceeds 65535"))?;
    let th = u16::try_from(desc.tile_height).map_err(|_| invalid("tile height exceeds 65535"))?;
    Ok((tw, th))
}

fn read_image(path: &Path) -> Result<Image, MapError> {
    let bytes = std::fs::read(path).map_err(|source| MapError::io(path, source))?;
    Image::from_file_with_format(&bytes, None).map_err(|err| MapError::Image {
        path: path.to_path_buf(),
        message: format!("{err:?}"),
    })
}

/// Row-major slicing of `count` cells out of a sheet.
pub(crate) fn slice_sheet(sheet: &Image, tw: u16, th: u16, columns: u32, count: u32) -> Vec<TileImage> {
    let columns = columns.max(1);
    (0..count)
        .map(|idx| {
            let col = idx % columns;
            let row = idx / columns;
            let mut cell = TileImage::blank(tw, th);
            blit(
                &mut cell.0,
                sheet,
                (col as usize * tw as usize, row as usize * th as usize),
                (0, 0),
            );
            cell
        })
        .collect()
}

fn load_per_tile(entries: &[TileImageRef], tw: u16, th: u16) -> Result<Vec<TileImage>, MapError> {
    let Some(max_id) = entries.iter().map(|e| e.id).max() else {
        return Ok(Vec::new());
    };

    let mut tiles = vec![TileImage::blank(tw, th); max_id as usize + 1];
    for entry in entries {
        let Some(path) = &entry.image else {
            continue;
        };
        let image = read_image(path)?;
        tiles[entry.id as usize] = center_in_cell(&image, tw, th);
    }
    Ok(tiles)
}

/// Place `image` centered over a blank cell, clipping whatever overflows.
pub(crate) fn center_in_cell(image: &Image, tw: u16, th: u16) -> TileImage {
    let x = (tw as usize).saturating_sub(image.width as usize) / 2;
    let y = (th as usize).saturating_sub(image.height as usize) / 2;
    let mut cell = TileImage::blank(tw, th);
    blit(&mut cell.0, image, (0, 0), (x, y));
    cell
}

/// Copy as much of `src` starting at `src_origin` as fits into `dst` at
/// `dst_origin`. Pixels are copied verbatim.
fn blit(dst: &mut Image, src: &Image, src_origin: (usize, usize), dst_origin: (usize, usize)) {
    let (sx, sy) = src_origin;
    let (dx, dy) = dst_origin;
    let (src_w, src_h) = (src.width as usize, src.height as usize);
    let (dst_w, dst_h) = (dst.width as usize, dst.height as usize);
    if sx >= src_w || sy >= src_h || dx >= dst_w || dy >= dst_h {
        return;
    }

    let w = (src_w - sx).min(dst_w - dx);
    let h = (src_h - sy).min(dst_h - dy);
    for row in 0..h {
        let s = ((sy + row) * src_w + sx) * BYTES_PER_PIXEL;
        let d = ((dy + row) * dst_w + dx) * BYTES_PER_PIXEL;
        let len = w * BYTES_PER_PIXEL;
        dst.bytes[d..d + len].copy_from_slice(&src.bytes[s..s + len]);
    }
}
