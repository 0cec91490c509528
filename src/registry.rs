use std::path::Path;

use tracing::{debug, warn};

use crate::atlas::{load_atlas, Atlas, AtlasDescription, TileImage};
use crate::error::MapError;
use crate::loader::decode_tileset;
use crate::Gid;

/// Ordered atlases with contiguous global id ranges.
///
/// `atlas[i].first_gid == 1 + sum(tile_count of atlas[..i])`. Order is what
/// makes ids reproducible, so it is kept exactly as given. A registry is never
/// edited in place; loading a different atlas list builds a new one.
#[derive(Debug, Clone, Default)]
pub struct AtlasRegistry {
    atlases: Vec<Atlas>,
}

impl AtlasRegistry {
    /// Assign `first_gid`s to `atlases` in order.
    pub fn from_atlases(mut atlases: Vec<Atlas>) -> Self {
        let mut first_gid: Gid = 1;
        for atlas in &mut atlases {
            atlas.set_first_gid(first_gid);
            first_gid += atlas.tile_count();
        }
        debug!(atlases = atlases.len(), max_gid = first_gid - 1, "built atlas registry");
        AtlasRegistry { atlases }
    }

    /// Load every description in order, failing on the first atlas that does
    /// not load.
    pub fn load(descriptions: &[AtlasDescription]) -> Result<Self, MapError> {
        let mut atlases = Vec::with_capacity(descriptions.len());
        for (index, desc) in descriptions.iter().enumerate() {
            let atlas = load_atlas(desc).map_err(|source| MapError::AtlasLoad {
                index,
                atlas: desc.source.clone().unwrap_or_else(|| desc.name.clone()),
                source: Box::new(source),
            })?;
            atlases.push(atlas);
        }
        Ok(Self::from_atlases(atlases))
    }

    /// Load what can be loaded. Failed atlases are skipped (so later atlases
    /// shift down) and reported alongside the registry.
    pub fn load_partial(descriptions: &[AtlasDescription]) -> (Self, Vec<MapError>) {
        let mut atlases = Vec::with_capacity(descriptions.len());
        let mut failures = Vec::new();
        for (index, desc) in descriptions.iter().enumerate() {
            match load_atlas(desc) {
                Ok(atlas) => atlases.push(atlas),
                Err(source) => {
                    warn!(atlas = %desc.name, error = %source, "skipping atlas");
                    failures.push(MapError::AtlasLoad {
                        index,
                        atlas: desc.source.clone().unwrap_or_else(|| desc.name.clone()),
                        source: Box::new(source),
                    });
                }
            }
        }
        (Self::from_atlases(atlases), failures)
    }

    /// Load tileset files named by `sources`, resolved against `base_dir`.
    /// Each source id is kept on its atlas so [`AtlasRegistry::sources`]
    /// reproduces the list.
    pub fn load_files<S: AsRef<str>>(base_dir: &Path, sources: &[S]) -> Result<Self, MapError> {
        let descriptions = sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let source = source.as_ref();
                let mut desc = decode_tileset(&base_dir.join(source)).map_err(|err| {
                    MapError::AtlasLoad {
                        index,
                        atlas: source.to_owned(),
                        source: Box::new(err),
                    }
                })?;
                desc.source = Some(source.to_owned());
                Ok(desc)
            })
            .collect::<Result<Vec<_>, MapError>>()?;
        Self::load(&descriptions)
    }

    /// Find the atlas owning `gid` and the local id inside it.
    ///
    /// `None` for `0` and for dangling ids; displaying those is the host's call.
    #[inline]
    pub fn resolve(&self, gid: Gid) -> Option<(&Atlas, u32)> {
        if gid == 0 {
            return None;
        }
        // ranges are sorted and contiguous; first atlas whose range ends past gid
        let idx = self
            .atlases
            .partition_point(|a| a.first_gid() + a.tile_count() <= gid);
        let atlas = self.atlases.get(idx)?;
        atlas.contains(gid).then(|| (atlas, gid - atlas.first_gid()))
    }

    /// Image for `gid`, if it resolves.
    pub fn tile_image(&self, gid: Gid) -> Option<&TileImage> {
        self.resolve(gid)
            .and_then(|(atlas, local_id)| atlas.tile(local_id))
    }

    /// Atlases in gid order.
    pub fn atlases(&self) -> &[Atlas] {
        &self.atlases
    }

    /// Atlas by position.
    pub fn get(&self, index: usize) -> Option<&Atlas> {
        self.atlases.get(index)
    }

    /// Number of atlases.
    pub fn len(&self) -> usize {
        self.atlases.len()
    }

    /// True when no atlas is loaded.
    pub fn is_empty(&self) -> bool {
        self.atlases.is_empty()
    }

    /// Sum of all tile counts, which is also the largest valid gid.
    pub fn total_tiles(&self) -> u32 {
        self.atlases.iter().map(Atlas::tile_count).sum()
    }

    /// Source ids of atlases that have one, in gid order.
    pub fn sources(&self) -> Vec<String> {
        self.atlases
            .iter()
            .filter_map(|a| a.source().map(str::to_owned))
            .collect()
    }
}
