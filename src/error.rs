use std::path::PathBuf;
use std::{error, fmt, io};

use serde_json::Error as SerdeError;

/// Error type for atlas and document loading.
#[derive(Debug)]
pub enum MapError {
    /// File could not be read or written
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
    /// A file was read but is not valid JSON for the expected shape
    Json {
        /// Offending path
        path: PathBuf,
        /// Underlying parse error
        source: SerdeError,
    },
    /// An in-memory document did not decode
    Decode(SerdeError),
    /// Image bytes could not be decoded
    Image {
        /// Offending path
        path: PathBuf,
        /// Decoder message
        message: String,
    },
    /// A TSX tileset file could not be parsed
    Tsx {
        /// Offending path
        path: PathBuf,
        /// Parser message
        message: String,
    },
    /// Atlas description is malformed (zero tile size, oversized cells, ...)
    InvalidAtlas {
        /// Atlas name
        name: String,
        /// What is wrong with it
        reason: String,
    },
    /// Loading one atlas of an ordered list failed
    AtlasLoad {
        /// Position of the atlas in the list
        index: usize,
        /// Atlas name or source id
        atlas: String,
        /// Why it failed
        source: Box<MapError>,
    },
    /// A layer's rows/columns do not match the document dimensions
    InvalidLayerSize {
        /// Layer name
        layer: String,
        /// Mismatch description
        reason: String,
    },
    /// Document has neither a `layers` map nor a legacy `grid`
    InvalidDocument(String),
    /// Unsupported file format
    UnsupportedFormat(String),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            MapError::Json { path, source } => {
                write!(f, "Failed to parse JSON in {}: {}", path.display(), source)
            }
            MapError::Decode(err) => write!(f, "Failed to decode document: {}", err),
            MapError::Image { path, message } => {
                write!(f, "Failed to decode image {}: {}", path.display(), message)
            }
            MapError::Tsx { path, message } => {
                write!(f, "Failed to parse tileset {}: {}", path.display(), message)
            }
            MapError::InvalidAtlas { name, reason } => {
                write!(f, "Invalid atlas '{}': {}", name, reason)
            }
            MapError::AtlasLoad {
                index,
                atlas,
                source,
            } => write!(f, "Failed to load atlas #{} '{}': {}", index, atlas, source),
            MapError::InvalidLayerSize { layer, reason } => {
                write!(f, "Invalid layer size for layer '{}': {}", layer, reason)
            }
            MapError::InvalidDocument(msg) => write!(f, "Invalid document: {}", msg),
            MapError::UnsupportedFormat(ext) => write!(f, "Unsupported file format: {}", ext),
        }
    }
}

impl From<SerdeError> for MapError {
    fn from(err: SerdeError) -> Self {
        MapError::Decode(err)
    }
}

impl error::Error for MapError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            MapError::Io { source, .. } => Some(source),
            MapError::Json { source, .. } => Some(source),
            MapError::Decode(err) => Some(err),
            MapError::AtlasLoad { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl MapError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MapError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: SerdeError) -> Self {
        MapError::Json {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_load_error_names_the_atlas_and_keeps_the_cause() {
        let err = MapError::AtlasLoad {
            index: 2,
            atlas: "dungeon".into(),
            source: Box::new(MapError::InvalidAtlas {
                name: "dungeon".into(),
                reason: "tile_width must be positive".into(),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("#2"));
        assert!(msg.contains("dungeon"));
        assert!(error::Error::source(&err).is_some());
    }
}
