use std::path::PathBuf;

use symforge_font::{FontError, PlacementError};
use thiserror::Error;

/// Errors that abort an atlas build. Per-glyph failures never surface here;
/// they are absorbed by the resolver and counted in the run report.
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("unsupported texture size {0}; expected 4096 or 8192")]
    UnsupportedTextureSize(u32),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("font '{name}' is unusable: {source}")]
    Font {
        name: String,
        #[source]
        source: FontError,
    },
    #[error("cannot place glyphs for region {region}: {source}")]
    Placement {
        region: String,
        #[source]
        source: PlacementError,
    },
    #[error("atlas geometry invariant violated: {0}")]
    Geometry(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image error on {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("symbol map serialization failed: {0}")]
    SymbolMap(#[from] serde_json::Error),
}

pub type Result<T, E = AtlasError> = std::result::Result<T, E>;
