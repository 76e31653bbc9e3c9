use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading a font or reading its metrics.
///
/// Every variant is fatal for the region that uses the font: wrong metrics
/// would shift every glyph in the region the same way.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("font data is truncated or malformed: {0}")]
    Malformed(#[from] std::io::Error),
    #[error("required table '{0}' is missing")]
    MissingTable(String),
    #[error("unsupported font data: {0}")]
    Unsupported(String),
    #[error("collection index {index} is out of range ({count} fonts in file)")]
    CollectionIndex { index: u32, count: u32 },
    #[error("font reports unusable metrics: {0}")]
    InvalidMetrics(String),
    #[error("rasterizer rejected font {name}: {reason}")]
    Rasterizer { name: String, reason: String },
}
