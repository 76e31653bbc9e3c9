//! Font-side building blocks for the symforge atlas generator: TrueType
//! parsing, normalized metrics, outline distance fields, the bitmap
//! rasterizer seam and glyph placement.

pub mod binary_reader;
pub mod error;
pub mod font;
pub mod library;
pub mod metrics;
pub mod outline;
pub mod parser;
pub mod placement;
pub mod raster;
pub mod tables;
pub mod vector_field;

#[cfg(any(test, feature = "test-support"))]
pub mod synth;

pub use error::FontError;
pub use font::VectorFont;
pub use library::{FontKey, FontLibrary};
pub use metrics::FontMetrics;
pub use outline::{GlyphCommand, GlyphOutline};
pub use parser::FontParser;
pub use placement::{BitmapPlacement, PlacementError, PlacementParams};
pub use raster::{Coverage, FontdueRasterizer, InkBounds, LineMetrics, Rasterizer};
pub use vector_field::generate_field;
