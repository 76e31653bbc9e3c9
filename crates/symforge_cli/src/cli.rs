use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use symforge_atlas::{FieldFilter, RenderMode};

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Build the symbol atlas texture and its symbol map")]
pub struct Args {
    /// Atlas size in pixels (4096 or 8192).
    #[arg(long)]
    pub size: Option<u32>,
    /// Distance-field spread in atlas pixels.
    #[arg(long)]
    pub pxrange: Option<u32>,
    /// Fraction of the cell height used by text glyphs.
    #[arg(long)]
    pub padding: Option<f32>,
    /// Directory receiving symbols.png and symbol_map.json.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Directory holding the sprite sheets, tui.txt and the CJK list.
    #[arg(long)]
    pub inputs: Option<PathBuf>,
    /// TOML file with generator settings; flags override it.
    #[arg(long, short)]
    pub config: Option<PathBuf>,
    /// Font for the tui region.
    #[arg(long)]
    pub font: Option<PathBuf>,
    #[arg(long)]
    pub cjk_font: Option<PathBuf>,
    #[arg(long)]
    pub emoji_font: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub tui_mode: Option<ModeArg>,
    #[arg(long, value_enum)]
    pub cjk_mode: Option<ModeArg>,
    #[arg(long, value_enum)]
    pub field_filter: Option<FilterArg>,
    /// More log output (-v debug, -vv trace).
    #[arg(long, short, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Bitmap,
    Sdf,
    Vector,
}

impl From<ModeArg> for RenderMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Bitmap => RenderMode::BitmapOnly,
            ModeArg::Sdf => RenderMode::SdfFromBitmap,
            ModeArg::Vector => RenderMode::VectorDistanceField,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    Resize,
    Downsample,
}

impl From<FilterArg> for FieldFilter {
    fn from(filter: FilterArg) -> Self {
        match filter {
            FilterArg::Resize => FieldFilter::Resize,
            FilterArg::Downsample => FieldFilter::Downsample,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let args = Args::try_parse_from([
            "symforge",
            "--size",
            "4096",
            "--pxrange",
            "6",
            "--tui-mode",
            "sdf",
            "--field-filter",
            "downsample",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.size, Some(4096));
        assert_eq!(args.pxrange, Some(6));
        assert_eq!(args.tui_mode.map(RenderMode::from), Some(RenderMode::SdfFromBitmap));
        assert_eq!(args.field_filter, Some(FilterArg::Downsample));
        assert_eq!(args.verbose, 2);
        assert!(args.output.is_none());
    }

    #[test]
    fn rejects_unknown_modes() {
        assert!(Args::try_parse_from(["symforge", "--cjk-mode", "msdf"]).is_err());
    }
}
