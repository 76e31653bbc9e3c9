//! Generator settings: a TOML file, defaults for everything it omits, and
//! command-line overrides on top.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use symforge_atlas::{LayoutConfig, RenderSettings};

use crate::cli::Args;

pub const DEFAULT_SIZE: u32 = 8192;

/// A font file and the face to use inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontRef {
    pub path: PathBuf,
    #[serde(default)]
    pub collection_index: u32,
}

impl FontRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            collection_index: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub tui: Option<FontRef>,
    pub cjk: Option<FontRef>,
    pub emoji: Option<FontRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub size: u32,
    pub output: PathBuf,
    pub inputs: PathBuf,
    pub fonts: FontConfig,
    pub render: RenderSettings,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            output: PathBuf::from("."),
            inputs: PathBuf::from("symbols"),
            fonts: FontConfig::default(),
            render: RenderSettings::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid generator config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config file (if any) with the flags applied on top.
    pub fn resolve(args: &Args) -> Result<Self> {
        let base = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(args))
    }

    pub fn with_overrides(mut self, args: &Args) -> Self {
        if let Some(size) = args.size {
            self.size = size;
        }
        if let Some(output) = &args.output {
            self.output = output.clone();
        }
        if let Some(inputs) = &args.inputs {
            self.inputs = inputs.clone();
        }
        if let Some(path) = &args.font {
            self.fonts.tui = Some(FontRef::new(path));
        }
        if let Some(path) = &args.cjk_font {
            self.fonts.cjk = Some(FontRef::new(path));
        }
        if let Some(path) = &args.emoji_font {
            self.fonts.emoji = Some(FontRef::new(path));
        }
        if let Some(spread) = args.pxrange {
            self.render = self.render.with_spread(spread);
        }
        if let Some(padding) = args.padding {
            self.render = self.render.with_text_padding(padding);
        }
        if args.tui_mode.is_some() || args.cjk_mode.is_some() {
            let tui = args.tui_mode.map_or(self.render.tui_mode, Into::into);
            let cjk = args.cjk_mode.map_or(self.render.cjk_mode, Into::into);
            self.render = self.render.with_modes(tui, cjk);
        }
        if let Some(filter) = args.field_filter {
            self.render = self.render.with_field_filter(filter.into());
        }
        self
    }

    /// Validate and freeze into the configuration the atlas crate runs on.
    pub fn layout_config(&self) -> Result<LayoutConfig> {
        LayoutConfig::from_pixels(self.size, self.render.clone()).context("invalid atlas settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{FilterArg, ModeArg};
    use symforge_atlas::{FieldFilter, RenderMode};

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = GeneratorConfig::from_toml(
            r#"
            size = 4096

            [fonts.cjk]
            path = "/fonts/cjk.ttc"
            collection_index = 2

            [render]
            spread = 6
            cjk_mode = "sdf_from_bitmap"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.size, 4096);
        assert_eq!(cfg.render.spread, 6);
        assert_eq!(cfg.render.cjk_mode, RenderMode::SdfFromBitmap);
        assert_eq!(cfg.render.text_padding, 0.92);
        assert_eq!(cfg.fonts.cjk.as_ref().map(|f| f.collection_index), Some(2));
        assert!(cfg.fonts.tui.is_none());
        assert_eq!(cfg.output, PathBuf::from("."));
    }

    #[test]
    fn flags_override_file_values() {
        let cfg = GeneratorConfig::from_toml("size = 4096\n[render]\nspread = 6\n").unwrap();
        let args = Args {
            size: Some(8192),
            pxrange: Some(3),
            font: Some(PathBuf::from("mono.ttf")),
            tui_mode: Some(ModeArg::Bitmap),
            field_filter: Some(FilterArg::Downsample),
            ..Args::default()
        };
        let cfg = cfg.with_overrides(&args);
        assert_eq!(cfg.size, 8192);
        assert_eq!(cfg.render.spread, 3);
        assert_eq!(cfg.render.tui_mode, RenderMode::BitmapOnly);
        assert_eq!(cfg.render.cjk_mode, RenderMode::VectorDistanceField);
        assert_eq!(cfg.render.field_filter, FieldFilter::Downsample);
        assert_eq!(cfg.fonts.tui, Some(FontRef::new("mono.ttf")));
    }

    #[test]
    fn unsupported_size_is_rejected() {
        let cfg = GeneratorConfig {
            size: 2048,
            ..GeneratorConfig::default()
        };
        let err = cfg.layout_config().unwrap_err();
        assert!(format!("{err:#}").contains("2048"));
    }

    #[test]
    fn mistyped_values_are_rejected() {
        assert!(GeneratorConfig::from_toml("size = \"big\"").is_err());
    }
}
