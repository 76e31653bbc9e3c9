mod cli;
mod config;
mod fonts;
mod inputs;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use symforge_atlas::{AtlasComposer, GlyphSourceResolver};
use symforge_font::FontLibrary;

use crate::cli::Args;
use crate::config::GeneratorConfig;

fn run(args: &Args) -> Result<()> {
    let generator = GeneratorConfig::resolve(args)?;
    let layout = generator.layout_config()?;
    info!(
        "atlas {}px (scale {}x), pxrange {}, text padding {}",
        layout.size().pixels(),
        layout.size().scale(),
        layout.render.spread,
        layout.render.text_padding
    );

    let inputs = inputs::load(&generator.inputs)
        .with_context(|| format!("loading inputs from {}", generator.inputs.display()))?;

    let library = FontLibrary::new();
    let fonts = fonts::discover(&library, &generator.fonts)?;
    let resolver = GlyphSourceResolver::new(&layout, fonts).context("preparing glyph sources")?;
    let composer = AtlasComposer::new(layout, resolver);

    let output = composer.compose(inputs).context("composing atlas")?;
    let (png, json) = output
        .save(&generator.output)
        .with_context(|| format!("writing outputs to {}", generator.output.display()))?;
    let total = output.report.total();
    info!(
        "done: {} filled slots ({} blank), {} empty slots",
        total.rendered(),
        total.blank,
        total.empty_slots
    );
    info!("wrote {} and {}", png.display(), json.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose).context("initialising logging")?;
    run(&args)
}
