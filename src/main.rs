use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

mod animation;
mod assets;
mod camera;
mod config;
mod demo;
mod engine;
mod frame_timing;
mod geometry;
mod input;
mod interaction;
mod labels;
mod overlay;
mod picking;
mod post_processing;
mod rendering;
mod scene_graph;
mod window;

/// Interactive holographic 3D scene.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Scene config file. Defaults to holoscene.toml in the working
    /// directory when present.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    let config =
        config::SceneConfig::load(cli.config.as_deref()).context("Failed to load scene config")?;

    pollster::block_on(window::run(config))?;

    Ok(())
}
