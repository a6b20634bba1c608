mod core;
mod decoder;
mod error;
mod renderer;
mod shared;
mod sync;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::core::{PlaybackOptions, PlaybackSummary};
use crate::decoder::{FrameSource, StreamingSource};
use crate::renderer::TerminalDisplay;
use crate::shared::Config;

#[derive(Parser)]
#[command(author, version, about = "display images in the terminal.", long_about = None)]
struct Cli {
    /// file path to image.
    #[arg(value_name = "fp")]
    input: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Settings and logging (files only when debugging is on)
    let config = Config::load();
    crate::utils::logger::init(config.debug);

    // 2. Decode before the terminal is touched, so a bad file leaves the shell as it was
    let streaming = config.streaming
        && decoder::loader::detect_format(&cli.input)
            .with_context(|| format!("failed to open {}", cli.input.display()))?
            == image::ImageFormat::Gif;

    let summary = if streaming {
        let source = StreamingSource::open(&cli.input)
            .with_context(|| format!("failed to load {}", cli.input.display()))?;
        run(source, &config)?
    } else {
        let source = decoder::load(&cli.input)
            .with_context(|| format!("failed to load {}", cli.input.display()))?;
        run(source, &config)?
    };

    crate::utils::logger::info(&format!(
        "Exited after {} iteration(s), {} repaint(s)",
        summary.iterations, summary.repaints
    ));

    Ok(())
}

/// 3. Probe the terminal and hand both collaborators to the render loop
fn run<S: FrameSource>(source: S, config: &Config) -> Result<PlaybackSummary> {
    let display = TerminalDisplay::new(config.max_colors);
    let options = PlaybackOptions::from(config);
    let summary = crate::core::play(display, source, &options).context("playback failed")?;
    Ok(summary)
}
