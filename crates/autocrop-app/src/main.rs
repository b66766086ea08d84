// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AutoCrop — command-line entry point.
//
// Exposes the classifier, the rectifier, and the scan session for desktop
// use: frames come from image files, guidance goes to stdout and the log.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use autocrop_core::AutoCropConfig;
use autocrop_core::error::{AutoCropError, Result};

#[derive(Parser, Debug)]
#[command(name = "autocrop", author, version, about = "Document framing guidance and perspective-corrected capture")]
struct Cli {
    /// Load tunables from a JSON configuration file.
    #[arg(long, global = true, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Use a named preset: default, variant-a, variant-b.
    #[arg(long, global = true)]
    preset: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a quadrilateral given as normalized corners
    Classify {
        /// Eight comma-separated coordinates: TLx,TLy,TRx,TRy,BLx,BLy,BRx,BRy
        /// (unit square, bottom-left origin).
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        corners: Vec<f32>,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rectify the document in an image file
    Rectify {
        /// Source image (JPEG, PNG, ...).
        input: PathBuf,
        /// Where to write the rectified image; the format follows the extension.
        #[arg(short, long)]
        output: PathBuf,
        /// Corners to crop; detected with the CPU detector when omitted.
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        corners: Option<Vec<f32>>,
    },

    /// Replay image files as camera frames through a scan session
    Session {
        /// Frames, in order.
        #[arg(required = true)]
        frames: Vec<PathBuf>,
        /// Request a capture just before this frame (1-based).
        #[arg(long, default_value_t = 1)]
        capture_at: usize,
        /// Where to write the captured image.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Fixed corners reported for every frame instead of CPU detection.
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        corners: Option<Vec<f32>>,
        /// Per-frame detection budget in milliseconds (default 10000).
        #[arg(long)]
        budget_ms: Option<u64>,
    },

    /// Print a configuration as JSON, or write it to a file
    Config {
        /// Write to this path instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "autocrop failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref(), cli.preset.as_deref())?;

    match cli.command {
        Command::Classify { corners, json } => commands::classify(&config, &corners, json),
        Command::Rectify {
            input,
            output,
            corners,
        } => commands::rectify(&config, &input, &output, corners.as_deref()),
        Command::Session {
            frames,
            capture_at,
            output,
            corners,
            budget_ms,
        } => {
            let options = commands::SessionOptions {
                frames,
                capture_at,
                output,
                corners,
                budget_ms,
            };
            commands::session(config, options).await
        }
        Command::Config { output } => commands::config(&config, output.as_deref()),
    }
}

/// Pick the configuration: an explicit file wins, then a preset, then the
/// defaults.
fn resolve_config(path: Option<&std::path::Path>, preset: Option<&str>) -> Result<AutoCropConfig> {
    if let Some(path) = path {
        return AutoCropConfig::load(path);
    }
    match preset {
        Some(name) => AutoCropConfig::preset(name)
            .ok_or_else(|| AutoCropError::Config(format!("unknown preset '{name}'"))),
        None => Ok(AutoCropConfig::default()),
    }
}
