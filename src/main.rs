// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use device_preview::backends::gst::GstMediaDevices;
use device_preview::backends::synthetic::SyntheticMediaDevices;
use device_preview::backends::{BackendKind, MediaDevices};
use device_preview::config::Config;

mod cli;

#[derive(Parser)]
#[command(name = "device-preview")]
#[command(about = "Pick an audio/video input and preview the capture")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Media backend providing devices and streams
    #[arg(long, global = true, value_enum, default_value_t = BackendKind::GStreamer)]
    backend: BackendKind,

    /// Frames buffered between the capture thread and the UI
    #[arg(long, global = true)]
    frame_capacity: Option<usize>,

    /// Number of microphone/camera pairs the synthetic backend reports
    #[arg(long, global = true)]
    synthetic_devices: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available devices
    List {
        /// Print the device list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Confirm a device pair without the interactive selector and count frames
    Probe {
        /// Audio input id (from 'device-preview list')
        #[arg(short, long)]
        audio: Option<String>,

        /// Video input id (from 'device-preview list')
        #[arg(short, long)]
        video: Option<String>,

        /// Preview duration in seconds
        #[arg(short, long, default_value = "3")]
        duration: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=device_preview=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let mut config = Config {
        backend: cli.backend,
        ..Config::default()
    };
    if let Some(capacity) = cli.frame_capacity {
        config.frame_channel_capacity = capacity;
    }
    if let Some(count) = cli.synthetic_devices {
        config.synthetic_devices = count;
    }
    config.validate()?;

    match config.backend {
        BackendKind::GStreamer => {
            let backend = GstMediaDevices::new(config.frame_channel_capacity)?;
            dispatch(backend, cli.command, &config)
        }
        BackendKind::Synthetic => {
            let backend = SyntheticMediaDevices::new(config.synthetic_devices);
            dispatch(backend, cli.command, &config)
        }
    }
}

fn dispatch<B: MediaDevices>(
    backend: B,
    command: Option<Commands>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Some(Commands::List { json }) => cli::list_devices(&backend, json)?,
        Some(Commands::Probe {
            audio,
            video,
            duration,
        }) => cli::probe(backend, audio, video, duration, config.ui_poll_interval())?,
        None => device_preview::terminal::run(backend, config)?,
    }
    Ok(())
}
