// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Robobag CLI
//!
//! Records a synthetic ROS1 bag with a string, a temperature and an image
//! stream.
//!
//! ## Usage
//!
//! ```sh
//! # 100 messages per topic with default settings
//! robobag demo.bag
//!
//! # Small chunks and a larger frame
//! robobag demo.bag --count 500 --chunk-threshold 65536 --width 320 --height 240
//!
//! # Writer settings from a TOML file
//! robobag demo.bag --config writer.toml
//! ```
//!
//! Set `RUST_LOG=robobag=debug` to see connection and chunk events.

use std::path::PathBuf;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use robobag::encoding::{Image, Ros1Message, RosHeader, StringMsg, Temperature};
use robobag::{BagWriterBuilder, Time, WriterConfig};

/// Interval between two messages of the same topic
const PERIOD_NS: i64 = 100_000_000;

/// Robobag - write a synthetic ROS1 bag
#[derive(Parser, Clone, Debug)]
#[command(name = "robobag")]
#[command(about = "Record synthetic String, Temperature and Image streams into a ROS1 bag", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Output bag file
    output: PathBuf,

    /// Messages per topic
    #[arg(short = 'n', long, default_value_t = 100)]
    count: u32,

    /// Chunk flush threshold in bytes (overrides the config file)
    #[arg(long)]
    chunk_threshold: Option<usize>,

    /// Writer configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Image width in pixels
    #[arg(long, default_value_t = 64)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 48)]
    height: u32,
}

/// RGB gradient that shifts with the frame number.
fn gradient_frame(width: u32, height: u32, frame: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            data.push(((x + frame) % 256) as u8);
            data.push(((y + frame) % 256) as u8);
            data.push((frame % 256) as u8);
        }
    }
    data
}

fn header(seq: u32, timestamp: i64, frame_id: &str) -> Result<RosHeader> {
    Ok(RosHeader {
        seq,
        stamp: Time::from_nanos(timestamp)?,
        frame_id: frame_id.to_string(),
    })
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => WriterConfig::load(path)?,
        None => WriterConfig::default(),
    };
    if let Some(threshold) = cli.chunk_threshold {
        config.chunk_threshold = threshold;
    }

    let start = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the Unix epoch")?
        .as_nanos();
    let start = i64::try_from(start).context("system clock out of range")?;

    let mut writer = BagWriterBuilder::new()
        .config(config)
        .open(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;

    let chatter = writer.connection("/chatter", StringMsg::TYPE_NAME)?;
    let thermo = writer.connection("/temperature", Temperature::TYPE_NAME)?;
    let camera = writer.connection("/camera/image_raw", Image::TYPE_NAME)?;

    for seq in 0..cli.count {
        let timestamp = start + i64::from(seq) * PERIOD_NS;

        writer.write_message(&chatter, timestamp, &StringMsg::new(format!("hello {seq}")))?;

        let reading = Temperature {
            header: header(seq, timestamp, "thermo")?,
            temperature: 20.0 + f64::from(seq % 50) * 0.1,
            variance: 0.01,
        };
        writer.write_message(&thermo, timestamp, &reading)?;

        let frame = Image {
            header: header(seq, timestamp, "camera")?,
            height: cli.height,
            width: cli.width,
            encoding: "rgb8".to_string(),
            is_bigendian: 0,
            step: cli.width * 3,
            data: gradient_frame(cli.width, cli.height, seq),
        };
        writer.write_message(&camera, timestamp, &frame)?;
    }

    writer.close()?;

    println!(
        "Wrote {} ({} connections, {} chunks, {} messages)",
        cli.output.display(),
        writer.connections().len(),
        writer.chunk_count(),
        u64::from(cli.count) * 3
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
