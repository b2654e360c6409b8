//! ispr-export - ISPR clip builder
//!
//! Converts video clips into ISPR-V3.0 (ADPCM) / ISPR-V4.0 (PCM) containers
//! (.ISD, .ISM, .ISS)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ispr_common::{LevelGate, SampleRate, analyze};

use ispr_export::{ClipConfig, Manifest, OutputOptions, audio, inspect, pipeline};

#[derive(Parser)]
#[command(name = "ispr-export")]
#[command(about = "ISPR clip builder")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a container from a source video (requires ffmpeg)
    Build(ClipConfig),

    /// Build every clip listed in a manifest file
    Batch {
        /// Path to the clips manifest
        #[arg(default_value = "clips.toml")]
        manifest: PathBuf,
    },

    /// Mux pre-extracted audio and BMP frames into a container
    Mux {
        /// Audio input: WAV, or raw big-endian 16-bit PCM
        #[arg(short, long)]
        audio: PathBuf,

        /// Directory of BMP frames (sorted by file name)
        #[arg(short, long)]
        frames: PathBuf,

        /// Output container name (suffix added when missing)
        name: PathBuf,

        /// Sample rate of raw audio input (default: --freq)
        #[arg(long)]
        input_rate: Option<u32>,

        /// Channel count of raw audio input (default: 1 for ADPCM, 2 for PCM)
        #[arg(long)]
        input_channels: Option<u16>,

        #[command(flatten)]
        options: OutputOptions,
    },

    /// Report the peak and average level of an audio file
    Level {
        /// WAV, or raw big-endian 16-bit PCM
        input: PathBuf,

        /// Output rate the raw input is assumed to match (15625 = mono)
        #[arg(long, default_value_t = SampleRate::Adpcm15625)]
        freq: SampleRate,

        /// Sample rate of raw input, overriding --freq
        #[arg(long)]
        input_rate: Option<u32>,

        /// Channel count of raw input (default: 1 for 15625, 2 otherwise)
        #[arg(long)]
        input_channels: Option<u16>,

        /// Peak level limit in percent
        #[arg(long, default_value_t = 98.5)]
        peak_max: f64,

        /// Average level minimum in percent
        #[arg(long, default_value_t = 8.0)]
        avg_min: f64,
    },

    /// Print a container's header and record count
    Inspect {
        /// Container file (.ISD, .ISM, .ISS)
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build(clip) => {
            tracing::info!("Building {:?} from {:?}", clip.output, clip.source);
            let report = pipeline::build_clip(&clip)
                .with_context(|| format!("Failed to build {}", clip.source.display()))?;
            tracing::info!("Done! {:?} ({} frames)", report.output, report.summary.frames);
        }

        Commands::Batch { manifest } => {
            let manifest = Manifest::load(&manifest)?;
            if manifest.clips.is_empty() {
                anyhow::bail!("Manifest contains no [[clips]] entries");
            }

            // Validate everything before the first transcode
            for clip in &manifest.clips {
                clip.validate()
                    .with_context(|| format!("Invalid clip {}", clip.source.display()))?;
            }

            let total = manifest.clips.len();
            for (i, clip) in manifest.clips.iter().enumerate() {
                tracing::info!("Clip {}/{}: {:?}", i + 1, total, clip.source);
                let report = pipeline::build_clip(clip)
                    .with_context(|| format!("Failed to build {}", clip.source.display()))?;
                tracing::info!("Wrote {:?}", report.output);
            }
            tracing::info!("Batch complete!");
        }

        Commands::Mux {
            audio,
            frames,
            name,
            input_rate,
            input_channels,
            options,
        } => {
            let clip = audio::load_audio(&audio, options.freq, input_rate, input_channels)
                .with_context(|| format!("Failed to load audio {}", audio.display()))?;
            let report = pipeline::mux_inputs(&clip, &frames, &name, &options)?;
            tracing::info!(
                "Done! {:?} ({} frames, {} bytes)",
                report.output,
                report.summary.frames,
                report.summary.total_bytes
            );
        }

        Commands::Level {
            input,
            freq,
            input_rate,
            input_channels,
            peak_max,
            avg_min,
        } => {
            let clip = audio::load_audio(&input, freq, input_rate, input_channels)
                .with_context(|| format!("Failed to load audio {}", input.display()))?;
            let report = analyze(&clip.samples);
            println!(
                "{}: {} samples, {:.1} s",
                input.display(),
                report.samples,
                clip.duration_secs()
            );
            LevelGate::new(avg_min, peak_max).check(&report)?;
            println!("Level OK");
        }

        Commands::Inspect { input } => {
            let info = inspect::inspect_file(&input)?;
            println!("{}", info);
        }
    }

    Ok(())
}
