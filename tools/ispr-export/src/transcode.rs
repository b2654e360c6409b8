//! ffmpeg invocation for audio and frame extraction
//!
//! Audio comes out as a raw big-endian 16-bit stream at the target clock;
//! video comes out as numbered BMP files scaled to the view, quantized to
//! RGB565 by ffmpeg when debanding is on.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use ispr_common::SampleRate;

use crate::config::ClipConfig;
use crate::error::{ExportError, ExportResult};

const FFMPEG: &str = "ffmpeg";

/// File name pattern for extracted frames
pub const FRAME_PATTERN: &str = "output_%05d.bmp";

const DEBAND_FILTER: &str = "deband=1thr=0.02:2thr=0.02:3thr=0.02:blur=1";

/// Handle to a located ffmpeg executable
#[derive(Debug, Clone)]
pub struct Transcoder {
    program: PathBuf,
}

impl Transcoder {
    /// Find ffmpeg on PATH
    pub fn locate() -> ExportResult<Self> {
        let program = which::which(FFMPEG)
            .map_err(|e| ExportError::upstream(FFMPEG, format!("not found on PATH ({e})")))?;
        tracing::debug!("Using {}", program.display());
        Ok(Self { program })
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Extract the cut's audio as raw s16be PCM into `output`
    pub fn extract_audio(&self, clip: &ClipConfig, output: &Path) -> ExportResult<()> {
        self.run(audio_args(clip, output))
    }

    /// Extract the cut's frames as BMP files into `dir`
    pub fn extract_frames(&self, clip: &ClipConfig, dir: &Path) -> ExportResult<()> {
        self.run(video_args(clip, dir))
    }

    fn run(&self, args: Vec<OsString>) -> ExportResult<()> {
        tracing::debug!("{} {:?}", self.program.display(), args);

        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .map_err(|e| ExportError::upstream(FFMPEG, format!("failed to start: {e}")))?;

        if !status.success() {
            return Err(ExportError::upstream(
                FFMPEG,
                format!(
                    "exit code {}",
                    status
                        .code()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                ),
            ));
        }
        Ok(())
    }
}

/// Audio filter chain: volume, plus a low-pass at the ADPCM clock
pub fn audio_filter(volume: f64, rate: SampleRate) -> String {
    let mut filter = format!("volume={volume}");
    if rate.is_adpcm() {
        filter.push_str(&format!(",lowpass=f={}", rate.hz()));
    }
    filter
}

pub fn audio_args(clip: &ClipConfig, output: &Path) -> Vec<OsString> {
    let rate = clip.options.freq;
    let mut args: Vec<OsString> = Vec::new();
    args.push("-y".into());
    args.push("-i".into());
    args.push(clip.source.clone().into());
    for arg in ["-f", "s16be", "-acodec", "pcm_s16be", "-filter:a"] {
        args.push(arg.into());
    }
    args.push(audio_filter(clip.volume, rate).into());
    args.push("-ar".into());
    args.push(rate.hz().to_string().into());
    args.push("-ac".into());
    args.push(rate.channels().to_string().into());
    args.push("-ss".into());
    args.push(clip.cut_offset.clone().into());
    args.push("-t".into());
    args.push(clip.cut_length.clone().into());
    args.push(output.into());
    args
}

/// Video filter graph: frame rate, scale, optional unsharp and deband
pub fn video_filter(clip: &ClipConfig) -> String {
    let mut filter = format!(
        "[0:v] fps={},scale={}:{}",
        clip.options.fps, clip.options.view_width, clip.options.view_height
    );
    if clip.sharpness > 0.0 {
        filter.push_str(&format!(",unsharp=3:3:{}:3:3:0", clip.sharpness));
    }
    if clip.deband {
        filter.push(',');
        filter.push_str(DEBAND_FILTER);
    }
    filter
}

pub fn video_args(clip: &ClipConfig, dir: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    args.push("-y".into());
    args.push("-i".into());
    args.push(clip.source.clone().into());
    args.push("-ss".into());
    args.push(clip.cut_offset.clone().into());
    args.push("-t".into());
    args.push(clip.cut_length.clone().into());
    args.push("-filter_complex".into());
    args.push(video_filter(clip).into());
    args.push("-vcodec".into());
    args.push("bmp".into());
    // Debanded output is quantized by ffmpeg so the dither survives packing
    if clip.deband {
        args.push("-pix_fmt".into());
        args.push("rgb565".into());
    }
    args.push(dir.join(FRAME_PATTERN).into());
    args
}
