//! Clip build options and the batch manifest
//!
//! The same structures back the command line (clap) and `[[clips]]` tables in
//! a TOML manifest, so both share one set of defaults.
//!
//! ```toml
//! [[clips]]
//! source = "opening.mp4"
//! output = "OPENING"
//! fps = 27.5
//! freq = 44100
//! view_width = 256
//! view_height = 200
//! ```

use std::path::{Path, PathBuf};

use clap::Args;
use ispr_common::{
    AuxBitMode, ContainerSettings, FrameRate, LevelGate, PixelAspect, SampleRate, ViewGeometry,
};
use serde::Deserialize;

use crate::error::{ExportError, ExportResult};

/// Container extensions recognized on output names
pub const CONTAINER_EXTENSIONS: [&str; 3] = ["ISD", "ISM", "ISS"];

/// Upper bound of the unsharp amount
pub const MAX_SHARPNESS: f64 = 1.5;

pub const DEFAULT_COMMENT: &str = "build with ispr-export";

/// Container-level options shared by `build`, `mux` and manifest entries
#[derive(Debug, Clone, Args, Deserialize)]
pub struct OutputOptions {
    /// Frame rate (6, 10, 12, 15, 18, 20, 22, 24, 27.5, 30)
    #[arg(long, default_value_t = FrameRate::Fps15)]
    #[serde(default = "default_fps")]
    pub fps: FrameRate,

    /// View width in pixels (multiple of 8)
    #[arg(short = 'W', long, default_value_t = 216)]
    #[serde(default = "default_view_width")]
    pub view_width: u32,

    /// View height in pixels
    #[arg(short = 'H', long, default_value_t = 168)]
    #[serde(default = "default_view_height")]
    pub view_height: u32,

    /// Square pixel mode (384x256 screen)
    #[arg(long)]
    #[serde(default)]
    pub square: bool,

    /// Audio sample rate (15625 = ADPCM mono, others = 16-bit stereo PCM)
    #[arg(long, default_value_t = SampleRate::Adpcm15625)]
    #[serde(default = "default_freq")]
    pub freq: SampleRate,

    /// Set the auxiliary bit from green intensity instead of visibility
    #[arg(long)]
    #[serde(default)]
    pub intensity_bit: bool,

    /// Comment stored in the container header
    #[arg(long, default_value = DEFAULT_COMMENT)]
    #[serde(default = "default_comment")]
    pub comment: String,

    /// Peak level limit in percent
    #[arg(long, default_value_t = 98.5)]
    #[serde(default = "default_peak_max")]
    pub peak_max: f64,

    /// Average level minimum in percent
    #[arg(long, default_value_t = 8.0)]
    #[serde(default = "default_avg_min")]
    pub avg_min: f64,
}

fn default_fps() -> FrameRate {
    FrameRate::Fps15
}

fn default_view_width() -> u32 {
    216
}

fn default_view_height() -> u32 {
    168
}

fn default_freq() -> SampleRate {
    SampleRate::Adpcm15625
}

fn default_comment() -> String {
    DEFAULT_COMMENT.to_string()
}

fn default_peak_max() -> f64 {
    98.5
}

fn default_avg_min() -> f64 {
    8.0
}

impl OutputOptions {
    pub fn view(&self) -> ViewGeometry {
        let aspect = if self.square {
            PixelAspect::Square
        } else {
            PixelAspect::Wide
        };
        ViewGeometry::new(self.view_width, self.view_height, aspect)
    }

    pub fn aux_mode(&self) -> AuxBitMode {
        if self.intensity_bit {
            AuxBitMode::Intensity
        } else {
            AuxBitMode::Visible
        }
    }

    pub fn gate(&self) -> LevelGate {
        LevelGate::new(self.avg_min, self.peak_max)
    }

    pub fn settings(&self) -> ContainerSettings {
        ContainerSettings {
            view: self.view(),
            sample_rate: self.freq,
            frame_rate: self.fps,
            aux_mode: self.aux_mode(),
            comment: self.comment.clone(),
        }
    }

    /// Check geometry and level thresholds
    pub fn validate(&self) -> ExportResult<()> {
        self.view().validate()?;
        check_percent("peak_max", self.peak_max)?;
        check_percent("avg_min", self.avg_min)?;
        Ok(())
    }

    /// Apply the container suffix convention to an output name.
    ///
    /// Names already ending in `.ISD`, `.ISM` or `.ISS` (any case) are kept.
    /// Otherwise square mode appends `.ISS`, ADPCM appends `.ISD` and PCM
    /// appends `.ISM`.
    pub fn output_path(&self, name: &Path) -> PathBuf {
        let has_suffix = name
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                CONTAINER_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            });
        if has_suffix {
            return name.to_path_buf();
        }

        let suffix = if self.square {
            "ISS"
        } else if self.freq.is_adpcm() {
            "ISD"
        } else {
            "ISM"
        };
        let mut path = name.as_os_str().to_owned();
        path.push(".");
        path.push(suffix);
        PathBuf::from(path)
    }
}

fn check_percent(name: &str, value: f64) -> ExportResult<()> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ExportError::parameter(format!(
            "{name} {value} must be between 0 and 100"
        )));
    }
    Ok(())
}

/// One clip to build from a source video
#[derive(Debug, Clone, Args, Deserialize)]
pub struct ClipConfig {
    /// Source video file
    pub source: PathBuf,

    /// Output container name (suffix added when missing)
    pub output: PathBuf,

    #[command(flatten)]
    #[serde(flatten)]
    pub options: OutputOptions,

    /// Cut start (HH:MM:SS.mmm)
    #[arg(long, default_value = "00:00:00.000")]
    #[serde(default = "default_cut_offset")]
    pub cut_offset: String,

    /// Cut length (HH:MM:SS.mmm)
    #[arg(long, default_value = "01:00:00.000")]
    #[serde(default = "default_cut_length")]
    pub cut_length: String,

    /// Source volume multiplier
    #[arg(long, default_value_t = 1.0)]
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Apply a deband filter before quantizing
    #[arg(long)]
    #[serde(default)]
    pub deband: bool,

    /// Unsharp amount (0 disables, max 1.5)
    #[arg(long, default_value_t = 0.6)]
    #[serde(default = "default_sharpness")]
    pub sharpness: f64,

    /// Keep the extracted frames in `frames_dir` instead of a temp dir
    #[arg(long)]
    #[serde(default)]
    pub preserve_frames: bool,

    /// Directory for preserved frames
    #[arg(long, default_value = "output_bmp")]
    #[serde(default = "default_frames_dir")]
    pub frames_dir: PathBuf,
}

fn default_cut_offset() -> String {
    "00:00:00.000".to_string()
}

fn default_cut_length() -> String {
    "01:00:00.000".to_string()
}

fn default_volume() -> f64 {
    1.0
}

fn default_sharpness() -> f64 {
    0.6
}

fn default_frames_dir() -> PathBuf {
    PathBuf::from("output_bmp")
}

impl ClipConfig {
    /// Validate every parameter before any transcoding starts
    pub fn validate(&self) -> ExportResult<()> {
        self.options.validate()?;
        if !(0.0..=MAX_SHARPNESS).contains(&self.sharpness) {
            return Err(ExportError::parameter(format!(
                "sharpness {} must be between 0 and {}",
                self.sharpness, MAX_SHARPNESS
            )));
        }
        if !self.volume.is_finite() || self.volume <= 0.0 {
            return Err(ExportError::parameter(format!(
                "volume {} must be positive",
                self.volume
            )));
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.options.output_path(&self.output)
    }

    /// Resolve relative paths against a base directory
    pub fn resolve(mut self, base: &Path) -> Self {
        if self.source.is_relative() {
            self.source = base.join(&self.source);
        }
        if self.output.is_relative() {
            self.output = base.join(&self.output);
        }
        if self.frames_dir.is_relative() {
            self.frames_dir = base.join(&self.frames_dir);
        }
        self
    }
}

/// Batch manifest: a list of `[[clips]]` tables
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub clips: Vec<ClipConfig>,
}

impl Manifest {
    /// Load a manifest; clip paths are resolved against its directory
    pub fn load(path: &Path) -> ExportResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
        let manifest: Manifest = toml::from_str(&content).map_err(|source| ExportError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Manifest {
            clips: manifest
                .clips
                .into_iter()
                .map(|clip| clip.resolve(base))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_from_toml(toml_text: &str) -> ClipConfig {
        let manifest: Manifest = toml::from_str(toml_text).unwrap();
        manifest.clips.into_iter().next().unwrap()
    }

    #[test]
    fn test_manifest_defaults() {
        let clip = clip_from_toml(
            r#"
            [[clips]]
            source = "in.mp4"
            output = "OUT"
            "#,
        );
        assert_eq!(clip.options.fps, FrameRate::Fps15);
        assert_eq!(clip.options.view_width, 216);
        assert_eq!(clip.options.view_height, 168);
        assert_eq!(clip.options.freq, SampleRate::Adpcm15625);
        assert_eq!(clip.options.peak_max, 98.5);
        assert_eq!(clip.options.avg_min, 8.0);
        assert_eq!(clip.options.comment, DEFAULT_COMMENT);
        assert_eq!(clip.cut_offset, "00:00:00.000");
        assert_eq!(clip.cut_length, "01:00:00.000");
        assert_eq!(clip.volume, 1.0);
        assert_eq!(clip.sharpness, 0.6);
        assert!(!clip.deband);
        assert!(clip.validate().is_ok());
    }

    #[test]
    fn test_manifest_overrides() {
        let clip = clip_from_toml(
            r#"
            [[clips]]
            source = "in.mp4"
            output = "OUT"
            fps = 27.5
            freq = 44100
            square = true
            view_width = 384
            view_height = 216
            intensity_bit = true
            "#,
        );
        assert_eq!(clip.options.fps, FrameRate::Fps27_5);
        assert_eq!(clip.options.freq, SampleRate::Pcm44100);
        assert_eq!(clip.options.aux_mode(), AuxBitMode::Intensity);
        assert_eq!(clip.options.view().aspect, PixelAspect::Square);
        assert!(clip.validate().is_ok());
    }

    #[test]
    fn test_manifest_rejects_unknown_rates() {
        let result: Result<Manifest, _> = toml::from_str(
            r#"
            [[clips]]
            source = "in.mp4"
            output = "OUT"
            freq = 16000
            "#,
        );
        assert!(result.is_err());

        let result: Result<Manifest, _> = toml::from_str(
            r#"
            [[clips]]
            source = "in.mp4"
            output = "OUT"
            fps = 25
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let base = clip_from_toml(
            r#"
            [[clips]]
            source = "in.mp4"
            output = "OUT"
            "#,
        );

        let mut clip = base.clone();
        clip.options.view_width = 220;
        assert!(clip.validate().is_err());

        let mut clip = base.clone();
        clip.sharpness = 1.6;
        assert!(clip.validate().is_err());

        let mut clip = base.clone();
        clip.options.peak_max = 101.0;
        assert!(clip.validate().is_err());

        let mut clip = base.clone();
        clip.options.avg_min = -1.0;
        assert!(clip.validate().is_err());

        let mut clip = base;
        clip.volume = 0.0;
        assert!(clip.validate().is_err());
    }

    #[test]
    fn test_output_suffix() {
        let mut clip = clip_from_toml(
            r#"
            [[clips]]
            source = "in.mp4"
            output = "movie"
            "#,
        );
        assert_eq!(clip.output_path(), PathBuf::from("movie.ISD"));

        clip.options.freq = SampleRate::Pcm32000;
        assert_eq!(clip.output_path(), PathBuf::from("movie.ISM"));

        clip.options.square = true;
        assert_eq!(clip.output_path(), PathBuf::from("movie.ISS"));

        clip.output = PathBuf::from("movie.isd");
        assert_eq!(clip.output_path(), PathBuf::from("movie.isd"));

        clip.output = PathBuf::from("movie.v1");
        assert_eq!(clip.output_path(), PathBuf::from("movie.v1.ISS"));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clips.toml");
        std::fs::write(
            &path,
            "[[clips]]\nsource = \"a.mp4\"\noutput = \"A\"\n\n[[clips]]\nsource = \"/abs/b.mp4\"\noutput = \"B\"\n",
        )
        .unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.clips.len(), 2);
        assert_eq!(manifest.clips[0].source, dir.path().join("a.mp4"));
        assert_eq!(manifest.clips[1].source, PathBuf::from("/abs/b.mp4"));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[[clips]]\nsource = 3\n").unwrap();
        assert!(matches!(
            Manifest::load(&path),
            Err(ExportError::Manifest { .. })
        ));
    }
}
