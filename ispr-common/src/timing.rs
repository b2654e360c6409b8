//! Frame timing: how many audio bytes each container frame carries
//!
//! The sound hardware runs from fixed clocks that rarely divide the frame rate
//! evenly. A calibration table, measured against real playback, overrides the
//! naive `bytes_per_second / fps` for specific (rate, fps) pairs. The constants
//! come from hardware clock beats and cannot be derived from a formula.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::IsprError;

/// Size of the fixed per-record addressing header
pub const RECORD_HEADER_SIZE: usize = 16;

/// Size of the audio chunk length prefix
pub const VOICE_LENGTH_SIZE: usize = 2;

/// Container block granularity
pub const BLOCK_SIZE: usize = 1024;

// =============================================================================
// Sample Rate
// =============================================================================

/// Supported audio clocks
///
/// 15625 Hz is stored as mono 4-bit ADPCM; every other rate is stored as raw
/// big-endian 16-bit stereo PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u32")]
pub enum SampleRate {
    Adpcm15625,
    Pcm22050,
    Pcm24000,
    Pcm32000,
    Pcm44100,
    Pcm48000,
}

impl SampleRate {
    pub const ALL: [SampleRate; 6] = [
        SampleRate::Adpcm15625,
        SampleRate::Pcm22050,
        SampleRate::Pcm24000,
        SampleRate::Pcm32000,
        SampleRate::Pcm44100,
        SampleRate::Pcm48000,
    ];

    /// Rate in Hz
    pub const fn hz(self) -> u32 {
        match self {
            SampleRate::Adpcm15625 => 15625,
            SampleRate::Pcm22050 => 22050,
            SampleRate::Pcm24000 => 24000,
            SampleRate::Pcm32000 => 32000,
            SampleRate::Pcm44100 => 44100,
            SampleRate::Pcm48000 => 48000,
        }
    }

    /// Whether this rate uses the ADPCM representation
    pub const fn is_adpcm(self) -> bool {
        matches!(self, SampleRate::Adpcm15625)
    }

    /// Channel count delivered by the transcoder for this rate
    pub const fn channels(self) -> u16 {
        if self.is_adpcm() { 1 } else { 2 }
    }

    /// Rate/type code stored in the container header
    pub const fn rate_type_code(self) -> u32 {
        match self {
            SampleRate::Adpcm15625 => 0x403,
            SampleRate::Pcm22050 => 0b0010_1111,
            SampleRate::Pcm24000 => 0b0011_1111,
            SampleRate::Pcm32000 => 0b1001_1111,
            SampleRate::Pcm44100 => 0b1010_1111,
            SampleRate::Pcm48000 => 0b1011_1111,
        }
    }

    /// Stored bytes per second as a fraction `(numerator, denominator)`
    ///
    /// ADPCM packs two mono samples per byte; PCM is 2 channels x 2 bytes.
    const fn bytes_per_second(self) -> (u64, u64) {
        if self.is_adpcm() {
            (self.hz() as u64, 2)
        } else {
            (self.hz() as u64 * 4, 1)
        }
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = IsprError;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        SampleRate::ALL
            .into_iter()
            .find(|rate| rate.hz() == hz)
            .ok_or_else(|| {
                IsprError::parameter(format!(
                    "unsupported sample rate {} (use 15625, 22050, 24000, 32000, 44100 or 48000)",
                    hz
                ))
            })
    }
}

impl FromStr for SampleRate {
    type Err = IsprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hz: u32 = s
            .trim()
            .parse()
            .map_err(|_| IsprError::parameter(format!("invalid sample rate: {}", s)))?;
        SampleRate::try_from(hz)
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hz())
    }
}

// =============================================================================
// Frame Rate
// =============================================================================

/// Supported frame rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "f64")]
pub enum FrameRate {
    Fps6,
    Fps10,
    Fps12,
    Fps15,
    Fps18,
    Fps20,
    Fps22,
    Fps24,
    Fps27_5,
    Fps30,
}

impl FrameRate {
    pub const ALL: [FrameRate; 10] = [
        FrameRate::Fps6,
        FrameRate::Fps10,
        FrameRate::Fps12,
        FrameRate::Fps15,
        FrameRate::Fps18,
        FrameRate::Fps20,
        FrameRate::Fps22,
        FrameRate::Fps24,
        FrameRate::Fps27_5,
        FrameRate::Fps30,
    ];

    /// Frames per second times two, exact for every supported rate
    pub const fn half_frames(self) -> u64 {
        match self {
            FrameRate::Fps6 => 12,
            FrameRate::Fps10 => 20,
            FrameRate::Fps12 => 24,
            FrameRate::Fps15 => 30,
            FrameRate::Fps18 => 36,
            FrameRate::Fps20 => 40,
            FrameRate::Fps22 => 44,
            FrameRate::Fps24 => 48,
            FrameRate::Fps27_5 => 55,
            FrameRate::Fps30 => 60,
        }
    }

    pub fn as_f64(self) -> f64 {
        self.half_frames() as f64 / 2.0
    }

    /// `floor(numerator / fps)` without floating point
    pub const fn divide(self, numerator: u64) -> u64 {
        numerator * 2 / self.half_frames()
    }

    /// The two frame-duration header fields, in 1/60 s vsync units.
    ///
    /// Rates that do not divide 60 alternate between two durations.
    pub const fn durations(self) -> (u32, u32) {
        match self {
            FrameRate::Fps22 | FrameRate::Fps24 | FrameRate::Fps27_5 => (2, 3),
            FrameRate::Fps18 => (3, 4),
            _ => {
                let d = self.divide(60) as u32;
                (d, d)
            }
        }
    }
}

impl TryFrom<f64> for FrameRate {
    type Error = IsprError;

    fn try_from(fps: f64) -> Result<Self, Self::Error> {
        FrameRate::ALL
            .into_iter()
            .find(|rate| rate.as_f64() == fps)
            .ok_or_else(|| {
                IsprError::parameter(format!(
                    "unsupported frame rate {} (use 6, 10, 12, 15, 18, 20, 22, 24, 27.5 or 30)",
                    fps
                ))
            })
    }
}

impl FromStr for FrameRate {
    type Err = IsprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fps: f64 = s
            .trim()
            .parse()
            .map_err(|_| IsprError::parameter(format!("invalid frame rate: {}", s)))?;
        FrameRate::try_from(fps)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

// =============================================================================
// Calibration
// =============================================================================

/// One calibrated (rate, fps) pair: `floor(numerator / fps) * multiplier`
struct Calibration {
    rate: SampleRate,
    fps: FrameRate,
    numerator: u64,
    multiplier: u64,
}

const fn cal(rate: SampleRate, fps: FrameRate, numerator: u64, multiplier: u64) -> Calibration {
    Calibration {
        rate,
        fps,
        numerator,
        multiplier,
    }
}

#[rustfmt::skip]
const CALIBRATION: &[Calibration] = {
    use FrameRate::*;
    use SampleRate::*;
    &[
    cal(Adpcm15625, Fps6, 7800, 1),
    cal(Adpcm15625, Fps10, 7800, 1),
    cal(Adpcm15625, Fps12, 7800, 1),
    cal(Adpcm15625, Fps15, 7800, 1),
    cal(Adpcm15625, Fps18, 7812, 1),
    cal(Adpcm15625, Fps20, 7800, 1),
    cal(Adpcm15625, Fps22, 7810, 1),
    cal(Adpcm15625, Fps24, 7800, 1),
    cal(Adpcm15625, Fps27_5, 7810, 1),
    cal(Adpcm15625, Fps30, 7800, 1),

    cal(Pcm22050, Fps22, 22044, 4),
    cal(Pcm22050, Fps27_5, 22055, 4),

    cal(Pcm24000, Fps18, 24012, 4),
    cal(Pcm24000, Fps22, 24002, 4),
    cal(Pcm24000, Fps27_5, 23980, 4),

    cal(Pcm32000, Fps6, 64008, 2),
    cal(Pcm32000, Fps12, 64008, 2),
    cal(Pcm32000, Fps18, 64008, 2),
    cal(Pcm32000, Fps24, 64008, 2),
    cal(Pcm32000, Fps15, 63990, 2),
    cal(Pcm32000, Fps30, 63990, 2),
    cal(Pcm32000, Fps22, 63998, 2),
    cal(Pcm32000, Fps27_5, 64020, 2),

    cal(Pcm44100, Fps22, 44110, 4),
    cal(Pcm44100, Fps27_5, 44110, 4),

    cal(Pcm48000, Fps18, 48006, 4),
    cal(Pcm48000, Fps22, 48004, 4),
    cal(Pcm48000, Fps27_5, 48015, 4),
    ]
};

/// Audio bytes owed to one frame period
///
/// Calibrated pairs use their table entry; everything else falls back to
/// `floor(bytes_per_second / fps)`.
pub fn frame_voice_size(rate: SampleRate, fps: FrameRate) -> usize {
    if let Some(c) = CALIBRATION.iter().find(|c| c.rate == rate && c.fps == fps) {
        return (fps.divide(c.numerator) * c.multiplier) as usize;
    }

    let (num, den) = rate.bytes_per_second();
    (num * 2 / (den * fps.half_frames())) as usize
}

/// Total record size: header, pixels, length prefix and audio, rounded up to 1 KiB
pub fn frame_size(pixel_bytes: usize, voice_size: usize) -> usize {
    (RECORD_HEADER_SIZE + pixel_bytes + VOICE_LENGTH_SIZE + voice_size).div_ceil(BLOCK_SIZE)
        * BLOCK_SIZE
}

/// Per-frame sizing constants for one build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    pub sample_rate: SampleRate,
    pub frame_rate: FrameRate,
    pub pixel_bytes: usize,
    pub voice_size: usize,
    pub frame_size: usize,
}

impl FrameTiming {
    pub fn new(sample_rate: SampleRate, frame_rate: FrameRate, pixel_bytes: usize) -> Self {
        let voice_size = frame_voice_size(sample_rate, frame_rate);
        let frame_size = frame_size(pixel_bytes, voice_size);
        tracing::debug!(
            "timing {} Hz @ {} fps: voice {} bytes, frame {} bytes",
            sample_rate,
            frame_rate,
            voice_size,
            frame_size
        );
        Self {
            sample_rate,
            frame_rate,
            pixel_bytes,
            voice_size,
            frame_size,
        }
    }

    /// Zero padding at the end of a record whose audio chunk is `chunk_len` bytes
    pub fn padding(&self, chunk_len: usize) -> usize {
        self.frame_size - RECORD_HEADER_SIZE - self.pixel_bytes - VOICE_LENGTH_SIZE - chunk_len
    }
}
