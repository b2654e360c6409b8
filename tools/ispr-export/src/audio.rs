//! Audio loading and container payload preparation
//!
//! Input is either a raw big-endian 16-bit stream (what the transcoder emits)
//! or a 16-bit WAV file. The payload is the byte stream the muxer slices into
//! frame records:
//!
//! - 15625 Hz: down-mixed to mono, pulse-resampled, gated, ADPCM encoded
//! - other rates: gated and stored as interleaved big-endian stereo PCM

use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use ispr_adpcm::{ADPCM_SAMPLE_RATE, downmix_stereo, encode_pcm, resample};
use ispr_common::{LevelGate, LevelReport, SampleRate};

use crate::error::{ExportError, ExportResult};

/// Interleaved 16-bit samples with their clock and channel count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioClip {
    /// Number of sample frames (one sample per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate.max(1) as f64
    }
}

/// Parse a raw s16be byte stream; a trailing odd byte is ignored
pub fn parse_s16be(bytes: &[u8]) -> Vec<i16> {
    let len = bytes.len() / 2;
    let mut samples = vec![0i16; len];
    BigEndian::read_i16_into(&bytes[..len * 2], &mut samples);
    samples
}

/// Load a raw s16be file with a known clock and channel count
pub fn load_raw(path: &Path, sample_rate: u32, channels: u16) -> ExportResult<AudioClip> {
    let bytes = std::fs::read(path).map_err(|e| ExportError::io(path, e))?;
    Ok(AudioClip {
        samples: parse_s16be(&bytes),
        sample_rate,
        channels,
    })
}

/// Load a 16-bit integer WAV file
pub fn load_wav(path: &Path) -> ExportResult<AudioClip> {
    let wav_err = |source| ExportError::Wav {
        path: path.to_path_buf(),
        source,
    };

    let reader = hound::WavReader::open(path).map_err(wav_err)?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(ExportError::parameter(format!(
            "{} must be 16-bit integer PCM (got {}-bit {:?})",
            path.display(),
            spec.bits_per_sample,
            spec.sample_format
        )));
    }

    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(wav_err)?;

    Ok(AudioClip {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Load WAV by extension, anything else as raw s16be at the target's
/// natural clock and channel count unless overridden
pub fn load_audio(
    path: &Path,
    target: SampleRate,
    raw_rate: Option<u32>,
    raw_channels: Option<u16>,
) -> ExportResult<AudioClip> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));

    if is_wav {
        load_wav(path)
    } else {
        load_raw(
            path,
            raw_rate.unwrap_or(target.hz()),
            raw_channels.unwrap_or(target.channels()),
        )
    }
}

/// Gated payload ready for the muxer
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub level: LevelReport,
}

/// Convert a clip to the container payload for `target`, gating its level.
pub fn prepare_payload(
    clip: &AudioClip,
    target: SampleRate,
    gate: &LevelGate,
) -> ExportResult<AudioPayload> {
    if target.is_adpcm() {
        prepare_adpcm(clip, gate)
    } else {
        prepare_pcm(clip, target, gate)
    }
}

fn prepare_adpcm(clip: &AudioClip, gate: &LevelGate) -> ExportResult<AudioPayload> {
    let mono = match clip.channels {
        1 => clip.samples.clone(),
        2 => downmix_stereo(&clip.samples),
        n => {
            return Err(ExportError::parameter(format!(
                "ADPCM input must be mono or stereo, got {n} channels"
            )));
        }
    };

    if clip.sample_rate < ADPCM_SAMPLE_RATE {
        return Err(ExportError::parameter(format!(
            "input rate {} Hz is below the ADPCM clock {} Hz",
            clip.sample_rate, ADPCM_SAMPLE_RATE
        )));
    }
    let mono = resample(&mono, clip.sample_rate, ADPCM_SAMPLE_RATE);

    let level = gate.analyze_and_check(&mono)?;
    let bytes = encode_pcm(&mono);
    tracing::info!(
        "Encoded {} samples into {} ADPCM bytes",
        mono.len(),
        bytes.len()
    );
    Ok(AudioPayload { bytes, level })
}

fn prepare_pcm(clip: &AudioClip, target: SampleRate, gate: &LevelGate) -> ExportResult<AudioPayload> {
    if clip.channels != target.channels() || clip.sample_rate != target.hz() {
        return Err(ExportError::parameter(format!(
            "PCM input must be {}-channel {} Hz, got {}-channel {} Hz",
            target.channels(),
            target.hz(),
            clip.channels,
            clip.sample_rate
        )));
    }

    let level = gate.analyze_and_check(&clip.samples)?;
    let mut bytes = vec![0u8; clip.samples.len() * 2];
    BigEndian::write_i16_into(&clip.samples, &mut bytes);
    tracing::info!("Stored {} bytes of {} Hz PCM", bytes.len(), target.hz());
    Ok(AudioPayload { bytes, level })
}
