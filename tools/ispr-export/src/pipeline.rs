//! End-to-end clip builds
//!
//! 1. Audio: extract, gate, encode
//! 2. Video: extract numbered frames
//! 3. Mux: pack frames and write the container
//!
//! The container is written to a temporary file next to the destination and
//! only moved into place once every frame has become a record.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use ispr_common::{ContainerMuxer, ContainerSettings, MuxSummary};
use tempfile::NamedTempFile;

use crate::audio::{self, AudioClip};
use crate::config::{ClipConfig, OutputOptions};
use crate::error::{ExportError, ExportResult};
use crate::raster::{self, PACK_BATCH};
use crate::transcode::Transcoder;

const WIP_PCM: &str = "_wip_pcm.dat";

/// Completed build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub output: PathBuf,
    pub summary: MuxSummary,
}

/// Run the full pipeline for one clip
pub fn build_clip(clip: &ClipConfig) -> ExportResult<BuildReport> {
    clip.validate()?;
    let output = clip.output_path();
    let transcoder = Transcoder::locate()?;

    let work = tempfile::tempdir().map_err(|e| ExportError::io(std::env::temp_dir(), e))?;
    let rate = clip.options.freq;

    tracing::info!("[STAGE 1] Extracting audio from {}", clip.source.display());
    let pcm_path = work.path().join(WIP_PCM);
    transcoder.extract_audio(clip, &pcm_path)?;
    let audio = audio::load_raw(&pcm_path, rate.hz(), rate.channels())?;
    let payload = audio::prepare_payload(&audio, rate, &clip.options.gate())?;
    tracing::info!("[STAGE 1] Completed ({:.1} s of audio)", audio.duration_secs());

    let frames_dir = if clip.preserve_frames {
        clip.frames_dir.clone()
    } else {
        work.path().join("frames")
    };
    tracing::info!("[STAGE 2] Extracting frames into {}", frames_dir.display());
    raster::prepare_frame_dir(&frames_dir)?;
    transcoder.extract_frames(clip, &frames_dir)?;
    tracing::info!("[STAGE 2] Completed");

    tracing::info!("[STAGE 3] Writing {}", output.display());
    let frames = raster::list_frames(&frames_dir)?;
    let summary = write_container(&output, clip.options.settings(), &payload.bytes, &frames)?;
    tracing::info!("[STAGE 3] Completed");

    Ok(BuildReport { output, summary })
}

/// Mux already extracted audio and frames, skipping the transcoder
pub fn mux_inputs(
    audio: &AudioClip,
    frames_dir: &Path,
    name: &Path,
    options: &OutputOptions,
) -> ExportResult<BuildReport> {
    options.validate()?;
    let output = options.output_path(name);

    let payload = audio::prepare_payload(audio, options.freq, &options.gate())?;
    let frames = raster::list_frames(frames_dir)?;
    let summary = write_container(&output, options.settings(), &payload.bytes, &frames)?;

    Ok(BuildReport { output, summary })
}

/// Pack `frames` in order and write the container to `output`.
///
/// Nothing appears at `output` unless the build completes.
pub fn write_container(
    output: &Path,
    settings: ContainerSettings,
    audio: &[u8],
    frames: &[PathBuf],
) -> ExportResult<MuxSummary> {
    if frames.is_empty() {
        return Err(ExportError::parameter("no frames to mux"));
    }
    settings.view.validate()?;

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| ExportError::io(dir, e))?;

    let view = settings.view;
    let aux_mode = settings.aux_mode;
    let summary = {
        let writer = BufWriter::new(temp.as_file_mut());
        let mut muxer = ContainerMuxer::new(writer, settings, audio)?;
        let timing = muxer.timing();
        tracing::debug!(
            "frame_voice_size={} frame_size={} padding={}",
            timing.voice_size,
            timing.frame_size,
            timing.padding(timing.voice_size)
        );

        for (batch_no, batch) in frames.chunks(PACK_BATCH).enumerate() {
            let first = batch_no * PACK_BATCH;
            for pixels in raster::pack_batch(batch, first, &view, aux_mode)? {
                muxer.push_packed(&pixels)?;
            }
            tracing::debug!("{} / {} frames", first + batch.len(), frames.len());
        }
        muxer.finish(frames.len())?
    };

    temp.persist(output)
        .map_err(|e| ExportError::io(output, e.error))?;

    tracing::info!(
        "{} frames, {} bytes ({} audio bytes unused)",
        summary.frames,
        summary.total_bytes,
        summary.audio_dropped
    );
    Ok(summary)
}
