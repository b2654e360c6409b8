//! ISPR container muxer
//!
//! Writes the header, then one fixed-size record per raster. Audio is sliced
//! sequentially from a single payload: record `n` carries bytes
//! `n * voice_size .. (n + 1) * voice_size`, shortened (or empty) once the
//! payload runs out.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use crate::error::{IsprError, IsprResult};
use crate::formats::{AudioFormat, ContainerHeader, FrameRecordHeader, HEADER_SIZE, ViewGeometry};
use crate::packing::{AuxBitMode, RasterFrame, pack_raster};
use crate::timing::{FrameRate, FrameTiming, SampleRate};

/// Everything that determines the container layout
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSettings {
    pub view: ViewGeometry,
    pub sample_rate: SampleRate,
    pub frame_rate: FrameRate,
    pub aux_mode: AuxBitMode,
    pub comment: String,
}

impl ContainerSettings {
    pub fn timing(&self) -> FrameTiming {
        FrameTiming::new(self.sample_rate, self.frame_rate, self.view.pixel_bytes())
    }

    pub fn header(&self) -> ContainerHeader {
        let timing = self.timing();
        ContainerHeader {
            audio_format: AudioFormat::of(self.sample_rate),
            view_width: self.view.width,
            view_height: self.view.height,
            durations: self.frame_rate.durations(),
            rate_type_code: self.sample_rate.rate_type_code(),
            frame_size: timing.frame_size as u32,
            header_size: HEADER_SIZE as u32,
            comment: self.comment.clone(),
        }
    }
}

/// Result of a completed build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxSummary {
    pub frames: usize,
    pub frame_size: usize,
    pub total_bytes: usize,
    /// Audio bytes placed into records
    pub audio_bytes: usize,
    /// Audio bytes left over after the last record
    pub audio_dropped: usize,
}

/// Streaming container writer
pub struct ContainerMuxer<'a, W: Write> {
    writer: W,
    settings: ContainerSettings,
    timing: FrameTiming,
    record_header: [u8; FrameRecordHeader::SIZE],
    audio: &'a [u8],
    cursor: usize,
    frames_written: usize,
}

impl<'a, W: Write> ContainerMuxer<'a, W> {
    /// Validate the settings and write the container header.
    pub fn new(mut writer: W, settings: ContainerSettings, audio: &'a [u8]) -> IsprResult<Self> {
        settings.view.validate()?;

        let timing = settings.timing();
        if timing.voice_size > u16::MAX as usize {
            return Err(IsprError::parameter(format!(
                "audio chunk of {} bytes does not fit the 16-bit length field",
                timing.voice_size
            )));
        }

        writer.write_all(&settings.header().to_bytes())?;

        Ok(Self {
            writer,
            record_header: FrameRecordHeader::for_view(&settings.view).to_bytes(),
            settings,
            timing,
            audio,
            cursor: 0,
            frames_written: 0,
        })
    }

    pub fn timing(&self) -> &FrameTiming {
        &self.timing
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Pack a raster and append its record
    pub fn push_frame(&mut self, frame: &RasterFrame) -> IsprResult<()> {
        let pixels = pack_raster(
            frame,
            self.frames_written,
            &self.settings.view,
            self.settings.aux_mode,
        )?;
        self.write_record(&pixels)
    }

    /// Append a record from an already packed pixel buffer
    pub fn push_packed(&mut self, pixels: &[u8]) -> IsprResult<()> {
        if pixels.len() != self.timing.pixel_bytes {
            return Err(IsprError::parameter(format!(
                "packed frame {} is {} bytes, expected {}",
                self.frames_written,
                pixels.len(),
                self.timing.pixel_bytes
            )));
        }
        self.write_record(pixels)
    }

    fn write_record(&mut self, pixels: &[u8]) -> IsprResult<()> {
        let start = self.cursor.min(self.audio.len());
        let end = (self.cursor + self.timing.voice_size).min(self.audio.len());
        let chunk = &self.audio[start..end];

        self.writer.write_all(&self.record_header)?;
        self.writer.write_all(pixels)?;
        self.writer
            .write_u16::<BigEndian>(self.timing.voice_size as u16)?;
        self.writer.write_all(chunk)?;
        self.writer
            .write_all(&vec![0u8; self.timing.padding(chunk.len())])?;

        self.cursor += self.timing.voice_size;
        self.frames_written += 1;
        Ok(())
    }

    /// Flush and check that every expected raster became exactly one record.
    pub fn finish(mut self, expected_frames: usize) -> IsprResult<MuxSummary> {
        self.writer.flush()?;

        if self.frames_written != expected_frames {
            return Err(IsprError::IncompleteBuild {
                written: self.frames_written,
                expected: expected_frames,
            });
        }

        let audio_bytes = self.cursor.min(self.audio.len());
        let summary = MuxSummary {
            frames: self.frames_written,
            frame_size: self.timing.frame_size,
            total_bytes: HEADER_SIZE + self.frames_written * self.timing.frame_size,
            audio_bytes,
            audio_dropped: self.audio.len() - audio_bytes,
        };
        if summary.audio_dropped > 0 {
            tracing::debug!("{} trailing audio bytes not used", summary.audio_dropped);
        }
        Ok(summary)
    }
}

/// Build a complete container in memory
pub fn mux_to_vec(
    settings: ContainerSettings,
    frames: &[RasterFrame],
    audio: &[u8],
) -> IsprResult<Vec<u8>> {
    let mut output = Vec::new();
    let mut muxer = ContainerMuxer::new(&mut output, settings, audio)?;
    for frame in frames {
        muxer.push_frame(frame)?;
    }
    muxer.finish(frames.len())?;
    Ok(output)
}
