//! Container inspection

use std::fmt;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use ispr_common::packing::PACKED_PIXEL_SIZE;
use ispr_common::{AudioFormat, ContainerHeader, FrameRecordHeader, HEADER_SIZE};

use crate::error::{ExportError, ExportResult};

/// Header fields plus a structural check of the record area
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    pub header: ContainerHeader,
    pub records: usize,
    /// Bytes after the last whole record (0 for a well-formed file)
    pub trailing_bytes: usize,
    pub first_record: Option<FrameRecordHeader>,
    /// Audio length prefix of the first record
    pub voice_size: Option<u16>,
}

pub fn inspect_bytes(data: &[u8]) -> ExportResult<ContainerInfo> {
    let header = ContainerHeader::from_bytes(data)
        .ok_or_else(|| ExportError::parameter("not an ISPR container (bad magic)"))?;

    let frame_size = header.frame_size as usize;
    if frame_size == 0 {
        return Err(ExportError::parameter("container declares a zero frame size"));
    }

    let body = &data[HEADER_SIZE..];
    let first_record = FrameRecordHeader::from_bytes(body);
    let voice_size = first_record.and_then(|record| {
        let pixels = record.width as usize * record.height as usize * PACKED_PIXEL_SIZE;
        let at = FrameRecordHeader::SIZE + pixels;
        body.get(at..at + 2).map(BigEndian::read_u16)
    });

    Ok(ContainerInfo {
        records: body.len() / frame_size,
        trailing_bytes: body.len() % frame_size,
        first_record,
        voice_size,
        header,
    })
}

pub fn inspect_file(path: &Path) -> ExportResult<ContainerInfo> {
    let data = std::fs::read(path).map_err(|e| ExportError::io(path, e))?;
    inspect_bytes(&data)
}

impl fmt::Display for ContainerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = &self.header;
        let format = match h.audio_format {
            AudioFormat::Adpcm => "ISPR-V3.0 (ADPCM)",
            AudioFormat::Pcm => "ISPR-V4.0 (PCM)",
        };
        writeln!(f, "Format:      {format}")?;
        writeln!(f, "View:        {}x{}", h.view_width, h.view_height)?;
        writeln!(f, "Durations:   {}, {} (1/60 s)", h.durations.0, h.durations.1)?;
        writeln!(f, "Rate code:   0x{:X}", h.rate_type_code)?;
        writeln!(f, "Frame size:  {} bytes", h.frame_size)?;
        writeln!(f, "Comment:     {}", h.comment)?;
        if let Some(record) = &self.first_record {
            writeln!(f, "VRAM offset: 0x{:06X}", record.vram_address)?;
        }
        if let Some(voice) = self.voice_size {
            writeln!(f, "Voice size:  {voice} bytes per frame")?;
        }
        write!(f, "Records:     {}", self.records)?;
        if self.trailing_bytes > 0 {
            write!(f, " (+{} trailing bytes)", self.trailing_bytes)?;
        }
        Ok(())
    }
}
