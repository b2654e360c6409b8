//! ISPR container header (1024 bytes)
//!
//! # Layout
//! ```text
//! 0x00: magic + version, NUL terminated (10 bytes)
//! 0x0A: view width u32 BE
//! 0x0E: view height u32 BE
//! 0x12: frame duration 0 u32 BE (1/60 s units)
//! 0x16: frame duration 1 u32 BE
//! 0x1A: PCM rate/type code u32 BE
//! 0x1E: frame size u32 BE
//! 0x22: header size u32 BE (always 1024)
//! 0x26: "CM" + comment + NUL
//! ....: zero padding to 1024
//! ```

use byteorder::{BigEndian, ByteOrder};
use encoding_rs::SHIFT_JIS;

use crate::timing::SampleRate;

/// Total header size
pub const HEADER_SIZE: usize = 1024;

/// Magic for ADPCM (15.625 kHz mono) clips
pub const MAGIC_ADPCM: &[u8; 10] = b"ISPR-V3.0\0";

/// Magic for raw 16-bit stereo PCM clips
pub const MAGIC_PCM: &[u8; 10] = b"ISPR-V4.0\0";

/// Offset of the comment sub-record
pub const COMMENT_OFFSET: usize = 38;

/// Comment sub-record tag
pub const COMMENT_TAG: &[u8; 2] = b"CM";

/// Longest comment text that fits with its tag and terminator
pub const MAX_COMMENT_LEN: usize = HEADER_SIZE - COMMENT_OFFSET - COMMENT_TAG.len() - 1;

/// Audio representation declared by the magic string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Adpcm,
    Pcm,
}

impl AudioFormat {
    pub fn of(rate: SampleRate) -> Self {
        if rate.is_adpcm() {
            AudioFormat::Adpcm
        } else {
            AudioFormat::Pcm
        }
    }

    pub fn magic(self) -> &'static [u8; 10] {
        match self {
            AudioFormat::Adpcm => MAGIC_ADPCM,
            AudioFormat::Pcm => MAGIC_PCM,
        }
    }
}

/// Parsed or to-be-written container header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub audio_format: AudioFormat,
    pub view_width: u32,
    pub view_height: u32,
    pub durations: (u32, u32),
    pub rate_type_code: u32,
    pub frame_size: u32,
    pub header_size: u32,
    pub comment: String,
}

impl ContainerHeader {
    pub const SIZE: usize = HEADER_SIZE;

    /// Write header to bytes
    ///
    /// The comment is stored as Shift_JIS; characters with no mapping are
    /// dropped and the text is truncated to [`MAX_COMMENT_LEN`] bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..10].copy_from_slice(self.audio_format.magic());
        BigEndian::write_u32(&mut bytes[10..14], self.view_width);
        BigEndian::write_u32(&mut bytes[14..18], self.view_height);
        BigEndian::write_u32(&mut bytes[18..22], self.durations.0);
        BigEndian::write_u32(&mut bytes[22..26], self.durations.1);
        BigEndian::write_u32(&mut bytes[26..30], self.rate_type_code);
        BigEndian::write_u32(&mut bytes[30..34], self.frame_size);
        BigEndian::write_u32(&mut bytes[34..38], self.header_size);

        let comment = encode_comment(&self.comment);
        let start = COMMENT_OFFSET + COMMENT_TAG.len();
        bytes[COMMENT_OFFSET..start].copy_from_slice(COMMENT_TAG);
        bytes[start..start + comment.len()].copy_from_slice(&comment);
        // Terminator and padding are already zero
        bytes
    }

    /// Read header from bytes
    ///
    /// Returns `None` if the slice is too short or the magic is unknown.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }

        let audio_format = match &bytes[0..10] {
            m if m == MAGIC_ADPCM => AudioFormat::Adpcm,
            m if m == MAGIC_PCM => AudioFormat::Pcm,
            _ => return None,
        };

        let comment = if &bytes[COMMENT_OFFSET..COMMENT_OFFSET + 2] == COMMENT_TAG {
            let text = &bytes[COMMENT_OFFSET + 2..Self::SIZE];
            let end = text.iter().position(|&b| b == 0).unwrap_or(text.len());
            SHIFT_JIS
                .decode_without_bom_handling(&text[..end])
                .0
                .into_owned()
        } else {
            String::new()
        };

        Some(Self {
            audio_format,
            view_width: BigEndian::read_u32(&bytes[10..14]),
            view_height: BigEndian::read_u32(&bytes[14..18]),
            durations: (
                BigEndian::read_u32(&bytes[18..22]),
                BigEndian::read_u32(&bytes[22..26]),
            ),
            rate_type_code: BigEndian::read_u32(&bytes[26..30]),
            frame_size: BigEndian::read_u32(&bytes[30..34]),
            header_size: BigEndian::read_u32(&bytes[34..38]),
            comment,
        })
    }
}

/// Comment text as stored: Shift_JIS (CP932), unmappable characters and
/// NULs dropped, truncated on a character boundary to fit
fn encode_comment(comment: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(comment.len().min(MAX_COMMENT_LEN));
    let mut buf = [0u8; 4];
    for c in comment.chars().filter(|&c| c != '\0') {
        let (encoded, _, unmappable) = SHIFT_JIS.encode(c.encode_utf8(&mut buf));
        if unmappable {
            continue;
        }
        if out.len() + encoded.len() > MAX_COMMENT_LEN {
            break;
        }
        out.extend_from_slice(&encoded);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> ContainerHeader {
        ContainerHeader {
            audio_format: AudioFormat::Adpcm,
            view_width: 216,
            view_height: 168,
            durations: (4, 4),
            rate_type_code: 0x403,
            frame_size: 73 * 1024,
            header_size: HEADER_SIZE as u32,
            comment: "build with ispr-export".to_string(),
        }
    }

    #[test]
    fn test_header_layout() {
        let bytes = sample_header().to_bytes();
        assert_eq!(&bytes[0..10], b"ISPR-V3.0\0");
        assert_eq!(&bytes[10..14], &[0, 0, 0, 216]);
        assert_eq!(&bytes[14..18], &[0, 0, 0, 168]);
        assert_eq!(&bytes[26..30], &[0, 0, 0x04, 0x03]);
        assert_eq!(&bytes[34..38], &[0, 0, 0x04, 0x00]);
        assert_eq!(&bytes[38..40], b"CM");
        assert_eq!(&bytes[40..62], b"build with ispr-export");
        assert!(bytes[62..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample_header();
        let parsed = ContainerHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_pcm_magic() {
        let mut header = sample_header();
        header.audio_format = AudioFormat::of(SampleRate::Pcm44100);
        assert_eq!(&header.to_bytes()[0..10], b"ISPR-V4.0\0");
    }

    #[test]
    fn test_comment_truncated_and_terminated() {
        let mut header = sample_header();
        header.comment = "x".repeat(2000);
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(bytes[HEADER_SIZE - 1], 0);
        assert_eq!(bytes[HEADER_SIZE - 2], b'x');

        let parsed = ContainerHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.comment.len(), MAX_COMMENT_LEN);
    }

    #[test]
    fn test_comment_shift_jis() {
        let mut header = sample_header();
        header.comment = "テスト clip".to_string();
        let bytes = header.to_bytes();
        assert_eq!(
            &bytes[38..51],
            &[
                b'C', b'M', 0x83, 0x65, 0x83, 0x58, 0x83, 0x67, b' ', b'c', b'l', b'i', b'p'
            ]
        );
        assert_eq!(bytes[51], 0);

        let parsed = ContainerHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.comment, "テスト clip");
    }

    #[test]
    fn test_comment_drops_unmappable() {
        let mut header = sample_header();
        header.comment = "clip\u{1F3AC}\0tail".to_string();
        let parsed = ContainerHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed.comment, "cliptail");
    }

    #[test]
    fn test_comment_truncates_on_char_boundary() {
        let mut header = sample_header();
        // 2 + 2n never lands exactly on 983
        header.comment = format!("xx{}", "あ".repeat(600));
        let bytes = header.to_bytes();
        let text = &bytes[COMMENT_OFFSET + 2..];
        let len = text.iter().position(|&b| b == 0).unwrap();
        assert_eq!(len, MAX_COMMENT_LEN - 1);

        let parsed = ContainerHeader::from_bytes(&bytes).unwrap();
        assert!(parsed.comment.starts_with("xxあ"));
        assert!(!parsed.comment.contains('\u{FFFD}'));
    }

    #[test]
    fn test_from_bytes_rejects_bad_input() {
        assert!(ContainerHeader::from_bytes(&[0u8; 100]).is_none());
        assert!(ContainerHeader::from_bytes(&[0u8; HEADER_SIZE]).is_none());
    }
}
