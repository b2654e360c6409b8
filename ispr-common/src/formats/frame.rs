//! Frame record addressing header and view placement
//!
//! # Record layout
//! ```text
//! 0x00: VRAM target address u32 BE
//! 0x04: view width u16 BE
//! 0x06: view height u16 BE
//! 0x08: row stride delta u32 BE (always 1024)
//! 0x0C: copy count u32 BE (reserved, 0)
//! 0x10: packed pixels (width * height * 2)
//! ....: audio chunk length u16 BE
//! ....: audio chunk
//! ....: zero padding to frame_size
//! ```

use byteorder::{BigEndian, ByteOrder};

use crate::error::{IsprError, IsprResult};
use crate::packing::PACKED_PIXEL_SIZE;

/// Graphics VRAM base address
pub const GVRAM_BASE: u32 = 0xC0_0000;

/// Bytes between two VRAM rows (512 pixels x 2 bytes)
pub const GVRAM_ROW_BYTES: u32 = 512 * 2;

/// Virtual screen height in rows
pub const SCREEN_HEIGHT: u32 = 256;

/// Narrowest supported view
pub const MIN_VIEW_WIDTH: u32 = 128;

/// Horizontal pixel aspect of the display mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PixelAspect {
    /// 256 x 256 screen stretched to 4:3
    #[default]
    Wide,
    /// 384 x 256 screen with square pixels
    Square,
}

impl PixelAspect {
    pub const fn screen_width(self) -> u32 {
        match self {
            PixelAspect::Wide => 256,
            PixelAspect::Square => 384,
        }
    }
}

/// Declared view size and its placement on the virtual screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewGeometry {
    pub width: u32,
    pub height: u32,
    pub aspect: PixelAspect,
}

impl ViewGeometry {
    pub fn new(width: u32, height: u32, aspect: PixelAspect) -> Self {
        Self {
            width,
            height,
            aspect,
        }
    }

    /// Check the view fits the display mode.
    ///
    /// Width must be a multiple of 8 between 128 and the screen width; height
    /// must be between 1 and 256.
    pub fn validate(&self) -> IsprResult<()> {
        if !self.width.is_multiple_of(8) {
            return Err(IsprError::parameter(format!(
                "view width {} must be a multiple of 8",
                self.width
            )));
        }
        if self.width < MIN_VIEW_WIDTH {
            return Err(IsprError::parameter(format!(
                "view width {} is too small (min {})",
                self.width, MIN_VIEW_WIDTH
            )));
        }
        if self.width > self.aspect.screen_width() {
            return Err(IsprError::parameter(format!(
                "view width {} is too large (max {})",
                self.width,
                self.aspect.screen_width()
            )));
        }
        if self.height == 0 || self.height > SCREEN_HEIGHT {
            return Err(IsprError::parameter(format!(
                "view height {} must be between 1 and {}",
                self.height, SCREEN_HEIGHT
            )));
        }
        Ok(())
    }

    /// Packed pixel payload size
    pub fn pixel_bytes(&self) -> usize {
        self.width as usize * self.height as usize * PACKED_PIXEL_SIZE
    }

    /// Top-left corner that centers the view on the screen
    pub fn offset(&self) -> (u32, u32) {
        (
            self.aspect.screen_width().saturating_sub(self.width) / 2,
            SCREEN_HEIGHT.saturating_sub(self.height) / 2,
        )
    }

    /// VRAM address of the view's top-left pixel
    pub fn vram_address(&self) -> u32 {
        let (x, y) = self.offset();
        GVRAM_BASE + y * GVRAM_ROW_BYTES + x * PACKED_PIXEL_SIZE as u32
    }
}

/// Fixed 16-byte header at the start of every frame record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRecordHeader {
    pub vram_address: u32,
    pub width: u16,
    pub height: u16,
    pub row_delta: u32,
    pub copy_count: u32,
}

impl FrameRecordHeader {
    pub const SIZE: usize = 16;

    pub fn for_view(view: &ViewGeometry) -> Self {
        Self {
            vram_address: view.vram_address(),
            width: view.width as u16,
            height: view.height as u16,
            row_delta: GVRAM_ROW_BYTES,
            copy_count: 0,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        BigEndian::write_u32(&mut bytes[0..4], self.vram_address);
        BigEndian::write_u16(&mut bytes[4..6], self.width);
        BigEndian::write_u16(&mut bytes[6..8], self.height);
        BigEndian::write_u32(&mut bytes[8..12], self.row_delta);
        BigEndian::write_u32(&mut bytes[12..16], self.copy_count);
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            vram_address: BigEndian::read_u32(&bytes[0..4]),
            width: BigEndian::read_u16(&bytes[4..6]),
            height: BigEndian::read_u16(&bytes[6..8]),
            row_delta: BigEndian::read_u32(&bytes[8..12]),
            copy_count: BigEndian::read_u32(&bytes[12..16]),
        })
    }
}
