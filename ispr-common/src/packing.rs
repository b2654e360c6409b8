//! RGB to packed 16-bit color conversion
//!
//! The graphics VRAM stores one 16-bit word per pixel:
//!
//! ```text
//! bit 15..11  green (top 5 bits)
//! bit 10..6   red   (top 5 bits)
//! bit  5..1   blue  (top 5 bits)
//! bit  0      I (intensity) bit
//! ```
//!
//! Words are stored big-endian.

use crate::error::{IsprError, IsprResult};
use crate::formats::ViewGeometry;

/// Bytes per packed pixel
pub const PACKED_PIXEL_SIZE: usize = 2;

/// Policy for the auxiliary (I) bit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuxBitMode {
    /// Set for every pixel that is not pure black
    #[default]
    Visible,
    /// Set when the discarded green precision rounds up (`g & 7 >= 4`)
    Intensity,
}

/// One decoded video frame as row-major RGB triples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RasterFrame {
    /// Wrap an RGB buffer.
    ///
    /// Returns `None` if the buffer is not exactly `width * height * 3` bytes.
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Option<Self> {
        if rgb.len() != width as usize * height as usize * 3 {
            return None;
        }
        Some(Self { width, height, rgb })
    }

    /// A frame filled with one color
    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> Self {
        let rgb = color.repeat(width as usize * height as usize);
        Self { width, height, rgb }
    }
}

/// Pack one RGB pixel
#[inline]
pub fn pack_color(r: u8, g: u8, b: u8, mode: AuxBitMode) -> u16 {
    let c = ((g as u16 >> 3) << 11) | ((r as u16 >> 3) << 6) | ((b as u16 >> 3) << 1);
    let aux = match mode {
        AuxBitMode::Intensity => (g & 0x07) >= 4,
        AuxBitMode::Visible => c != 0,
    };
    c | aux as u16
}

/// Pack a raster into a `view.width * view.height * 2` byte VRAM image
///
/// The raster width must equal the view width. A raster shorter than the
/// view leaves the trailing rows zero; a taller one is rejected.
///
/// # Arguments
/// * `frame` - Source raster
/// * `index` - Position of the raster in the clip (for error reporting)
/// * `view` - Declared view geometry
/// * `mode` - Auxiliary bit policy
pub fn pack_raster(
    frame: &RasterFrame,
    index: usize,
    view: &ViewGeometry,
    mode: AuxBitMode,
) -> IsprResult<Vec<u8>> {
    if frame.width != view.width || frame.height > view.height {
        return Err(IsprError::FormatMismatch {
            index,
            width: frame.width,
            height: frame.height,
            view_width: view.width,
            view_height: view.height,
        });
    }

    if frame.height < view.height {
        tracing::warn!(
            "raster {} has {} rows, view has {}; trailing rows stay black",
            index,
            frame.height,
            view.height
        );
    }

    let mut packed = vec![0u8; view.pixel_bytes()];
    for (dst, src) in packed
        .chunks_exact_mut(PACKED_PIXEL_SIZE)
        .zip(frame.rgb.chunks_exact(3))
    {
        let c = pack_color(src[0], src[1], src[2], mode);
        dst.copy_from_slice(&c.to_be_bytes());
    }

    Ok(packed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::PixelAspect;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    fn view(width: u32, height: u32) -> ViewGeometry {
        ViewGeometry::new(width, height, PixelAspect::Wide)
    }

    #[test]
    fn test_black_packs_to_zero() {
        assert_eq!(pack_color(0, 0, 0, AuxBitMode::Visible), 0x0000);
        assert_eq!(pack_color(0, 0, 0, AuxBitMode::Intensity), 0x0000);
    }

    #[test]
    fn test_white_packs_all_fields() {
        let c = pack_color(255, 255, 255, AuxBitMode::Visible);
        assert_eq!(c >> 11, 31);
        assert_eq!((c >> 6) & 0x1F, 31);
        assert_eq!((c >> 1) & 0x1F, 31);
        assert_eq!(c & 1, 1);
        assert_eq!(c, 0xFFFF);

        // 255 & 7 = 7 >= 4
        assert_eq!(pack_color(255, 255, 255, AuxBitMode::Intensity), 0xFFFF);
    }

    #[test]
    fn test_channel_positions() {
        assert_eq!(pack_color(0, 0xF8, 0, AuxBitMode::Intensity), 0xF800);
        assert_eq!(pack_color(0xF8, 0, 0, AuxBitMode::Intensity), 0x07C0);
        assert_eq!(pack_color(0, 0, 0xF8, AuxBitMode::Intensity), 0x003E);
    }

    #[test]
    fn test_visible_bit_on_dark_pixel() {
        // Channels below 8 truncate to zero, so the word stays black
        assert_eq!(pack_color(7, 7, 7, AuxBitMode::Visible), 0x0000);
        assert_eq!(pack_color(8, 0, 0, AuxBitMode::Visible), 0x0041);
    }

    #[test]
    fn test_intensity_bit_uses_green_remainder() {
        assert_eq!(pack_color(0, 3, 0, AuxBitMode::Intensity), 0x0000);
        assert_eq!(pack_color(0, 4, 0, AuxBitMode::Intensity), 0x0001);
        // Red and blue remainders are ignored
        assert_eq!(pack_color(7, 0, 7, AuxBitMode::Intensity), 0x0000);
    }

    #[test]
    fn test_pack_raster_big_endian() {
        let frame = RasterFrame::new(2, 1, vec![0, 0xF8, 0, 0xF8, 0, 0]).unwrap();
        let packed = pack_raster(&frame, 0, &view(2, 1), AuxBitMode::Intensity).unwrap();
        assert_eq!(packed, vec![0xF8, 0x00, 0x07, 0xC0]);
    }

    #[test]
    fn test_pack_raster_width_mismatch() {
        let frame = RasterFrame::solid(136, 96, [255, 255, 255]);
        let err = pack_raster(&frame, 7, &view(128, 96), AuxBitMode::Visible).unwrap_err();
        assert!(matches!(err, IsprError::FormatMismatch { index: 7, .. }));
    }

    #[test]
    fn test_pack_raster_too_tall() {
        let frame = RasterFrame::solid(128, 97, [255, 255, 255]);
        assert!(pack_raster(&frame, 0, &view(128, 96), AuxBitMode::Visible).is_err());
    }

    #[test]
    fn test_pack_raster_short_leaves_zero_rows() {
        let frame = RasterFrame::solid(128, 90, [255, 255, 255]);
        let packed = pack_raster(&frame, 0, &view(128, 96), AuxBitMode::Visible).unwrap();
        assert_eq!(packed.len(), 128 * 96 * 2);

        let split = 128 * 90 * 2;
        assert!(packed[..split].iter().all(|&b| b == 0xFF));
        assert!(packed[split..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_raster_new_validates_length() {
        assert!(RasterFrame::new(2, 2, vec![0; 12]).is_some());
        assert!(RasterFrame::new(2, 2, vec![0; 11]).is_none());
    }

    #[test]
    fn test_pack_color_random_pixels() {
        let mut rng = Pcg32::seed_from_u64(0x5A5A);
        for _ in 0..10_000 {
            let (r, g, b): (u8, u8, u8) = (rng.random(), rng.random(), rng.random());

            let visible = pack_color(r, g, b, AuxBitMode::Visible);
            assert_eq!(visible >> 11, (g >> 3) as u16);
            assert_eq!((visible >> 6) & 0x1F, (r >> 3) as u16);
            assert_eq!((visible >> 1) & 0x1F, (b >> 3) as u16);
            assert_eq!(visible & 1 == 1, (visible >> 1) != 0);

            let intensity = pack_color(r, g, b, AuxBitMode::Intensity);
            assert_eq!(intensity >> 1, visible >> 1);
            assert_eq!(intensity & 1 == 1, (g & 7) >= 4);
        }
    }
}
