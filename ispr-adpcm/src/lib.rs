//! ISPR-ADPCM: 4-bit adaptive differential codec for ISPR-V3.0 clips
//!
//! The target sound chip plays 12-bit samples reconstructed from 4-bit codes at
//! 15.625 kHz. Each code carries a sign bit and three magnitude bits that scale
//! an adaptive step size; the step index then moves up or down depending on
//! how large the code was.
//!
//! **This is a pure codec** - there is no framing, no header and no sample
//! count. The container (`ispr-common`) slices the packed stream into fixed
//! per-frame chunks.
//!
//! # Code Layout
//!
//! ```text
//! bit 3: sign (1 = negative delta)
//! bit 2: + step
//! bit 1: + step >> 1
//! bit 0: + step >> 2
//!        (step >> 3 is always added)
//! ```
//!
//! Two codes are packed per byte, first sample in the low nibble.
//!
//! # State
//!
//! The whole codec state is an [`AdpcmState`] value. Encoding always derives
//! the next state by running the decoder on the code it just produced, so an
//! encoder and a decoder that start from the same state stay bit-identical.
//!
//! # Usage
//!
//! ```
//! use ispr_adpcm::{decode_adpcm, encode_pcm};
//!
//! let samples: Vec<i16> = (0..100).map(|i| (i * 300) as i16).collect();
//! let packed = encode_pcm(&samples);
//! assert_eq!(packed.len(), 50);
//!
//! let decoded = decode_adpcm(&packed, samples.len());
//! assert_eq!(decoded.len(), samples.len());
//! ```

mod decode;
mod encode;
mod resample;

pub use decode::{decode, decode_adpcm};
pub use encode::{encode, encode_pcm};
pub use resample::{PulseResampler, downmix_stereo, resample};

// =============================================================================
// Constants
// =============================================================================

/// Native playback rate of the ADPCM path in Hz
pub const ADPCM_SAMPLE_RATE: u32 = 15625;

/// Smallest reconstructable 12-bit sample
pub const MIN_ESTIMATE: i16 = -2048;

/// Largest reconstructable 12-bit sample
pub const MAX_ESTIMATE: i16 = 2047;

/// Highest valid index into [`STEP_SIZE`]
pub const MAX_STEP_INDEX: u8 = 48;

/// Step index adjustment keyed by 4-bit code
pub const STEP_ADJUST: [i8; 16] = [-1, -1, -1, -1, 2, 4, 6, 8, -1, -1, -1, -1, 2, 4, 6, 8];

/// Step size table (49 entries, monotonically increasing)
pub const STEP_SIZE: [i16; 49] = [
    16, 17, 19, 21, 23, 25, 28, 31, 34, 37, 41, 45, 50, 55, 60, 66, //
    73, 80, 88, 97, 107, 118, 130, 143, 157, 173, 190, 209, 230, 253, 279, 307, //
    337, 371, 408, 449, 494, 544, 598, 658, 724, 796, 876, 963, 1060, 1166, 1282, 1411, //
    1552,
];

// =============================================================================
// Codec State
// =============================================================================

/// Running predictor state shared by encoder and decoder.
///
/// `step_index` stays within `0..=48` and `estimate` within `-2048..=2047`.
/// A fresh stream always starts from [`AdpcmState::default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdpcmState {
    pub step_index: u8,
    pub estimate: i16,
}

impl AdpcmState {
    /// Build a state, clamping both fields into the codec's range
    pub const fn new(step_index: u8, estimate: i16) -> Self {
        let step_index = if step_index > MAX_STEP_INDEX {
            MAX_STEP_INDEX
        } else {
            step_index
        };
        let estimate = if estimate < MIN_ESTIMATE {
            MIN_ESTIMATE
        } else if estimate > MAX_ESTIMATE {
            MAX_ESTIMATE
        } else {
            estimate
        };
        Self {
            step_index,
            estimate,
        }
    }

    /// Current quantizer step size
    ///
    /// An out-of-range `step_index` reads as [`MAX_STEP_INDEX`].
    #[inline]
    pub fn step_size(&self) -> i32 {
        STEP_SIZE[self.step_index.min(MAX_STEP_INDEX) as usize] as i32
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Narrow a signed 16-bit sample to the codec's 12-bit range.
///
/// Division truncates toward zero, so small negative samples map to 0.
#[inline]
pub fn narrow_to_12bit(sample: i16) -> i16 {
    sample / 16
}

/// Clamp value to the 12-bit estimate range
#[inline]
pub(crate) fn clamp_estimate(v: i32) -> i16 {
    v.clamp(MIN_ESTIMATE as i32, MAX_ESTIMATE as i32) as i16
}

// =============================================================================
// Tests
// =============================================================================
