//! ADPCM decoder implementation
//!
//! The decoder is also the canonical state transition: the encoder calls
//! [`decode`] on every code it emits.

use crate::{AdpcmState, MAX_STEP_INDEX, STEP_ADJUST, clamp_estimate};

/// Apply one 4-bit code to the predictor state.
///
/// Only the lowest 4 bits of `code` are used.
///
/// # Arguments
/// * `code` - 4-bit ADPCM code
/// * `state` - State before this code
///
/// # Returns
/// The state after this code; `estimate` is the reconstructed 12-bit sample
#[inline]
pub fn decode(code: u8, state: AdpcmState) -> AdpcmState {
    let code = code & 0x0F;
    let ss = state.step_size();

    let mut delta = ss >> 3;
    if code & 0x01 != 0 {
        delta += ss >> 2;
    }
    if code & 0x02 != 0 {
        delta += ss >> 1;
    }
    if code & 0x04 != 0 {
        delta += ss;
    }
    if code & 0x08 != 0 {
        delta = -delta;
    }

    let estimate = clamp_estimate(state.estimate as i32 + delta);
    let step_index = (state.step_index as i32 + STEP_ADJUST[code as usize] as i32)
        .clamp(0, MAX_STEP_INDEX as i32) as u8;

    AdpcmState {
        step_index,
        estimate,
    }
}

/// Decode a packed ADPCM stream to 12-bit samples
///
/// # Arguments
/// * `data` - Packed codes, low nibble first
/// * `total_samples` - Number of samples to decode (at most `data.len() * 2`)
///
/// # Returns
/// Reconstructed samples in the 12-bit range
pub fn decode_adpcm(data: &[u8], total_samples: usize) -> Vec<i16> {
    let total_samples = total_samples.min(data.len() * 2);
    let mut output = Vec::with_capacity(total_samples);
    let mut state = AdpcmState::default();

    for &byte in data {
        for code in [byte & 0x0F, byte >> 4] {
            if output.len() == total_samples {
                return output;
            }
            state = decode(code, state);
            output.push(state.estimate);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_ESTIMATE, MIN_ESTIMATE};

    #[test]
    fn test_decode_zero_code() {
        // ss = 16, delta = 16 >> 3 = 2, code 0 lowers the index (clamped at 0)
        let state = decode(0x0, AdpcmState::default());
        assert_eq!(state, AdpcmState::new(0, 2));
    }

    #[test]
    fn test_decode_full_magnitude() {
        // ss = 16: 2 + 4 + 8 + 16 = 30, index +8
        let state = decode(0x7, AdpcmState::default());
        assert_eq!(state, AdpcmState::new(8, 30));

        let state = decode(0xF, AdpcmState::default());
        assert_eq!(state, AdpcmState::new(8, -30));
    }

    #[test]
    fn test_decode_clamps_estimate() {
        let state = decode(0x7, AdpcmState::new(48, 2000));
        assert_eq!(state.estimate, MAX_ESTIMATE);
        assert_eq!(state.step_index, 48);

        let state = decode(0xF, AdpcmState::new(48, -2000));
        assert_eq!(state.estimate, MIN_ESTIMATE);
    }

    #[test]
    fn test_out_of_range_state_is_clamped() {
        assert_eq!(AdpcmState::new(49, 0).step_index, MAX_STEP_INDEX);
        assert_eq!(AdpcmState::new(0, 4000).estimate, MAX_ESTIMATE);
        assert_eq!(AdpcmState::new(0, -4000).estimate, MIN_ESTIMATE);

        let state = decode(0, AdpcmState::new(49, 0));
        assert!(state.step_index <= MAX_STEP_INDEX);

        // Fields are public, so the step lookup must not trust them
        let raw = AdpcmState {
            step_index: 200,
            estimate: 0,
        };
        assert_eq!(raw.step_size(), 1552);
        assert_eq!(decode(0x7, raw).step_index, MAX_STEP_INDEX);
    }

    #[test]
    fn test_decode_ignores_high_bits() {
        let state = AdpcmState::new(10, 100);
        assert_eq!(decode(0xF3, state), decode(0x03, state));
    }

    #[test]
    fn test_decode_stream_nibble_order() {
        // Low nibble (0x7) is decoded before high nibble (0x0)
        let decoded = decode_adpcm(&[0x07], 2);
        assert_eq!(decoded, vec![30, 30 + (34 >> 3)]);
    }

    #[test]
    fn test_decode_stream_partial() {
        let decoded = decode_adpcm(&[0x00, 0x00], 3);
        assert_eq!(decoded.len(), 3);

        // Never reads past the data
        let decoded = decode_adpcm(&[0x00], 10);
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode_adpcm(&[], 0).is_empty());
        assert!(decode_adpcm(&[], 5).is_empty());
    }
}
