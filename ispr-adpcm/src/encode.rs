//! ADPCM encoder implementation
//!
//! Quantization is bit-plane greedy: the magnitude bits are set from the top
//! down whenever the remaining delta still reaches the threshold.

use crate::{AdpcmState, decode, narrow_to_12bit};

/// Encode one 12-bit sample
///
/// # Arguments
/// * `sample` - Input sample, already narrowed to the 12-bit range
/// * `state` - Predictor state before this sample
///
/// # Returns
/// The 4-bit code and the state after it (as computed by [`decode`])
#[inline]
pub fn encode(sample: i16, state: AdpcmState) -> (u8, AdpcmState) {
    let ss = state.step_size();
    let mut delta = sample as i32 - state.estimate as i32;

    let mut code = 0u8;
    if delta < 0 {
        code = 0x08;
        delta = -delta;
    }

    if delta >= ss {
        code |= 0x04;
        delta -= ss;
    }
    if delta >= ss >> 1 {
        code |= 0x02;
        delta -= ss >> 1;
    }
    if delta >= ss >> 2 {
        code |= 0x01;
    }

    (code, decode(code, state))
}

/// Encode 16-bit PCM samples to a packed ADPCM stream
///
/// Samples are narrowed to 12 bits, encoded from a fresh state and packed two
/// per byte, low nibble first. An odd final sample leaves the high nibble zero.
///
/// # Arguments
/// * `samples` - Mono 16-bit PCM at the ADPCM playback rate
pub fn encode_pcm(samples: &[i16]) -> Vec<u8> {
    let mut output = Vec::with_capacity(samples.len().div_ceil(2));
    let mut state = AdpcmState::default();

    for pair in samples.chunks(2) {
        let mut byte = 0u8;
        for (i, &sample) in pair.iter().enumerate() {
            let (code, next) = encode(narrow_to_12bit(sample), state);
            byte |= code << (i * 4);
            state = next;
        }
        output.push(byte);
    }

    output
}
