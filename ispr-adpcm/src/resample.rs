//! Channel down-mix and integer rate reduction for the ADPCM path
//!
//! Rate conversion uses a pulse accumulator: every input sample adds
//! `output_freq`, and a sample is emitted each time the accumulator reaches
//! `input_freq`. Integer-only, so long clips never drift.

/// Fixed-point pulse accumulator for rate reduction
#[derive(Debug, Clone)]
pub struct PulseResampler {
    input_freq: u32,
    output_freq: u32,
    accumulator: u64,
}

impl PulseResampler {
    /// Create a resampler from `input_freq` down to `output_freq`.
    ///
    /// `output_freq` above `input_freq` degrades to passing every sample.
    pub fn new(input_freq: u32, output_freq: u32) -> Self {
        Self {
            input_freq,
            output_freq,
            accumulator: 0,
        }
    }

    /// Advance by one input sample; returns whether it should be emitted
    #[inline]
    pub fn tick(&mut self) -> bool {
        self.accumulator += self.output_freq as u64;
        if self.accumulator >= self.input_freq as u64 {
            self.accumulator -= self.input_freq as u64;
            true
        } else {
            false
        }
    }
}

/// Keep every input sample whose pulse fires
///
/// # Arguments
/// * `samples` - Mono input samples
/// * `input_freq` - Input rate in Hz
/// * `output_freq` - Output rate in Hz
pub fn resample(samples: &[i16], input_freq: u32, output_freq: u32) -> Vec<i16> {
    if input_freq == output_freq {
        return samples.to_vec();
    }

    let mut pulse = PulseResampler::new(input_freq, output_freq);
    samples.iter().copied().filter(|_| pulse.tick()).collect()
}

/// Convert interleaved stereo to mono by averaging channels
///
/// The average truncates toward zero. An incomplete last pair is dropped.
pub fn downmix_stereo(samples: &[i16]) -> Vec<i16> {
    samples
        .chunks_exact(2)
        .map(|pair| ((pair[0] as i32 + pair[1] as i32) / 2) as i16)
        .collect()
}
