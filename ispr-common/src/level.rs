//! Loudness analysis and the pre-flight level gate
//!
//! The playback hardware has no gain control, so a clip that clips or is
//! nearly inaudible has to be rejected before it is committed to a container.

use crate::error::{IsprError, IsprResult};

/// Full-scale amplitude used for percentages
pub const FULL_SCALE: f64 = 32767.0;

/// Peak and average loudness of a sample stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelReport {
    /// `max |sample|` as a percentage of full scale
    pub peak_percent: f64,
    /// `mean |sample|` as a percentage of full scale
    pub average_percent: f64,
    /// Number of samples analyzed (all channels)
    pub samples: usize,
}

/// Analyze a mono or interleaved stereo stream
///
/// Every channel contributes to both the peak and the mean. An empty stream
/// reports 0% for both.
pub fn analyze(samples: &[i16]) -> LevelReport {
    if samples.is_empty() {
        return LevelReport {
            peak_percent: 0.0,
            average_percent: 0.0,
            samples: 0,
        };
    }

    let mut peak = 0u32;
    let mut total = 0u64;
    for &s in samples {
        let magnitude = s.unsigned_abs() as u32;
        peak = peak.max(magnitude);
        total += magnitude as u64;
    }

    LevelReport {
        peak_percent: 100.0 * peak as f64 / FULL_SCALE,
        average_percent: 100.0 * total as f64 / samples.len() as f64 / FULL_SCALE,
        samples: samples.len(),
    }
}

/// Caller-supplied loudness thresholds (percent of full scale)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelGate {
    pub min_average: f64,
    pub max_peak: f64,
}

impl LevelGate {
    pub fn new(min_average: f64, max_peak: f64) -> Self {
        Self {
            min_average,
            max_peak,
        }
    }

    /// Reject the stream if it is too quiet on average or peaks too high.
    ///
    /// Both bounds are inclusive.
    pub fn check(&self, report: &LevelReport) -> IsprResult<()> {
        tracing::info!("Average Level ... {:.2}%", report.average_percent);
        tracing::info!("Peak Level    ... {:.2}%", report.peak_percent);

        if report.average_percent < self.min_average || report.peak_percent > self.max_peak {
            return Err(IsprError::LevelRange {
                average: report.average_percent,
                peak: report.peak_percent,
                min_average: self.min_average,
                max_peak: self.max_peak,
            });
        }
        Ok(())
    }

    /// Analyze and gate in one step
    pub fn analyze_and_check(&self, samples: &[i16]) -> IsprResult<LevelReport> {
        let report = analyze(samples);
        self.check(&report)?;
        Ok(report)
    }
}
