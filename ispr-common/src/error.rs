//! Error taxonomy for ISPR container building.

use thiserror::Error;

/// Errors that abort a container build.
#[derive(Error, Debug)]
pub enum IsprError {
    /// Audio is too quiet or clips; the operator must adjust volume or thresholds.
    #[error(
        "level range error: average {average:.2}% (min {min_average:.2}%), \
         peak {peak:.2}% (max {max_peak:.2}%). Adjust volume settings."
    )]
    LevelRange {
        average: f64,
        peak: f64,
        min_average: f64,
        max_peak: f64,
    },

    /// A raster does not match the declared view dimensions.
    #[error("raster {index} is {width}x{height}, but the view is {view_width}x{view_height}")]
    FormatMismatch {
        index: usize,
        width: u32,
        height: u32,
        view_width: u32,
        view_height: u32,
    },

    /// Invalid build parameter, detected before any heavy work.
    #[error("invalid parameter: {0}")]
    Parameter(String),

    /// The muxer finished with a different number of records than rasters.
    #[error("incomplete build: wrote {written} of {expected} frames")]
    IncompleteBuild { written: usize, expected: usize },

    /// I/O error while writing the container.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IsprError {
    pub fn parameter(message: impl Into<String>) -> Self {
        Self::Parameter(message.into())
    }
}

/// Convenience Result type for container operations.
pub type IsprResult<T> = Result<T, IsprError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_range_display() {
        let err = IsprError::LevelRange {
            average: 7.5,
            peak: 50.0,
            min_average: 8.0,
            max_peak: 98.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("average 7.50%"));
        assert!(msg.contains("Adjust volume"));
    }

    #[test]
    fn format_mismatch_display() {
        let err = IsprError::FormatMismatch {
            index: 3,
            width: 200,
            height: 96,
            view_width: 128,
            view_height: 96,
        };
        assert_eq!(
            err.to_string(),
            "raster 3 is 200x96, but the view is 128x96"
        );
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::WriteZero, "disk full");
        let err: IsprError = io_err.into();
        assert!(matches!(err, IsprError::Io(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
