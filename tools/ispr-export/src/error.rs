//! Export error types.

use std::path::PathBuf;

use ispr_common::IsprError;
use thiserror::Error;

/// Errors that abort a clip build.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Level gate, format mismatch, parameter or muxer failure.
    #[error(transparent)]
    Container(#[from] IsprError),

    /// The external transcoder is missing or reported failure.
    #[error("{tool} failed: {reason}")]
    UpstreamTool { tool: String, reason: String },

    /// A raster image could not be decoded.
    #[error("failed to decode image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A WAV file could not be read.
    #[error("failed to read WAV {}: {source}", path.display())]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    /// A clip manifest could not be parsed.
    #[error("failed to parse manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// I/O error on a specific file.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parameter(message: impl Into<String>) -> Self {
        Self::Container(IsprError::parameter(message))
    }

    pub fn upstream(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UpstreamTool {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
