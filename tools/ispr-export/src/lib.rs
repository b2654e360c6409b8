//! ispr-export library
//!
//! Clip building stages used by the `ispr-export` binary: transcoder
//! invocation, audio payload preparation, raster packing and container
//! output.

pub mod audio;
pub mod config;
pub mod error;
pub mod inspect;
pub mod pipeline;
pub mod raster;
pub mod transcode;

pub use config::{ClipConfig, Manifest, OutputOptions};
pub use error::{ExportError, ExportResult};
pub use pipeline::{BuildReport, build_clip, mux_inputs, write_container};
