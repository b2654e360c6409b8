//! Shared types and utilities for ISPR clips
//!
//! This crate provides the container-level pieces used by `ispr-export`:
//!
//! # Modules
//!
//! - [`level`] - Peak/average loudness analysis and the level gate
//! - [`packing`] - RGB → packed 16-bit VRAM color conversion
//! - [`timing`] - Sample/frame rates and per-frame audio sizing
//! - [`formats`] - Container header and frame record layouts
//! - [`mux`] - Streaming container muxer
//! - [`error`] - Error taxonomy shared by every stage

pub mod error;
pub mod formats;
pub mod level;
pub mod mux;
pub mod packing;
pub mod timing;

pub use error::{IsprError, IsprResult};

pub use formats::{
    AudioFormat, ContainerHeader, FrameRecordHeader, HEADER_SIZE, MAGIC_ADPCM, MAGIC_PCM,
    PixelAspect, ViewGeometry,
};

pub use level::{LevelGate, LevelReport, analyze};

pub use mux::{ContainerMuxer, ContainerSettings, MuxSummary, mux_to_vec};

pub use packing::{AuxBitMode, RasterFrame, pack_color, pack_raster};

pub use timing::{FrameRate, FrameTiming, SampleRate, frame_size, frame_voice_size};
