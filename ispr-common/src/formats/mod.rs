//! ISPR container binary formats
//!
//! An ISPR file is a 1024-byte [`ContainerHeader`] followed by fixed-size
//! frame records. Each record starts with a [`FrameRecordHeader`] telling the
//! player where in graphics VRAM to copy the pixels, then carries the packed
//! pixels and one audio chunk. All integers are big-endian.
//!
//! ```text
//! 0x0000: ContainerHeader (1024 bytes)
//! 0x0400: record 0 (frame_size bytes)
//! ...     record n-1
//! ```

pub mod frame;
pub mod header;

pub use frame::*;
pub use header::*;
