//! Frame directory handling and raster decoding
//!
//! Frames are BMP files whose sorted file names give the temporal order.
//! Decoding and packing of a batch runs on the rayon pool; results are
//! collected in input order before they reach the muxer.

use std::path::{Path, PathBuf};

use ispr_common::{AuxBitMode, RasterFrame, ViewGeometry, pack_raster};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::error::{ExportError, ExportResult};

/// Frames decoded per parallel batch
pub const PACK_BATCH: usize = 64;

fn is_bmp(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("bmp"))
}

/// List the BMP files directly inside `dir`, sorted by file name
pub fn list_frames(dir: &Path) -> ExportResult<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            ExportError::io(dir, source)
        })?;
        if entry.file_type().is_file() && is_bmp(entry.path()) {
            frames.push(entry.into_path());
        }
    }
    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(frames)
}

/// Create `dir` if needed and remove BMP files left from a previous run
pub fn prepare_frame_dir(dir: &Path) -> ExportResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))?;
    for path in list_frames(dir)? {
        std::fs::remove_file(&path).map_err(|e| ExportError::io(&path, e))?;
    }
    Ok(())
}

/// Decode an image file to RGB
pub fn load_raster(path: &Path) -> ExportResult<RasterFrame> {
    let img = image::open(path)
        .map_err(|source| ExportError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(RasterFrame {
        width,
        height,
        rgb: img.into_raw(),
    })
}

/// Decode and pack one frame; `index` is its position in the clip
pub fn pack_file(
    path: &Path,
    index: usize,
    view: &ViewGeometry,
    mode: AuxBitMode,
) -> ExportResult<Vec<u8>> {
    let frame = load_raster(path)?;
    Ok(pack_raster(&frame, index, view, mode)?)
}

/// Decode and pack a run of frames in parallel, preserving order.
///
/// `first_index` is the clip position of `paths[0]`.
pub fn pack_batch(
    paths: &[PathBuf],
    first_index: usize,
    view: &ViewGeometry,
    mode: AuxBitMode,
) -> ExportResult<Vec<Vec<u8>>> {
    paths
        .par_iter()
        .enumerate()
        .map(|(i, path)| pack_file(path, first_index + i, view, mode))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ispr_common::{IsprError, PixelAspect};

    fn write_bmp(path: &Path, width: u32, height: u32, color: [u8; 3]) {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb(color));
        img.save(path).unwrap();
    }

    #[test]
    fn test_list_frames_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["output_00003.bmp", "output_00001.BMP", "output_00002.bmp"] {
            write_bmp(&dir.path().join(name), 8, 8, [0, 0, 0]);
        }
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        std::fs::create_dir(dir.path().join("nested.bmp")).unwrap();

        let frames = list_frames(dir.path()).unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            ["output_00001.BMP", "output_00002.bmp", "output_00003.bmp"]
        );
    }

    #[test]
    fn test_prepare_frame_dir_clears_old_frames() {
        let dir = tempfile::tempdir().unwrap();
        let frames = dir.path().join("frames");
        std::fs::create_dir(&frames).unwrap();
        write_bmp(&frames.join("output_00001.bmp"), 8, 8, [0, 0, 0]);
        std::fs::write(frames.join("keep.txt"), "keep").unwrap();

        prepare_frame_dir(&frames).unwrap();
        assert!(list_frames(&frames).unwrap().is_empty());
        assert!(frames.join("keep.txt").exists());
    }

    #[test]
    fn test_pack_batch_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let view = ViewGeometry::new(128, 16, PixelAspect::Wide);
        let paths: Vec<PathBuf> = (0..8u8)
            .map(|i| {
                let path = dir.path().join(format!("output_{i:05}.bmp"));
                write_bmp(&path, 128, 16, [i * 32, 0, 0]);
                path
            })
            .collect();

        let packed = pack_batch(&paths, 0, &view, AuxBitMode::Visible).unwrap();
        assert_eq!(packed.len(), 8);
        for (i, pixels) in packed.iter().enumerate() {
            let expected = ispr_common::pack_color(i as u8 * 32, 0, 0, AuxBitMode::Visible);
            assert_eq!(&pixels[0..2], &expected.to_be_bytes());
            assert_eq!(pixels.len(), view.pixel_bytes());
        }
    }

    #[test]
    fn test_pack_batch_reports_clip_index() {
        let dir = tempfile::tempdir().unwrap();
        let view = ViewGeometry::new(128, 16, PixelAspect::Wide);
        let good = dir.path().join("a.bmp");
        let bad = dir.path().join("b.bmp");
        write_bmp(&good, 128, 16, [255, 255, 255]);
        write_bmp(&bad, 136, 16, [255, 255, 255]);

        let err = pack_batch(&[good, bad], 10, &view, AuxBitMode::Visible).unwrap_err();
        assert!(matches!(
            err,
            ExportError::Container(IsprError::FormatMismatch { index: 11, .. })
        ));
    }

    #[test]
    fn test_load_raster_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.bmp");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(
            load_raster(&path),
            Err(ExportError::Image { .. })
        ));
    }
}
