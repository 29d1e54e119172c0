// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The benchmark input: decoded once, then shared read-only by every task and
// variant.

use std::path::{Path, PathBuf};

use cvbench_core::error::{BenchError, Result};
use image::{DynamicImage, RgbaImage};
use tracing::{debug, info, instrument};

/// Decoded input image.
///
/// Tasks never mutate this value. A task that needs to write into its source
/// takes its own copy through [`SourceImage::rgba_copy`].
#[derive(Debug, Clone)]
pub struct SourceImage {
    path: PathBuf,
    rgba: RgbaImage,
}

impl SourceImage {
    // -- Construction ---------------------------------------------------------

    /// Load and decode an image file (JPEG, PNG, ...) into RGBA.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            BenchError::ImageLoad(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        if img.width() == 0 || img.height() == 0 {
            return Err(BenchError::ImageLoad(format!(
                "{} has no pixels",
                path.as_ref().display()
            )));
        }
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            rgba: img.to_rgba8(),
        })
    }

    /// Wrap an already-decoded image. `path` is what subprocess variants
    /// receive as their input argument.
    pub fn from_dynamic(image: DynamicImage, path: impl Into<PathBuf>) -> Self {
        let rgba = image.to_rgba8();
        debug!(width = rgba.width(), height = rgba.height(), "Image wrapped");
        Self {
            path: path.into(),
            rgba,
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    pub fn height(&self) -> u32 {
        self.rgba.height()
    }

    /// Borrow the shared RGBA pixels.
    pub fn rgba(&self) -> &RgbaImage {
        &self.rgba
    }

    /// A private, mutable copy of the pixels.
    pub fn rgba_copy(&self) -> RgbaImage {
        self.rgba.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn open_missing_file_is_image_load_error() {
        let err = SourceImage::open("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, BenchError::ImageLoad(_)));
    }

    #[test]
    fn open_decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.png");
        RgbaImage::from_pixel(6, 4, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let source = SourceImage::open(&path).unwrap();
        assert_eq!((source.width(), source.height()), (6, 4));
        assert_eq!(source.path(), path.as_path());
        assert_eq!(source.rgba().get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn copies_are_independent() {
        let source = SourceImage::from_dynamic(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4]))),
            "mem.png",
        );
        let mut copy = source.rgba_copy();
        copy.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        assert_eq!(source.rgba().get_pixel(0, 0), &Rgba([1, 2, 3, 4]));
    }
}
