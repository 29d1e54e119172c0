// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The fixed operation catalog of the image library, and its in-process
// builds. Operations follow the usual "source, destination" calling style so
// callers can keep output buffers alive across repeated calls.

use cvbench_core::error::{BenchError, Result};
use image::{GrayImage, RgbaImage};
use imageproc::contours::{Contour, find_contours};
use imageproc::edges::canny;
use imageproc::filter::{box_filter, gaussian_blur_f32};
use imageproc::morphology::{grayscale_dilate, grayscale_erode};
use rayon::prelude::*;

use crate::ops::{self, CHANNELS, StructuringElement};

/// One build of the image library.
///
/// Every method performs exactly one operation; allocation of inputs and
/// reusable outputs is the caller's concern.
pub trait ImageLibrary: Send + Sync {
    /// Short build name, e.g. `scalar`.
    fn build(&self) -> &'static str;

    /// Catalog operations this build runs on the calling thread even though
    /// it otherwise schedules work in parallel.
    fn unthreaded_ops(&self) -> &'static [&'static str] {
        &[]
    }

    /// Split an RGBA image into one plane per channel. Planes that already
    /// have the source size are overwritten in place.
    fn split(&self, src: &RgbaImage, channels: &mut Vec<GrayImage>) -> Result<()>;

    /// Replace every sample by `table[sample]`, in place.
    fn lut(&self, img: &mut RgbaImage, table: &[u8; 256]) -> Result<()>;

    /// Mean adaptive binary threshold, in place.
    fn adaptive_threshold(
        &self,
        img: &mut GrayImage,
        max_value: u8,
        block_size: u32,
        c: i32,
    ) -> Result<()>;

    /// Global binary threshold, in place.
    fn threshold(&self, img: &mut GrayImage, thresh: u8, max_value: u8) -> Result<()>;

    /// Normalised box blur, in place.
    fn blur(&self, img: &mut RgbaImage, ksize: u32) -> Result<()>;

    /// Box filter, in place. Only the normalised form is supported.
    fn box_filter(&self, img: &mut RgbaImage, ksize: u32, normalize: bool) -> Result<()>;

    /// Canny edge detection.
    fn canny(&self, src: &GrayImage, edges: &mut GrayImage, low: f32, high: f32) -> Result<()>;

    /// RGBA to single-channel luma. `dst` is reused when its size matches.
    fn cvt_color(&self, src: &RgbaImage, dst: &mut GrayImage) -> Result<()>;

    /// Grayscale dilation with `kernel`, in place.
    fn dilate(&self, img: &mut RgbaImage, kernel: &StructuringElement) -> Result<()>;

    /// Grayscale erosion with `kernel`, in place.
    fn erode(&self, img: &mut RgbaImage, kernel: &StructuringElement) -> Result<()>;

    /// Outer contours of a binary image, chains compressed to segment ends.
    fn find_contours(&self, src: &GrayImage, contours: &mut Vec<Contour<i32>>) -> Result<()>;

    /// Gaussian blur, in place. `sigma <= 0` derives sigma from `ksize`.
    fn gaussian_blur(&self, img: &mut RgbaImage, ksize: u32, sigma: f32) -> Result<()>;

    /// Bilinear resize into `dst`, reused when it already has the target size.
    fn resize(&self, src: &RgbaImage, dst: &mut RgbaImage, width: u32, height: u32) -> Result<()>;

    /// Stack blur, in place.
    fn stack_blur(&self, img: &mut RgbaImage, ksize: u32) -> Result<()>;
}

/// How per-channel work is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Channels processed one after another on the calling thread.
    Scalar,
    /// Channels or rows processed concurrently on the rayon pool.
    ///
    /// `Canny` and `findContours` have no parallel form and run on the
    /// calling thread, as in the scalar build.
    Threaded,
}

/// `image` / `imageproc` backed library build.
#[derive(Debug, Clone)]
pub struct ImageprocLibrary {
    execution: Execution,
}

impl ImageprocLibrary {
    pub fn new(execution: Execution) -> Self {
        Self { execution }
    }

    pub fn scalar() -> Self {
        Self::new(Execution::Scalar)
    }

    pub fn threaded() -> Self {
        Self::new(Execution::Threaded)
    }

    fn planes(&self, src: &RgbaImage) -> Vec<GrayImage> {
        match self.execution {
            Execution::Scalar => (0..CHANNELS).map(|c| ops::extract_plane(src, c)).collect(),
            Execution::Threaded => (0..CHANNELS)
                .into_par_iter()
                .map(|c| ops::extract_plane(src, c))
                .collect(),
        }
    }

    /// Apply `row_op(y, row)` to every `row_len`-sample row of `buf`.
    fn for_each_row<F>(&self, buf: &mut [u8], row_len: usize, row_op: F)
    where
        F: Fn(usize, &mut [u8]) + Sync + Send,
    {
        match self.execution {
            Execution::Scalar => buf
                .chunks_mut(row_len)
                .enumerate()
                .for_each(|(y, row)| row_op(y, row)),
            Execution::Threaded => buf
                .par_chunks_mut(row_len)
                .enumerate()
                .for_each(|(y, row)| row_op(y, row)),
        }
    }

    /// Run a single-plane kernel over every channel of `img`, in place.
    fn map_planes<F>(&self, op: &'static str, img: &mut RgbaImage, kernel: F) -> Result<()>
    where
        F: Fn(&GrayImage) -> GrayImage + Sync + Send,
    {
        ops::check_not_empty(op, img.width(), img.height())?;
        let planes = self.planes(img);
        let out: Vec<GrayImage> = match self.execution {
            Execution::Scalar => planes.iter().map(&kernel).collect(),
            Execution::Threaded => planes.par_iter().map(&kernel).collect(),
        };
        ops::merge_planes(&out, img)
    }
}

impl Default for ImageprocLibrary {
    fn default() -> Self {
        Self::scalar()
    }
}

/// Chunk size for parallel per-sample loops.
const SAMPLE_CHUNK: usize = 64 * 1024;

impl ImageLibrary for ImageprocLibrary {
    fn build(&self) -> &'static str {
        match self.execution {
            Execution::Scalar => "scalar",
            Execution::Threaded => "threaded",
        }
    }

    fn unthreaded_ops(&self) -> &'static [&'static str] {
        match self.execution {
            Execution::Scalar => &[],
            Execution::Threaded => &["Canny", "findContours"],
        }
    }

    fn split(&self, src: &RgbaImage, channels: &mut Vec<GrayImage>) -> Result<()> {
        ops::check_not_empty("split", src.width(), src.height())?;
        channels.resize_with(CHANNELS, GrayImage::default);
        match self.execution {
            Execution::Scalar => {
                for (c, plane) in channels.iter_mut().enumerate() {
                    ops::extract_plane_into(src, c, plane);
                }
            }
            Execution::Threaded => channels
                .par_iter_mut()
                .enumerate()
                .for_each(|(c, plane)| ops::extract_plane_into(src, c, plane)),
        }
        Ok(())
    }

    fn lut(&self, img: &mut RgbaImage, table: &[u8; 256]) -> Result<()> {
        let samples: &mut [u8] = img;
        match self.execution {
            Execution::Scalar => {
                for s in samples.iter_mut() {
                    *s = table[*s as usize];
                }
            }
            Execution::Threaded => samples.par_chunks_mut(SAMPLE_CHUNK).for_each(|chunk| {
                for s in chunk.iter_mut() {
                    *s = table[*s as usize];
                }
            }),
        }
        Ok(())
    }

    fn adaptive_threshold(
        &self,
        img: &mut GrayImage,
        max_value: u8,
        block_size: u32,
        c: i32,
    ) -> Result<()> {
        let local = ops::LocalMean::new(img, block_size)?;
        let width = img.width() as usize;
        self.for_each_row(img, width, |y, row| {
            local.threshold_row(y as u32, row, max_value, c)
        });
        Ok(())
    }

    fn threshold(&self, img: &mut GrayImage, thresh: u8, max_value: u8) -> Result<()> {
        ops::check_not_empty("threshold", img.width(), img.height())?;
        let width = img.width() as usize;
        self.for_each_row(img, width, |_, row| ops::threshold_row(row, thresh, max_value));
        Ok(())
    }

    fn blur(&self, img: &mut RgbaImage, ksize: u32) -> Result<()> {
        self.box_filter(img, ksize, true)
    }

    fn box_filter(&self, img: &mut RgbaImage, ksize: u32, normalize: bool) -> Result<()> {
        if !normalize {
            return Err(BenchError::op("boxFilter", "unnormalised box filter is not supported"));
        }
        let radius = ops::check_ksize("boxFilter", ksize)?;
        self.map_planes("boxFilter", img, |plane| box_filter(plane, radius, radius))
    }

    fn canny(&self, src: &GrayImage, edges: &mut GrayImage, low: f32, high: f32) -> Result<()> {
        ops::check_not_empty("Canny", src.width(), src.height())?;
        if low > high {
            return Err(BenchError::op("Canny", "low threshold exceeds high threshold"));
        }
        let out = canny(src, low, high);
        if edges.dimensions() == out.dimensions() {
            edges.copy_from_slice(&out);
        } else {
            *edges = out;
        }
        Ok(())
    }

    fn cvt_color(&self, src: &RgbaImage, dst: &mut GrayImage) -> Result<()> {
        ops::check_not_empty("cvtColor", src.width(), src.height())?;
        let (width, height) = src.dimensions();
        if dst.dimensions() != (width, height) {
            *dst = GrayImage::new(width, height);
        }
        let src_row = width as usize * CHANNELS;
        self.for_each_row(dst, width as usize, |y, row| {
            ops::luma_row(&src.as_raw()[y * src_row..(y + 1) * src_row], row)
        });
        Ok(())
    }

    fn dilate(&self, img: &mut RgbaImage, kernel: &StructuringElement) -> Result<()> {
        let mask = kernel.to_mask();
        self.map_planes("dilate", img, |plane| grayscale_dilate(plane, &mask))
    }

    fn erode(&self, img: &mut RgbaImage, kernel: &StructuringElement) -> Result<()> {
        let mask = kernel.to_mask();
        self.map_planes("erode", img, |plane| grayscale_erode(plane, &mask))
    }

    fn find_contours(&self, src: &GrayImage, contours: &mut Vec<Contour<i32>>) -> Result<()> {
        ops::check_not_empty("findContours", src.width(), src.height())?;
        contours.clear();
        contours.extend(ops::external_contours(find_contours::<i32>(src)));
        Ok(())
    }

    fn gaussian_blur(&self, img: &mut RgbaImage, ksize: u32, sigma: f32) -> Result<()> {
        ops::check_ksize("GaussianBlur", ksize)?;
        let sigma = if sigma > 0.0 { sigma } else { ops::gaussian_sigma_for(ksize) };
        self.map_planes("GaussianBlur", img, |plane| gaussian_blur_f32(plane, sigma))
    }

    fn resize(&self, src: &RgbaImage, dst: &mut RgbaImage, width: u32, height: u32) -> Result<()> {
        ops::check_not_empty("resize", src.width(), src.height())?;
        ops::check_not_empty("resize", width, height)?;
        if dst.dimensions() != (width, height) {
            *dst = RgbaImage::new(width, height);
        }
        self.for_each_row(dst, width as usize * CHANNELS, |y, row| {
            ops::resize_row(src, y as u32, height, row)
        });
        Ok(())
    }

    fn stack_blur(&self, img: &mut RgbaImage, ksize: u32) -> Result<()> {
        let radius = ops::check_ksize("stackBlur", ksize)?;
        self.map_planes("stackBlur", img, |plane| ops::stack_blur_plane(plane, radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 10) as u8, (y * 10) as u8, 128, 255]))
    }

    fn builds() -> Vec<ImageprocLibrary> {
        vec![ImageprocLibrary::scalar(), ImageprocLibrary::threaded()]
    }

    #[test]
    fn build_names() {
        assert_eq!(ImageprocLibrary::scalar().build(), "scalar");
        assert_eq!(ImageprocLibrary::threaded().build(), "threaded");
    }

    #[test]
    fn split_yields_four_planes() {
        for lib in builds() {
            let src = gradient(8, 6);
            let mut channels = Vec::new();
            lib.split(&src, &mut channels).unwrap();
            assert_eq!(channels.len(), 4);
            assert_eq!(channels[0].get_pixel(3, 0).0[0], 30);
            assert_eq!(channels[1].get_pixel(0, 2).0[0], 20);
            assert!(channels[3].pixels().all(|p| p.0[0] == 255));
        }
    }

    #[test]
    fn split_overwrites_existing_planes() {
        for lib in builds() {
            let mut channels = vec![GrayImage::new(8, 6); 4];
            let before: Vec<*const u8> = channels.iter().map(|p| p.as_ptr()).collect();
            lib.split(&gradient(8, 6), &mut channels).unwrap();
            lib.split(&gradient(8, 6), &mut channels).unwrap();
            let after: Vec<*const u8> = channels.iter().map(|p| p.as_ptr()).collect();
            assert_eq!(before, after);
            assert_eq!(channels[2].get_pixel(7, 5).0[0], 128);
        }
    }

    #[test]
    fn lut_inverts_every_sample() {
        let mut table = [0u8; 256];
        for (i, v) in table.iter_mut().enumerate() {
            *v = 255 - i as u8;
        }
        for lib in builds() {
            let mut img = gradient(300, 300);
            lib.lut(&mut img, &table).unwrap();
            assert_eq!(img.get_pixel(2, 3), &Rgba([235, 225, 127, 0]));
        }
    }

    #[test]
    fn scalar_and_threaded_agree() {
        let kernel = StructuringElement::rect(3, 3).unwrap();
        let scalar = ImageprocLibrary::scalar();
        let threaded = ImageprocLibrary::threaded();

        let mut a = gradient(20, 20);
        let mut b = gradient(20, 20);
        scalar.gaussian_blur(&mut a, 11, 0.0).unwrap();
        threaded.gaussian_blur(&mut b, 11, 0.0).unwrap();
        assert_eq!(a, b);

        scalar.dilate(&mut a, &kernel).unwrap();
        threaded.dilate(&mut b, &kernel).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn row_parallel_ops_match_scalar() {
        let scalar = ImageprocLibrary::scalar();
        let threaded = ImageprocLibrary::threaded();
        let src = gradient(23, 17);

        let mut ga = GrayImage::new(23, 17);
        let mut gb = GrayImage::new(23, 17);
        scalar.cvt_color(&src, &mut ga).unwrap();
        threaded.cvt_color(&src, &mut gb).unwrap();
        assert_eq!(ga, gb);

        let (mut ta, mut tb) = (ga.clone(), gb.clone());
        scalar.adaptive_threshold(&mut ta, 255, 11, 2).unwrap();
        threaded.adaptive_threshold(&mut tb, 255, 11, 2).unwrap();
        assert_eq!(ta, tb);

        scalar.threshold(&mut ga, 90, 255).unwrap();
        threaded.threshold(&mut gb, 90, 255).unwrap();
        assert_eq!(ga, gb);

        let mut ra = RgbaImage::new(1, 1);
        let mut rb = RgbaImage::new(1, 1);
        scalar.resize(&src, &mut ra, 61, 40).unwrap();
        threaded.resize(&src, &mut rb, 61, 40).unwrap();
        assert_eq!(ra, rb);
    }

    #[test]
    fn only_the_threaded_build_reports_sequential_ops() {
        assert!(ImageprocLibrary::scalar().unthreaded_ops().is_empty());
        assert_eq!(
            ImageprocLibrary::threaded().unthreaded_ops(),
            &["Canny", "findContours"]
        );
    }

    #[test]
    fn blur_keeps_flat_image() {
        for lib in builds() {
            let mut img = RgbaImage::from_pixel(15, 15, Rgba([50, 60, 70, 255]));
            lib.blur(&mut img, 11).unwrap();
            assert!(img.pixels().all(|p| *p == Rgba([50, 60, 70, 255])));
        }
    }

    #[test]
    fn even_kernel_is_an_operation_error() {
        let lib = ImageprocLibrary::scalar();
        let mut img = gradient(4, 4);
        let err = lib.box_filter(&mut img, 4, true).unwrap_err();
        assert!(matches!(err, BenchError::Operation { op: "boxFilter", .. }));
        assert!(lib.box_filter(&mut img, 3, false).is_err());
    }

    #[test]
    fn dilate_and_erode_move_a_bright_dot() {
        let lib = ImageprocLibrary::scalar();
        let kernel = StructuringElement::rect(3, 3).unwrap();

        let mut img = RgbaImage::from_pixel(7, 7, Rgba([0, 0, 0, 255]));
        img.put_pixel(3, 3, Rgba([200, 200, 200, 255]));
        lib.dilate(&mut img, &kernel).unwrap();
        assert_eq!(img.get_pixel(2, 2).0[0], 200);
        assert_eq!(img.get_pixel(0, 0).0[0], 0);

        lib.erode(&mut img, &kernel).unwrap();
        assert_eq!(img.get_pixel(3, 3).0[0], 200);
        assert_eq!(img.get_pixel(2, 2).0[0], 0);
    }

    #[test]
    fn cvt_color_and_canny_shapes() {
        let lib = ImageprocLibrary::scalar();
        let src = gradient(16, 12);
        let mut gray = GrayImage::new(1, 1);
        lib.cvt_color(&src, &mut gray).unwrap();
        assert_eq!(gray.dimensions(), (16, 12));
        assert_eq!(gray, image::imageops::grayscale(&src));

        let mut edges = GrayImage::new(1, 1);
        lib.canny(&gray, &mut edges, 50.0, 150.0).unwrap();
        assert_eq!(edges.dimensions(), (16, 12));
        let before = edges.as_ptr();
        lib.canny(&gray, &mut edges, 50.0, 150.0).unwrap();
        assert_eq!(edges.as_ptr(), before);
        assert!(lib.canny(&gray, &mut edges, 150.0, 50.0).is_err());
    }

    #[test]
    fn find_contours_reports_outer_square() {
        let lib = ImageprocLibrary::scalar();
        let mut img = GrayImage::new(20, 20);
        for y in 5..15 {
            for x in 5..15 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        // A hole inside the square must not produce a second external contour.
        img.put_pixel(10, 10, Luma([0]));

        let mut contours = Vec::new();
        lib.find_contours(&img, &mut contours).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points.len(), 4);

        // A second call replaces, not appends.
        lib.find_contours(&img, &mut contours).unwrap();
        assert_eq!(contours.len(), 1);
    }

    #[test]
    fn resize_to_target() {
        let lib = ImageprocLibrary::threaded();
        let src = gradient(10, 10);
        let mut dst = RgbaImage::new(1, 1);
        lib.resize(&src, &mut dst, 40, 25).unwrap();
        assert_eq!(dst.dimensions(), (40, 25));
        assert!(lib.resize(&src, &mut dst, 0, 25).is_err());
    }

    #[test]
    fn repeated_calls_reuse_the_destination() {
        for lib in builds() {
            let src = gradient(30, 20);

            let mut resized = RgbaImage::new(64, 48);
            let before = resized.as_ptr();
            for _ in 0..3 {
                lib.resize(&src, &mut resized, 64, 48).unwrap();
            }
            assert_eq!(resized.as_ptr(), before);

            let mut gray = GrayImage::new(30, 20);
            let before = gray.as_ptr();
            for _ in 0..3 {
                lib.cvt_color(&src, &mut gray).unwrap();
            }
            assert_eq!(gray.as_ptr(), before);
        }
    }

    #[test]
    fn stack_blur_and_threshold() {
        let lib = ImageprocLibrary::scalar();
        let mut img = RgbaImage::from_pixel(12, 12, Rgba([9, 9, 9, 9]));
        lib.stack_blur(&mut img, 11).unwrap();
        assert!(img.pixels().all(|p| *p == Rgba([9, 9, 9, 9])));

        let mut gray = GrayImage::from_pixel(2, 2, Luma([200]));
        lib.threshold(&mut gray, 127, 255).unwrap();
        assert!(gray.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn empty_images_are_rejected() {
        let lib = ImageprocLibrary::scalar();
        let mut img = RgbaImage::new(0, 0);
        assert!(lib.blur(&mut img, 3).is_err());
        let mut channels = Vec::new();
        assert!(lib.split(&img, &mut channels).is_err());
    }
}
