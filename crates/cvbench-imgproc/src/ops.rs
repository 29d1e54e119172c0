// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-plane kernels used by the library builds: thresholding, blurs,
// morphology, plane split/merge and contour simplification.

use cvbench_core::error::{BenchError, Result};
use image::{GrayImage, Luma, Pixel, Rgba, RgbaImage};
use imageproc::contours::Contour;
use imageproc::definitions::Image;
use imageproc::integral_image::{integral_image, sum_image_pixels};
use imageproc::morphology::Mask;
use imageproc::point::Point;

/// Number of interleaved channels in an RGBA buffer.
pub const CHANNELS: usize = 4;

/// Reject even or zero kernel sizes, mirroring the usual "odd, positive" rule
/// for centred kernels.
pub fn check_ksize(op: &'static str, ksize: u32) -> Result<u32> {
    if ksize == 0 || ksize % 2 == 0 {
        return Err(BenchError::op(op, format!("kernel size {ksize} must be odd and positive")));
    }
    Ok(ksize / 2)
}

/// Reject images with no pixels.
pub fn check_not_empty(op: &'static str, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(BenchError::op(op, "empty image"));
    }
    Ok(())
}

// -- Planes -------------------------------------------------------------------

/// Copy channel `channel` of an RGBA image into its own plane.
pub fn extract_plane(src: &RgbaImage, channel: usize) -> GrayImage {
    let mut plane = GrayImage::new(src.width(), src.height());
    extract_plane_into(src, channel, &mut plane);
    plane
}

/// Copy channel `channel` of an RGBA image into `plane`, reusing its buffer
/// when the size already matches.
pub fn extract_plane_into(src: &RgbaImage, channel: usize, plane: &mut GrayImage) {
    if plane.dimensions() != src.dimensions() {
        *plane = GrayImage::new(src.width(), src.height());
    }
    for (dst, pixel) in plane.iter_mut().zip(src.as_raw().chunks_exact(CHANNELS)) {
        *dst = pixel[channel];
    }
}

/// Write four planes back into an interleaved RGBA image of the same size.
pub fn merge_planes(planes: &[GrayImage], dst: &mut RgbaImage) -> Result<()> {
    if planes.len() != CHANNELS {
        return Err(BenchError::op(
            "merge",
            format!("expected {CHANNELS} planes, got {}", planes.len()),
        ));
    }
    if planes.iter().any(|p| p.dimensions() != dst.dimensions()) {
        return Err(BenchError::op("merge", "plane size does not match destination"));
    }

    for (i, pixel) in dst.pixels_mut().enumerate() {
        for (c, plane) in planes.iter().enumerate() {
            pixel.0[c] = plane.as_raw()[i];
        }
    }
    Ok(())
}

// -- Row kernels --------------------------------------------------------------
//
// Each takes one destination row so a build can walk rows sequentially or
// hand them to the rayon pool.

/// Luma of one row of interleaved RGBA samples.
pub fn luma_row(src_row: &[u8], dst_row: &mut [u8]) {
    for (dst, px) in dst_row.iter_mut().zip(src_row.chunks_exact(CHANNELS)) {
        *dst = Rgba::<u8>::from_slice(px).to_luma().0[0];
    }
}

/// Binary threshold: `max_value` where the pixel exceeds `thresh`, else 0.
pub fn threshold_row(row: &mut [u8], thresh: u8, max_value: u8) {
    for value in row.iter_mut() {
        *value = if *value > thresh { max_value } else { 0 };
    }
}

/// Row `y` of a bilinear resize of `src`, written into `dst_row`.
///
/// Sample centres are aligned (`(x + 0.5) * scale - 0.5`) and clamped to the
/// source edge.
pub fn resize_row(src: &RgbaImage, y: u32, dst_height: u32, dst_row: &mut [u8]) {
    let (sw, sh) = src.dimensions();
    let dst_width = (dst_row.len() / CHANNELS) as u32;
    let sy = source_coord(y, sh, dst_height);
    let (y0, y1, fy) = neighbours(sy, sh);

    for (x, out) in dst_row.chunks_exact_mut(CHANNELS).enumerate() {
        let sx = source_coord(x as u32, sw, dst_width);
        let (x0, x1, fx) = neighbours(sx, sw);
        let (a, b) = (src.get_pixel(x0, y0).0, src.get_pixel(x1, y0).0);
        let (c, d) = (src.get_pixel(x0, y1).0, src.get_pixel(x1, y1).0);
        for ch in 0..CHANNELS {
            let top = a[ch] as f32 + (b[ch] as f32 - a[ch] as f32) * fx;
            let bottom = c[ch] as f32 + (d[ch] as f32 - c[ch] as f32) * fx;
            let value = top + (bottom - top) * fy;
            out[ch] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn source_coord(dst: u32, src_len: u32, dst_len: u32) -> f32 {
    let scale = src_len as f32 / dst_len as f32;
    ((dst as f32 + 0.5) * scale - 0.5).clamp(0.0, (src_len - 1) as f32)
}

fn neighbours(coord: f32, len: u32) -> (u32, u32, f32) {
    let lo = coord.floor() as u32;
    let hi = (lo + 1).min(len - 1);
    (lo, hi, coord - lo as f32)
}

// -- Adaptive threshold -------------------------------------------------------

/// Local means for a mean adaptive threshold, backed by an integral image of
/// the plane. Built once per call; rows are then thresholded independently.
pub struct LocalMean {
    integral: Image<Luma<u64>>,
    width: u32,
    height: u32,
    radius: u32,
}

impl LocalMean {
    pub fn new(plane: &GrayImage, block_size: u32) -> Result<Self> {
        let radius = check_ksize("adaptiveThreshold", block_size)?;
        if block_size < 3 {
            return Err(BenchError::op("adaptiveThreshold", "block size must be at least 3"));
        }
        let (width, height) = plane.dimensions();
        check_not_empty("adaptiveThreshold", width, height)?;

        Ok(Self {
            integral: integral_image::<_, u64>(plane),
            width,
            height,
            radius,
        })
    }

    /// Mean of the block centred on (x, y), clamped to the image.
    pub fn mean(&self, x: u32, y: u32) -> f64 {
        let left = x.saturating_sub(self.radius);
        let top = y.saturating_sub(self.radius);
        let right = (x + self.radius).min(self.width - 1);
        let bottom = (y + self.radius).min(self.height - 1);

        let area = ((right - left + 1) * (bottom - top + 1)) as f64;
        sum_image_pixels(&self.integral, left, top, right, bottom)[0] as f64 / area
    }

    /// Threshold row `y` in place: `max_value` where the pixel exceeds its
    /// rounded local mean minus `c`, else 0.
    pub fn threshold_row(&self, y: u32, row: &mut [u8], max_value: u8, c: i32) {
        for (x, value) in row.iter_mut().enumerate() {
            let threshold = self.mean(x as u32, y).round() as i32 - c;
            *value = if *value as i32 > threshold { max_value } else { 0 };
        }
    }
}

// -- Blurs --------------------------------------------------------------------

/// Sigma derived from the kernel size when the caller passes `sigma <= 0`.
pub fn gaussian_sigma_for(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Stack blur: separable convolution with triangular weights
/// `radius + 1 - |i|`, edges clamped.
pub fn stack_blur_plane(plane: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return plane.clone();
    }
    let (w, h) = plane.dimensions();
    let r = radius as i64;
    let weights: Vec<u32> = (-r..=r).map(|i| (r + 1 - i.abs()) as u32).collect();
    let norm: u32 = weights.iter().sum();

    let horizontal = GrayImage::from_fn(w, h, |x, y| {
        let mut acc = 0u32;
        for (k, weight) in weights.iter().enumerate() {
            let sx = (x as i64 + k as i64 - r).clamp(0, w as i64 - 1) as u32;
            acc += plane.get_pixel(sx, y).0[0] as u32 * weight;
        }
        Luma([((acc + norm / 2) / norm) as u8])
    });

    GrayImage::from_fn(w, h, |x, y| {
        let mut acc = 0u32;
        for (k, weight) in weights.iter().enumerate() {
            let sy = (y as i64 + k as i64 - r).clamp(0, h as i64 - 1) as u32;
            acc += horizontal.get_pixel(x, sy).0[0] as u32 * weight;
        }
        Luma([((acc + norm / 2) / norm) as u8])
    })
}

// -- Morphology ---------------------------------------------------------------

/// A binary structuring element with an anchor point.
#[derive(Debug, Clone)]
pub struct StructuringElement {
    kernel: GrayImage,
    anchor: (u8, u8),
}

impl StructuringElement {
    /// A filled `width` x `height` rectangle anchored at its centre.
    pub fn rect(width: u8, height: u8) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BenchError::op("getStructuringElement", "empty kernel"));
        }
        Ok(Self {
            kernel: GrayImage::from_pixel(width as u32, height as u32, Luma([255])),
            anchor: (width / 2, height / 2),
        })
    }

    /// Convert to the mask type used by the grayscale morphology kernels.
    pub fn to_mask(&self) -> Mask {
        Mask::from_image(&self.kernel, self.anchor.0, self.anchor.1)
    }
}

// -- Contours -----------------------------------------------------------------

/// Drop intermediate points of horizontal, vertical and diagonal runs of a
/// closed chain, keeping only the end points of each straight segment.
pub fn simplify_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let step = |a: &Point<i32>, b: &Point<i32>| ((b.x - a.x).signum(), (b.y - a.y).signum());
    let simplified: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = &points[(i + n - 1) % n];
            let next = &points[(i + 1) % n];
            step(prev, &points[i]) != step(&points[i], next)
        })
        .map(|i| points[i])
        .collect();

    if simplified.is_empty() {
        vec![points[0]]
    } else {
        simplified
    }
}

/// Keep only outermost borders and compress their point chains.
pub fn external_contours(contours: Vec<Contour<i32>>) -> impl Iterator<Item = Contour<i32>> {
    contours
        .into_iter()
        .filter(|c| c.parent.is_none())
        .map(|mut c| {
            c.points = simplify_chain(&c.points);
            c
        })
}
