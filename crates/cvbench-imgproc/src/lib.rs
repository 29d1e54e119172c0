// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// cvbench-imgproc — The image library under test.
//
// Exposes the fixed operation catalog (split, LUT, thresholds, blurs, Canny,
// colour conversion, morphology, contours, resize) behind the `ImageLibrary`
// trait, with single-threaded and thread-pool builds backed by `image` and
// `imageproc`, plus the shared decoded input image.

pub mod library;
pub mod ops;
pub mod source;

pub use library::{Execution, ImageLibrary, ImageprocLibrary};
pub use ops::StructuringElement;
pub use source::SourceImage;
