// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The task catalog.
//
// Each task has a stable name (also the subprocess task argument), a setup
// step that builds the cell's scratch state, and exactly one measured library
// call. Setup is never timed.

use std::fmt;
use std::str::FromStr;

use image::{GrayImage, RgbaImage};
use imageproc::contours::Contour;
use tracing::debug;

use cvbench_core::error::{BenchError, Result};
use cvbench_imgproc::{ImageLibrary, SourceImage, StructuringElement};

/// Kernel size shared by the blur family.
pub const BLUR_SIZE: u32 = 11;

/// Output size of the `resize` task.
pub const RESIZE_TARGET: (u32, u32) = (2000, 2000);

const ADAPTIVE_BLOCK_SIZE: u32 = 11;
const ADAPTIVE_C: i32 = 2;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
const CONTOUR_THRESHOLD: u8 = 127;
const MORPH_SIZE: u8 = 3;

/// One entry of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Split,
    Lut,
    AdaptiveThreshold,
    Blur,
    Canny,
    CvtColor,
    BoxFilter,
    Dilate,
    Erode,
    FindContours,
    GaussianBlur,
    Resize,
    StackBlur,
}

impl Task {
    /// Every task, in display order.
    pub const ALL: [Task; 13] = [
        Task::Split,
        Task::Lut,
        Task::AdaptiveThreshold,
        Task::Blur,
        Task::Canny,
        Task::CvtColor,
        Task::BoxFilter,
        Task::Dilate,
        Task::Erode,
        Task::FindContours,
        Task::GaussianBlur,
        Task::Resize,
        Task::StackBlur,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Task::Split => "split",
            Task::Lut => "LUT",
            Task::AdaptiveThreshold => "adaptiveThreshold",
            Task::Blur => "blur",
            Task::Canny => "Canny",
            Task::CvtColor => "cvtColor",
            Task::BoxFilter => "boxFilter",
            Task::Dilate => "dilate",
            Task::Erode => "erode",
            Task::FindContours => "findContours",
            Task::GaussianBlur => "GaussianBlur",
            Task::Resize => "resize",
            Task::StackBlur => "stackBlur",
        }
    }

    /// Look a task up by its exact name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| BenchError::UnknownTask(name.to_string()))
    }

    /// The catalog restricted to `filter`, still in catalog order.
    ///
    /// `None` selects every task. Unknown names are an error.
    pub fn selection(filter: Option<&[String]>) -> Result<Vec<Task>> {
        let Some(names) = filter else {
            return Ok(Self::ALL.to_vec());
        };
        let wanted = names
            .iter()
            .map(|n| Self::from_name(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::ALL
            .into_iter()
            .filter(|t| wanted.contains(t))
            .collect())
    }

    /// Build the scratch state for one (task, variant) cell.
    ///
    /// `lib` is the variant's own library; conversions done during setup use
    /// it so a cell never mixes builds.
    pub fn setup<'a>(&self, source: &'a SourceImage, lib: &dyn ImageLibrary) -> Result<Workspace<'a>> {
        let setup_err = |reason: String| BenchError::setup(self.name(), reason);
        if source.width() == 0 || source.height() == 0 {
            return Err(setup_err("source image is empty".into()));
        }
        debug!(task = self.name(), "setting up cell");

        let gray = || -> Result<GrayImage> {
            let mut gray = GrayImage::new(source.width(), source.height());
            lib.cvt_color(source.rgba(), &mut gray)
                .map_err(|e| setup_err(e.to_string()))?;
            Ok(gray)
        };
        let rect = || {
            StructuringElement::rect(MORPH_SIZE, MORPH_SIZE).map_err(|e| setup_err(e.to_string()))
        };

        let workspace = match self {
            Task::Split => Workspace::Split {
                src: source.rgba(),
                channels: vec![GrayImage::new(source.width(), source.height()); 4],
            },
            Task::Lut => {
                let mut table = [0u8; 256];
                for (i, v) in table.iter_mut().enumerate() {
                    *v = 255 - i as u8;
                }
                Workspace::Lut {
                    img: source.rgba_copy(),
                    table,
                }
            }
            Task::AdaptiveThreshold => Workspace::AdaptiveThreshold { gray: gray()? },
            Task::Blur => Workspace::Blur {
                img: source.rgba_copy(),
            },
            Task::Canny => Workspace::Canny {
                gray: gray()?,
                edges: GrayImage::new(source.width(), source.height()),
            },
            Task::CvtColor => Workspace::CvtColor {
                src: source.rgba(),
                dst: GrayImage::new(source.width(), source.height()),
            },
            Task::BoxFilter => Workspace::BoxFilter {
                img: source.rgba_copy(),
            },
            Task::Dilate => Workspace::Dilate {
                img: source.rgba_copy(),
                kernel: rect()?,
            },
            Task::Erode => Workspace::Erode {
                img: source.rgba_copy(),
                kernel: rect()?,
            },
            Task::FindContours => {
                let mut binary = gray()?;
                lib.threshold(&mut binary, CONTOUR_THRESHOLD, 255)
                    .map_err(|e| setup_err(e.to_string()))?;
                Workspace::FindContours {
                    binary,
                    contours: Vec::new(),
                }
            }
            Task::GaussianBlur => Workspace::GaussianBlur {
                img: source.rgba_copy(),
            },
            Task::Resize => Workspace::Resize {
                src: source.rgba(),
                dst: RgbaImage::new(RESIZE_TARGET.0, RESIZE_TARGET.1),
            },
            Task::StackBlur => Workspace::StackBlur {
                img: source.rgba_copy(),
            },
        };
        Ok(workspace)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Task {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Scratch state of one cell.
///
/// Owned by the cell and dropped when it finishes, whatever the outcome.
/// Read-only inputs borrow the shared source; anything the operation writes
/// is a private buffer, reused across the repeats of the cell.
pub enum Workspace<'a> {
    Split {
        src: &'a RgbaImage,
        channels: Vec<GrayImage>,
    },
    Lut {
        img: RgbaImage,
        table: [u8; 256],
    },
    AdaptiveThreshold {
        gray: GrayImage,
    },
    Blur {
        img: RgbaImage,
    },
    Canny {
        gray: GrayImage,
        edges: GrayImage,
    },
    CvtColor {
        src: &'a RgbaImage,
        dst: GrayImage,
    },
    BoxFilter {
        img: RgbaImage,
    },
    Dilate {
        img: RgbaImage,
        kernel: StructuringElement,
    },
    Erode {
        img: RgbaImage,
        kernel: StructuringElement,
    },
    FindContours {
        binary: GrayImage,
        contours: Vec<Contour<i32>>,
    },
    GaussianBlur {
        img: RgbaImage,
    },
    Resize {
        src: &'a RgbaImage,
        dst: RgbaImage,
    },
    StackBlur {
        img: RgbaImage,
    },
}

impl Workspace<'_> {
    /// The measured operation: exactly one library call.
    pub fn run(&mut self, lib: &dyn ImageLibrary) -> Result<()> {
        match self {
            Workspace::Split { src, channels } => lib.split(*src, channels),
            Workspace::Lut { img, table } => lib.lut(img, table),
            Workspace::AdaptiveThreshold { gray } => {
                lib.adaptive_threshold(gray, 255, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_C)
            }
            Workspace::Blur { img } => lib.blur(img, BLUR_SIZE),
            Workspace::Canny { gray, edges } => lib.canny(gray, edges, CANNY_LOW, CANNY_HIGH),
            Workspace::CvtColor { src, dst } => lib.cvt_color(*src, dst),
            Workspace::BoxFilter { img } => lib.box_filter(img, BLUR_SIZE, true),
            Workspace::Dilate { img, kernel } => lib.dilate(img, kernel),
            Workspace::Erode { img, kernel } => lib.erode(img, kernel),
            Workspace::FindContours { binary, contours } => lib.find_contours(binary, contours),
            Workspace::GaussianBlur { img } => lib.gaussian_blur(img, BLUR_SIZE, 0.0),
            Workspace::Resize { src, dst } => {
                lib.resize(*src, dst, RESIZE_TARGET.0, RESIZE_TARGET.1)
            }
            Workspace::StackBlur { img } => lib.stack_blur(img, BLUR_SIZE),
        }
    }
}
