//! Pixel comparator.
//!
//! Two distinct tolerances are involved:
//! - [`PIXEL_SENSITIVITY`] decides whether a single pixel differs at all. It is
//!   fixed and loose enough to absorb sub-pixel rendering noise.
//! - [`CompareOptions::threshold`] is the largest fraction of differing pixels
//!   for which the whole comparison still passes.

mod delta;



use serde::Serialize;

use crate::config::validate_threshold;
use crate::error::{Result, VdiffError};
use crate::raster::RasterImage;
use crate::Viewport;

use delta::{color_delta, faded_gray, is_antialiased, MAX_YIQ_DELTA};

/// Per-pixel YIQ sensitivity (0 = exact match, 1 = anything goes).
pub const PIXEL_SENSITIVITY: f64 = 0.1;

/// Colour painted over pixels counted as different.
pub const DIFF_COLOR: [u8; 4] = [255, 0, 0, 255];
/// Colour painted over pixels classified as anti-aliasing (not counted).
pub const ANTIALIAS_COLOR: [u8; 4] = [255, 255, 0, 255];
/// Opacity of the greyscale background copied from the first image.
const BACKGROUND_FADE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompareOptions {
    /// Largest passing diff ratio, within `0..=1`.
    pub threshold: f64,
    pub produce_diff_image: bool,
}

impl CompareOptions {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            produce_diff_image: false,
        }
    }

    pub fn with_diff_image(mut self, produce: bool) -> Self {
        self.produce_diff_image = produce;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub dimensions: Viewport,
    pub diff_pixel_count: u64,
    /// Pixels that differed but were attributed to anti-aliasing.
    pub antialiased_pixel_count: u64,
    pub total_pixels: u64,
    pub diff_ratio: f64,
    pub threshold: f64,
    pub passed: bool,
    #[serde(skip)]
    pub diff_image: Option<RasterImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelClass {
    Same,
    AntiAliased,
    Different,
}

/// Compare two equally sized images.
///
/// Fails with [`VdiffError::DimensionMismatch`] when sizes differ; images
/// are never resized or cropped.
pub fn compare(a: &RasterImage, b: &RasterImage, options: &CompareOptions) -> Result<ComparisonResult> {
    validate_threshold(options.threshold)?;
    if a.viewport() != b.viewport() {
        return Err(VdiffError::DimensionMismatch {
            expected: a.viewport(),
            actual: b.viewport(),
        });
    }

    let (width, height) = (a.width(), a.height());
    let (pa, pb) = (a.pixels(), b.pixels());
    let max_delta = MAX_YIQ_DELTA * PIXEL_SENSITIVITY * PIXEL_SENSITIVITY;

    let mut diff_pixels = options
        .produce_diff_image
        .then(|| vec![0u8; pa.len()]);
    let mut diff_pixel_count = 0u64;
    let mut antialiased_pixel_count = 0u64;

    for y in 0..height {
        for x in 0..width {
            let pos = (y as usize * width as usize + x as usize) * 4;

            let class = if pa[pos..pos + 4] == pb[pos..pos + 4]
                || color_delta(pa, pb, pos, pos, false).abs() <= max_delta
            {
                PixelClass::Same
            } else if is_antialiased(pa, pb, x, y, width, height)
                || is_antialiased(pb, pa, x, y, width, height)
            {
                PixelClass::AntiAliased
            } else {
                PixelClass::Different
            };

            match class {
                PixelClass::Different => diff_pixel_count += 1,
                PixelClass::AntiAliased => antialiased_pixel_count += 1,
                PixelClass::Same => {}
            }

            if let Some(out) = diff_pixels.as_mut() {
                let colour = match class {
                    PixelClass::Different => DIFF_COLOR,
                    PixelClass::AntiAliased => ANTIALIAS_COLOR,
                    PixelClass::Same => {
                        let v = faded_gray(pa, pos, BACKGROUND_FADE);
                        [v, v, v, 255]
                    }
                };
                out[pos..pos + 4].copy_from_slice(&colour);
            }
        }
    }

    let total_pixels = a.total_pixels();
    let diff_ratio = diff_pixel_count as f64 / total_pixels as f64;
    let passed = diff_ratio <= options.threshold;

    let diff_image = diff_pixels
        .map(|pixels| RasterImage::from_rgba(width, height, pixels))
        .transpose()?;

    Ok(ComparisonResult {
        dimensions: a.viewport(),
        diff_pixel_count,
        antialiased_pixel_count,
        total_pixels,
        diff_ratio,
        threshold: options.threshold,
        passed,
        diff_image,
    })
}
