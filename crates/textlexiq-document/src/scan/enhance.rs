// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page enhancement — denoising, grayscale conversion, skew correction and
// adaptive binarization of a (rectified) document image.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use imageproc::definitions::Image;
use imageproc::geometry::min_area_rect;
use imageproc::integral_image::{integral_image, sum_image_pixels};
use imageproc::point::Point;
use textlexiq_core::error::{Result, TextLexiqError};
use textlexiq_core::{BinarizeMethod, ScanConfig};
use tracing::{debug, info, instrument};

use super::stages::Binarizer;

/// Residual skew below this many degrees is left alone.
const MIN_SKEW_DEGREES: f32 = 0.5;

/// Enhances a page image for text recognition.
///
/// Each step consumes `self` and returns the transformed enhancer, so the
/// usual sequence reads as a chain:
///
/// ```ignore
/// let page = ScanEnhancer::from_dynamic(flattened)
///     .denoise(0.8)
///     .grayscale()
///     .deskew()
///     .binarize(&GaussianAdaptiveBinarizer::default())?
///     .into_gray();
/// ```
pub struct ScanEnhancer {
    /// The working image (kept as `DynamicImage` for flexibility).
    image: DynamicImage,
}

impl ScanEnhancer {
    // -- Construction ---------------------------------------------------------

    /// Create an enhancer wrapping an existing `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Borrow the current working image.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the enhancer and return the underlying image.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Consume the enhancer and return a single-channel image.
    pub fn into_gray(self) -> GrayImage {
        match self.image {
            DynamicImage::ImageLuma8(gray) => gray,
            other => other.to_luma8(),
        }
    }

    // -- Steps ----------------------------------------------------------------

    /// Gaussian smoothing to suppress sensor noise before thresholding.
    #[instrument(skip(self))]
    pub fn denoise(self, sigma: f32) -> Self {
        debug!(sigma, "Denoising");
        let image = match self.image {
            DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(gaussian_blur_f32(&gray, sigma)),
            other => DynamicImage::ImageRgb8(gaussian_blur_f32(&other.to_rgb8(), sigma)),
        };
        Self { image }
    }

    /// Convert to single-channel luma.
    pub fn grayscale(self) -> Self {
        Self {
            image: DynamicImage::ImageLuma8(self.into_gray()),
        }
    }

    /// Rotate the page so its text block is level.
    ///
    /// The skew is estimated from the minimum-area rectangle around all dark
    /// (Otsu) pixels. Angles under half a degree, and pages without any dark
    /// pixels, are returned unchanged. Exposed corners are filled with white.
    #[instrument(skip(self))]
    pub fn deskew(self) -> Self {
        let gray = self.into_gray();
        match estimate_skew_degrees(&gray) {
            Some(angle) if angle.abs() >= MIN_SKEW_DEGREES => {
                info!(angle, "Correcting text skew");
                let rotated = rotate_about_center(
                    &gray,
                    (-angle).to_radians(),
                    Interpolation::Bicubic,
                    Luma([255u8]),
                );
                Self::from_dynamic(DynamicImage::ImageLuma8(rotated))
            }
            angle => {
                debug!(?angle, "No skew correction needed");
                Self::from_dynamic(DynamicImage::ImageLuma8(gray))
            }
        }
    }

    /// Threshold the page with `binarizer`.
    #[instrument(skip_all)]
    pub fn binarize(self, binarizer: &dyn Binarizer) -> Result<Self> {
        let gray = self.into_gray();
        let binary = binarizer.binarize(&gray)?;
        debug!("Binarization complete");
        Ok(Self::from_dynamic(DynamicImage::ImageLuma8(binary)))
    }
}

// -- Binarizers ---------------------------------------------------------------

/// Build the binarizer selected in `config`.
pub fn binarizer_from_config(config: &ScanConfig) -> Box<dyn Binarizer> {
    match config.binarize_method {
        BinarizeMethod::Gaussian => Box::new(GaussianAdaptiveBinarizer {
            block_size: config.binarize_block_size,
            offset: config.binarize_offset,
        }),
        BinarizeMethod::Mean => Box::new(MeanAdaptiveBinarizer {
            block_size: config.binarize_block_size,
            offset: config.binarize_offset,
        }),
    }
}

/// Adaptive threshold against a Gaussian-weighted local mean.
///
/// A pixel becomes white when it is brighter than the weighted mean of its
/// `block_size` neighbourhood minus `offset`, black otherwise. The Gaussian
/// sigma is derived from the block size the way OpenCV sizes its kernels, so
/// `block_size = 31, offset = 15` matches the reference behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaussianAdaptiveBinarizer {
    pub block_size: u32,
    pub offset: i32,
}

impl Default for GaussianAdaptiveBinarizer {
    fn default() -> Self {
        Self {
            block_size: 31,
            offset: 15,
        }
    }
}

impl GaussianAdaptiveBinarizer {
    fn sigma(&self) -> f32 {
        0.3 * ((self.block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }
}

impl Binarizer for GaussianAdaptiveBinarizer {
    #[instrument(skip_all, fields(block_size = self.block_size, offset = self.offset))]
    fn binarize(&self, gray: &GrayImage) -> Result<GrayImage> {
        validate_block(gray, self.block_size)?;
        info!("Applying Gaussian adaptive binarization");

        let local_mean = gaussian_blur_f32(gray, self.sigma());
        Ok(threshold_against(gray, self.offset, |x, y| {
            f64::from(local_mean.get_pixel(x, y).0[0])
        }))
    }
}

/// Adaptive threshold against the unweighted mean of a square neighbourhood,
/// read from an integral image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeanAdaptiveBinarizer {
    pub block_size: u32,
    pub offset: i32,
}

impl Binarizer for MeanAdaptiveBinarizer {
    #[instrument(skip_all, fields(block_size = self.block_size, offset = self.offset))]
    fn binarize(&self, gray: &GrayImage) -> Result<GrayImage> {
        validate_block(gray, self.block_size)?;
        info!("Applying mean adaptive binarization");

        let integral = integral_image::<_, u64>(gray);
        let radius = self.block_size / 2;
        Ok(threshold_against(gray, self.offset, |x, y| {
            region_mean(&integral, x, y, radius)
        }))
    }
}

fn validate_block(gray: &GrayImage, block_size: u32) -> Result<()> {
    if gray.width() == 0 || gray.height() == 0 {
        return Err(TextLexiqError::Binarization(
            "cannot binarize an empty image".into(),
        ));
    }
    if block_size < 3 || block_size % 2 == 0 {
        return Err(TextLexiqError::Binarization(format!(
            "block size must be an odd number >= 3, got {block_size}"
        )));
    }
    Ok(())
}

/// White where `pixel > mean(x, y) - offset`, black elsewhere.
fn threshold_against(gray: &GrayImage, offset: i32, mean: impl Fn(u32, u32) -> f64) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut output = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let threshold = mean(x, y) - f64::from(offset);
            let value = f64::from(gray.get_pixel(x, y).0[0]);
            let binary = if value > threshold { 255u8 } else { 0u8 };
            output.put_pixel(x, y, Luma([binary]));
        }
    }
    output
}

/// Mean pixel value within the square of `radius` around (cx, cy), clamped to
/// the image bounds. `integral` comes from [`integral_image`].
fn region_mean(integral: &Image<Luma<u64>>, cx: u32, cy: u32, radius: u32) -> f64 {
    // The table is one row and column larger than the image.
    let (width, height) = (integral.width() - 1, integral.height() - 1);
    let left = cx.saturating_sub(radius);
    let top = cy.saturating_sub(radius);
    let right = cx.saturating_add(radius).min(width - 1);
    let bottom = cy.saturating_add(radius).min(height - 1);

    let count = u64::from(right - left + 1) * u64::from(bottom - top + 1);
    let sum = sum_image_pixels(integral, left, top, right, bottom)[0];
    sum as f64 / count as f64
}

// -- Skew estimation ----------------------------------------------------------

/// Estimate the text skew in degrees, normalised to (-45, 45].
///
/// Positive angles mean the text slopes down to the right. Returns `None`
/// when the page has no dark pixels.
pub fn estimate_skew_degrees(gray: &GrayImage) -> Option<f32> {
    let level = otsu_level(gray);
    let ink: Vec<Point<i32>> = gray
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] <= level)
        .map(|(x, y, _)| Point::new(x as i32, y as i32))
        .collect();
    if ink.is_empty() {
        return None;
    }

    let rect = min_area_rect(&ink);
    let dx = (rect[1].x - rect[0].x) as f32;
    let dy = (rect[1].y - rect[0].y) as f32;
    if dx == 0.0 && dy == 0.0 {
        return Some(0.0);
    }

    let mut angle = dy.atan2(dx).to_degrees();
    while angle > 45.0 {
        angle -= 90.0;
    }
    while angle <= -45.0 {
        angle += 90.0;
    }
    debug!(angle, ink_pixels = ink.len(), otsu = level, "Skew estimated");
    Some(angle)
}

// -- Tests --------------------------------------------------------------------
