// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — file decoding, working-resolution resizing and saving.
// Operates on in-memory images using the `image` crate.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use textlexiq_core::error::{Result, TextLexiqError};
use tracing::{debug, info, instrument};

/// Image processing steps operating on a single in-memory image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`,
/// enabling method chaining.
///
/// ```ignore
/// let (small, ratio) = ImageProcessor::open("photo.jpg")?.resize_to_height(500);
/// let gray = small.into_luma();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    ///
    /// # Errors
    ///
    /// [`TextLexiqError::Input`] when the file is missing or cannot be decoded.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|err| TextLexiqError::Input(format!("{}: {err}", path.display())))?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Consume the processor and return a single-channel image.
    pub fn into_luma(self) -> GrayImage {
        match self.image {
            DynamicImage::ImageLuma8(gray) => gray,
            other => other.to_luma8(),
        }
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Resize the image to exactly `width` x `height`, ignoring aspect ratio.
    /// Uses a bilinear (triangle) filter.
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        let resized = self.image.resize_exact(width, height, FilterType::Triangle);
        Self { image: resized }
    }

    /// Scale to `target_height` rows, keeping the aspect ratio.
    ///
    /// Returns the resized image together with the scale ratio
    /// `original_height / target_height`. The new width is the original width
    /// divided by that ratio, truncated, and never less than one pixel.
    #[instrument(skip(self), fields(from_w = self.width(), from_h = self.height()))]
    pub fn resize_to_height(self, target_height: u32) -> (Self, f64) {
        let ratio = f64::from(self.height()) / f64::from(target_height.max(1));
        let width = ((f64::from(self.width()) / ratio) as u32).max(1);
        let height = target_height.max(1);
        debug!(width, height, ratio, "Resizing to working resolution");
        (self.resize_exact(width, height), ratio)
    }

    // -- Output ---------------------------------------------------------------

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.image.save(path).map_err(|err| {
            TextLexiqError::ImageError(format!(
                "failed to save image to {}: {err}",
                path.display()
            ))
        })
    }
}
