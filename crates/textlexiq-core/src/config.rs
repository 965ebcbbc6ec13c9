// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TextLexiqError};

/// Local-threshold statistic used by the adaptive binarizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinarizeMethod {
    /// Gaussian-weighted neighbourhood mean.
    #[default]
    Gaussian,
    /// Unweighted box mean (summed-area table).
    Mean,
}

/// Tunable parameters for detection, rectification and binarization.
///
/// Every field has a default, so a JSON config file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Height in pixels of the downscaled copy used for edge detection.
    pub working_height: u32,
    /// How many of the largest contours are tried as document candidates.
    pub candidate_limit: usize,
    /// Polygon simplification tolerance as a fraction of the contour perimeter.
    pub epsilon_factor: f64,
    /// Contours smaller than this (in working-resolution pixels²) are ignored.
    /// Zero disables the cut-off.
    pub min_contour_area: f64,
    /// Gaussian sigma applied before edge detection (1.1 ≈ a 5x5 kernel).
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Dilation radius applied to the edge map to close small gaps at corners.
    pub edge_dilation: u8,
    /// Gaussian sigma used to denoise the page before binarization
    /// (0.8 ≈ a 3x3 kernel).
    pub denoise_sigma: f32,
    pub binarize_method: BinarizeMethod,
    /// Neighbourhood size for the adaptive threshold; must be odd.
    pub binarize_block_size: u32,
    /// Constant subtracted from the local mean.
    pub binarize_offset: i32,
    /// Straighten residual text skew before binarization.
    pub deskew: bool,
    /// Appended to the input path to name the processed image.
    pub output_suffix: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            working_height: 500,
            candidate_limit: 5,
            epsilon_factor: 0.02,
            min_contour_area: 0.0,
            blur_sigma: 1.1,
            canny_low: 75.0,
            canny_high: 200.0,
            edge_dilation: 1,
            denoise_sigma: 0.8,
            binarize_method: BinarizeMethod::Gaussian,
            binarize_block_size: 31,
            binarize_offset: 15,
            deskew: false,
            output_suffix: ".processed.png".into(),
        }
    }
}

impl ScanConfig {
    /// Load a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.working_height == 0 {
            return Err(invalid("working_height must be positive"));
        }
        if self.candidate_limit == 0 {
            return Err(invalid("candidate_limit must be at least 1"));
        }
        if !(self.epsilon_factor > 0.0 && self.epsilon_factor < 1.0) {
            return Err(invalid("epsilon_factor must lie in (0, 1)"));
        }
        if !(self.min_contour_area >= 0.0) {
            return Err(invalid("min_contour_area must be non-negative"));
        }
        if !(self.blur_sigma > 0.0 && self.denoise_sigma > 0.0) {
            return Err(invalid("blur_sigma and denoise_sigma must be positive"));
        }
        if !(self.canny_low >= 0.0 && self.canny_low <= self.canny_high) {
            return Err(invalid("canny_low must be non-negative and not exceed canny_high"));
        }
        if self.binarize_block_size < 3 || self.binarize_block_size % 2 == 0 {
            return Err(invalid("binarize_block_size must be an odd number >= 3"));
        }
        if self.output_suffix.is_empty() {
            return Err(invalid("output_suffix must not be empty"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> TextLexiqError {
    TextLexiqError::Config(reason.to_string())
}
