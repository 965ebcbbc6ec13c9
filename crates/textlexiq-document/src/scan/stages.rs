// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator stages of the scan pipeline.
//
// The geometric core (locate, order, rectify) consumes an edge map, traced
// contours and, downstream, a binarizer and a text recognizer. Each of those is
// a trait so the pipeline can be driven with alternative implementations;
// the defaults here are built on `imageproc`.

use image::{DynamicImage, GrayImage};
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;
use textlexiq_core::error::Result;
use textlexiq_core::{Contour, Point2D, ScanConfig};
use tracing::{debug, instrument};

/// Produces a binary edge map (255 = edge) from a grayscale image.
pub trait EdgeDetector: Send + Sync {
    fn detect_edges(&self, gray: &GrayImage) -> GrayImage;
}

/// Traces closed boundary candidates in a binary edge map.
pub trait ContourFinder: Send + Sync {
    fn find_contours(&self, edges: &GrayImage) -> Vec<Contour>;
}

/// Reduces a grayscale page to black text on a white background.
pub trait Binarizer: Send + Sync {
    fn binarize(&self, gray: &GrayImage) -> Result<GrayImage>;
}

/// Extracts text from a (typically binarized) page image.
pub trait TextRecognizer {
    fn recognize_text(&self, image: &DynamicImage) -> Result<String>;
}

/// Gaussian smoothing followed by Canny hysteresis thresholding, with an
/// optional dilation that closes one-pixel gaps where page corners meet.
#[derive(Debug, Clone, PartialEq)]
pub struct CannyEdgeDetector {
    pub blur_sigma: f32,
    pub low_threshold: f32,
    pub high_threshold: f32,
    pub dilation: u8,
}

impl Default for CannyEdgeDetector {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            low_threshold: 75.0,
            high_threshold: 200.0,
            dilation: 1,
        }
    }
}

impl CannyEdgeDetector {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            blur_sigma: config.blur_sigma,
            low_threshold: config.canny_low,
            high_threshold: config.canny_high,
            dilation: config.edge_dilation,
        }
    }
}

impl EdgeDetector for CannyEdgeDetector {
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    fn detect_edges(&self, gray: &GrayImage) -> GrayImage {
        let blurred = gaussian_blur_f32(gray, self.blur_sigma);
        let edges = canny(&blurred, self.low_threshold, self.high_threshold);
        let edges = if self.dilation > 0 {
            dilate(&edges, Norm::LInf, self.dilation)
        } else {
            edges
        };
        debug!(
            edge_pixels = edges.pixels().filter(|p| p.0[0] > 0).count(),
            "Edge map computed"
        );
        edges
    }
}

/// Suzuki–Abe border following via `imageproc::contours::find_contours`.
///
/// Both outer borders and hole borders are returned, so a closed edge ring
/// yields its outside and its inside as separate candidates. Contours with
/// fewer than three points enclose nothing and are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderFollowingContourFinder;

impl ContourFinder for BorderFollowingContourFinder {
    #[instrument(skip_all)]
    fn find_contours(&self, edges: &GrayImage) -> Vec<Contour> {
        let traced = find_contours::<u32>(edges);
        let contours: Vec<Contour> = traced
            .into_iter()
            .filter(|c| c.points.len() >= 3)
            .map(|c| {
                c.points
                    .into_iter()
                    .map(|p| Point2D::new(f64::from(p.x), f64::from(p.y)))
                    .collect()
            })
            .collect();
        debug!(count = contours.len(), "Contours traced");
        contours
    }
}
