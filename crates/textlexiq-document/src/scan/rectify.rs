// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — flatten a detected document quadrilateral to a
// top-down rectangle.

use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, warp_into};
use textlexiq_core::error::{Result, TextLexiqError};
use textlexiq_core::{Point2D, Quad};
use tracing::{debug, info, instrument};

use super::homography::Homography;

const INTERPOLATION: Interpolation = Interpolation::Bilinear;

/// Output of [`PerspectiveRectifier::rectify`]: the flattened page plus the
/// transform that produced it.
#[derive(Debug, Clone)]
pub struct RectifiedImage {
    image: DynamicImage,
    transform: Homography,
}

impl RectifiedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    /// Source-to-output mapping. Its inverse takes output pixels back to the
    /// photo.
    pub fn transform(&self) -> &Homography {
        &self.transform
    }
}

/// Warps the region inside an ordered [`Quad`] to an axis-aligned rectangle.
///
/// The output size is taken from the quad itself: the longer of the two
/// horizontal edges gives the width and the longer of the two vertical edges
/// gives the height, so the page is never shrunk below its photographed size.
/// Sampling is bilinear; output pixels whose source falls outside the photo
/// are black.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerspectiveRectifier;

impl PerspectiveRectifier {
    pub fn new() -> Self {
        Self
    }

    /// Flatten `quad` (in canonical TL, TR, BR, BL order) out of `image`.
    ///
    /// # Errors
    ///
    /// [`TextLexiqError::Rectification`] when the corners are degenerate
    /// (collinear, coincident, or spanning less than two pixels in either
    /// direction) or when the flattened page would be larger than the
    /// photo's diagonal on either side.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn rectify(&self, image: &DynamicImage, quad: &Quad) -> Result<RectifiedImage> {
        let (out_w, out_h) = output_dimensions(quad);
        debug!(out_w, out_h, "Output dimensions computed");
        if out_w < 2 || out_h < 2 {
            return Err(TextLexiqError::Rectification(format!(
                "document outline is too thin to flatten ({out_w}x{out_h})"
            )));
        }
        let limit = diagonal_pixels(image.width(), image.height());
        if out_w > limit || out_h > limit {
            return Err(TextLexiqError::Rectification(format!(
                "document outline ({out_w}x{out_h}) exceeds the {limit} px image diagonal"
            )));
        }

        let destination = destination_corners(out_w, out_h);
        let transform = Homography::from_correspondences(quad.corners(), &destination)?;
        let projection = transform.projection();

        let warped = match image {
            DynamicImage::ImageLuma8(gray) => {
                let mut output = GrayImage::new(out_w, out_h);
                warp_into(gray, &projection, INTERPOLATION, Luma([0]), &mut output);
                DynamicImage::ImageLuma8(output)
            }
            other => {
                let rgba = other.to_rgba8();
                let mut output = RgbaImage::new(out_w, out_h);
                let fill = Rgba([0, 0, 0, 255]);
                warp_into(&rgba, &projection, INTERPOLATION, fill, &mut output);
                DynamicImage::ImageRgba8(output)
            }
        };

        info!(out_w, out_h, "Perspective rectification applied");
        Ok(RectifiedImage {
            image: warped,
            transform,
        })
    }
}

/// Width and height of the flattened page, truncated to whole pixels.
pub fn output_dimensions(quad: &Quad) -> (u32, u32) {
    let width_bottom = quad.bottom_right().distance(&quad.bottom_left());
    let width_top = quad.top_right().distance(&quad.top_left());
    let height_right = quad.top_right().distance(&quad.bottom_right());
    let height_left = quad.top_left().distance(&quad.bottom_left());

    let width = width_bottom.max(width_top);
    let height = height_right.max(height_left);
    (to_pixels(width), to_pixels(height))
}

/// Target rectangle corners for an output of `width` x `height` pixels.
pub fn destination_corners(width: u32, height: u32) -> [Point2D; 4] {
    let right = f64::from(width) - 1.0;
    let bottom = f64::from(height) - 1.0;
    [
        Point2D::new(0.0, 0.0),
        Point2D::new(right, 0.0),
        Point2D::new(right, bottom),
        Point2D::new(0.0, bottom),
    ]
}

/// Longest straight line that fits in a `width` x `height` image, rounded up.
fn diagonal_pixels(width: u32, height: u32) -> u32 {
    to_pixels(f64::from(width).hypot(f64::from(height)).ceil())
}

fn to_pixels(length: f64) -> u32 {
    if length.is_finite() && length > 0.0 {
        length.floor().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}
