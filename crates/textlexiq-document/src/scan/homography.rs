// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Projective transform (homography) from four point correspondences.

use imageproc::geometric_transformations::Projection;
use textlexiq_core::Point2D;
use textlexiq_core::error::{Result, TextLexiqError};

/// Twice the area of any corner triangle must exceed this fraction of the
/// squared point spread.
const DEGENERATE_TOLERANCE: f64 = 1e-6;

/// Projective transform between two quadrilaterals, backed by an `imageproc`
/// [`Projection`] so the same value drives point mapping and warping.
#[derive(Debug, Clone, Copy)]
pub struct Homography {
    projection: Projection,
}

impl Homography {
    /// Solve for the homography taking each `src[i]` to `dst[i]`.
    ///
    /// Three collinear (or coincident) corners on either side leave the
    /// system without a unique solution and are reported as
    /// [`TextLexiqError::Rectification`].
    pub fn from_correspondences(src: &[Point2D; 4], dst: &[Point2D; 4]) -> Result<Self> {
        if src.iter().chain(dst).any(|p| !p.is_finite()) {
            return Err(TextLexiqError::Rectification(
                "corner coordinates must be finite".into(),
            ));
        }
        if is_degenerate(src) || is_degenerate(dst) {
            return Err(TextLexiqError::Rectification(
                "corner points are collinear or coincident; the perspective transform is singular"
                    .into(),
            ));
        }

        let to_f32 = |p: &Point2D| (p.x as f32, p.y as f32);
        let projection =
            Projection::from_control_points(src.each_ref().map(to_f32), dst.each_ref().map(to_f32))
                .ok_or_else(|| {
                    TextLexiqError::Rectification("perspective transform is not invertible".into())
                })?;
        Ok(Self { projection })
    }

    /// Map a point through the transform. `None` when the point lands on the
    /// line at infinity.
    pub fn apply(&self, point: Point2D) -> Option<Point2D> {
        let (x, y) = self.projection * (point.x as f32, point.y as f32);
        let mapped = Point2D::new(f64::from(x), f64::from(y));
        mapped.is_finite().then_some(mapped)
    }

    /// The transform mapping destination coordinates back to the source.
    pub fn inverse(&self) -> Self {
        Self {
            projection: self.projection.invert(),
        }
    }

    /// The underlying projection, for [`imageproc::geometric_transformations::warp_into`].
    pub fn projection(&self) -> Projection {
        self.projection
    }
}

/// True when some three of the four points are (nearly) collinear.
fn is_degenerate(points: &[Point2D; 4]) -> bool {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let spread_sq = (max_x - min_x).powi(2) + (max_y - min_y).powi(2);
    let tolerance = DEGENERATE_TOLERANCE * spread_sq;

    [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)]
        .into_iter()
        .any(|(i, j, k)| {
            let (a, b, c) = (points[i], points[j], points[k]);
            let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            cross.abs() <= tolerance
        })
}
