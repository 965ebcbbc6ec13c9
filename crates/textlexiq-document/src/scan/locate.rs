// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document boundary selection from traced edge contours.

use imageproc::geometry::{arc_length, contour_area};
use imageproc::point::Point;
use textlexiq_core::{Contour, Point2D, Quad, ScanConfig};
use tracing::{debug, info, instrument};

use super::corners::order_corners;
use super::polygon::simplify_closed;

/// Picks the document outline from a set of candidate contours.
///
/// The search is greedy: candidates are ranked by enclosed area, only the
/// largest `candidate_limit` are considered, and the first whose simplified
/// polygon has exactly four vertices wins. A photographed page is assumed to
/// be the dominant foreground shape, so the largest plausible quadrilateral is
/// taken without scoring the others.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLocator {
    candidate_limit: usize,
    epsilon_factor: f64,
    min_area: f64,
}

impl Default for DocumentLocator {
    fn default() -> Self {
        Self {
            candidate_limit: 5,
            epsilon_factor: 0.02,
            min_area: 0.0,
        }
    }
}

impl DocumentLocator {
    pub fn new(candidate_limit: usize, epsilon_factor: f64) -> Self {
        Self {
            candidate_limit,
            epsilon_factor,
            min_area: 0.0,
        }
    }

    /// Stop the search at the first candidate smaller than `min_area`
    /// (detection-resolution pixels²).
    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.candidate_limit, config.epsilon_factor)
            .with_min_area(config.min_contour_area)
    }

    /// Select the document quadrilateral among `contours`.
    ///
    /// `scale_ratio` maps detection-resolution coordinates back to the
    /// original image (original height / detection height). Returns `None`
    /// when no candidate simplifies to four vertices; callers fall back to the
    /// full image.
    #[instrument(skip_all, fields(contours = contours.len(), scale_ratio))]
    pub fn locate(&self, contours: &[Contour], scale_ratio: f64) -> Option<Quad> {
        let mut ranked: Vec<(f64, Vec<Point<f64>>)> = contours
            .iter()
            .map(|contour| {
                let ring: Vec<Point<f64>> =
                    contour.points().iter().map(|p| Point::new(p.x, p.y)).collect();
                (contour_area(&ring), ring)
            })
            .collect();
        // Stable sort: equal areas keep their tracing order.
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        ranked.truncate(self.candidate_limit);

        for (rank, (area, ring)) in ranked.into_iter().enumerate() {
            if area < self.min_area {
                debug!(rank, area, min_area = self.min_area, "Remaining candidates too small");
                break;
            }

            let perimeter = arc_length(&ring, true);
            let approx: Vec<Point2D> = simplify_closed(&ring, self.epsilon_factor * perimeter)
                .into_iter()
                .map(|p| Point2D::new(p.x, p.y))
                .collect();
            debug!(
                rank,
                area,
                perimeter,
                vertices = approx.len(),
                "Candidate simplified"
            );

            if let Ok(corners) = <[Point2D; 4]>::try_from(approx) {
                let quad = order_corners(corners.map(|p| p.scale(scale_ratio)));
                info!(
                    rank,
                    top_left = %quad.top_left(),
                    top_right = %quad.top_right(),
                    bottom_right = %quad.bottom_right(),
                    bottom_left = %quad.bottom_left(),
                    "Document boundary located"
                );
                return Some(quad);
            }
        }

        debug!("No four-sided candidate among the largest contours");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn densify(corners: &[(f64, f64)], step: f64) -> Contour {
        let corners: Vec<Point2D> = corners.iter().map(|&c| Point2D::from(c)).collect();
        let mut out = Vec::new();
        for i in 0..corners.len() {
            let (a, b) = (corners[i], corners[(i + 1) % corners.len()]);
            let samples = (a.distance(&b) / step).ceil().max(1.0) as usize;
            for s in 0..samples {
                let t = s as f64 / samples as f64;
                out.push(Point2D::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)));
            }
        }
        Contour::new(out)
    }

    fn circle(cx: f64, cy: f64, r: f64) -> Contour {
        (0..120)
            .map(|i| {
                let (sin, cos) = (f64::from(i) * 3.0).to_radians().sin_cos();
                Point2D::new(cx + r * cos, cy + r * sin)
            })
            .collect()
    }

    fn triangle(x: f64, y: f64, size: f64) -> Contour {
        densify(&[(x, y), (x + size, y), (x + size / 2.0, y + size)], 1.0)
    }

    #[test]
    fn finds_large_quad_among_small_fragments() {
        // Rotated page at detection resolution.
        let page = [(62.0, 40.0), (300.0, 58.0), (284.0, 455.0), (41.0, 437.0)];
        let contours = vec![
            circle(30.0, 30.0, 8.0),
            triangle(320.0, 10.0, 15.0),
            densify(&page, 1.0),
            densify(&[(5.0, 5.0), (12.0, 5.0), (12.0, 12.0), (5.0, 12.0)], 1.0),
            circle(200.0, 480.0, 5.0),
        ];

        let quad = DocumentLocator::default()
            .locate(&contours, 2.0)
            .expect("page should be found");

        let expected = [(124.0, 80.0), (600.0, 116.0), (568.0, 910.0), (82.0, 874.0)];
        for (got, want) in quad.corners().iter().zip(expected) {
            assert!(
                got.distance(&Point2D::from(want)) < 5.0,
                "corner {got:?} too far from {want:?}"
            );
        }
    }

    #[test]
    fn largest_quad_wins_over_smaller_quad() {
        let big = densify(&[(10.0, 10.0), (400.0, 10.0), (400.0, 480.0), (10.0, 480.0)], 1.0);
        let small = densify(&[(50.0, 50.0), (150.0, 50.0), (150.0, 150.0), (50.0, 150.0)], 1.0);

        let quad = DocumentLocator::default()
            .locate(&[small, big], 1.0)
            .unwrap();
        assert_eq!(quad.top_left(), Point2D::new(10.0, 10.0));
        assert_eq!(quad.bottom_right(), Point2D::new(400.0, 480.0));
    }

    #[test]
    fn not_found_when_quad_is_outside_the_top_five() {
        let contours = vec![
            circle(100.0, 100.0, 90.0),
            circle(300.0, 100.0, 85.0),
            triangle(0.0, 200.0, 150.0),
            circle(100.0, 400.0, 80.0),
            triangle(200.0, 300.0, 140.0),
            // Sixth by area: never considered.
            densify(&[(0.0, 0.0), (40.0, 0.0), (40.0, 40.0), (0.0, 40.0)], 1.0),
        ];
        assert!(DocumentLocator::default().locate(&contours, 1.0).is_none());
        assert!(DocumentLocator::new(6, 0.02).locate(&contours, 1.0).is_some());
    }

    #[test]
    fn empty_input_is_not_found() {
        assert!(DocumentLocator::default().locate(&[], 1.0).is_none());
    }

    #[test]
    fn min_area_stops_the_search() {
        let small = densify(&[(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)], 1.0);
        let locator = DocumentLocator::default().with_min_area(1000.0);
        assert!(locator.locate(&[small.clone()], 1.0).is_none());
        assert!(DocumentLocator::default().locate(&[small], 1.0).is_some());
    }

    #[test]
    fn from_config_uses_tuned_defaults() {
        assert_eq!(
            DocumentLocator::from_config(&ScanConfig::default()),
            DocumentLocator::default()
        );
    }
}
