// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Closed-polygon simplification on top of imageproc's Douglas–Peucker.

use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;

/// Simplify a closed ring so that no removed vertex lies farther than
/// `epsilon` from the simplified outline.
///
/// The ring is cut at two mutually distant vertices and each half goes
/// through [`approximate_polygon_dp`] as an open curve. Both cut vertices lie
/// on the convex hull, so they are kept as corners.
///
/// Rings of three or fewer vertices, and non-positive `epsilon`, return the
/// input unchanged.
pub fn simplify_closed(ring: &[Point<f64>], epsilon: f64) -> Vec<Point<f64>> {
    let n = ring.len();
    if n <= 3 || !(epsilon > 0.0) {
        return ring.to_vec();
    }

    let first = farthest_from(ring, ring[0]);
    let second = farthest_from(ring, ring[first]);
    if first == second {
        // Every vertex coincides.
        return vec![ring[0]];
    }

    let (start, end) = (first.min(second), first.max(second));
    let mut outline = approximate_polygon_dp(&ring[start..=end], epsilon, false);

    let wrapped: Vec<Point<f64>> = ring[end..].iter().chain(&ring[..=start]).copied().collect();
    let back = approximate_polygon_dp(&wrapped, epsilon, false);
    // `back` runs end..=start; both endpoints are already in `outline`.
    if back.len() > 2 {
        outline.extend_from_slice(&back[1..back.len() - 1]);
    }
    outline
}

/// Index of the vertex farthest from `origin` (first one on ties).
fn farthest_from(ring: &[Point<f64>], origin: Point<f64>) -> usize {
    let mut best = 0;
    let mut best_distance = 0.0;
    for (i, &point) in ring.iter().enumerate() {
        let d = distance(point, origin);
        if d > best_distance {
            best = i;
            best_distance = d;
        }
    }
    best
}

fn distance(a: Point<f64>, b: Point<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}
