// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Canonical corner ordering for detected document quadrilaterals.

use textlexiq_core::{Point2D, Quad};

/// Order four unordered points as (top-left, top-right, bottom-right,
/// bottom-left).
///
/// For each point `sum = x + y` and `diff = y - x`:
///
/// - top-left has the smallest sum, bottom-right the largest;
/// - top-right has the smallest diff, bottom-left the largest.
///
/// The two diagonals are separated without computing any angle, which holds
/// up for the moderate rotation of a hand-held photo.
///
/// # Ties
///
/// When several points share the extreme sum or diff the first one in input
/// order is chosen. Inputs that tie (a square rotated by 45 degrees, collinear
/// or repeated points) can therefore yield a quad that reuses a point; that is
/// accepted for such degenerate shapes.
pub fn order_corners(points: [Point2D; 4]) -> Quad {
    let sum = |p: &Point2D| p.x + p.y;
    let diff = |p: &Point2D| p.y - p.x;

    Quad::from_ordered([
        extreme(&points, sum, Extreme::Min),
        extreme(&points, diff, Extreme::Min),
        extreme(&points, sum, Extreme::Max),
        extreme(&points, diff, Extreme::Max),
    ])
}

#[derive(Clone, Copy)]
enum Extreme {
    Min,
    Max,
}

/// First point holding the extreme key (strict comparison keeps the earliest).
fn extreme(points: &[Point2D; 4], key: impl Fn(&Point2D) -> f64, which: Extreme) -> Point2D {
    let mut best = points[0];
    let mut best_key = key(&best);
    for point in &points[1..] {
        let k = key(point);
        let better = match which {
            Extreme::Min => k < best_key,
            Extreme::Max => k > best_key,
        };
        if better {
            best = *point;
            best_key = k;
        }
    }
    best
}
