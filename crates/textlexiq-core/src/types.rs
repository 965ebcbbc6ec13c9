// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core geometry types for the TextLexiq scan pipeline.

use serde::{Deserialize, Serialize};

/// A floating-point coordinate in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Multiply both coordinates by `ratio`.
    pub fn scale(&self, ratio: f64) -> Self {
        Self::new(self.x * ratio, self.y * ratio)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<(f32, f32)> for Point2D {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(f64::from(x), f64::from(y))
    }
}

impl std::fmt::Display for Point2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Four document corners in canonical order: top-left, top-right,
/// bottom-right, bottom-left.
///
/// The ordering is established by the corner orderer in
/// `textlexiq-document`; [`Quad::from_ordered`] is for callers that already
/// hold corners in that order (e.g. a crop screen that labels its handles).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    corners: [Point2D; 4],
}

impl Quad {
    /// Wrap corners that are already in (TL, TR, BR, BL) order.
    pub const fn from_ordered(corners: [Point2D; 4]) -> Self {
        Self { corners }
    }

    pub fn corners(&self) -> &[Point2D; 4] {
        &self.corners
    }

    pub fn top_left(&self) -> Point2D {
        self.corners[0]
    }

    pub fn top_right(&self) -> Point2D {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> Point2D {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> Point2D {
        self.corners[3]
    }

    /// Scale every corner by `ratio`. A positive ratio preserves the ordering.
    pub fn scaled(&self, ratio: f64) -> Self {
        Self::from_ordered(self.corners.map(|p| p.scale(ratio)))
    }

    /// Express the corners as fractions (0..1) of an image of the given size,
    /// the representation used by the mobile crop screen.
    pub fn normalized(&self, width: u32, height: u32) -> Self {
        let (w, h) = (f64::from(width.max(1)), f64::from(height.max(1)));
        Self::from_ordered(self.corners.map(|p| Point2D::new(p.x / w, p.y / h)))
    }

    /// Inverse of [`Quad::normalized`]: map 0..1 fractions back to pixels.
    pub fn denormalized(&self, width: u32, height: u32) -> Self {
        let (w, h) = (f64::from(width), f64::from(height));
        Self::from_ordered(self.corners.map(|p| Point2D::new(p.x * w, p.y * h)))
    }
}

/// A closed polygon candidate traced from an edge map.
///
/// The closing edge (last vertex back to the first) is implicit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contour {
    points: Vec<Point2D>,
}

impl Contour {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<Point2D> for Contour {
    fn from_iter<I: IntoIterator<Item = Point2D>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
