// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — corner ordering, document location, homography,
// perspective rectification, enhancement and optical character recognition.

pub mod corners;
pub mod enhance;
pub mod homography;
pub mod locate;
pub mod polygon;
pub mod rectify;
pub mod stages;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use corners::order_corners;
pub use enhance::ScanEnhancer;
pub use homography::Homography;
pub use locate::DocumentLocator;
pub use rectify::{PerspectiveRectifier, RectifiedImage};

#[cfg(feature = "ocr")]
pub use ocr::OcrEngine;
