// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// textlexiq-document — Document scanning for TextLexiq.
//
// Locates a photographed page's four-sided boundary, orders its corners,
// flattens the perspective with a homography, and binarizes the result for
// text recognition (OCR behind the `ocr` feature).

pub mod image;
pub mod pipeline;
pub mod scan;

// Re-export the primary types so callers can use `textlexiq_document::ScanPipeline` etc.
pub use crate::image::processor::ImageProcessor;
pub use pipeline::{OcrOutput, PreprocessOutput, PreprocessedImage, Rectification, ScanPipeline};
pub use scan::corners::order_corners;
pub use scan::enhance::ScanEnhancer;
pub use scan::locate::DocumentLocator;
pub use scan::rectify::{PerspectiveRectifier, RectifiedImage};
pub use scan::stages::{Binarizer, ContourFinder, EdgeDetector, TextRecognizer};

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrEngine;
