// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for TextLexiq.

use thiserror::Error;

/// Top-level error type for all TextLexiq operations.
///
/// A missed document boundary is not an error (it is reported as `None` by the
/// locator). `Rectification` is produced by the rectifier but is absorbed by
/// the scan pipeline, which falls back to the unrectified image.
#[derive(Debug, Error)]
pub enum TextLexiqError {
    // -- Input --
    #[error("could not read image: {0}")]
    Input(String),

    // -- Processing --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("rectification failed: {0}")]
    Rectification(String),

    #[error("binarization failed: {0}")]
    Binarization(String),

    #[error("OCR failed: {0}")]
    OcrError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("not available in this build: {0}")]
    Unsupported(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TextLexiqError>;
