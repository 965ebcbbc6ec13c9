// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the scan wrapper.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives whether a front-end offers "try again" or "pick another
// file".

use crate::error::TextLexiqError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something outside the input failed (disk full, model missing); retrying
    /// after fixing the environment can succeed.
    Transient,
    /// User must do something (retake the photo, fix a setting).
    ActionRequired,
    /// Cannot be fixed by retrying: wrong format, unsupported build.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether running the same command again may succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `TextLexiqError` into a `HumanError`.
pub fn humanize_error(err: &TextLexiqError) -> HumanError {
    match err {
        TextLexiqError::Input(detail) => HumanError {
            message: "We couldn't open this picture.".into(),
            suggestion: format!(
                "Check that the file exists and is a JPEG, PNG or TIFF image. ({detail})"
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        TextLexiqError::ImageError(detail) => HumanError {
            message: "Something went wrong while processing the picture.".into(),
            suggestion: format!("Try again with a smaller or different photo. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        TextLexiqError::Rectification(_) => HumanError {
            message: "We couldn't straighten the page.".into(),
            suggestion: "Retake the photo with all four corners of the page visible.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        TextLexiqError::Binarization(detail) => HumanError {
            message: "We couldn't clean up the page for reading.".into(),
            suggestion: format!("Retake the photo in even lighting. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        TextLexiqError::OcrError(detail) => humanize_ocr_error(detail),

        TextLexiqError::Config(detail) => HumanError {
            message: "The scan settings are not valid.".into(),
            suggestion: format!("Fix the configuration file and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        TextLexiqError::Unsupported(detail) => HumanError {
            message: "This feature isn't available in this version.".into(),
            suggestion: format!("Install a build with text recognition enabled. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        TextLexiqError::Io(io_err) => HumanError {
            message: "We couldn't read or write a file.".into(),
            suggestion: format!(
                "Check that the folder exists and that you have permission to write to it. ({io_err})"
            ),
            retriable: true,
            severity: Severity::Transient,
        },

        TextLexiqError::Serialization(detail) => HumanError {
            message: "A settings file is damaged.".into(),
            suggestion: format!("Check the JSON syntax of the configuration file. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

fn humanize_ocr_error(detail: &str) -> HumanError {
    let lower = detail.to_lowercase();
    if lower.contains("model not found") || lower.contains("failed to load") {
        HumanError {
            message: "The text recognition models are missing.".into(),
            suggestion: "Download the models (run `ocrs` once) or pass --model-dir.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else {
        HumanError {
            message: "We couldn't read the text on this page.".into(),
            suggestion: format!("Retake the photo closer to the page. (Detail: {detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    }
}
