// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TextLexiq — command-line entry point.
//
// Prints exactly one JSON object on stdout per invocation; logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use textlexiq_core::error::Result;
use textlexiq_core::human_errors::humanize_error;
use textlexiq_core::{ScanConfig, TextLexiqError};
use textlexiq_document::ScanPipeline;
use tracing::{error, info};

const OUTPUT_HELP: &str = "\
Output:
  One JSON object on stdout.
    preprocess  {\"status\": \"success\", \"output_path\": ..., \"rectification\": {...}}
    ocr         {\"status\": \"success\", \"result\": {\"text\": ..., \"processed_image_path\": ..., \"rectification\": {...}}}
    on failure  {\"status\": \"error\", \"message\": ..., \"hint\": ...}  (exit code 1)
  `rectification.outcome` is one of rectified, not_found, failed or skipped;
  `hint` suggests how to fix the error.";

#[derive(Parser, Debug)]
#[command(name = "textlexiq")]
#[command(about = "Flatten, clean up and read photographed documents")]
#[command(version)]
#[command(after_help = OUTPUT_HELP)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON file overriding the default scan settings
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding text-detection.rten and text-recognition.rten
    #[arg(long, global = true, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Straighten slightly rotated text before binarizing
    #[arg(long, global = true)]
    deskew: bool,

    /// Log progress to stderr (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Detect, flatten and binarize the page; write `<IMAGE>.processed.png`
    Preprocess {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,
    },
    /// Preprocess, then recognise the page's text
    Ocr {
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "Command failed");
            println!("{}", error_report(&err));
            ExitCode::FAILURE
        }
    }
}

/// stderr subscriber; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn run(cli: &Cli) -> Result<Value> {
    let pipeline = ScanPipeline::new(load_config(cli)?)?;

    match &cli.command {
        Command::Preprocess { image_path } => {
            info!(path = %image_path.display(), "Preprocessing");
            let output = pipeline.preprocess(image_path)?;
            Ok(json!({
                "status": "success",
                "output_path": output.output_path,
                "rectification": output.rectification,
            }))
        }
        Command::Ocr { image_path } => {
            info!(path = %image_path.display(), "Running OCR");
            let output = recognize(&pipeline, image_path, cli.model_dir.as_deref())?;
            Ok(json!({ "status": "success", "result": output }))
        }
    }
}

fn load_config(cli: &Cli) -> Result<ScanConfig> {
    let mut config = match &cli.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if cli.deskew {
        config.deskew = true;
    }
    Ok(config)
}

#[cfg(feature = "ocr")]
fn recognize(
    pipeline: &ScanPipeline,
    image_path: &Path,
    model_dir: Option<&Path>,
) -> Result<textlexiq_document::OcrOutput> {
    use textlexiq_document::OcrEngine;

    let engine = match model_dir {
        Some(dir) => OcrEngine::from_model_dir(dir)?,
        None => OcrEngine::with_defaults()?,
    };
    pipeline.ocr(image_path, &engine)
}

#[cfg(not(feature = "ocr"))]
fn recognize(
    _pipeline: &ScanPipeline,
    _image_path: &Path,
    _model_dir: Option<&Path>,
) -> Result<textlexiq_document::OcrOutput> {
    Err(TextLexiqError::Unsupported(
        "text recognition (rebuild with the `ocr` feature)".into(),
    ))
}

fn error_report(err: &TextLexiqError) -> Value {
    let human = humanize_error(err);
    json!({
        "status": "error",
        "message": err.to_string(),
        "hint": human.suggestion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use image::{DynamicImage, Rgb, RgbImage};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn long_help_documents_json_fields() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("rectification"));
        assert!(help.contains("\"hint\""));
        assert!(help.contains("not_found"));
    }

    #[test]
    fn parses_subcommands_and_global_flags() {
        let cli = parse(&["textlexiq", "ocr", "page.jpg", "--model-dir", "/models", "-vv"]);
        assert_eq!(
            cli.command,
            Command::Ocr {
                image_path: PathBuf::from("page.jpg")
            }
        );
        assert_eq!(cli.model_dir, Some(PathBuf::from("/models")));
        assert_eq!(cli.verbose, 2);

        let cli = parse(&["textlexiq", "--deskew", "preprocess", "scan.png"]);
        assert!(cli.deskew);
        assert!(matches!(cli.command, Command::Preprocess { .. }));
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["textlexiq", "translate", "x.png"]).is_err());
        assert!(Cli::try_parse_from(["textlexiq", "preprocess"]).is_err());
    }

    #[test]
    fn preprocess_reports_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.png");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 60, Rgb([200, 200, 200])))
            .save(&input)
            .unwrap();

        let cli = parse(&["textlexiq", "preprocess", input.to_str().unwrap()]);
        let report = run(&cli).unwrap();
        assert_eq!(report["status"], "success");
        assert_eq!(
            report["output_path"],
            json!(dir.path().join("photo.png.processed.png"))
        );
        assert_eq!(report["rectification"]["outcome"], "not_found");
    }

    #[test]
    fn missing_image_becomes_error_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("absent.jpg");
        let cli = parse(&["textlexiq", "preprocess", input.to_str().unwrap()]);

        let err = run(&cli).unwrap_err();
        let report = error_report(&err);
        assert_eq!(report["status"], "error");
        assert!(report["message"].as_str().unwrap().starts_with("could not read image"));
        assert!(report["hint"].is_string());
    }

    #[test]
    fn invalid_config_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("scan.json");
        std::fs::write(&config, r#"{ "binarize_block_size": 4 }"#).unwrap();

        let cli = parse(&[
            "textlexiq",
            "preprocess",
            "page.png",
            "--config",
            config.to_str().unwrap(),
        ]);
        assert!(matches!(run(&cli), Err(TextLexiqError::Config(_))));
    }

    #[test]
    fn ocr_without_models_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.png");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb([255, 255, 255])))
            .save(&input)
            .unwrap();

        let cli = parse(&[
            "textlexiq",
            "ocr",
            input.to_str().unwrap(),
            "--model-dir",
            dir.path().to_str().unwrap(),
        ]);
        let err = run(&cli).unwrap_err();
        assert!(matches!(
            err,
            TextLexiqError::OcrError(_) | TextLexiqError::Unsupported(_)
        ));
    }
}
