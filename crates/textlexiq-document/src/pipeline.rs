// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline — photo in, binarized page (and optionally text) out.
//
// detect (working resolution) -> order corners -> rectify (full resolution)
// -> denoise -> grayscale -> [deskew] -> binarize -> [recognize]
//
// A detection miss or a degenerate outline is absorbed: the page is processed
// unrectified and the outcome is recorded as a `Rectification` value. Only
// unreadable input and downstream (binarization, recognition, output) failures
// are returned as errors.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage};
use serde::Serialize;
use textlexiq_core::error::Result;
use textlexiq_core::{Point2D, Quad, ScanConfig};
use tracing::{info, instrument, warn};

use crate::image::processor::ImageProcessor;
use crate::scan::corners::order_corners;
use crate::scan::enhance::{ScanEnhancer, binarizer_from_config};
use crate::scan::locate::DocumentLocator;
use crate::scan::rectify::PerspectiveRectifier;
use crate::scan::stages::{
    Binarizer, BorderFollowingContourFinder, CannyEdgeDetector, ContourFinder, EdgeDetector,
    TextRecognizer,
};

/// What happened to the perspective of a processed page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Rectification {
    /// The page inside `quad` (original image coordinates) was flattened.
    Rectified { quad: Quad },
    /// No four-sided outline among the largest contours; the full photo was used.
    NotFound,
    /// An outline was found or supplied but could not be flattened.
    Failed { reason: String },
    /// Detection was not attempted.
    Skipped,
}

impl Rectification {
    pub fn is_rectified(&self) -> bool {
        matches!(self, Self::Rectified { .. })
    }

    pub fn quad(&self) -> Option<&Quad> {
        match self {
            Self::Rectified { quad } => Some(quad),
            _ => None,
        }
    }
}

/// In-memory result of preprocessing.
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    /// Black text on white, 0 or 255 per pixel.
    pub image: GrayImage,
    pub rectification: Rectification,
}

/// Result of [`ScanPipeline::preprocess`].
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessOutput {
    pub output_path: PathBuf,
    pub rectification: Rectification,
}

/// Result of [`ScanPipeline::ocr`].
#[derive(Debug, Clone, Serialize)]
pub struct OcrOutput {
    /// Recognised text with surrounding whitespace trimmed.
    pub text: String,
    pub processed_image_path: PathBuf,
    pub rectification: Rectification,
}

/// Photo-to-page processing with pluggable edge, contour and binarization
/// stages.
///
/// The pipeline holds no per-image state and is `Send + Sync`, so one
/// instance can serve several worker threads.
pub struct ScanPipeline {
    config: ScanConfig,
    edge_detector: Box<dyn EdgeDetector>,
    contour_finder: Box<dyn ContourFinder>,
    binarizer: Box<dyn Binarizer>,
    locator: DocumentLocator,
    rectifier: PerspectiveRectifier,
}

impl Default for ScanPipeline {
    fn default() -> Self {
        Self::build(ScanConfig::default())
    }
}

impl ScanPipeline {
    /// Pipeline with the default `imageproc` stages tuned by `config`.
    ///
    /// # Errors
    ///
    /// [`TextLexiqError::Config`](textlexiq_core::TextLexiqError::Config) when
    /// `config` fails validation.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ScanConfig) -> Self {
        Self {
            edge_detector: Box::new(CannyEdgeDetector::from_config(&config)),
            contour_finder: Box::new(BorderFollowingContourFinder),
            binarizer: binarizer_from_config(&config),
            locator: DocumentLocator::from_config(&config),
            rectifier: PerspectiveRectifier::new(),
            config,
        }
    }

    pub fn with_edge_detector(mut self, detector: impl EdgeDetector + 'static) -> Self {
        self.edge_detector = Box::new(detector);
        self
    }

    pub fn with_contour_finder(mut self, finder: impl ContourFinder + 'static) -> Self {
        self.contour_finder = Box::new(finder);
        self
    }

    pub fn with_binarizer(mut self, binarizer: impl Binarizer + 'static) -> Self {
        self.binarizer = Box::new(binarizer);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    // -- Detection ------------------------------------------------------------

    /// Find the page outline in `image`, in original image coordinates.
    ///
    /// Edges and contours are computed on a copy scaled to the configured
    /// working height; the locator maps the corners back with the ratio
    /// `original_height / working_height`.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect_document(&self, image: &DynamicImage) -> Option<Quad> {
        if image.width() == 0 || image.height() == 0 {
            return None;
        }
        let gray = DynamicImage::ImageLuma8(image.to_luma8());
        let (working, ratio) =
            ImageProcessor::from_dynamic(gray).resize_to_height(self.config.working_height);

        let edges = self.edge_detector.detect_edges(&working.into_luma());
        let contours = self.contour_finder.find_contours(&edges);
        self.locator.locate(&contours, ratio)
    }

    /// Flatten `quad` out of `image`, or hand `image` back untouched with the
    /// reason when there is no usable outline.
    fn rectify_or_original(
        &self,
        image: DynamicImage,
        quad: Option<Quad>,
    ) -> (DynamicImage, Rectification) {
        let Some(quad) = quad else {
            warn!("No document outline found; using the full image");
            return (image, Rectification::NotFound);
        };
        match self.rectifier.rectify(&image, &quad) {
            Ok(rectified) => (rectified.into_image(), Rectification::Rectified { quad }),
            Err(err) => {
                warn!(%err, "Rectification failed; using the full image");
                (
                    image,
                    Rectification::Failed {
                        reason: err.to_string(),
                    },
                )
            }
        }
    }

    // -- Preprocessing ----------------------------------------------------------

    /// Detect, rectify and binarize a decoded photo.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn preprocess_image(&self, image: DynamicImage) -> Result<PreprocessedImage> {
        let quad = self.detect_document(&image);
        let (page, rectification) = self.rectify_or_original(image, quad);
        self.finish(page, rectification)
    }

    /// Rectify with caller-supplied corners (in any order) instead of
    /// detecting them, then binarize.
    #[instrument(skip_all)]
    pub fn preprocess_image_with_corners(
        &self,
        image: DynamicImage,
        corners: [Point2D; 4],
    ) -> Result<PreprocessedImage> {
        let quad = order_corners(corners);
        let (page, rectification) = self.rectify_or_original(image, Some(quad));
        self.finish(page, rectification)
    }

    /// Binarize without attempting detection, for pages that are already flat.
    pub fn enhance_image(&self, image: DynamicImage) -> Result<PreprocessedImage> {
        self.finish(image, Rectification::Skipped)
    }

    fn finish(&self, page: DynamicImage, rectification: Rectification) -> Result<PreprocessedImage> {
        let mut enhancer = ScanEnhancer::from_dynamic(page)
            .denoise(self.config.denoise_sigma)
            .grayscale();
        if self.config.deskew {
            enhancer = enhancer.deskew();
        }
        let image = enhancer.binarize(self.binarizer.as_ref())?.into_gray();
        info!(
            width = image.width(),
            height = image.height(),
            rectified = rectification.is_rectified(),
            "Page preprocessed"
        );
        Ok(PreprocessedImage {
            image,
            rectification,
        })
    }

    // -- File-level operations --------------------------------------------------

    /// Preprocess the photo at `path` and write the page next to it as
    /// `<path><output_suffix>`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn preprocess(&self, path: impl AsRef<Path>) -> Result<PreprocessOutput> {
        let (_, output) = self.preprocess_to_file(path.as_ref())?;
        Ok(output)
    }

    /// Preprocess the photo at `path`, write the page, and recognise its text.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn ocr(
        &self,
        path: impl AsRef<Path>,
        recognizer: &dyn TextRecognizer,
    ) -> Result<OcrOutput> {
        let (page, output) = self.preprocess_to_file(path.as_ref())?;
        let text = recognizer.recognize_text(&DynamicImage::ImageLuma8(page))?;
        let text = text.trim().to_owned();
        info!(chars = text.len(), "Text recognised");
        Ok(OcrOutput {
            text,
            processed_image_path: output.output_path,
            rectification: output.rectification,
        })
    }

    fn preprocess_to_file(&self, path: &Path) -> Result<(GrayImage, PreprocessOutput)> {
        let photo = ImageProcessor::open(path)?.into_dynamic();
        let PreprocessedImage {
            image,
            rectification,
        } = self.preprocess_image(photo)?;

        let output_path = processed_path(path, &self.config.output_suffix);
        let page = ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(image));
        page.save(&output_path)?;
        info!(output = %output_path.display(), "Processed page written");

        Ok((
            page.into_luma(),
            PreprocessOutput {
                output_path,
                rectification,
            },
        ))
    }
}

/// `input` with `suffix` appended to the full file name, so `scan.jpg`
/// becomes `scan.jpg.processed.png`.
pub fn processed_path(input: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;
    use textlexiq_core::TextLexiqError;

    /// A light page of `page_w` x `page_h` on a dark table, centred and rotated
    /// clockwise by `degrees`. Returns the photo and the true corners in
    /// (TL, TR, BR, BL) order.
    fn photographed_page(
        width: u32,
        height: u32,
        page_w: f64,
        page_h: f64,
        degrees: f64,
    ) -> (DynamicImage, [Point2D; 4]) {
        let (cx, cy) = (f64::from(width) / 2.0, f64::from(height) / 2.0);
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (hw, hh) = (page_w / 2.0, page_h / 2.0);
        let corners = [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
            .map(|(x, y)| Point2D::new(cx + x * cos - y * sin, cy + x * sin + y * cos));

        let mut img = RgbImage::from_pixel(width, height, Rgb([40, 40, 45]));
        let outline = corners.map(|c| Point::new(c.x.round() as i32, c.y.round() as i32));
        draw_polygon_mut(&mut img, &outline, Rgb([225, 225, 220]));
        (DynamicImage::ImageRgb8(img), corners)
    }

    struct FixedText(&'static str);

    impl TextRecognizer for FixedText {
        fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
            assert!(matches!(image, DynamicImage::ImageLuma8(_)));
            Ok(self.0.to_owned())
        }
    }

    struct BrokenRecognizer;

    impl TextRecognizer for BrokenRecognizer {
        fn recognize_text(&self, _: &DynamicImage) -> Result<String> {
            Err(TextLexiqError::OcrError("engine crashed".into()))
        }
    }

    fn write_photo(dir: &Path, name: &str, image: &DynamicImage) -> PathBuf {
        let path = dir.join(name);
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn rotated_page_is_detected_and_flattened() {
        let (photo, truth) = photographed_page(1000, 1400, 800.0, 1150.0, 6.0);
        let pipeline = ScanPipeline::default();

        let processed = pipeline.preprocess_image(photo).unwrap();
        let quad = processed
            .rectification
            .quad()
            .expect("page should be rectified");

        for (got, want) in quad.corners().iter().zip(truth) {
            assert!(got.distance(&want) < 5.0, "corner {got} too far from {want}");
        }

        let (w, h) = processed.image.dimensions();
        let aspect = f64::from(w) / f64::from(h);
        let true_aspect = 800.0 / 1150.0;
        assert!(
            (aspect / true_aspect - 1.0).abs() < 0.05,
            "aspect {aspect} vs {true_aspect}"
        );
        assert!(processed.image.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn blank_photo_is_processed_unrectified() {
        let photo = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 200, Rgb([128, 128, 128])));
        let processed = ScanPipeline::default().preprocess_image(photo).unwrap();
        assert_eq!(processed.rectification, Rectification::NotFound);
        assert_eq!(processed.image.dimensions(), (300, 200));
        assert!(processed.image.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn degenerate_manual_corners_fall_back_to_the_photo() {
        let photo = DynamicImage::ImageLuma8(GrayImage::from_pixel(120, 90, Luma([200])));
        let corners = [
            Point2D::new(0.0, 0.0),
            Point2D::new(30.0, 30.0),
            Point2D::new(60.0, 60.0),
            Point2D::new(90.0, 89.0),
        ];
        let processed = ScanPipeline::default()
            .preprocess_image_with_corners(photo, corners)
            .unwrap();
        assert!(matches!(processed.rectification, Rectification::Failed { .. }));
        assert_eq!(processed.image.dimensions(), (120, 90));
    }

    #[test]
    fn manual_corners_far_outside_the_photo_fall_back() {
        let photo = DynamicImage::ImageLuma8(GrayImage::from_pixel(10, 10, Luma([200])));
        let corners = [
            Point2D::new(0.0, 0.0),
            Point2D::new(6000.0, 0.0),
            Point2D::new(6000.0, 6000.0),
            Point2D::new(0.0, 6000.0),
        ];
        let processed = ScanPipeline::default()
            .preprocess_image_with_corners(photo, corners)
            .unwrap();
        assert!(matches!(processed.rectification, Rectification::Failed { .. }));
        assert_eq!(processed.image.dimensions(), (10, 10));
    }

    #[test]
    fn manual_corners_are_ordered_then_used() {
        let (photo, truth) = photographed_page(400, 500, 240.0, 330.0, -5.0);
        // Deliberately scrambled.
        let corners = [truth[2], truth[0], truth[3], truth[1]];
        let processed = ScanPipeline::default()
            .preprocess_image_with_corners(photo, corners)
            .unwrap();
        assert_eq!(processed.rectification.quad().unwrap().corners(), &truth);
        let (w, h) = processed.image.dimensions();
        assert!(w.abs_diff(240) <= 1 && h.abs_diff(330) <= 1, "{w}x{h}");
    }

    #[test]
    fn enhance_only_skips_detection() {
        let (photo, _) = photographed_page(200, 260, 120.0, 160.0, 3.0);
        let processed = ScanPipeline::default().enhance_image(photo).unwrap();
        assert_eq!(processed.rectification, Rectification::Skipped);
        assert_eq!(processed.image.dimensions(), (200, 260));
    }

    #[test]
    fn preprocess_writes_page_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let (photo, _) = photographed_page(360, 480, 240.0, 340.0, 4.0);
        let input = write_photo(dir.path(), "receipt.png", &photo);

        let output = ScanPipeline::default().preprocess(&input).unwrap();
        assert_eq!(output.output_path, dir.path().join("receipt.png.processed.png"));
        assert!(output.rectification.is_rectified());

        let page = image::open(&output.output_path).unwrap().to_luma8();
        assert!(page.width().abs_diff(240) <= 12, "width {}", page.width());
        assert!(page.height().abs_diff(340) <= 12, "height {}", page.height());

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["rectification"]["outcome"], "rectified");
    }

    #[test]
    fn ocr_trims_recognised_text() {
        let dir = tempfile::tempdir().unwrap();
        let (photo, _) = photographed_page(300, 400, 200.0, 280.0, 2.0);
        let input = write_photo(dir.path(), "note.png", &photo);

        let output = ScanPipeline::default()
            .ocr(&input, &FixedText("  Hello, world.\n\n"))
            .unwrap();
        assert_eq!(output.text, "Hello, world.");
        assert!(output.processed_image_path.exists());
    }

    #[test]
    fn recognizer_failure_is_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let (photo, _) = photographed_page(300, 400, 200.0, 280.0, 2.0);
        let input = write_photo(dir.path(), "note.png", &photo);

        let err = ScanPipeline::default()
            .ocr(&input, &BrokenRecognizer)
            .unwrap_err();
        assert!(matches!(err, TextLexiqError::OcrError(_)));
    }

    #[test]
    fn unreadable_input_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.jpg");
        std::fs::write(&input, b"\xff\xd8 truncated").unwrap();

        let err = ScanPipeline::default().preprocess(&input).unwrap_err();
        assert!(matches!(err, TextLexiqError::Input(_)));
        assert!(!processed_path(&input, ".processed.png").exists());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ScanConfig {
            binarize_block_size: 30,
            ..ScanConfig::default()
        };
        assert!(matches!(
            ScanPipeline::new(config),
            Err(TextLexiqError::Config(_))
        ));
    }

    #[test]
    fn custom_stages_are_used() {
        struct NoEdges;
        impl EdgeDetector for NoEdges {
            fn detect_edges(&self, gray: &GrayImage) -> GrayImage {
                GrayImage::new(gray.width(), gray.height())
            }
        }

        let (photo, _) = photographed_page(300, 400, 200.0, 280.0, 2.0);
        let processed = ScanPipeline::default()
            .with_edge_detector(NoEdges)
            .preprocess_image(photo)
            .unwrap();
        assert_eq!(processed.rectification, Rectification::NotFound);
    }

    #[test]
    fn pipeline_is_shared_across_threads() {
        let pipeline = ScanPipeline::default();
        let photos: Vec<_> = [3.0, -4.0]
            .into_iter()
            .map(|deg| photographed_page(300, 400, 200.0, 280.0, deg).0)
            .collect();

        let shared = &pipeline;
        std::thread::scope(|scope| {
            let handles: Vec<_> = photos
                .into_iter()
                .map(|photo| scope.spawn(move || shared.preprocess_image(photo)))
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap().unwrap().rectification.is_rectified());
            }
        });
    }

    #[test]
    fn processed_path_appends_to_full_name() {
        assert_eq!(
            processed_path(Path::new("/tmp/scan.jpg"), ".processed.png"),
            PathBuf::from("/tmp/scan.jpg.processed.png")
        );
    }
}
