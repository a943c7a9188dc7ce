//! Stage orchestration for a single page

use crate::config::PipelineConfig;
use crate::preprocess::preprocess_for_ocr;
use crate::PipelineError;
use image::DynamicImage;
use pagetext_common::{Detection, ProcessingError};
use pagetext_layout::{select, DocLayoutYolo, LayoutDetector};
use pagetext_ocr::{RegionText, RegionTextExtractor, TesseractRecognizer, TextRecognizer};
use pagetext_reading_order::resolve;
use pagetext_tei::{assemble, TeiDocument};
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Decode an image file, whatever its format
pub fn load_image(path: &Path) -> Result<DynamicImage, ProcessingError> {
    image::open(path).map_err(|e| ProcessingError::ImageLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Everything produced for one page
#[derive(Debug, Clone)]
pub struct PageResult {
    /// The page as loaded, before any OCR preprocessing
    pub image: Arc<DynamicImage>,
    /// Raw detector output, all classes
    pub detections: Vec<Detection>,
    /// OCR text per selected region, in reading order
    pub regions: Vec<RegionText>,
    pub document: TeiDocument,
}

/// Layout detector, OCR engine and settings for processing pages
pub struct Pipeline {
    detector: Box<dyn LayoutDetector + Send>,
    extractor: RegionTextExtractor,
    config: PipelineConfig,
}

impl Pipeline {
    /// Load the layout model and Tesseract described by `config`.
    ///
    /// Each collaborator gets one retry before the error is returned.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let detector = retry_once("Loading layout model", || {
            DocLayoutYolo::new(config.layout.clone())
        })
        .map_err(PipelineError::ModelLoad)?;

        let recognizer = retry_once("Initializing Tesseract", || {
            TesseractRecognizer::new(config.ocr.clone())
        })
        .map_err(PipelineError::OcrEngine)?;

        Ok(Self::with_components(
            Box::new(detector),
            Arc::new(recognizer),
            config,
        ))
    }

    /// Assemble a pipeline from already constructed collaborators
    pub fn with_components(
        detector: Box<dyn LayoutDetector + Send>,
        recognizer: Arc<dyn TextRecognizer>,
        config: PipelineConfig,
    ) -> Self {
        let extractor = RegionTextExtractor::new(recognizer, config.extraction.clone());
        Self {
            detector,
            extractor,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the image at `path` and process it
    pub async fn process_path(&mut self, path: &Path) -> Result<PageResult, PipelineError> {
        let image = load_image(path).map_err(PipelineError::ImageLoad)?;
        info!(
            "Loaded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        self.process_image(image).await
    }

    /// Run every stage on one page.
    ///
    /// A page without text regions is not an error: the document is simply
    /// empty.
    pub async fn process_image(&mut self, image: DynamicImage) -> Result<PageResult, PipelineError> {
        let start = Instant::now();
        let image = Arc::new(image);

        let detections = self
            .detector
            .detect(&image)
            .map_err(PipelineError::Detection)?;

        let selected = select(&detections, self.config.layout.target_class);
        let ordered = resolve(&selected);
        info!(
            "{} detections, {} text regions in reading order",
            detections.len(),
            ordered.len()
        );

        let ocr_image = if self.config.preprocess.enabled {
            Arc::new(preprocess_for_ocr(&image, &self.config.preprocess))
        } else {
            Arc::clone(&image)
        };

        let regions = self
            .extractor
            .extract(ocr_image, &ordered, &self.config.ocr.language)
            .await?;

        let texts: Vec<&str> = regions.iter().map(|r| r.raw_text.as_str()).collect();
        let document = assemble(&texts);

        info!(
            "Page processed in {:.2}s ({} divisions)",
            start.elapsed().as_secs_f64(),
            document.len()
        );

        Ok(PageResult {
            image,
            detections,
            regions,
            document,
        })
    }
}

fn retry_once<T, E: Display>(what: &str, mut init: impl FnMut() -> Result<T, E>) -> Result<T, E> {
    init().or_else(|e| {
        warn!("{what} failed: {e}; retrying once");
        init()
    })
}
