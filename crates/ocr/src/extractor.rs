//! Region text extraction: one OCR call per ordered region
//!
//! Calls run on tokio's blocking pool, bounded by a semaphore and a
//! per-region timeout. Every result carries the index of the region it was
//! produced for, so the output order is the reading order regardless of
//! which call finishes first.

use crate::{OcrError, TextRecognizer};
use image::DynamicImage;
use pagetext_common::{BBox, ProcessingError, TextRegion};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::error::Elapsed;
use tracing::{debug, info, warn};

/// Extraction scheduling options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Per-region OCR timeout in milliseconds
    pub ocr_timeout_ms: u64,
    /// Maximum OCR calls in flight (1 = sequential)
    pub max_concurrency: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_timeout_ms: 30_000,
            max_concurrency: 1,
        }
    }
}

impl ExtractionConfig {
    #[must_use]
    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_millis(self.ocr_timeout_ms)
    }
}

/// OCR output for one region, at its reading-order position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionText {
    pub index: usize,
    pub region: TextRegion,
    /// Recognized text, trimmed at both ends; may be empty
    pub raw_text: String,
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("OCR failed on region {index}: {source}")]
    Region {
        index: usize,
        #[source]
        source: OcrError,
    },

    #[error("OCR task failed: {0}")]
    Join(String),
}

impl From<JoinError> for ExtractError {
    fn from(err: JoinError) -> Self {
        ExtractError::Join(err.to_string())
    }
}

/// Crop `bbox` out of `image`.
///
/// Fails with `InvalidRegion` when the box is not fully inside the image.
pub fn crop_region(image: &DynamicImage, bbox: &BBox) -> Result<DynamicImage, ProcessingError> {
    if !bbox.fits_within(image.width(), image.height()) {
        return Err(ProcessingError::InvalidRegion(format!(
            "box {bbox} outside {}x{} image",
            image.width(),
            image.height()
        )));
    }

    let to_u32 = |v: i32| {
        u32::try_from(v).map_err(|_| ProcessingError::InvalidRegion(format!("box {bbox}")))
    };
    Ok(image.crop_imm(
        to_u32(bbox.x1())?,
        to_u32(bbox.y1())?,
        to_u32(bbox.width())?,
        to_u32(bbox.height())?,
    ))
}

type TaskOutcome = (usize, Result<Result<Result<String, OcrError>, JoinError>, Elapsed>);

/// Runs the recognizer over ordered regions
pub struct RegionTextExtractor {
    recognizer: Arc<dyn TextRecognizer>,
    config: ExtractionConfig,
}

impl RegionTextExtractor {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, config: ExtractionConfig) -> Self {
        Self { recognizer, config }
    }

    #[must_use]
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Recognize the text of every region, in order.
    ///
    /// The result has one entry per input region. Regions that cannot be
    /// cropped, or whose OCR call times out, get empty text. An engine error
    /// aborts extraction with the index of the failing region.
    pub async fn extract(
        &self,
        image: Arc<DynamicImage>,
        regions: &[TextRegion],
        language: &str,
    ) -> Result<Vec<RegionText>, ExtractError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let timeout = self.config.ocr_timeout();
        let mut slots: Vec<Option<String>> = vec![None; regions.len()];
        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();

        for (index, region) in regions.iter().enumerate() {
            let crop = match crop_region(&image, &region.bbox) {
                Ok(crop) => crop,
                Err(e) => {
                    warn!("Skipping region {index}: {e}");
                    slots[index] = Some(String::new());
                    continue;
                }
            };

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| ExtractError::Join(e.to_string()))?;

            let recognizer = Arc::clone(&self.recognizer);
            let language = language.to_string();
            tasks.spawn(async move {
                let _permit = permit;
                let call =
                    tokio::task::spawn_blocking(move || recognizer.recognize(&crop, &language));
                (index, tokio::time::timeout(timeout, call).await)
            });

            // Surface engine failures without waiting for the remaining regions
            while let Some(joined) = tasks.try_join_next() {
                settle(&mut slots, joined?, timeout)?;
            }
        }

        while let Some(joined) = tasks.join_next().await {
            settle(&mut slots, joined?, timeout)?;
        }

        let texts: Vec<RegionText> = regions
            .iter()
            .zip(slots)
            .enumerate()
            .map(|(index, (region, text))| RegionText {
                index,
                region: region.clone(),
                raw_text: text.unwrap_or_default(),
            })
            .collect();

        info!(
            "Extracted text from {} regions ({} empty)",
            texts.len(),
            texts.iter().filter(|t| t.raw_text.is_empty()).count()
        );
        Ok(texts)
    }
}

fn settle(
    slots: &mut [Option<String>],
    (index, outcome): TaskOutcome,
    timeout: Duration,
) -> Result<(), ExtractError> {
    let text = match outcome {
        Err(_) => {
            warn!("OCR on region {index} timed out after {timeout:?}");
            String::new()
        }
        Ok(joined) => match joined? {
            Ok(text) => text.trim().to_string(),
            Err(source) => return Err(ExtractError::Region { index, source }),
        },
    };
    debug!("Region {index}: {} chars", text.len());
    slots[index] = Some(text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    /// Reports the crop size, padded with whitespace
    struct SizeRecognizer;

    impl TextRecognizer for SizeRecognizer {
        fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError> {
            Ok(format!("\n  {}x{} {language}\nsecond line  \n", image.width(), image.height()))
        }
    }

    /// Sleeps `width` milliseconds before answering
    struct SlowRecognizer;

    impl TextRecognizer for SlowRecognizer {
        fn recognize(&self, image: &DynamicImage, _language: &str) -> Result<String, OcrError> {
            std::thread::sleep(Duration::from_millis(u64::from(image.width())));
            Ok(format!("w{}", image.width()))
        }
    }

    /// Fails on crops of one width
    struct FailingRecognizer(u32);

    impl TextRecognizer for FailingRecognizer {
        fn recognize(&self, image: &DynamicImage, _language: &str) -> Result<String, OcrError> {
            if image.width() == self.0 {
                Err(OcrError::Recognition("engine crashed".to_string()))
            } else {
                Ok("ok".to_string())
            }
        }
    }

    fn page() -> Arc<DynamicImage> {
        Arc::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            400,
            300,
            Rgb([255, 255, 255]),
        )))
    }

    fn region(x1: i32, y1: i32, x2: i32, y2: i32) -> TextRegion {
        TextRegion::new(BBox::new(x1, y1, x2, y2).unwrap())
    }

    #[test]
    fn test_crop_region() {
        let mut img = RgbImage::from_pixel(50, 40, Rgb([0, 0, 0]));
        img.put_pixel(10, 5, Rgb([255, 0, 0]));
        let img = DynamicImage::ImageRgb8(img);

        let crop = crop_region(&img, &BBox::new(10, 5, 30, 25).unwrap()).unwrap();
        assert_eq!(crop.dimensions(), (20, 20));
        assert_eq!(crop.get_pixel(0, 0).0, [255, 0, 0, 255]);

        // Full image is fine, one pixel over is not
        assert!(crop_region(&img, &BBox::new(0, 0, 50, 40).unwrap()).is_ok());
        assert!(matches!(
            crop_region(&img, &BBox::new(0, 0, 51, 40).unwrap()),
            Err(ProcessingError::InvalidRegion(_))
        ));
        assert!(crop_region(&img, &BBox::new(-1, 0, 10, 10).unwrap()).is_err());
    }

    #[tokio::test]
    async fn test_extract_trims_and_keeps_order() {
        let extractor = RegionTextExtractor::new(Arc::new(SizeRecognizer), ExtractionConfig::default());
        let regions = vec![region(0, 0, 30, 10), region(100, 100, 110, 150)];

        let texts = extractor.extract(page(), &regions, "fra").await.unwrap();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].index, 0);
        assert_eq!(texts[0].raw_text, "30x10 fra\nsecond line");
        assert_eq!(texts[1].raw_text, "10x50 fra\nsecond line");
        assert_eq!(texts[1].region, regions[1]);
    }

    #[tokio::test]
    async fn test_invalid_region_yields_empty_text() {
        let extractor = RegionTextExtractor::new(Arc::new(SizeRecognizer), ExtractionConfig::default());
        let regions = vec![
            region(0, 0, 10, 10),
            region(390, 0, 420, 10), // past the right edge
            region(0, 20, 10, 30),
        ];

        let texts = extractor.extract(page(), &regions, "fra").await.unwrap();
        assert_eq!(texts.len(), 3);
        assert!(!texts[0].raw_text.is_empty());
        assert!(texts[1].raw_text.is_empty());
        assert_eq!(texts[1].index, 1);
        assert!(!texts[2].raw_text.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_results_follow_region_order() {
        let config = ExtractionConfig {
            max_concurrency: 4,
            ..Default::default()
        };
        let extractor = RegionTextExtractor::new(Arc::new(SlowRecognizer), config);
        // Widest first, so completion order is the reverse of region order
        let regions = vec![
            region(0, 0, 120, 10),
            region(0, 20, 80, 30),
            region(0, 40, 40, 50),
            region(0, 60, 5, 70),
        ];

        let texts = extractor.extract(page(), &regions, "fra").await.unwrap();
        let got: Vec<&str> = texts.iter().map(|t| t.raw_text.as_str()).collect();
        assert_eq!(got, vec!["w120", "w80", "w40", "w5"]);
    }

    #[tokio::test]
    async fn test_timeout_yields_empty_text() {
        let config = ExtractionConfig {
            ocr_timeout_ms: 50,
            max_concurrency: 2,
        };
        let extractor = RegionTextExtractor::new(Arc::new(SlowRecognizer), config);
        let regions = vec![region(0, 0, 5, 10), region(0, 20, 300, 30)];

        let texts = extractor.extract(page(), &regions, "fra").await.unwrap();
        assert_eq!(texts[0].raw_text, "w5");
        assert!(texts[1].raw_text.is_empty());
    }

    #[tokio::test]
    async fn test_engine_error_reports_region_index() {
        let extractor =
            RegionTextExtractor::new(Arc::new(FailingRecognizer(20)), ExtractionConfig::default());
        let regions = vec![region(0, 0, 10, 10), region(0, 0, 20, 10), region(0, 0, 30, 10)];

        let err = extractor.extract(page(), &regions, "fra").await.unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Region {
                index: 1,
                source: OcrError::Recognition(_)
            }
        ));
        assert!(err.to_string().contains("region 1"));
    }

    #[tokio::test]
    async fn test_no_regions() {
        let extractor = RegionTextExtractor::new(Arc::new(SizeRecognizer), ExtractionConfig::default());
        assert!(extractor.extract(page(), &[], "fra").await.unwrap().is_empty());
    }

    #[test]
    fn test_extraction_config_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.ocr_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_concurrency, 1);
    }
}
