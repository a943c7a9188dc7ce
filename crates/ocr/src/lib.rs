//! OCR module using Tesseract 5.x
//!
//! Text recognition for cropped page regions. The engine sits behind the
//! [`TextRecognizer`] trait; [`TesseractRecognizer`] is the production
//! implementation (via `leptess`). [`RegionTextExtractor`] drives one
//! recognition call per ordered region and keeps results in region order.
//!
//! # Example
//! ```no_run
//! use pagetext_ocr::{OcrConfig, TesseractRecognizer, TextRecognizer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OcrConfig::default();
//! let recognizer = TesseractRecognizer::new(config)?;
//!
//! let crop = image::open("block.png")?;
//! let text = recognizer.recognize(&crop, "fra")?;
//! println!("{}", text.trim());
//! # Ok(())
//! # }
//! ```

pub mod extractor;

pub use extractor::{crop_region, ExtractError, ExtractionConfig, RegionText, RegionTextExtractor};

use image::DynamicImage;
use leptess::{LepTess, Variable};
use pagetext_common::ProcessingError;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Configuration for OCR processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract language codes (e.g., "fra", "eng+fra")
    pub language: String,
    /// Page segmentation mode (see Tesseract PSM)
    pub page_segmentation_mode: u32,
    /// Directory holding `*.traineddata`; Tesseract's default when unset
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "fra".to_string(),
            page_segmentation_mode: 3, // PSM_AUTO (fully automatic)
            tessdata_dir: None,
        }
    }
}

/// Errors that can occur during OCR processing
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to initialize Tesseract: {0}")]
    Init(String),

    #[error("Failed to run OCR: {0}")]
    Recognition(String),

    #[error("Invalid image dimensions: {0}")]
    InvalidImageDimensions(String),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),
}

/// An OCR engine: image crop in, raw (possibly multi-line) text out.
///
/// Implementations must be callable from several threads at once.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError>;
}

/// Tesseract-backed recognizer.
///
/// `LepTess` handles are not thread-safe, so each call opens its own.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    config: OcrConfig,
}

impl TesseractRecognizer {
    /// Create a recognizer, verifying that Tesseract and the configured
    /// language data can be loaded
    pub fn new(config: OcrConfig) -> Result<Self, OcrError> {
        let recognizer = Self { config };
        recognizer.engine(&recognizer.config.language)?;
        debug!(
            "Tesseract ready (lang={}, psm={})",
            recognizer.config.language, recognizer.config.page_segmentation_mode
        );
        Ok(recognizer)
    }

    #[must_use]
    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    fn engine(&self, language: &str) -> Result<LepTess, OcrError> {
        let tessdata = match &self.config.tessdata_dir {
            Some(dir) => Some(dir.to_str().ok_or_else(|| {
                OcrError::Init(format!("tessdata path is not UTF-8: {}", dir.display()))
            })?),
            None => None,
        };

        let mut lt = LepTess::new(tessdata, language).map_err(|e| {
            OcrError::Init(format!(
                "Failed to initialize Tesseract with language '{language}': {e}. \
                 Make sure language data is installed (e.g., 'apt install tesseract-ocr-fra')"
            ))
        })?;

        lt.set_variable(
            Variable::TesseditPagesegMode,
            &self.config.page_segmentation_mode.to_string(),
        )
        .map_err(|e| OcrError::Init(format!("Failed to set PSM: {e}")))?;

        Ok(lt)
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImageDimensions(format!(
                "Image dimensions must be non-zero (got {width}x{height})"
            )));
        }

        let mut lt = self.engine(language)?;

        // leptess expects encoded image data
        let mut png_buf = Cursor::new(Vec::new());
        image
            .write_to(&mut png_buf, image::ImageFormat::Png)
            .map_err(|e| OcrError::Recognition(format!("Failed to encode image to PNG: {e}")))?;

        lt.set_image_from_mem(png_buf.get_ref())
            .map_err(|e| OcrError::Recognition(format!("Failed to set image from memory: {e}")))?;

        let text = lt
            .get_utf8_text()
            .map_err(|e| OcrError::Recognition(format!("Tesseract returned invalid UTF-8: {e}")))?;

        debug!("OCR read {} chars from {width}x{height} crop", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_ocr_config_default() {
        let config = OcrConfig::default();
        assert_eq!(config.language, "fra");
        assert_eq!(config.page_segmentation_mode, 3);
        assert!(config.tessdata_dir.is_none());
    }

    #[test]
    fn test_ocr_config_partial_deserialize() {
        let config: OcrConfig = serde_json::from_str(r#"{"language": "eng+fra"}"#).unwrap();
        assert_eq!(config.language, "eng+fra");
        assert_eq!(config.page_segmentation_mode, 3);
    }

    #[test]
    #[ignore] // Requires Tesseract with French language data
    fn test_recognizer_creation() {
        let result = TesseractRecognizer::new(OcrConfig::default());
        assert!(
            result.is_ok(),
            "Failed to create recognizer. Make sure Tesseract is installed with French language data."
        );
    }

    #[test]
    #[ignore] // Requires Tesseract
    fn test_recognizer_invalid_language() {
        let config = OcrConfig {
            language: "invalid_lang_xyz".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            TesseractRecognizer::new(config),
            Err(OcrError::Init(_))
        ));
    }

    #[test]
    #[ignore] // Requires Tesseract with French language data
    fn test_recognize_blank_crop() {
        let recognizer = TesseractRecognizer::new(OcrConfig::default()).unwrap();
        let crop = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 40, Rgb([255, 255, 255])));
        let text = recognizer.recognize(&crop, "fra").unwrap();
        assert!(text.trim().is_empty(), "Blank crop produced text: {text:?}");
    }

    #[test]
    fn test_recognize_rejects_empty_image() {
        // No engine is opened before the dimension check
        let recognizer = TesseractRecognizer {
            config: OcrConfig::default(),
        };
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 10));
        assert!(matches!(
            recognizer.recognize(&empty, "fra"),
            Err(OcrError::InvalidImageDimensions(_))
        ));
    }
}
