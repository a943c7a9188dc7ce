//! Page layout detection using DocLayout-YOLO via ONNX Runtime
//!
//! This crate wraps the layout model behind the [`LayoutDetector`] trait and
//! provides the region selector that narrows raw detections down to the
//! class of interest (plain text blocks by default).
//!
//! # Example
//! ```no_run
//! use pagetext_layout::{select, DocLayoutYolo, LayoutConfig, LayoutDetector};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LayoutConfig::new("models/doclayout_yolo_docstructbench_imgsz1280.onnx");
//! let target = config.target_class;
//! let mut detector = DocLayoutYolo::new(config)?;
//!
//! let page = image::open("page.jpg")?;
//! let detections = detector.detect(&page)?;
//! let regions = select(&detections, target);
//! println!("{} text regions", regions.len());
//! # Ok(())
//! # }
//! ```

pub mod doclayout_yolo;
pub mod selector;
pub mod session;

pub use doclayout_yolo::DocLayoutYolo;
pub use selector::select;

use image::DynamicImage;
use pagetext_common::{Detection, Device, ProcessingError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Class id of "plain text" in the DocStructBench label set
pub const PLAIN_TEXT_CLASS: u32 = 1;

/// DocStructBench labels, indexed by class id
pub const DOCSTRUCTBENCH_CLASSES: &[&str] = &[
    "title",
    "plain text",
    "abandon",
    "figure",
    "figure_caption",
    "table",
    "table_caption",
    "table_footnote",
    "isolate_formula",
    "formula_caption",
];

/// Get the DocStructBench label for a class id
#[must_use]
pub fn class_name(class_id: u32) -> &'static str {
    usize::try_from(class_id)
        .ok()
        .and_then(|idx| DOCSTRUCTBENCH_CLASSES.get(idx))
        .copied()
        .unwrap_or("unknown")
}

/// Configuration for the layout model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Path to the exported ONNX model
    pub model_path: PathBuf,
    /// Execution device, chosen explicitly by the caller
    pub device: Device,
    /// Square model input resolution
    pub input_size: u32,
    /// Minimum confidence for a detection to be reported (0-1)
    pub confidence_threshold: f32,
    /// Class kept by the region selector
    pub target_class: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/doclayout_yolo_docstructbench_imgsz1280.onnx"),
            device: Device::Cpu,
            input_size: 1280,
            confidence_threshold: 0.3,
            target_class: PLAIN_TEXT_CLASS,
        }
    }
}

impl LayoutConfig {
    /// Default configuration pointing at the given model file
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }
}

/// Anything that turns a page image into layout detections
pub trait LayoutDetector {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<Detection>, LayoutError>;
}

/// Error types for layout detection
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Failed to load ONNX model from {path}: {error}")]
    ModelLoad { path: PathBuf, error: String },

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(#[from] ort::Error),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),
}
