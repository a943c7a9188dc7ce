//! Page-to-TEI pipeline
//!
//! Coordinates the stages for one page image:
//! load → detect layout → select text regions → resolve reading order →
//! OCR each region → assemble the TEI document → write outputs.
//!
//! # Example
//! ```no_run
//! use pagetext_pipeline::{Pipeline, PipelineConfig};
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = PipelineConfig::default();
//! config.layout.model_path = "models/doclayout_yolo_docstructbench_imgsz1280.onnx".into();
//!
//! let mut pipeline = Pipeline::new(config)?;
//! let page = pipeline.process_path(Path::new("page.jpg")).await?;
//! println!("{}", page.document.plain_text());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod output;
pub mod preprocess;
pub mod runner;
pub mod visualization;

pub use config::PipelineConfig;
pub use output::{OutputPaths, ReadingOrderSidecar};
pub use preprocess::{preprocess_for_ocr, PreprocessConfig};
pub use runner::{load_image, PageResult, Pipeline};
pub use visualization::{render_layout, LayoutRenderer, VisualizationOptions};

use pagetext_common::ProcessingError;
use pagetext_layout::LayoutError;
use pagetext_ocr::{ExtractError, OcrError};
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline failures, tagged with the stage that produced them
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid configuration {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Image load failed: {0}")]
    ImageLoad(#[source] ProcessingError),

    #[error("Layout model unavailable: {0}")]
    ModelLoad(#[source] LayoutError),

    #[error("Layout detection failed: {0}")]
    Detection(#[source] LayoutError),

    #[error("OCR engine unavailable: {0}")]
    OcrEngine(#[source] OcrError),

    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Failed to write {path}: {reason}")]
    Output { path: PathBuf, reason: String },
}
