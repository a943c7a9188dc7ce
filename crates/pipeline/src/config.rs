//! Pipeline configuration, loadable from TOML

use crate::preprocess::PreprocessConfig;
use crate::visualization::VisualizationOptions;
use crate::PipelineError;
use pagetext_layout::LayoutConfig;
use pagetext_ocr::{ExtractionConfig, OcrConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for every stage. Missing sections and keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub layout: LayoutConfig,
    pub ocr: OcrConfig,
    pub extraction: ExtractionConfig,
    pub preprocess: PreprocessConfig,
    pub visualization: VisualizationOptions,
}

impl PipelineConfig {
    /// Read a configuration file such as:
    ///
    /// ```toml
    /// [layout]
    /// model_path = "models/doclayout_yolo_docstructbench_imgsz1280.onnx"
    /// device = "cuda"
    ///
    /// [ocr]
    /// language = "fra"
    ///
    /// [extraction]
    /// max_concurrency = 4
    /// ```
    pub fn from_toml_file(path: &Path) -> Result<Self, PipelineError> {
        let config_error = |reason: String| PipelineError::Config {
            path: path.to_path_buf(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        toml::from_str(&text).map_err(|e| config_error(e.to_string()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, PipelineError> {
        toml::from_str(text).map_err(|e| PipelineError::Config {
            path: "<inline>".into(),
            reason: e.to_string(),
        })
    }
}
