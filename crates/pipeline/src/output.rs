//! Result files for a processed page
//!
//! For an input `page.jpg` the results directory receives `page.jpg` (the
//! annotated layout), `page.xml` (TEI) and `page.json` (reading-order
//! sidecar). Each file is written to a temporary name and renamed into
//! place.

use crate::runner::PageResult;
use crate::visualization::LayoutRenderer;
use crate::PipelineError;
use image::{DynamicImage, ImageFormat};
use pagetext_common::BBox;
use pagetext_layout::class_name;
use pagetext_tei::serializer::write_atomic;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where the outputs of one page were written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub layout_image: PathBuf,
    pub tei: PathBuf,
    pub sidecar: PathBuf,
}

/// One region of the sidecar, in reading order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidecarRegion {
    pub index: usize,
    pub bbox: BBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub text: String,
}

/// JSON sidecar describing the reading order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingOrderSidecar {
    /// Source image file name
    pub image: String,
    pub width: u32,
    pub height: u32,
    /// All detections before class selection
    pub detection_count: usize,
    pub regions: Vec<SidecarRegion>,
}

impl ReadingOrderSidecar {
    #[must_use]
    pub fn from_page(image_name: &str, page: &PageResult) -> Self {
        Self {
            image: image_name.to_string(),
            width: page.image.width(),
            height: page.image.height(),
            detection_count: page.detections.len(),
            regions: page
                .regions
                .iter()
                .map(|r| SidecarRegion {
                    index: r.index,
                    bbox: r.region.bbox,
                    class_id: r.region.class_id,
                    label: r.region.class_id.map(|id| class_name(id).to_string()),
                    confidence: r.region.confidence,
                    text: r.raw_text.clone(),
                })
                .collect(),
        }
    }
}

impl PageResult {
    /// Write the layout image, TEI XML and JSON sidecar for the page read
    /// from `image_path` into `res_dir`, creating it if needed.
    pub fn write_outputs(
        &self,
        image_path: &Path,
        res_dir: &Path,
        renderer: &LayoutRenderer,
    ) -> Result<OutputPaths, PipelineError> {
        let output_error = |path: &Path, reason: String| PipelineError::Output {
            path: path.to_path_buf(),
            reason,
        };

        let (Some(file_name), Some(stem)) = (
            image_path.file_name().and_then(|n| n.to_str()),
            image_path.file_stem().and_then(|s| s.to_str()),
        ) else {
            return Err(output_error(image_path, "no usable file name".to_string()));
        };

        std::fs::create_dir_all(res_dir).map_err(|e| output_error(res_dir, e.to_string()))?;

        let paths = OutputPaths {
            layout_image: res_dir.join(file_name),
            tei: res_dir.join(format!("{stem}.xml")),
            sidecar: res_dir.join(format!("{stem}.json")),
        };

        // Annotated layout, encoded in the input's format
        let rendered = DynamicImage::ImageRgb8(renderer.render(&self.image, &self.detections));
        let format = ImageFormat::from_path(&paths.layout_image).unwrap_or(ImageFormat::Png);
        let mut encoded = Cursor::new(Vec::new());
        rendered
            .write_to(&mut encoded, format)
            .map_err(|e| output_error(&paths.layout_image, e.to_string()))?;
        write_atomic(&paths.layout_image, encoded.get_ref())
            .map_err(|e| output_error(&paths.layout_image, e.to_string()))?;

        self.document
            .write_to(&paths.tei)
            .map_err(|e| output_error(&paths.tei, e.to_string()))?;

        let sidecar = ReadingOrderSidecar::from_page(file_name, self);
        let json = serde_json::to_vec_pretty(&sidecar)
            .map_err(|e| output_error(&paths.sidecar, e.to_string()))?;
        write_atomic(&paths.sidecar, &json).map_err(|e| output_error(&paths.sidecar, e.to_string()))?;

        info!("Results written to {}", res_dir.display());
        Ok(paths)
    }
}
