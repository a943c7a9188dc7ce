//! # DocLayout-YOLO layout detector
//!
//! Runs an ONNX export of DocLayout-YOLO (DocStructBench weights). The export
//! has end-to-end NMS baked in, so the single output is `[1, N, 6]` with one
//! `[x1, y1, x2, y2, confidence, class_id]` row per detection, in letterboxed
//! model-input coordinates.

// Image dimensions are converted between usize (array indexing) and f32
// (model I/O). Precision loss is irrelevant below 10k pixels.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use crate::session::create_session;
use crate::{LayoutConfig, LayoutDetector, LayoutError};
use image::{DynamicImage, RgbImage};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use pagetext_common::{BBox, Detection};
use std::time::Instant;
use tracing::{debug, info};

/// Values per detection row in the model output
const ROW_LEN: usize = 6;

/// Letterbox fill value (mid gray after normalization)
const PAD_VALUE: f32 = 0.5;

/// DocLayout-YOLO model bound to a loaded ONNX session
pub struct DocLayoutYolo {
    session: Session,
    config: LayoutConfig,
}

impl std::fmt::Debug for DocLayoutYolo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocLayoutYolo")
            .field("session", &"<Session>")
            .field("config", &self.config)
            .finish()
    }
}

impl DocLayoutYolo {
    /// Load the model described by `config`
    pub fn new(config: LayoutConfig) -> Result<Self, LayoutError> {
        info!(
            "Loading DocLayout-YOLO from {} (imgsz={}, conf={})",
            config.model_path.display(),
            config.input_size,
            config.confidence_threshold
        );
        let session = create_session(&config.model_path, config.device)?;
        Ok(Self { session, config })
    }

    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Letterbox-resize to `input_size` x `input_size`, NCHW, normalized to [0, 1]
    fn preprocess(image: &RgbImage, input_size: u32) -> Array4<f32> {
        let (orig_w, orig_h) = (image.width() as usize, image.height() as usize);
        let target = input_size as usize;

        let scale = (target as f32 / orig_h as f32).min(target as f32 / orig_w as f32);
        let new_w = ((orig_w as f32 * scale).round() as usize).clamp(1, target);
        let new_h = ((orig_h as f32 * scale).round() as usize).clamp(1, target);
        let pad_x = (target - new_w) / 2;
        let pad_y = (target - new_h) / 2;

        let mut output = Array4::<f32>::from_elem((1, 3, target, target), PAD_VALUE);

        // Nearest-neighbor sampling from the source
        let scale_w = orig_w as f32 / new_w as f32;
        let scale_h = orig_h as f32 / new_h as f32;
        for dst_y in 0..new_h {
            let src_y = (((dst_y as f32 + 0.5) * scale_h) as usize).min(orig_h - 1);
            for dst_x in 0..new_w {
                let src_x = (((dst_x as f32 + 0.5) * scale_w) as usize).min(orig_w - 1);
                let pixel = image.get_pixel(src_x as u32, src_y as u32);
                for c in 0..3 {
                    output[[0, c, pad_y + dst_y, pad_x + dst_x]] = f32::from(pixel[c]) / 255.0;
                }
            }
        }

        output
    }

    /// Convert raw model rows into detections in original image coordinates.
    ///
    /// Rows below `confidence_threshold` are dropped, coordinates are mapped
    /// back through the letterbox, clamped to the image and truncated to
    /// integers. Boxes that collapse to nothing are discarded.
    pub(crate) fn post_process(
        output_shape: &[usize],
        output_data: &[f32],
        orig_w: u32,
        orig_h: u32,
        input_size: u32,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, LayoutError> {
        if output_shape.len() != 3 || output_shape[2] != ROW_LEN {
            return Err(LayoutError::Inference(format!(
                "Expected output shape [1, N, {ROW_LEN}], got {output_shape:?}"
            )));
        }
        let num_detections = output_shape[1];
        if output_data.len() < num_detections * ROW_LEN {
            return Err(LayoutError::Inference(format!(
                "Output has {} values, expected at least {}",
                output_data.len(),
                num_detections * ROW_LEN
            )));
        }

        let (w, h) = (orig_w as f32, orig_h as f32);
        let input = input_size as f32;
        let scale = (input / h).min(input / w);
        let pad_w = (input - (w * scale).round()) / 2.0;
        let pad_h = (input - (h * scale).round()) / 2.0;

        let mut detections = Vec::new();
        for row in output_data.chunks_exact(ROW_LEN).take(num_detections) {
            let confidence = row[4];
            if confidence < confidence_threshold {
                continue;
            }

            let x1 = ((row[0] - pad_w) / scale).clamp(0.0, w);
            let y1 = ((row[1] - pad_h) / scale).clamp(0.0, h);
            let x2 = ((row[2] - pad_w) / scale).clamp(0.0, w);
            let y2 = ((row[3] - pad_h) / scale).clamp(0.0, h);
            let class_id = row[5].max(0.0) as u32;

            match BBox::from_xyxy_f32(x1, y1, x2, y2) {
                Ok(bbox) => detections.push(Detection {
                    bbox,
                    class_id,
                    confidence,
                }),
                Err(e) => debug!("Dropping detection of class {class_id}: {e}"),
            }
        }

        detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(detections)
    }
}

impl LayoutDetector for DocLayoutYolo {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<Detection>, LayoutError> {
        let rgb = image.to_rgb8();
        let (orig_w, orig_h) = rgb.dimensions();
        if orig_w == 0 || orig_h == 0 {
            return Err(LayoutError::Inference(format!(
                "Image dimensions must be non-zero (got {orig_w}x{orig_h})"
            )));
        }

        let t0 = Instant::now();
        let input = Self::preprocess(&rgb, self.config.input_size);
        let input_tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| LayoutError::Inference(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| LayoutError::Inference(e.to_string()))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| LayoutError::Inference(format!("Failed to extract tensor: {e}")))?;
        let shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        let data = data.to_vec();
        drop(outputs);

        let detections = Self::post_process(
            &shape,
            &data,
            orig_w,
            orig_h,
            self.config.input_size,
            self.config.confidence_threshold,
        )?;

        info!(
            "Detected {} layout regions in {:.0}ms",
            detections.len(),
            t0.elapsed().as_secs_f64() * 1000.0
        );
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_preprocess_letterbox() {
        // 200x100 into 100x100: scaled to 100x50, padded 25 rows top and bottom
        let image = RgbImage::from_pixel(200, 100, Rgb([255, 0, 0]));
        let input = DocLayoutYolo::preprocess(&image, 100);
        assert_eq!(input.shape(), &[1, 3, 100, 100]);

        assert!((input[[0, 0, 0, 50]] - PAD_VALUE).abs() < f32::EPSILON);
        assert!((input[[0, 0, 50, 50]] - 1.0).abs() < f32::EPSILON);
        assert!(input[[0, 1, 50, 50]].abs() < f32::EPSILON);
        assert!((input[[0, 0, 99, 50]] - PAD_VALUE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_post_process_maps_letterbox_coordinates() {
        // 200x100 image, 100px input: scale 0.5, 25px vertical padding
        let data = [
            10.0, 30.0, 40.0, 50.0, 0.9, 1.0, // kept
            0.0, 25.0, 100.0, 75.0, 0.1, 3.0, // below threshold
        ];
        let detections =
            DocLayoutYolo::post_process(&[1, 2, 6], &data, 200, 100, 100, 0.3).unwrap();

        assert_eq!(detections.len(), 1);
        let det = &detections[0];
        assert_eq!(det.class_id, 1);
        assert_eq!(
            (det.bbox.x1(), det.bbox.y1(), det.bbox.x2(), det.bbox.y2()),
            (20, 10, 80, 50)
        );
    }

    #[test]
    fn test_post_process_clamps_and_drops_degenerate() {
        let data = [
            -10.0, -10.0, 500.0, 500.0, 0.8, 0.0, // clamped to the image
            50.0, 50.0, 50.2, 80.0, 0.8, 1.0, // zero width after truncation
        ];
        let detections =
            DocLayoutYolo::post_process(&[1, 2, 6], &data, 100, 100, 100, 0.3).unwrap();

        assert_eq!(detections.len(), 1);
        let bbox = detections[0].bbox;
        assert_eq!((bbox.x1(), bbox.y1(), bbox.x2(), bbox.y2()), (0, 0, 100, 100));
    }

    #[test]
    fn test_post_process_sorted_by_confidence() {
        let data = [
            0.0, 0.0, 10.0, 10.0, 0.4, 1.0, //
            20.0, 20.0, 30.0, 30.0, 0.9, 1.0, //
        ];
        let detections =
            DocLayoutYolo::post_process(&[1, 2, 6], &data, 100, 100, 100, 0.3).unwrap();
        assert!(detections[0].confidence > detections[1].confidence);
    }

    #[test]
    fn test_post_process_rejects_bad_shape() {
        let result = DocLayoutYolo::post_process(&[1, 84, 8400], &[], 100, 100, 100, 0.3);
        assert!(matches!(result, Err(LayoutError::Inference(_))));
    }
}
