//! Layout visualization rendering
//!
//! Draws every detection on a copy of the page: a hollow box in the class
//! color and, when a font is available, a `"<class> <confidence>"` label on
//! a filled background.

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use pagetext_common::{Detection, ProcessingError};
use pagetext_layout::class_name;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Visualization rendering options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationOptions {
    /// Line thickness for bounding boxes
    pub line_width: u32,
    /// Label height in pixels
    pub font_size: f32,
    /// TrueType font for labels; boxes only when unset
    pub font_path: Option<PathBuf>,
}

impl Default for VisualizationOptions {
    fn default() -> Self {
        Self {
            line_width: 2,
            font_size: 14.0,
            font_path: None,
        }
    }
}

/// Color per DocStructBench class
#[inline]
const fn class_color(class_id: u32) -> Rgb<u8> {
    match class_id {
        0 => Rgb([156, 39, 176]),  // title: purple
        1 => Rgb([66, 135, 245]),  // plain text: blue
        2 => Rgb([158, 158, 158]), // abandon: light gray
        3 => Rgb([255, 193, 7]),   // figure: yellow
        4 | 6 => Rgb([255, 152, 0]), // captions: orange
        5 => Rgb([76, 175, 80]),   // table: green
        7 => Rgb([121, 85, 72]),   // table footnote: brown
        8 | 9 => Rgb([244, 67, 54]), // formula: red
        _ => Rgb([0, 188, 212]),   // cyan
    }
}

/// Renders detections with a font loaded once
pub struct LayoutRenderer {
    options: VisualizationOptions,
    font: Option<FontVec>,
}

impl LayoutRenderer {
    pub fn new(options: VisualizationOptions) -> Result<Self, ProcessingError> {
        let font = match &options.font_path {
            Some(path) => {
                let data = std::fs::read(path)?;
                let font = FontVec::try_from_vec(data).map_err(|e| {
                    ProcessingError::Other(format!("Invalid font {}: {e}", path.display()))
                })?;
                Some(font)
            }
            None => {
                warn!("No label font configured, layout image will show boxes only");
                None
            }
        };
        Ok(Self { options, font })
    }

    /// Draw `detections` on a copy of `image`
    #[must_use]
    pub fn render(&self, image: &DynamicImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.to_rgb8();
        let page_w = i32::try_from(canvas.width()).unwrap_or(i32::MAX);
        let page_h = i32::try_from(canvas.height()).unwrap_or(i32::MAX);
        let line_width = i32::try_from(self.options.line_width).unwrap_or(i32::MAX);
        let scale = PxScale::from(self.options.font_size);

        for det in detections {
            let color = class_color(det.class_id);
            let bbox = det.bbox;

            // Inset one pixel per pass for thick lines
            for t in 0..line_width {
                let w = bbox.width() - 2 * t;
                let h = bbox.height() - 2 * t;
                if w <= 0 || h <= 0 {
                    break;
                }
                let rect = Rect::at(bbox.x1() + t, bbox.y1() + t)
                    .of_size(w.unsigned_abs(), h.unsigned_abs());
                draw_hollow_rect_mut(&mut canvas, rect, color);
            }

            let Some(font) = &self.font else {
                continue;
            };

            let label = format!("{} {:.2}", class_name(det.class_id), det.confidence);
            let (text_w, text_h) = text_size(scale, font, &label);
            let bg_h = text_h + 4;
            let bg_h_i = i32::try_from(bg_h).unwrap_or(i32::MAX);

            // Above the box, or inside its top edge when there is no room
            let text_y = if bbox.y1() >= bg_h_i {
                bbox.y1() - bg_h_i
            } else {
                bbox.y1()
            };

            if bbox.x1() < page_w && text_y < page_h {
                let bg = Rect::at(bbox.x1(), text_y).of_size(text_w + 4, bg_h);
                draw_filled_rect_mut(&mut canvas, bg, color);
                draw_text_mut(
                    &mut canvas,
                    Rgb([255, 255, 255]),
                    bbox.x1() + 2,
                    text_y + 2,
                    scale,
                    font,
                    &label,
                );
            }
        }

        canvas
    }
}

/// Render detections on `image` with `options`
pub fn render_layout(
    image: &DynamicImage,
    detections: &[Detection],
    options: &VisualizationOptions,
) -> Result<RgbImage, ProcessingError> {
    Ok(LayoutRenderer::new(options.clone())?.render(image, detections))
}
