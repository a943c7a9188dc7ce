//! OCR-side binarization
//!
//! Sauvola thresholding: each pixel is compared with
//! `T = mean * (1 + k * (stddev / r - 1))` over a square window around it.
//! Local statistics come from integral images, so the cost does not depend
//! on the window size.

// Pixel counts and sums are converted between usize, u64 and f64
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

use image::{DynamicImage, GrayImage, Luma};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Binarization settings, applied to the image used for OCR only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub enabled: bool,
    /// Side of the square window in pixels (odd values are centered)
    pub window_size: u32,
    /// Sauvola sensitivity
    pub k: f64,
    /// Dynamic range of the standard deviation
    pub r: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window_size: 25,
            k: 0.2,
            r: 128.0,
        }
    }
}

/// Grayscale and binarize `image` for OCR
#[must_use]
pub fn preprocess_for_ocr(image: &DynamicImage, config: &PreprocessConfig) -> DynamicImage {
    let gray = image.to_luma8();
    debug!(
        "Sauvola binarization of {}x{} (window={}, k={})",
        gray.width(),
        gray.height(),
        config.window_size,
        config.k
    );
    DynamicImage::ImageLuma8(sauvola(&gray, config))
}

fn sauvola(gray: &GrayImage, config: &PreprocessConfig) -> GrayImage {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let mut output = GrayImage::new(gray.width(), gray.height());
    if w == 0 || h == 0 {
        return output;
    }

    // integral[(y+1)*iw + (x+1)] = sum over gray[0..=y][0..=x]
    let iw = w + 1;
    let mut sum = vec![0u64; iw * (h + 1)];
    let mut sum_sq = vec![0u64; iw * (h + 1)];
    for (y, row) in gray.as_raw().chunks_exact(w).enumerate() {
        let (mut row_sum, mut row_sq) = (0u64, 0u64);
        for (x, &v) in row.iter().enumerate() {
            let v = u64::from(v);
            row_sum += v;
            row_sq += v * v;
            sum[(y + 1) * iw + x + 1] = row_sum + sum[y * iw + x + 1];
            sum_sq[(y + 1) * iw + x + 1] = row_sq + sum_sq[y * iw + x + 1];
        }
    }

    let half = (config.window_size.max(1) / 2) as usize;
    let window = |table: &[u64], x0: usize, y0: usize, x1: usize, y1: usize| -> f64 {
        (table[y1 * iw + x1] + table[y0 * iw + x0] - table[y0 * iw + x1] - table[y1 * iw + x0])
            as f64
    };

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let (x, y) = (x as usize, y as usize);
        let x0 = x.saturating_sub(half);
        let y0 = y.saturating_sub(half);
        let x1 = (x + half + 1).min(w);
        let y1 = (y + half + 1).min(h);

        let area = ((x1 - x0) * (y1 - y0)) as f64;
        let mean = window(&sum, x0, y0, x1, y1) / area;
        let variance = (window(&sum_sq, x0, y0, x1, y1) / area - mean * mean).max(0.0);
        let threshold = mean * (1.0 + config.k * (variance.sqrt() / config.r - 1.0));

        let value = f64::from(gray.as_raw()[y * w + x]);
        *pixel = Luma([if value > threshold { 255 } else { 0 }]);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_disabled() {
        let config = PreprocessConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.window_size, 25);
    }

    #[test]
    fn test_uniform_page_is_white() {
        let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 30, Luma([200])));
        let out = preprocess_for_ocr(&page, &PreprocessConfig::default()).to_luma8();
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_dark_stroke_is_black() {
        let mut gray = GrayImage::from_pixel(60, 60, Luma([230]));
        for y in 20..40 {
            for x in 28..32 {
                gray.put_pixel(x, y, Luma([20]));
            }
        }
        let out = preprocess_for_ocr(&DynamicImage::ImageLuma8(gray), &PreprocessConfig::default())
            .to_luma8();

        assert_eq!(out.get_pixel(30, 30).0[0], 0);
        assert_eq!(out.get_pixel(5, 5).0[0], 255);
        assert_eq!(out.get_pixel(50, 30).0[0], 255);
        assert_eq!(out.dimensions(), (60, 60));
    }

    #[test]
    fn test_color_input_converted() {
        let page = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, image::Rgb([250, 240, 230])));
        let out = preprocess_for_ocr(&page, &PreprocessConfig::default());
        assert!(matches!(out, DynamicImage::ImageLuma8(_)));
    }
}
