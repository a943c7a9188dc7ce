//! Common types and utilities for page layout and text extraction

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Processing errors
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Failed to load image {path}: {reason}")]
    ImageLoad { path: PathBuf, reason: String },

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageError(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<image::ImageError> for ProcessingError {
    fn from(err: image::ImageError) -> Self {
        ProcessingError::ImageError(err.to_string())
    }
}

/// Result type for processing operations
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Axis-aligned box in image pixel coordinates.
///
/// Always satisfies `x1 < x2` and `y1 < y2`; degenerate boxes are rejected
/// by [`BBox::new`] so nothing downstream has to re-check them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBBox", into = "RawBBox")]
pub struct BBox {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

#[derive(Serialize, Deserialize)]
struct RawBBox {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl TryFrom<RawBBox> for BBox {
    type Error = ProcessingError;

    fn try_from(raw: RawBBox) -> Result<Self> {
        BBox::new(raw.x1, raw.y1, raw.x2, raw.y2)
    }
}

impl From<BBox> for RawBBox {
    fn from(bbox: BBox) -> Self {
        RawBBox {
            x1: bbox.x1,
            y1: bbox.y1,
            x2: bbox.x2,
            y2: bbox.y2,
        }
    }
}

impl BBox {
    /// Create a box from its corners, rejecting empty or inverted extents
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self> {
        if x1 >= x2 || y1 >= y2 {
            return Err(ProcessingError::InvalidRegion(format!(
                "degenerate box ({x1}, {y1}, {x2}, {y2})"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Create a box from floating point corners, truncating toward zero
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_xyxy_f32(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self> {
        Self::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }

    #[must_use]
    pub fn x1(&self) -> i32 {
        self.x1
    }

    #[must_use]
    pub fn y1(&self) -> i32 {
        self.y1
    }

    #[must_use]
    pub fn x2(&self) -> i32 {
        self.x2
    }

    #[must_use]
    pub fn y2(&self) -> i32 {
        self.y2
    }

    #[must_use]
    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    #[must_use]
    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Horizontal center, `(x1 + x2) / 2` without integer rounding
    #[must_use]
    #[inline]
    pub fn center_x(&self) -> f64 {
        (f64::from(self.x1) + f64::from(self.x2)) / 2.0
    }

    /// Whether the box lies entirely inside an image of the given size
    #[must_use]
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x1 >= 0
            && self.y1 >= 0
            && i64::from(self.x2) <= i64::from(width)
            && i64::from(self.y2) <= i64::from(height)
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// One box reported by the layout detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BBox,
    pub class_id: u32,
    /// Detector confidence (0-1)
    pub confidence: f32,
}

/// A region selected for text extraction.
///
/// Carries no ordering of its own; the reading order is the position in
/// the sequence produced by the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub bbox: BBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl TextRegion {
    #[must_use]
    pub fn new(bbox: BBox) -> Self {
        Self {
            bbox,
            class_id: None,
            confidence: None,
        }
    }
}

impl From<&Detection> for TextRegion {
    fn from(detection: &Detection) -> Self {
        Self {
            bbox: detection.bbox,
            class_id: Some(detection.class_id),
            confidence: Some(detection.confidence),
        }
    }
}

/// Inference device for the layout model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
    CoreMl,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
            Device::CoreMl => "coreml",
        };
        f.write_str(name)
    }
}

impl FromStr for Device {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda),
            // "mps" is what torch calls Apple's accelerator
            "coreml" | "mps" => Ok(Device::CoreMl),
            other => Err(ProcessingError::Other(format!(
                "unknown device '{other}' (expected cpu, cuda or coreml)"
            ))),
        }
    }
}
