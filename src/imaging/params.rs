//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the command layer (which parses caller input) and the
//! components that do the pixel work.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`CompressionBudget`]: Target byte count plus the quality search bounds.
//! - [`ResizeParams`]: Target box and whether to keep the aspect ratio.
//! - [`CropBox`]: Left/top/right/bottom crop rectangle.

use super::error::ImagingError;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

pub const DEFAULT_QUALITY_MIN: u8 = 20;
pub const DEFAULT_QUALITY_MAX: u8 = 95;

/// Byte budget for [`compress`](super::compress::compress_to_budget).
///
/// Bounds are inclusive and always satisfy `quality_min <= quality_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionBudget {
    pub target_bytes: u64,
    quality_min: u8,
    quality_max: u8,
}

impl CompressionBudget {
    /// Budget with the default search bounds `[20, 95]`.
    pub fn new(target_bytes: u64) -> Self {
        Self {
            target_bytes,
            quality_min: DEFAULT_QUALITY_MIN,
            quality_max: DEFAULT_QUALITY_MAX,
        }
    }

    pub fn with_bounds(target_bytes: u64, min: u8, max: u8) -> Result<Self, ImagingError> {
        if min == 0 || max > 100 || min > max {
            return Err(ImagingError::InvalidParameter(format!(
                "quality bounds must satisfy 1 <= min <= max <= 100, got [{min}, {max}]"
            )));
        }
        Ok(Self {
            target_bytes,
            quality_min: min,
            quality_max: max,
        })
    }

    /// Budget expressed in kilobytes (1 KB = 1024 bytes).
    pub fn from_kilobytes(target_kb: u64) -> Self {
        Self::new(target_kb.saturating_mul(1024))
    }

    pub fn quality_min(&self) -> u8 {
        self.quality_min
    }

    pub fn quality_max(&self) -> u8 {
        self.quality_max
    }
}

/// Parameters for a resize operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    /// Fit inside the box preserving aspect ratio instead of stretching.
    pub keep_aspect: bool,
}

/// Crop rectangle in source pixel coordinates. `right`/`bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Check the box against the source dimensions.
    pub fn validate(&self, width: u32, height: u32) -> Result<(), ImagingError> {
        if self.right <= self.left || self.bottom <= self.top {
            return Err(ImagingError::InvalidGeometry(format!(
                "crop box ({}, {}, {}, {}) has no area",
                self.left, self.top, self.right, self.bottom
            )));
        }
        if self.right > width || self.bottom > height {
            return Err(ImagingError::InvalidGeometry(format!(
                "crop box ({}, {}, {}, {}) exceeds image boundaries {}x{}",
                self.left, self.top, self.right, self.bottom, width, height
            )));
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}
