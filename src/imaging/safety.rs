//! Resource ceilings checked before any size-proportional allocation.

use super::error::ImagingError;
use tracing::warn;

/// Default decoded pixel-count ceiling (decompression-bomb guard).
pub const DEFAULT_MAX_PIXELS: u64 = 50_000_000;

/// Default per-axis ceiling for requested output dimensions.
pub const DEFAULT_MAX_DIMENSION: u32 = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyLimits {
    pub max_pixels: u64,
    pub max_dimension: u32,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

impl SafetyLimits {
    /// Reject a source whose header dimensions exceed the pixel ceiling.
    ///
    /// Callers pass dimensions read from the container header, so nothing
    /// has been allocated for the pixels yet.
    pub fn check_source(&self, width: u32, height: u32) -> Result<(), ImagingError> {
        let pixels = width as u64 * height as u64;
        if pixels > self.max_pixels {
            warn!(width, height, limit = self.max_pixels, "rejected oversized source");
            return Err(ImagingError::DimensionTooLarge {
                width,
                height,
                limit: self.max_pixels,
            });
        }
        Ok(())
    }

    /// Reject an animation whose frames together exceed the pixel ceiling.
    ///
    /// Every decoded frame is a full `width`x`height` canvas, so `frames`
    /// canvases are what ends up in memory.
    pub fn check_frames(&self, width: u32, height: u32, frames: u64) -> Result<(), ImagingError> {
        let pixels = (width as u64 * height as u64).saturating_mul(frames);
        if pixels > self.max_pixels {
            warn!(width, height, frames, limit = self.max_pixels, "rejected oversized animation");
            return Err(ImagingError::DimensionTooLarge {
                width,
                height,
                limit: self.max_pixels,
            });
        }
        Ok(())
    }

    /// Reject a requested output size that is zero or over the per-axis ceiling.
    pub fn check_output(&self, width: u64, height: u64) -> Result<(), ImagingError> {
        if width == 0 || height == 0 {
            return Err(ImagingError::InvalidGeometry(format!(
                "output dimensions must be positive, got {width}x{height}"
            )));
        }
        let max = self.max_dimension as u64;
        if width > max || height > max {
            warn!(width, height, limit = max, "rejected oversized output request");
            return Err(ImagingError::InvalidGeometry(format!(
                "requested dimensions {width}x{height} exceed the {max}px limit"
            )));
        }
        Ok(())
    }
}
