//! Resize and crop.

use super::calculations::fit_within;
use super::error::ImagingError;
use super::params::{CropBox, ResizeParams};
use super::raster::RasterImage;
use super::safety::SafetyLimits;
use image::imageops::FilterType;

/// Resize to the requested box.
///
/// With `keep_aspect` the result is the largest aspect-preserving size that
/// fits in the box; a source already inside the box is left as is. Without
/// it the result is exactly `width`x`height`.
pub fn resize(
    image: RasterImage,
    params: ResizeParams,
    limits: &SafetyLimits,
) -> Result<RasterImage, ImagingError> {
    limits.check_output(params.width as u64, params.height as u64)?;

    let (width, height) = if params.keep_aspect {
        fit_within(image.dimensions(), (params.width, params.height))
    } else {
        (params.width, params.height)
    };

    if (width, height) == image.dimensions() {
        return Ok(image);
    }
    Ok(resample(image, width, height))
}

/// Exact Lanczos3 resample of every frame.
pub fn resample(image: RasterImage, width: u32, height: u32) -> RasterImage {
    image.map_geometry(|pixels| pixels.resize_exact(width, height, FilterType::Lanczos3))
}

/// Cut out `crop`. Nothing is produced if the box is invalid.
pub fn crop(image: RasterImage, crop: CropBox) -> Result<RasterImage, ImagingError> {
    crop.validate(image.width(), image.height())?;
    Ok(image.map_geometry(|pixels| {
        pixels.crop_imm(crop.left, crop.top, crop.width(), crop.height())
    }))
}
