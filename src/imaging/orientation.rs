//! Applies stored camera orientation so later geometry sees the upright raster.

use super::raster::RasterImage;
use image::metadata::Orientation;
use tracing::debug;

/// Rotate/flip the raster according to its stored orientation, then clear
/// the orientation so a second call does nothing.
pub fn correct_orientation(image: RasterImage) -> RasterImage {
    let orientation = image.orientation();
    if orientation == Orientation::NoTransforms {
        return image;
    }
    debug!(?orientation, "applying stored orientation");
    image
        .map_geometry(|pixels| {
            let mut oriented = pixels.clone();
            oriented.apply_orientation(orientation);
            oriented
        })
        .mark_oriented()
}
