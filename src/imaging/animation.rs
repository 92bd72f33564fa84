//! Frame-by-frame re-encoding of animated sources.

use super::error::ImagingError;
use super::format::{FormatProfile, OutputFormat};
use super::normalize::quantize;
use super::raster::{LoopCount, RasterImage};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame};
use tracing::debug;

/// Display duration for frames whose source stored none.
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

/// True when `image` has more than one frame and `profile` can carry them.
pub fn should_preserve(image: &RasterImage, profile: &FormatProfile) -> bool {
    image.is_animated() && profile.supports_animation
}

/// Encode every frame, in order, into one animated artifact.
///
/// Each frame is palettized on its own, keeps its source duration (or
/// [`DEFAULT_FRAME_DELAY_MS`]) and the source loop count is carried over.
pub fn encode_animation(image: &RasterImage, format: OutputFormat) -> Result<Vec<u8>, ImagingError> {
    if format != OutputFormat::Gif {
        return Err(ImagingError::UnsupportedFormat(format!(
            "{format} has no animated encoder"
        )));
    }

    let repeat = match image.loop_count() {
        LoopCount::Infinite => Repeat::Infinite,
        LoopCount::Finite(n) => Repeat::Finite(n),
    };

    let frames = image.frames().iter().map(|frame| {
        let (palettized, _) = quantize(&DynamicImage::ImageRgba8(frame.buffer.clone()));
        let delay_ms = frame.delay_ms.unwrap_or(DEFAULT_FRAME_DELAY_MS);
        Frame::from_parts(
            palettized,
            frame.left,
            frame.top,
            Delay::from_numer_denom_ms(delay_ms, 1),
        )
    });

    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        encoder.set_repeat(repeat).map_err(ImagingError::encode)?;
        encoder.encode_frames(frames).map_err(ImagingError::encode)?;
    }
    debug!(
        frames = image.frames().len(),
        loop_count = ?image.loop_count(),
        size = buf.len(),
        "encoded animation"
    );
    Ok(buf)
}
