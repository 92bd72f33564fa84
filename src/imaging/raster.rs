//! The in-memory raster that flows through a pipeline invocation.
//!
//! A [`RasterImage`] is owned by exactly one invocation. Every stage takes
//! it by value and hands back a new one, so stages can be reordered without
//! aliasing concerns.

use super::error::ImagingError;
use super::safety::SafetyLimits;
use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::metadata::Orientation;
use image::{
    AnimationDecoder, DynamicImage, Frames, ImageDecoder, ImageFormat, ImageReader, RgbaImage,
};
use std::io::Cursor;
use tracing::debug;

/// Channel layout of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    Rgba,
    /// Quantized to at most 256 opaque colors.
    Palette,
    /// Quantized to at most 256 colors, some translucent.
    PaletteAlpha,
}

impl ColorMode {
    /// Mode implied by a pixel buffer's channel layout.
    pub fn of(pixels: &DynamicImage) -> Self {
        match pixels {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_) => Self::Grayscale,
            DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => Self::GrayscaleAlpha,
            DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgb32F(_) => Self::Rgb,
            _ => Self::Rgba,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Self::GrayscaleAlpha | Self::Rgba | Self::PaletteAlpha)
    }

    pub fn is_palette(self) -> bool {
        matches!(self, Self::Palette | Self::PaletteAlpha)
    }

    pub fn is_grayscale(self) -> bool {
        matches!(self, Self::Grayscale | Self::GrayscaleAlpha)
    }
}

/// Number of times an animation repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopCount {
    #[default]
    Infinite,
    Finite(u16),
}

/// One frame of an animated source: a full-canvas RGBA buffer.
#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub buffer: RgbaImage,
    pub left: u32,
    pub top: u32,
    /// Display duration; `None` when the source stored zero.
    pub delay_ms: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: DynamicImage,
    mode: ColorMode,
    frames: Vec<AnimationFrame>,
    loop_count: LoopCount,
    orientation: Orientation,
    source_format: Option<ImageFormat>,
}

impl RasterImage {
    /// Wrap an already-decoded still image with no metadata.
    pub fn from_dynamic(pixels: DynamicImage) -> Self {
        Self {
            mode: ColorMode::of(&pixels),
            pixels,
            frames: Vec::new(),
            loop_count: LoopCount::Infinite,
            orientation: Orientation::NoTransforms,
            source_format: None,
        }
    }

    pub fn with_source_format(mut self, format: ImageFormat) -> Self {
        self.source_format = Some(format);
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_frames(mut self, frames: Vec<AnimationFrame>, loop_count: LoopCount) -> Self {
        self.frames = frames;
        self.loop_count = loop_count;
        self
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> DynamicImage {
        self.pixels
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    /// True when the source carried more than one frame.
    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn loop_count(&self) -> LoopCount {
        self.loop_count
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }

    /// Replace the pixel buffer, deriving the mode from its layout.
    pub fn with_pixels(mut self, pixels: DynamicImage) -> Self {
        self.mode = ColorMode::of(&pixels);
        self.pixels = pixels;
        self
    }

    /// Replace the pixel buffer with quantized data and mark it as palette.
    pub fn with_palette_pixels(mut self, pixels: DynamicImage, translucent: bool) -> Self {
        self.mode = if translucent {
            ColorMode::PaletteAlpha
        } else {
            ColorMode::Palette
        };
        self.pixels = pixels;
        self
    }

    pub(crate) fn mark_oriented(mut self) -> Self {
        self.orientation = Orientation::NoTransforms;
        self
    }

    /// Apply a geometric transform to the still pixels and every frame.
    pub fn map_geometry(self, transform: impl Fn(&DynamicImage) -> DynamicImage) -> Self {
        let pixels = transform(&self.pixels);
        let frames = self
            .frames
            .iter()
            .map(|frame| AnimationFrame {
                buffer: transform(&DynamicImage::ImageRgba8(frame.buffer.clone())).to_rgba8(),
                left: 0,
                top: 0,
                delay_ms: frame.delay_ms,
            })
            .collect();
        let mode = if self.mode.is_palette() {
            // Resampling introduces new colors.
            ColorMode::of(&pixels)
        } else {
            self.mode
        };
        Self {
            pixels,
            mode,
            frames,
            ..self
        }
    }
}

/// Decode a byte buffer into a still [`RasterImage`].
///
/// Header dimensions are checked against `limits` before any pixel buffer
/// is allocated. Stored orientation is recorded but not applied. An animated
/// source yields its first frame only; see [`decode_animated`].
pub fn decode(bytes: &[u8], limits: &SafetyLimits) -> Result<RasterImage, ImagingError> {
    decode_source(bytes, limits, false)
}

/// Like [`decode`], but an animated GIF, APNG or WebP keeps every frame.
///
/// The pixel ceiling covers all frames together, and the still pixels are
/// taken from the first frame rather than decoded a second time.
pub fn decode_animated(bytes: &[u8], limits: &SafetyLimits) -> Result<RasterImage, ImagingError> {
    decode_source(bytes, limits, true)
}

fn decode_source(
    bytes: &[u8],
    limits: &SafetyLimits,
    keep_frames: bool,
) -> Result<RasterImage, ImagingError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ImagingError::decode)?;
    let format = reader
        .format()
        .ok_or_else(|| ImagingError::InvalidImageData("unrecognized image container".into()))?;

    let mut decoder = reader.into_decoder().map_err(ImagingError::decode)?;
    let (width, height) = decoder.dimensions();
    limits.check_source(width, height)?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let frames = if keep_frames {
        decode_frames(bytes, format, (width, height), limits)?
    } else {
        Vec::new()
    };
    let pixels = match frames.first() {
        Some(first) => DynamicImage::ImageRgba8(first.buffer.clone()),
        None => DynamicImage::from_decoder(decoder).map_err(ImagingError::decode)?,
    };
    debug!(?format, width, height, frames = frames.len(), "decoded source");

    let image = RasterImage::from_dynamic(pixels)
        .with_source_format(format)
        .with_orientation(orientation);
    if frames.len() > 1 {
        let loop_count = if format == ImageFormat::Gif {
            gif_loop_count(bytes)
        } else {
            LoopCount::Infinite
        };
        Ok(image.with_frames(frames, loop_count))
    } else {
        Ok(image)
    }
}

/// Frame iterator for containers that carry an animation; `None` for stills.
fn animation_frames(bytes: &[u8], format: ImageFormat) -> image::ImageResult<Option<Frames<'_>>> {
    let cursor = Cursor::new(bytes);
    let frames = match format {
        ImageFormat::Gif => GifDecoder::new(cursor)?.into_frames(),
        ImageFormat::Png => {
            let decoder = PngDecoder::new(cursor)?;
            if !decoder.is_apng()? {
                return Ok(None);
            }
            decoder.apng()?.into_frames()
        }
        ImageFormat::WebP => {
            let decoder = WebPDecoder::new(cursor)?;
            if !decoder.has_animation() {
                return Ok(None);
            }
            decoder.into_frames()
        }
        _ => return Ok(None),
    };
    Ok(Some(frames))
}

/// Collect every frame, stopping as soon as the frames decoded so far pass
/// the pixel ceiling. Still images yield an empty list.
fn decode_frames(
    bytes: &[u8],
    format: ImageFormat,
    (width, height): (u32, u32),
    limits: &SafetyLimits,
) -> Result<Vec<AnimationFrame>, ImagingError> {
    let Some(frames) = animation_frames(bytes, format).map_err(ImagingError::decode)? else {
        return Ok(Vec::new());
    };

    let mut collected = Vec::new();
    for frame in frames {
        let frame = frame.map_err(ImagingError::decode)?;
        limits.check_frames(width, height, collected.len() as u64 + 1)?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        let delay = if denom == 0 { 0 } else { numer / denom };
        collected.push(AnimationFrame {
            left: frame.left(),
            top: frame.top(),
            delay_ms: (delay > 0).then_some(delay),
            buffer: frame.into_buffer(),
        });
    }
    Ok(collected)
}

/// Read the loop count from a GIF's NETSCAPE2.0 (or ANIMEXTS1.0)
/// application extension. Absent means play forever.
///
/// Sub-block layout after the 11-byte identifier: `03 01 <lo> <hi>`.
pub fn gif_loop_count(bytes: &[u8]) -> LoopCount {
    for id in [b"NETSCAPE2.0", b"ANIMEXTS1.0"] {
        let Some(pos) = bytes.windows(id.len()).position(|w| w == id) else {
            continue;
        };
        let block = &bytes[pos + id.len()..];
        if block.len() >= 4 && block[0] == 0x03 && block[1] == 0x01 {
            return match u16::from_le_bytes([block[2], block[3]]) {
                0 => LoopCount::Infinite,
                n => LoopCount::Finite(n),
            };
        }
    }
    LoopCount::Infinite
}
