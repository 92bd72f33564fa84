//! Pixel buffer → encoded bytes.
//!
//! Encoders come from the `image` crate, except WebP, which goes through
//! libwebp (the `image` crate only writes lossless WebP):
//!
//! | Format | Encoder | Quality |
//! |---|---|---|
//! | JPEG | `JpegEncoder` | honored |
//! | AVIF | `AvifEncoder` (rav1e, speed 6) | honored |
//! | WebP | `webp::Encoder` (lossy VP8) | honored |
//! | PNG, BMP, TIFF, GIF | format encoder | n/a |
//! | ICO | `IcoEncoder`, PNG-compressed entries | n/a |

use super::calculations::fit_within;
use super::error::ImagingError;
use super::format::OutputFormat;
use super::params::Quality;
use image::codecs::avif::AvifEncoder;
use image::codecs::bmp::BmpEncoder;
use image::codecs::gif::GifEncoder;
use image::codecs::ico::{IcoEncoder, IcoFrame};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, Frame, GenericImageView, ImageEncoder};
use std::io::Cursor;

/// Largest side an ICO entry can describe.
pub const ICO_MAX_SIDE: u32 = 256;

/// rav1e speed preset: 1 slowest/best, 10 fastest.
const AVIF_SPEED: u8 = 6;

/// Encode a still raster. `quality` is only consulted by lossy encoders.
pub fn encode(
    pixels: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, ImagingError> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let rgb = pixels.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, quality.value())
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
                .map_err(ImagingError::encode)?;
        }
        OutputFormat::Png => {
            let (raw, color) = eight_bit(pixels);
            PngEncoder::new(&mut buf)
                .write_image(&raw, pixels.width(), pixels.height(), color)
                .map_err(ImagingError::encode)?;
        }
        OutputFormat::WebP => return encode_webp(pixels, quality),
        OutputFormat::Bmp => {
            let (raw, color) = eight_bit(pixels);
            BmpEncoder::new(&mut buf)
                .write_image(&raw, pixels.width(), pixels.height(), color)
                .map_err(ImagingError::encode)?;
        }
        OutputFormat::Tiff => {
            let (raw, color) = eight_bit(pixels);
            let mut cursor = Cursor::new(&mut buf);
            TiffEncoder::new(&mut cursor)
                .write_image(&raw, pixels.width(), pixels.height(), color)
                .map_err(ImagingError::encode)?;
        }
        OutputFormat::Gif => {
            let mut encoder = GifEncoder::new(&mut buf);
            encoder
                .encode_frame(Frame::new(pixels.to_rgba8()))
                .map_err(ImagingError::encode)?;
        }
        OutputFormat::Ico => {
            let side = fit_within(pixels.dimensions(), (ICO_MAX_SIDE, ICO_MAX_SIDE));
            return encode_icon_entries(pixels, &[side]);
        }
        OutputFormat::Avif => {
            let (raw, color) = eight_bit(pixels);
            AvifEncoder::new_with_speed_quality(&mut buf, AVIF_SPEED, quality.value())
                .write_image(&raw, pixels.width(), pixels.height(), color)
                .map_err(ImagingError::encode)?;
        }
    }
    Ok(buf)
}

/// Lossy WebP. Alpha is kept when the buffer has it.
fn encode_webp(pixels: &DynamicImage, quality: Quality) -> Result<Vec<u8>, ImagingError> {
    let (width, height) = pixels.dimensions();
    let quality = quality.value() as f32;
    let encoded = if pixels.color().has_alpha() {
        let rgba = pixels.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode_simple(false, quality)
    } else {
        let rgb = pixels.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_simple(false, quality)
    };
    encoded
        .map(|memory| memory.to_vec())
        .map_err(|err| ImagingError::EncodingFailure(format!("webp encoding failed: {err:?}")))
}

/// Multi-resolution ICO: one square entry per size, each resampled from
/// `canvas` with Lanczos3.
pub fn encode_icon_container(canvas: &DynamicImage, sizes: &[u32]) -> Result<Vec<u8>, ImagingError> {
    let entries: Vec<(u32, u32)> = sizes.iter().map(|&s| (s, s)).collect();
    encode_icon_entries(canvas, &entries)
}

fn encode_icon_entries(pixels: &DynamicImage, entries: &[(u32, u32)]) -> Result<Vec<u8>, ImagingError> {
    let mut frames = Vec::with_capacity(entries.len());
    for &(width, height) in entries {
        if width == 0 || height == 0 || width > ICO_MAX_SIDE || height > ICO_MAX_SIDE {
            return Err(ImagingError::InvalidGeometry(format!(
                "icon entry {width}x{height} outside 1..={ICO_MAX_SIDE}"
            )));
        }
        let rgba = if (width, height) == pixels.dimensions() {
            pixels.to_rgba8()
        } else {
            pixels.resize_exact(width, height, FilterType::Lanczos3).to_rgba8()
        };
        let frame = IcoFrame::as_png(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(ImagingError::encode)?;
        frames.push(frame);
    }

    let mut buf = Vec::new();
    IcoEncoder::new(&mut buf)
        .encode_images(&frames)
        .map_err(ImagingError::encode)?;
    Ok(buf)
}

/// Flatten deep or float buffers to 8 bits per channel, keeping alpha and
/// grayscale where present.
fn eight_bit(pixels: &DynamicImage) -> (Vec<u8>, ExtendedColorType) {
    match pixels {
        DynamicImage::ImageLuma8(img) => (img.as_raw().clone(), ExtendedColorType::L8),
        DynamicImage::ImageLumaA8(img) => (img.as_raw().clone(), ExtendedColorType::La8),
        DynamicImage::ImageRgb8(img) => (img.as_raw().clone(), ExtendedColorType::Rgb8),
        other if other.color().has_alpha() => {
            (other.to_rgba8().into_raw(), ExtendedColorType::Rgba8)
        }
        other => (other.to_rgb8().into_raw(), ExtendedColorType::Rgb8),
    }
}

/// An encoder whose output size responds to a quality knob.
///
/// The size-target search only needs this one operation, which keeps it
/// testable against scripted size curves.
pub trait QualityEncoder: Send + Sync {
    fn encode_at(&self, pixels: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImagingError>;
}

/// Baseline JPEG at the requested quality.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegQualityEncoder;

impl QualityEncoder for JpegQualityEncoder {
    fn encode_at(&self, pixels: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImagingError> {
        encode(pixels, OutputFormat::Jpeg, Quality::new(quality as u32))
    }
}
