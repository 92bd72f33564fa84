//! Shared test utilities for the rasterforge test suite.
//!
//! Everything here builds synthetic images in memory so tests never depend
//! on fixture files.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let bytes = encode_png(&logo_with_margin(400, 300, 20));
//! let image = decode(&bytes, &SafetyLimits::default()).unwrap();
//!
//! let animated = decode_animated(&animated_gif_bytes(3, 40, None), &SafetyLimits::default());
//! ```

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Synthetic pixel buffers
// =========================================================================

/// Opaque RGB gradient. Varies on both axes so lossy encoders have work to do.
pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

/// Pseudo-random noise; compresses badly, which makes budgets hard to meet.
pub fn noise_rgb(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x9E37_79B9;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xFF) as u8
        };
        Rgb([next(), next(), next()])
    }))
}

/// RGBA image with a horizontal alpha ramp from 0 to 255.
pub fn translucent_rgba(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, _| {
        let alpha = ((x * 255) / width.max(2).saturating_sub(1)).min(255) as u8;
        Rgba([200, 40, 40, alpha])
    }))
}

/// Solid red square logo centered on a fully transparent field, with a
/// transparent border of `margin` pixels on every side.
pub fn logo_with_margin(width: u32, height: u32, margin: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        let inside = x >= margin && y >= margin && x < width - margin && y < height - margin;
        if inside {
            Rgba([220, 20, 60, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    }))
}

// =========================================================================
// Encoded buffers
// =========================================================================

pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
    encode_as(image, ImageFormat::Png)
}

pub fn encode_as(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

/// Animated GIF with `frames` 16x8 frames of alternating colors.
///
/// `loops: None` writes an infinite-loop extension.
pub fn animated_gif_bytes(frames: usize, delay_ms: u32, loops: Option<u16>) -> Vec<u8> {
    animated_gif(frames, (16, 8), delay_ms, loops)
}

/// [`animated_gif_bytes`] with a chosen canvas size.
pub fn animated_gif(
    frames: usize,
    (width, height): (u32, u32),
    delay_ms: u32,
    loops: Option<u16>,
) -> Vec<u8> {
    let colors = [Rgba([255, 0, 0, 255]), Rgba([0, 0, 255, 255]), Rgba([0, 255, 0, 255])];
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        let repeat = match loops {
            Some(n) => Repeat::Finite(n),
            None => Repeat::Infinite,
        };
        encoder.set_repeat(repeat).unwrap();
        let frames = (0..frames).map(|i| {
            Frame::from_parts(
                RgbaImage::from_pixel(width, height, colors[i % colors.len()]),
                0,
                0,
                Delay::from_numer_denom_ms(delay_ms, 1),
            )
        });
        encoder.encode_frames(frames).unwrap();
    }
    buf
}

/// Decode bytes back into a [`DynamicImage`] using format sniffing.
pub fn decode_any(bytes: &[u8]) -> DynamicImage {
    image::load_from_memory(bytes).unwrap()
}
