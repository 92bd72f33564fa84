//! Background policies, brand-color sampling and transparent-border trimming.

use super::error::ImagingError;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use std::fmt;
use std::str::FromStr;

/// Side of the thumbnail the brand color is averaged over.
const SAMPLE_SIDE: u32 = 50;
/// Pixels at or below this alpha are ignored when sampling.
const SAMPLE_ALPHA_THRESHOLD: u8 = 128;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// How the favicon canvas is filled behind the logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundPolicy {
    #[default]
    Transparent,
    Color(Rgba<u8>),
    /// Use the sampled brand color.
    Auto,
}

impl BackgroundPolicy {
    /// Concrete fill once the brand color is known.
    pub fn resolve(self, brand: Rgba<u8>) -> Rgba<u8> {
        match self {
            Self::Transparent => TRANSPARENT,
            Self::Color(color) => color,
            Self::Auto => brand,
        }
    }
}

impl FromStr for BackgroundPolicy {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transparent" => Ok(Self::Transparent),
            "white" => Ok(Self::Color(WHITE)),
            "black" => Ok(Self::Color(BLACK)),
            "auto" => Ok(Self::Auto),
            other => parse_hex(other).map(Self::Color),
        }
    }
}

impl fmt::Display for BackgroundPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transparent => f.write_str("transparent"),
            Self::Color(color) => f.write_str(&to_hex(*color)),
            Self::Auto => f.write_str("auto"),
        }
    }
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex(value: &str) -> Result<Rgba<u8>, ImagingError> {
    let invalid = || ImagingError::InvalidParameter(format!("'{value}' is not a color"));
    let digits = value.strip_prefix('#').ok_or_else(invalid)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());

    match digits.len() {
        3 => {
            let nibble = |i: usize| {
                u8::from_str_radix(&digits[i..i + 1], 16)
                    .map(|n| n * 17)
                    .map_err(|_| invalid())
            };
            Ok(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, 255]))
        }
        6 => Ok(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Ok(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => Err(invalid()),
    }
}

/// `#rrggbb`, or `#rrggbbaa` when not fully opaque.
pub fn to_hex(color: Rgba<u8>) -> String {
    let [r, g, b, a] = color.0;
    if a == 255 {
        format!("#{r:02x}{g:02x}{b:02x}")
    } else {
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

/// Average RGB of the clearly opaque pixels of a 50x50 downscale.
/// White when nothing qualifies.
pub fn sample_brand_color(pixels: &DynamicImage) -> Rgba<u8> {
    let small = pixels
        .resize_exact(SAMPLE_SIDE, SAMPLE_SIDE, FilterType::Triangle)
        .to_rgba8();

    let (mut sum, mut count) = ([0u64; 3], 0u64);
    for pixel in small.pixels().filter(|p| p[3] > SAMPLE_ALPHA_THRESHOLD) {
        for (acc, channel) in sum.iter_mut().zip(pixel.0) {
            *acc += channel as u64;
        }
        count += 1;
    }

    if count == 0 {
        return WHITE;
    }
    Rgba([
        (sum[0] / count) as u8,
        (sum[1] / count) as u8,
        (sum[2] / count) as u8,
        255,
    ])
}

/// Crop to the tightest box holding every pixel with non-zero alpha.
/// A fully transparent image is returned unchanged.
pub fn trim_transparent(pixels: &RgbaImage) -> RgbaImage {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in pixels.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x), b.max(y)),
        });
    }

    match bounds {
        Some((left, top, right, bottom)) => {
            image::imageops::crop_imm(pixels, left, top, right - left + 1, bottom - top + 1)
                .to_image()
        }
        None => pixels.clone(),
    }
}
