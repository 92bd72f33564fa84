//! Color-mode normalization against a target format profile.
//!
//! | Profile | Rule |
//! |---|---|
//! | no transparency (jpeg, bmp) | composite alpha onto white, else plain RGB |
//! | palette required (gif) | adaptive quantization to ≤256 colors |
//! | multi-resolution container (ico) | force RGBA |
//! | transparency-safe (png, webp, avif, tiff) | grayscale/palette → RGB or RGBA |

use super::format::FormatProfile;
use super::raster::{ColorMode, RasterImage};
use color_quant::NeuQuant;
use image::{DynamicImage, Rgba, RgbaImage, imageops};
use std::collections::HashSet;

/// NeuQuant sampling factor: 1 is slowest/best, 30 fastest.
const QUANT_SAMPLE_FACTOR: i32 = 10;
const PALETTE_SIZE: usize = 256;

/// Convert `image` so its color mode satisfies `profile`.
pub fn normalize(image: RasterImage, profile: &FormatProfile) -> RasterImage {
    if !profile.supports_transparency {
        let flattened = flatten_onto(image.pixels(), image.mode(), Rgba([255, 255, 255, 255]));
        image.with_pixels(flattened)
    } else if profile.requires_palette {
        let (quantized, translucent) = quantize(image.pixels());
        image.with_palette_pixels(DynamicImage::ImageRgba8(quantized), translucent)
    } else if profile.supports_multi_resolution {
        let rgba = image.pixels().to_rgba8();
        image.with_pixels(DynamicImage::ImageRgba8(rgba))
    } else {
        match image.mode() {
            ColorMode::Rgb | ColorMode::Rgba => image,
            ColorMode::Grayscale | ColorMode::Palette => {
                let rgb = image.pixels().to_rgb8();
                image.with_pixels(DynamicImage::ImageRgb8(rgb))
            }
            ColorMode::GrayscaleAlpha | ColorMode::PaletteAlpha => {
                let rgba = image.pixels().to_rgba8();
                image.with_pixels(DynamicImage::ImageRgba8(rgba))
            }
        }
    }
}

/// Drop the alpha channel by compositing onto an opaque background.
/// Modes without alpha are converted straight to RGB.
pub fn flatten_onto(pixels: &DynamicImage, mode: ColorMode, background: Rgba<u8>) -> DynamicImage {
    if !mode.has_alpha() {
        return DynamicImage::ImageRgb8(pixels.to_rgb8());
    }
    let mut canvas = RgbaImage::from_pixel(pixels.width(), pixels.height(), background);
    imageops::overlay(&mut canvas, &pixels.to_rgba8(), 0, 0);
    DynamicImage::ImageRgba8(canvas).to_rgb8().into()
}

/// Reduce to at most 256 colors. Returns the quantized buffer and whether
/// any resulting color is translucent.
///
/// Buffers that already fit in a palette are kept exactly.
pub fn quantize(pixels: &DynamicImage) -> (RgbaImage, bool) {
    let mut rgba = pixels.to_rgba8();

    if !fits_palette(&rgba) {
        let quant = NeuQuant::new(QUANT_SAMPLE_FACTOR, PALETTE_SIZE, rgba.as_raw());
        let palette = quant.color_map_rgba();
        for pixel in rgba.pixels_mut() {
            let idx = quant.index_of(&pixel.0) * 4;
            pixel.0.copy_from_slice(&palette[idx..idx + 4]);
        }
    }

    let translucent = rgba.pixels().any(|p| p[3] < 255);
    (rgba, translucent)
}

fn fits_palette(rgba: &RgbaImage) -> bool {
    let mut seen = HashSet::with_capacity(PALETTE_SIZE + 1);
    for pixel in rgba.pixels() {
        seen.insert(pixel.0);
        if seen.len() > PALETTE_SIZE {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::format::OutputFormat;
    use crate::test_helpers::{gradient_rgb, noise_rgb, translucent_rgba};
    use image::GrayImage;

    #[test]
    fn jpeg_flattens_alpha_onto_white() {
        let transparent = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0])));
        let image = normalize(
            RasterImage::from_dynamic(transparent),
            &OutputFormat::Jpeg.profile(),
        );
        assert_eq!(image.mode(), ColorMode::Rgb);
        assert_eq!(image.pixels().to_rgb8().get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn flatten_blends_partial_alpha() {
        let half = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128])));
        let flat = flatten_onto(&half, ColorMode::Rgba, Rgba([255, 255, 255, 255]));
        let value = flat.to_rgb8().get_pixel(0, 0)[0];
        assert!((120..=135).contains(&value), "got {value}");
    }

    #[test]
    fn bmp_converts_grayscale_to_rgb() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, image::Luma([77])));
        let image = normalize(RasterImage::from_dynamic(gray), &OutputFormat::Bmp.profile());
        assert_eq!(image.mode(), ColorMode::Rgb);
        assert_eq!(image.pixels().to_rgb8().get_pixel(1, 1).0, [77, 77, 77]);
    }

    #[test]
    fn png_keeps_rgba_untouched() {
        let source = translucent_rgba(8, 8);
        let image = normalize(
            RasterImage::from_dynamic(source.clone()),
            &OutputFormat::Png.profile(),
        );
        assert_eq!(image.mode(), ColorMode::Rgba);
        assert_eq!(image.pixels().as_bytes(), source.as_bytes());
    }

    #[test]
    fn webp_expands_grayscale() {
        let gray = DynamicImage::ImageLumaA8(image::GrayAlphaImage::new(3, 3));
        let image = normalize(RasterImage::from_dynamic(gray), &OutputFormat::WebP.profile());
        assert_eq!(image.mode(), ColorMode::Rgba);
    }

    #[test]
    fn gif_quantizes_to_palette() {
        let image = normalize(
            RasterImage::from_dynamic(noise_rgb(64, 64)),
            &OutputFormat::Gif.profile(),
        );
        assert_eq!(image.mode(), ColorMode::Palette);
        let colors: HashSet<[u8; 4]> = image.pixels().to_rgba8().pixels().map(|p| p.0).collect();
        assert!(colors.len() <= 256, "{} colors", colors.len());
    }

    #[test]
    fn gif_marks_translucent_palette() {
        let image = normalize(
            RasterImage::from_dynamic(translucent_rgba(16, 4)),
            &OutputFormat::Gif.profile(),
        );
        assert_eq!(image.mode(), ColorMode::PaletteAlpha);
    }

    #[test]
    fn small_palettes_are_exact() {
        let source = gradient_rgb(200, 1);
        let (quantized, translucent) = quantize(&source);
        assert!(!translucent);
        assert_eq!(
            DynamicImage::ImageRgba8(quantized).to_rgb8().as_raw(),
            source.to_rgb8().as_raw()
        );
    }

    #[test]
    fn ico_forces_alpha_channel() {
        let image = normalize(
            RasterImage::from_dynamic(gradient_rgb(8, 8)),
            &OutputFormat::Ico.profile(),
        );
        assert_eq!(image.mode(), ColorMode::Rgba);
    }

    #[test]
    fn palette_input_to_png_becomes_rgb() {
        let (quantized, _) = quantize(&gradient_rgb(8, 8));
        let palette =
            RasterImage::from_dynamic(gradient_rgb(8, 8)).with_palette_pixels(quantized.into(), false);
        let image = normalize(palette, &OutputFormat::Png.profile());
        assert_eq!(image.mode(), ColorMode::Rgb);
    }
}
