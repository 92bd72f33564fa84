//! Named optimization presets for common publishing targets.
//!
//! | Preset | Geometry | Encoding | Filename |
//! |---|---|---|---|
//! | twitter, whatsapp | longest side ≤ 1600 | JPEG within 1000 KB | `<name>.jpg` |
//! | web | longest side ≤ 1920 | WebP q75 | `optimized_web.webp` |
//! | instagram | longest side ≤ 1080 | JPEG q85 | `instagram.jpg` |
//! | youtube | center crop to 16:9, then 1280x720 | JPEG q90 | `youtube.jpg` |
//! | seo | 480/768/1200 WebP q75 + full-size AVIF | ZIP | `seo-images.zip` |
//!
//! Every preset starts from the source flattened onto white.

use crate::archive::{AssetArchive, ZIP_CONTENT_TYPE};
use crate::config::CompressionConfig;
use crate::imaging::calculations::{cover_crop_region, fit_longest_side};
use crate::imaging::codec::{JpegQualityEncoder, encode};
use crate::imaging::compress::compress_to_budget;
use crate::imaging::geometry::{crop, resample};
use crate::imaging::normalize::normalize;
use crate::imaging::{CropBox, ImagingError, OutputFormat, Quality, RasterImage};
use std::fmt;
use std::str::FromStr;

const SOCIAL_LONGEST_SIDE: u32 = 1600;
const SOCIAL_BUDGET_KB: u64 = 1000;
const WEB_LONGEST_SIDE: u32 = 1920;
const WEBP_QUALITY: u32 = 75;
const INSTAGRAM_LONGEST_SIDE: u32 = 1080;
const INSTAGRAM_QUALITY: u32 = 85;
const YOUTUBE_FRAME: (u32, u32) = (1280, 720);
const YOUTUBE_QUALITY: u32 = 90;
const SEO_SIZES: [u32; 3] = [480, 768, 1200];
const SEO_AVIF_QUALITY: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Twitter,
    Whatsapp,
    Web,
    Instagram,
    Youtube,
    Seo,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Self::Twitter,
        Self::Whatsapp,
        Self::Web,
        Self::Instagram,
        Self::Youtube,
        Self::Seo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Whatsapp => "whatsapp",
            Self::Web => "web",
            Self::Instagram => "instagram",
            Self::Youtube => "youtube",
            Self::Seo => "seo",
        }
    }

    pub fn filename(self) -> &'static str {
        match self {
            Self::Twitter => "twitter.jpg",
            Self::Whatsapp => "whatsapp.jpg",
            Self::Web => "optimized_web.webp",
            Self::Instagram => "instagram.jpg",
            Self::Youtube => "youtube.jpg",
            Self::Seo => "seo-images.zip",
        }
    }
}

impl FromStr for Preset {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ImagingError::InvalidParameter(format!("unknown preset '{s}'")))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoded preset result.
#[derive(Debug, Clone)]
pub struct PresetOutput {
    pub bytes: Vec<u8>,
    /// `jpeg`, `webp` or `zip`.
    pub format_name: &'static str,
    pub content_type: &'static str,
    pub filename: &'static str,
    /// Dimensions of the primary rendition.
    pub width: u32,
    pub height: u32,
}

pub fn optimize(
    image: RasterImage,
    preset: Preset,
    compression: &CompressionConfig,
) -> Result<PresetOutput, ImagingError> {
    let image = normalize(image, &OutputFormat::Jpeg.profile());

    match preset {
        Preset::Twitter | Preset::Whatsapp => {
            let image = shrink_longest_side(image, SOCIAL_LONGEST_SIDE);
            let budget = compression.budget(SOCIAL_BUDGET_KB * 1024)?;
            let outcome = compress_to_budget(&JpegQualityEncoder, image.pixels(), &budget)?;
            Ok(output(preset, OutputFormat::Jpeg, outcome.bytes, &image))
        }
        Preset::Web => {
            let image = shrink_longest_side(image, WEB_LONGEST_SIDE);
            let bytes = encode(image.pixels(), OutputFormat::WebP, Quality::new(WEBP_QUALITY))?;
            Ok(output(preset, OutputFormat::WebP, bytes, &image))
        }
        Preset::Instagram => {
            let image = shrink_longest_side(image, INSTAGRAM_LONGEST_SIDE);
            let bytes = encode(image.pixels(), OutputFormat::Jpeg, Quality::new(INSTAGRAM_QUALITY))?;
            Ok(output(preset, OutputFormat::Jpeg, bytes, &image))
        }
        Preset::Youtube => {
            let image = cover(image, YOUTUBE_FRAME)?;
            let bytes = encode(image.pixels(), OutputFormat::Jpeg, Quality::new(YOUTUBE_QUALITY))?;
            Ok(output(preset, OutputFormat::Jpeg, bytes, &image))
        }
        Preset::Seo => seo_bundle(image),
    }
}

fn output(preset: Preset, format: OutputFormat, bytes: Vec<u8>, image: &RasterImage) -> PresetOutput {
    PresetOutput {
        bytes,
        format_name: format.name(),
        content_type: format.mime_type(),
        filename: preset.filename(),
        width: image.width(),
        height: image.height(),
    }
}

fn shrink_longest_side(image: RasterImage, max_edge: u32) -> RasterImage {
    let (width, height) = fit_longest_side(image.dimensions(), max_edge);
    if (width, height) == image.dimensions() {
        image
    } else {
        resample(image, width, height)
    }
}

/// Crop the centered region with `frame`'s aspect ratio, then resample it to
/// exactly `frame`.
fn cover(image: RasterImage, frame: (u32, u32)) -> Result<RasterImage, ImagingError> {
    let (left, top, width, height) = cover_crop_region(image.dimensions(), frame);
    let cropped = crop(image, CropBox::new(left, top, left + width, top + height))?;
    Ok(resample(cropped, frame.0, frame.1))
}

fn seo_bundle(image: RasterImage) -> Result<PresetOutput, ImagingError> {
    let mut archive = AssetArchive::new();
    for size in SEO_SIZES {
        let (w, h) = fit_longest_side(image.dimensions(), size);
        let resized = image.pixels().resize_exact(w, h, image::imageops::FilterType::Lanczos3);
        let bytes = encode(&resized, OutputFormat::WebP, Quality::new(WEBP_QUALITY))?;
        archive.add(&format!("image-{size}.webp"), &bytes)?;
    }
    let avif = encode(image.pixels(), OutputFormat::Avif, Quality::new(SEO_AVIF_QUALITY))?;
    archive.add("image.avif", &avif)?;

    let packaged = archive.finish()?;
    Ok(PresetOutput {
        bytes: packaged.bytes,
        format_name: "zip",
        content_type: ZIP_CONTENT_TYPE,
        filename: Preset::Seo.filename(),
        width: image.width(),
        height: image.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient_rgb, noise_rgb, translucent_rgba};
    use image::GenericImageView;
    use std::io::Cursor;
    use zip::ZipArchive;

    fn run(preset: Preset, w: u32, h: u32) -> PresetOutput {
        optimize(
            RasterImage::from_dynamic(gradient_rgb(w, h)),
            preset,
            &CompressionConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn preset_names_parse_case_insensitively() {
        assert_eq!("Twitter".parse::<Preset>().unwrap(), Preset::Twitter);
        assert_eq!("SEO".parse::<Preset>().unwrap(), Preset::Seo);
        assert!(matches!(
            "tiktok".parse::<Preset>(),
            Err(ImagingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn twitter_shrinks_and_meets_budget() {
        let out = run(Preset::Twitter, 2000, 1000);
        assert_eq!((out.width, out.height), (1600, 800));
        assert!(out.bytes.len() <= 1000 * 1024);
        assert_eq!(out.filename, "twitter.jpg");
        assert_eq!(out.content_type, "image/jpeg");
    }

    #[test]
    fn instagram_never_upscales() {
        let out = run(Preset::Instagram, 600, 400);
        assert_eq!((out.width, out.height), (600, 400));
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (600, 400));
    }

    #[test]
    fn web_is_webp() {
        let out = run(Preset::Web, 2400, 1200);
        assert_eq!((out.width, out.height), (1920, 960));
        assert_eq!(out.filename, "optimized_web.webp");
        assert_eq!(image::guess_format(&out.bytes).unwrap(), image::ImageFormat::WebP);
    }

    #[test]
    fn youtube_is_exact_frame() {
        for (w, h) in [(500, 500), (3000, 1000), (800, 1200)] {
            let out = run(Preset::Youtube, w, h);
            assert_eq!((out.width, out.height), (1280, 720), "from {w}x{h}");
            let decoded = image::load_from_memory(&out.bytes).unwrap();
            assert_eq!(decoded.dimensions(), (1280, 720));
        }
    }

    #[test]
    fn youtube_extreme_aspect_is_cropped_before_scaling() {
        for (w, h) in [(2, 2000), (4000, 2)] {
            let out = run(Preset::Youtube, w, h);
            assert_eq!((out.width, out.height), (1280, 720), "from {w}x{h}");
        }
    }

    #[test]
    fn youtube_keeps_the_center() {
        // Red band in the middle third, blue elsewhere; the 16:9 crop of a
        // square keeps the middle rows.
        let source = image::RgbImage::from_fn(900, 900, |_, y| {
            if (300..600).contains(&y) {
                image::Rgb([255, 0, 0])
            } else {
                image::Rgb([0, 0, 255])
            }
        });
        let out = optimize(
            RasterImage::from_dynamic(image::DynamicImage::ImageRgb8(source)),
            Preset::Youtube,
            &CompressionConfig::default(),
        )
        .unwrap();
        let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgb8();
        let center = decoded.get_pixel(640, 360);
        assert!(center[0] > 200 && center[2] < 60, "{center:?}");
        let top = decoded.get_pixel(640, 5);
        assert!(top[2] > 200 && top[0] < 60, "{top:?}");
    }

    #[test]
    fn web_webp_is_lossy() {
        let source = RasterImage::from_dynamic(noise_rgb(256, 256));
        let lossless = encode(source.pixels(), OutputFormat::Png, Quality::default()).unwrap();
        let out = optimize(source, Preset::Web, &CompressionConfig::default()).unwrap();
        assert!(out.bytes.len() < lossless.len(), "{} bytes", out.bytes.len());
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (256, 256));
    }

    #[test]
    fn seo_bundle_holds_all_renditions() {
        let out = run(Preset::Seo, 1000, 500);
        assert_eq!(out.filename, "seo-images.zip");
        let mut zip = ZipArchive::new(Cursor::new(out.bytes)).unwrap();
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["image-1200.webp", "image-480.webp", "image-768.webp", "image.avif"]
        );

        let mut small = Vec::new();
        std::io::Read::read_to_end(&mut zip.by_name("image-480.webp").unwrap(), &mut small).unwrap();
        assert_eq!(image::load_from_memory(&small).unwrap().dimensions(), (480, 240));
    }

    #[test]
    fn transparent_sources_are_flattened_to_white() {
        let out = optimize(
            RasterImage::from_dynamic(translucent_rgba(40, 40)),
            Preset::Instagram,
            &CompressionConfig::default(),
        )
        .unwrap();
        let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgb8();
        // Leftmost column is fully transparent in the source
        assert!(decoded.get_pixel(0, 20)[1] > 200);
    }
}
