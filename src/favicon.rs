//! Favicon package builder.
//!
//! Turns one logo into a ZIP of everything a site needs for icons:
//!
//! ```text
//! favicon-16x16.png … favicon-512x512.png   one per configured size
//! favicon.ico                               16/32/48/64 in one container
//! favicon-dark-32x32.png                    black background variant
//! social-preview-1200x630.png               brand-color letterbox
//! site.webmanifest                          JSON web app manifest
//! favicon-html-code.txt                     <link>/<meta> snippet
//! ```
//!
//! The logo is trimmed to its non-transparent bounding box, then centered on
//! a square canvas of side `max(w, h) + 2 * padding`. Every rendition is
//! resampled from that one canvas.

use crate::archive::{AssetArchive, PackagedArchive};
use crate::config::FaviconConfig;
use crate::imaging::calculations::{canvas_side, centered_offset, fit_within};
use crate::imaging::codec::{encode, encode_icon_container};
use crate::imaging::color::{BLACK, BackgroundPolicy, sample_brand_color, to_hex, trim_transparent};
use crate::imaging::normalize::normalize;
use crate::imaging::{ImagingError, OutputFormat, Quality, RasterImage, SafetyLimits};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use maud::{Markup, PreEscaped, html};
use serde::Serialize;
use tracing::{debug, warn};

pub const PACKAGE_FILENAME: &str = "favicon-package.zip";
pub const ICO_FILENAME: &str = "favicon.ico";
pub const MANIFEST_FILENAME: &str = "site.webmanifest";
pub const HTML_FILENAME: &str = "favicon-html-code.txt";
pub const SOCIAL_WIDTH: u32 = 1200;
pub const SOCIAL_HEIGHT: u32 = 630;

/// Rendition sizes the manifest references, when generated.
const MANIFEST_ICON_SIZES: [u32; 2] = [192, 512];
const MASKABLE_SIZE: u32 = 512;

/// Parsed favicon parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaviconRequest {
    /// One of ico, png or webp.
    pub extension: OutputFormat,
    pub background: BackgroundPolicy,
    pub padding: u32,
}

impl FaviconRequest {
    pub fn parse(extension: &str, background: &str, padding: u32) -> Result<Self, ImagingError> {
        Ok(Self {
            extension: resolve_extension(extension)?,
            background: background.parse()?,
            padding,
        })
    }
}

impl Default for FaviconRequest {
    fn default() -> Self {
        Self {
            extension: OutputFormat::Ico,
            background: BackgroundPolicy::Transparent,
            padding: 0,
        }
    }
}

/// Map a requested extension to a favicon output format.
///
/// Unknown identifiers are rejected; known formats that make poor favicons
/// fall back to ICO.
pub fn resolve_extension(identifier: &str) -> Result<OutputFormat, ImagingError> {
    let format: OutputFormat = identifier.parse()?;
    match format {
        OutputFormat::Ico | OutputFormat::Png | OutputFormat::WebP => Ok(format),
        other => {
            warn!(requested = %other, "favicon extension not supported, using ico");
            Ok(OutputFormat::Ico)
        }
    }
}

/// A built package plus the values derived while building it.
#[derive(Debug, Clone)]
pub struct FaviconPackage {
    pub archive: PackagedArchive,
    pub brand_color: Rgba<u8>,
    /// Side of the square master canvas.
    pub canvas_side: u32,
}

pub fn build_favicon_package(
    image: RasterImage,
    request: &FaviconRequest,
    config: &FaviconConfig,
    limits: &SafetyLimits,
) -> Result<FaviconPackage, ImagingError> {
    if request.padding > config.max_padding {
        return Err(ImagingError::InvalidGeometry(format!(
            "padding {} exceeds {}",
            request.padding, config.max_padding
        )));
    }

    let image = normalize(image, &OutputFormat::Ico.profile());
    let (width, height) = image.dimensions();
    if width.min(height) < config.min_source_size {
        return Err(ImagingError::ImageTooSmall {
            width,
            height,
            minimum: config.min_source_size,
        });
    }

    let logo = trim_transparent(&image.pixels().to_rgba8());
    let side = canvas_side(logo.dimensions(), request.padding);
    limits.check_output(side, side)?;
    let side = side as u32;

    let brand = sample_brand_color(&DynamicImage::ImageRgba8(logo.clone()));
    let fill = request.background.resolve(brand);
    let canvas = DynamicImage::ImageRgba8(compose_canvas(&logo, side, fill));
    debug!(side, brand = %to_hex(brand), background = %request.background, "favicon canvas ready");

    let mut archive = AssetArchive::new();

    let rendition_format = rendition_format(request.extension);
    for &size in &config.sizes {
        let resized = canvas.resize_exact(size, size, FilterType::Lanczos3);
        let bytes = encode(&resized, rendition_format, Quality::default())?;
        archive.add(&rendition_name(size, rendition_format), &bytes)?;
    }

    archive.add(ICO_FILENAME, &encode_icon_container(&canvas, &config.icon_sizes)?)?;

    let dark = DynamicImage::ImageRgba8(compose_canvas(&logo, side, BLACK)).resize_exact(
        config.dark_size,
        config.dark_size,
        FilterType::Lanczos3,
    );
    archive.add(
        &dark_name(config.dark_size),
        &encode(&dark, OutputFormat::Png, Quality::default())?,
    )?;

    let social = social_preview(&canvas, brand);
    archive.add(
        &social_name(),
        &encode(&social, OutputFormat::Png, Quality::default())?,
    )?;

    let background_hex = match request.background {
        BackgroundPolicy::Color(color) => to_hex(color),
        BackgroundPolicy::Transparent | BackgroundPolicy::Auto => to_hex(brand),
    };
    let manifest = render_manifest(config, rendition_format, &to_hex(brand), &background_hex)?;
    archive.add(MANIFEST_FILENAME, manifest.as_bytes())?;

    let snippet = render_html(config, rendition_format);
    archive.add(HTML_FILENAME, snippet.into_string().as_bytes())?;

    Ok(FaviconPackage {
        archive: archive.finish()?,
        brand_color: brand,
        canvas_side: side,
    })
}

/// Individual renditions cannot be ICO containers themselves.
fn rendition_format(extension: OutputFormat) -> OutputFormat {
    match extension {
        OutputFormat::Ico => OutputFormat::Png,
        other => other,
    }
}

pub fn rendition_name(size: u32, format: OutputFormat) -> String {
    format!("favicon-{size}x{size}.{}", format.extension())
}

fn dark_name(size: u32) -> String {
    format!("favicon-dark-{size}x{size}.png")
}

fn social_name() -> String {
    format!("social-preview-{SOCIAL_WIDTH}x{SOCIAL_HEIGHT}.png")
}

/// Square canvas of `side` filled with `fill`, `logo` alpha-composited at
/// the center. Odd remainders go to the right/bottom.
pub fn compose_canvas(logo: &RgbaImage, side: u32, fill: Rgba<u8>) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(side, side, fill);
    let (x, y) = centered_offset((side, side), logo.dimensions());
    imageops::overlay(&mut canvas, logo, x, y);
    canvas
}

/// Brand-color letterbox with the canvas scaled to fit the height.
fn social_preview(canvas: &DynamicImage, brand: Rgba<u8>) -> DynamicImage {
    let (w, h) = fit_within(
        (canvas.width(), canvas.height()),
        (SOCIAL_HEIGHT, SOCIAL_HEIGHT),
    );
    let thumb = canvas.resize_exact(w, h, FilterType::Lanczos3).to_rgba8();
    let mut preview = RgbaImage::from_pixel(SOCIAL_WIDTH, SOCIAL_HEIGHT, brand);
    let (x, y) = centered_offset((SOCIAL_WIDTH, SOCIAL_HEIGHT), (w, h));
    imageops::overlay(&mut preview, &thumb, x, y);
    DynamicImage::ImageRgba8(preview)
}

#[derive(Serialize)]
struct WebManifest<'a> {
    name: &'a str,
    short_name: &'a str,
    icons: Vec<ManifestIcon>,
    theme_color: &'a str,
    background_color: &'a str,
    display: &'static str,
}

#[derive(Serialize)]
struct ManifestIcon {
    src: String,
    sizes: String,
    #[serde(rename = "type")]
    mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<&'static str>,
}

fn render_manifest(
    config: &FaviconConfig,
    format: OutputFormat,
    theme_color: &str,
    background_color: &str,
) -> Result<String, ImagingError> {
    let icons = MANIFEST_ICON_SIZES
        .iter()
        .filter(|size| config.sizes.contains(size))
        .map(|&size| ManifestIcon {
            src: rendition_name(size, format),
            sizes: format!("{size}x{size}"),
            mime_type: format.mime_type(),
            purpose: (size == MASKABLE_SIZE).then_some("maskable"),
        })
        .collect();

    let manifest = WebManifest {
        name: &config.app_name,
        short_name: &config.short_name,
        icons,
        theme_color,
        background_color,
        display: "standalone",
    };
    serde_json::to_string_pretty(&manifest).map_err(ImagingError::encode)
}

fn render_html(config: &FaviconConfig, format: OutputFormat) -> Markup {
    let mime = format.mime_type();
    let has = |size: u32| config.sizes.contains(&size);
    let href = |size: u32| format!("/{}", rendition_name(size, format));

    html! {
        (PreEscaped("<!-- Standard favicon -->")) "\n"
        link rel="icon" href={ "/" (ICO_FILENAME) } sizes="any"; "\n"
        @for size in [32, 16] {
            @if has(size) {
                link rel="icon" type=(mime) sizes={ (size) "x" (size) } href=(href(size)); "\n"
            }
        }
        link rel="icon" type="image/png" href={ "/" (dark_name(config.dark_size)) }
            media="(prefers-color-scheme: dark)"; "\n"
        @if has(180) {
            "\n" (PreEscaped("<!-- Apple -->")) "\n"
            link rel="apple-touch-icon" sizes="180x180" href=(href(180)); "\n"
        }
        "\n" (PreEscaped("<!-- Android -->")) "\n"
        link rel="manifest" href={ "/" (MANIFEST_FILENAME) }; "\n"
        "\n" (PreEscaped("<!-- Open Graph -->")) "\n"
        meta property="og:image" content={ "/" (social_name()) }; "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::color::WHITE;
    use crate::test_helpers::{gradient_rgb, logo_with_margin};
    use image::GenericImageView;
    use std::collections::BTreeSet;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn build(request: FaviconRequest) -> Result<FaviconPackage, ImagingError> {
        build_favicon_package(
            RasterImage::from_dynamic(logo_with_margin(300, 300, 20)),
            &request,
            &FaviconConfig::default(),
            &SafetyLimits::default(),
        )
    }

    fn read_entry(package: &FaviconPackage, name: &str) -> Vec<u8> {
        let mut zip = ZipArchive::new(Cursor::new(package.archive.bytes.clone())).unwrap();
        let mut buf = Vec::new();
        zip.by_name(name).unwrap().read_to_end(&mut buf).unwrap();
        buf
    }

    fn entry_set(package: &FaviconPackage) -> BTreeSet<String> {
        let zip = ZipArchive::new(Cursor::new(package.archive.bytes.clone())).unwrap();
        zip.file_names().map(str::to_string).collect()
    }

    #[test]
    fn package_has_exactly_the_expected_entries() {
        let package = build(FaviconRequest {
            extension: OutputFormat::Png,
            ..FaviconRequest::default()
        })
        .unwrap();

        let mut expected: BTreeSet<String> = [16, 32, 48, 64, 180, 192, 512]
            .iter()
            .map(|s| format!("favicon-{s}x{s}.png"))
            .collect();
        for name in [
            "favicon.ico",
            "favicon-dark-32x32.png",
            "social-preview-1200x630.png",
            "site.webmanifest",
            "favicon-html-code.txt",
        ] {
            expected.insert(name.to_string());
        }
        assert_eq!(entry_set(&package), expected);
        assert_eq!(package.archive.entry_names.len(), expected.len());
    }

    #[test]
    fn ico_extension_writes_png_renditions_and_one_container() {
        let package = build(FaviconRequest::default()).unwrap();
        let names = entry_set(&package);
        assert!(names.contains("favicon-192x192.png"));
        assert_eq!(names.iter().filter(|n| n.ends_with(".ico")).count(), 1);
    }

    #[test]
    fn webp_extension_writes_webp_renditions() {
        let package = build(FaviconRequest {
            extension: OutputFormat::WebP,
            ..FaviconRequest::default()
        })
        .unwrap();
        let bytes = read_entry(&package, "favicon-64x64.webp");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 64));
    }

    #[test]
    fn canvas_uses_trimmed_logo_plus_padding() {
        let package = build(FaviconRequest {
            padding: 30,
            ..FaviconRequest::default()
        })
        .unwrap();
        // 300 - 2 * 20 margin = 260 content, plus 2 * 30 padding
        assert_eq!(package.canvas_side, 320);
        assert_eq!(package.brand_color, Rgba([220, 20, 60, 255]));
    }

    #[test]
    fn icon_container_bundles_four_sizes() {
        let package = build(FaviconRequest::default()).unwrap();
        let ico = read_entry(&package, "favicon.ico");
        assert_eq!(u16::from_le_bytes([ico[4], ico[5]]), 4);
    }

    #[test]
    fn dark_variant_has_black_background() {
        let package = build(FaviconRequest {
            padding: 100,
            ..FaviconRequest::default()
        })
        .unwrap();
        let dark = image::load_from_memory(&read_entry(&package, "favicon-dark-32x32.png"))
            .unwrap()
            .to_rgba8();
        assert_eq!(dark.dimensions(), (32, 32));
        assert_eq!(dark.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn social_preview_letterboxes_on_brand_color() {
        let package = build(FaviconRequest::default()).unwrap();
        let social = image::load_from_memory(&read_entry(&package, "social-preview-1200x630.png"))
            .unwrap()
            .to_rgba8();
        assert_eq!(social.dimensions(), (1200, 630));
        assert_eq!(social.get_pixel(0, 0), &Rgba([220, 20, 60, 255]));
    }

    #[test]
    fn manifest_references_renditions_and_colors() {
        let package = build(FaviconRequest::default()).unwrap();
        let manifest: serde_json::Value =
            serde_json::from_slice(&read_entry(&package, "site.webmanifest")).unwrap();
        assert_eq!(manifest["name"], "Website");
        assert_eq!(manifest["short_name"], "Site");
        assert_eq!(manifest["display"], "standalone");
        assert_eq!(manifest["theme_color"], "#dc143c");
        // Transparent background reports the brand color
        assert_eq!(manifest["background_color"], "#dc143c");
        let icons = manifest["icons"].as_array().unwrap();
        assert_eq!(icons.len(), 2);
        assert_eq!(icons[0]["src"], "favicon-192x192.png");
        assert_eq!(icons[0]["type"], "image/png");
        assert!(icons[0].get("purpose").is_none());
        assert_eq!(icons[1]["purpose"], "maskable");
    }

    #[test]
    fn manifest_uses_explicit_background() {
        let package = build(FaviconRequest {
            background: BackgroundPolicy::Color(WHITE),
            ..FaviconRequest::default()
        })
        .unwrap();
        let manifest: serde_json::Value =
            serde_json::from_slice(&read_entry(&package, "site.webmanifest")).unwrap();
        assert_eq!(manifest["background_color"], "#ffffff");
    }

    #[test]
    fn html_snippet_links_every_asset() {
        let package = build(FaviconRequest {
            extension: OutputFormat::WebP,
            ..FaviconRequest::default()
        })
        .unwrap();
        let html = String::from_utf8(read_entry(&package, "favicon-html-code.txt")).unwrap();
        assert!(html.contains(r#"<link rel="icon" type="image/webp" sizes="32x32" href="/favicon-32x32.webp">"#));
        assert!(html.contains(r#"href="/favicon-16x16.webp""#));
        assert!(html.contains(r#"<link rel="apple-touch-icon" sizes="180x180" href="/favicon-180x180.webp">"#));
        assert!(html.contains(r#"<link rel="manifest" href="/site.webmanifest">"#));
        assert!(html.contains(r#"content="/social-preview-1200x630.png""#));
        assert!(html.contains("<!-- Apple -->"));
    }

    #[test]
    fn small_source_is_rejected() {
        let result = build_favicon_package(
            RasterImage::from_dynamic(gradient_rgb(255, 600)),
            &FaviconRequest::default(),
            &FaviconConfig::default(),
            &SafetyLimits::default(),
        );
        assert!(matches!(
            result,
            Err(ImagingError::ImageTooSmall { width: 255, height: 600, minimum: 256 })
        ));
    }

    #[test]
    fn excessive_padding_is_rejected() {
        let result = build(FaviconRequest {
            padding: 201,
            ..FaviconRequest::default()
        });
        assert!(matches!(result, Err(ImagingError::InvalidGeometry(_))));
    }

    #[test]
    fn canvas_over_dimension_ceiling_is_rejected() {
        let limits = SafetyLimits {
            max_dimension: 300,
            ..SafetyLimits::default()
        };
        let result = build_favicon_package(
            RasterImage::from_dynamic(gradient_rgb(300, 300)),
            &FaviconRequest {
                padding: 10,
                ..FaviconRequest::default()
            },
            &FaviconConfig::default(),
            &limits,
        );
        assert!(matches!(result, Err(ImagingError::InvalidGeometry(_))));
    }

    #[test]
    fn compose_centers_with_floor_bias() {
        let logo = RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255]));
        let canvas = compose_canvas(&logo, 6, Rgba([0, 0, 0, 0]));
        // offset floor((6 - 3) / 2) = 1: columns 1..=3 filled, 4..=5 empty
        assert_eq!(canvas.get_pixel(1, 1)[3], 255);
        assert_eq!(canvas.get_pixel(0, 0)[3], 0);
        assert_eq!(canvas.get_pixel(4, 4)[3], 0);
        assert_eq!(canvas.get_pixel(3, 3)[3], 255);
    }

    #[test]
    fn extension_resolution() {
        assert_eq!(resolve_extension("PNG").unwrap(), OutputFormat::Png);
        assert_eq!(resolve_extension("webp").unwrap(), OutputFormat::WebP);
        assert_eq!(resolve_extension("gif").unwrap(), OutputFormat::Ico);
        assert!(matches!(
            resolve_extension("svg"),
            Err(ImagingError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn request_parse_validates_background() {
        assert!(FaviconRequest::parse("png", "#336699", 10).is_ok());
        assert!(matches!(
            FaviconRequest::parse("png", "teal", 10),
            Err(ImagingError::InvalidParameter(_))
        ));
    }
}
