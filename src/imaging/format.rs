//! Output format negotiation.
//!
//! Target formats are a closed enum with a static capability table. Lookup
//! from a caller-supplied identifier is exact and case-insensitive; `jpg`
//! and `tif` are table entries in their own right, not fuzzy matches.

use super::error::ImagingError;
use image::ImageFormat;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Bmp,
    Tiff,
    Gif,
    Ico,
    Avif,
}

/// Capability descriptor for a target encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatProfile {
    pub format: OutputFormat,
    pub supports_transparency: bool,
    pub is_lossy: bool,
    pub requires_palette: bool,
    pub supports_animation: bool,
    pub supports_multi_resolution: bool,
}

const fn profile(
    format: OutputFormat,
    supports_transparency: bool,
    is_lossy: bool,
    requires_palette: bool,
    supports_animation: bool,
    supports_multi_resolution: bool,
) -> FormatProfile {
    FormatProfile {
        format,
        supports_transparency,
        is_lossy,
        requires_palette,
        supports_animation,
        supports_multi_resolution,
    }
}

/// Process-wide read-only capability table.
static PROFILES: [FormatProfile; 8] = [
    profile(OutputFormat::Jpeg, false, true, false, false, false),
    profile(OutputFormat::Png, true, false, false, false, false),
    profile(OutputFormat::WebP, true, true, false, false, false),
    profile(OutputFormat::Bmp, false, false, false, false, false),
    profile(OutputFormat::Tiff, true, false, false, false, false),
    profile(OutputFormat::Gif, true, false, true, true, false),
    profile(OutputFormat::Ico, true, false, false, false, true),
    profile(OutputFormat::Avif, true, true, false, false, false),
];

/// Identifier → format. Exact, case-insensitive.
const IDENTIFIERS: &[(&str, OutputFormat)] = &[
    ("jpeg", OutputFormat::Jpeg),
    ("jpg", OutputFormat::Jpeg),
    ("png", OutputFormat::Png),
    ("webp", OutputFormat::WebP),
    ("bmp", OutputFormat::Bmp),
    ("tiff", OutputFormat::Tiff),
    ("tif", OutputFormat::Tiff),
    ("gif", OutputFormat::Gif),
    ("ico", OutputFormat::Ico),
    ("avif", OutputFormat::Avif),
];

/// Look up the capability profile for a target-format identifier.
pub fn profile_for(identifier: &str) -> Result<FormatProfile, ImagingError> {
    let format: OutputFormat = identifier.parse()?;
    Ok(format.profile())
}

impl OutputFormat {
    pub fn profile(self) -> FormatProfile {
        // Table order matches declaration order.
        PROFILES[self as usize]
    }

    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Gif => "gif",
            Self::Ico => "ico",
            Self::Avif => "avif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Gif => "image/gif",
            Self::Ico => "image/x-icon",
            Self::Avif => "image/avif",
        }
    }

    /// Short display name used in reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Gif => "gif",
            Self::Ico => "ico",
            Self::Avif => "avif",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::WebP => ImageFormat::WebP,
            Self::Bmp => ImageFormat::Bmp,
            Self::Tiff => ImageFormat::Tiff,
            Self::Gif => ImageFormat::Gif,
            Self::Ico => ImageFormat::Ico,
            Self::Avif => ImageFormat::Avif,
        }
    }

    /// Map a decoded source format back to a target, when one exists.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::WebP => Some(Self::WebP),
            ImageFormat::Bmp => Some(Self::Bmp),
            ImageFormat::Tiff => Some(Self::Tiff),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::Ico => Some(Self::Ico),
            ImageFormat::Avif => Some(Self::Avif),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IDENTIFIERS
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(s))
            .map(|(_, format)| *format)
            .ok_or_else(|| ImagingError::UnsupportedFormat(format!("'{s}' is not a supported target")))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
