//! Command dispatch.
//!
//! Every command runs the same prefix before its own logic:
//!
//! ```text
//! bytes ──decode (SafetyGuard)──▶ RasterImage ──orientation──▶ component ──▶ Artifact
//! ```
//!
//! The pixel ceiling is enforced while decoding, from header dimensions, so an
//! oversized source never reaches resize, crop, compress, favicon or preset
//! logic. Frames of an animated source are decoded only when the output can
//! carry them, and then the ceiling covers all of them together. Each stage consumes the [`RasterImage`] it is given and hands a new
//! one to the next.

use crate::archive::ZIP_CONTENT_TYPE;
use crate::audit::ArtifactReport;
use crate::config::PipelineConfig;
use crate::favicon::{FaviconRequest, PACKAGE_FILENAME, build_favicon_package};
use crate::imaging::animation::should_preserve;
use crate::imaging::calculations::{fit_within, scale_by_percent};
use crate::imaging::codec::ICO_MAX_SIDE;
use crate::imaging::geometry::resample;
use crate::imaging::normalize::normalize;
use crate::imaging::{
    CropBox, ErrorClass, ImagingError, JpegQualityEncoder, OutputFormat, Quality, RasterImage,
    ResizeParams, compress_to_budget, correct_orientation, crop, decode, decode_animated, encode,
    encode_animation, resize,
};
use crate::presets::{Preset, optimize};
use image::ImageFormat;
use tracing::{debug, error};

/// A single caller request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Transcode { target: OutputFormat },
    Resize(ResizeParams),
    Crop(CropBox),
    Compress {
        /// Size budget in kilobytes. Absent means plain encoding at `quality`.
        target_kb: Option<u64>,
        quality: u32,
        /// Scale both axes before encoding (100 = unchanged).
        resize_percent: Option<u32>,
    },
    Favicon(FaviconRequest),
    Optimize(Preset),
}

impl Command {
    /// Endpoint name used in reports and audit records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transcode { .. } => "transcode",
            Self::Resize(_) => "resize",
            Self::Crop(_) => "crop",
            Self::Compress { .. } => "compress",
            Self::Favicon(_) => "favicon",
            Self::Optimize(_) => "optimize",
        }
    }
}

/// Bytes ready to hand back, tagged for download.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    /// Suggested download name, e.g. `converted.webp`.
    pub filename: String,
    pub report: ArtifactReport,
}

/// Stateless executor. Cheap to share between worker threads.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run `command` against an encoded source buffer.
    ///
    /// Internal-class failures are logged here with full detail; callers
    /// should surface [`ImagingError::public_message`] only.
    pub fn execute(&self, bytes: &[u8], command: &Command) -> Result<Artifact, ImagingError> {
        debug!(command = command.name(), input_bytes = bytes.len(), "executing command");
        let result = self.dispatch(bytes, command);
        if let Err(err) = &result {
            if err.class() == ErrorClass::Internal {
                error!(command = command.name(), kind = err.kind(), detail = %err, "command failed");
            }
        }
        result
    }

    fn dispatch(&self, bytes: &[u8], command: &Command) -> Result<Artifact, ImagingError> {
        let limits = self.config.limits.safety_limits();
        let image = if keeps_frames(bytes, command) {
            decode_animated(bytes, &limits)?
        } else {
            decode(bytes, &limits)?
        };
        let image = correct_orientation(image);
        let source = source_format_name(image.source_format());

        match command {
            Command::Transcode { target } => {
                let quality = Quality::new(self.config.compression.transcode_quality);
                let (image, bytes) = encode_for(image, *target, quality)?;
                Ok(still_artifact(command.name(), source, *target, "converted", image, bytes))
            }
            Command::Resize(params) => {
                let format = processed_format(image.source_format());
                let image = resize(image, *params, &limits)?;
                self.processed(command, source, format, image)
            }
            Command::Crop(crop_box) => {
                let format = processed_format(image.source_format());
                let image = crop(image, *crop_box)?;
                self.processed(command, source, format, image)
            }
            Command::Compress {
                target_kb,
                quality,
                resize_percent,
            } => self.compress(image, source, *target_kb, *quality, *resize_percent),
            Command::Favicon(request) => {
                let package =
                    build_favicon_package(image, request, &self.config.favicon, &limits)?;
                let side = package.canvas_side;
                Ok(archive_artifact(
                    command.name(),
                    source,
                    package.archive.bytes,
                    PACKAGE_FILENAME,
                    (side, side),
                ))
            }
            Command::Optimize(preset) => {
                let out = optimize(image, *preset, &self.config.compression)?;
                let report = ArtifactReport {
                    command: command.name(),
                    source_format: source,
                    target_format: out.format_name.to_string(),
                    width: out.width,
                    height: out.height,
                    byte_size: out.bytes.len() as u64,
                };
                Ok(Artifact {
                    bytes: out.bytes,
                    content_type: out.content_type,
                    filename: out.filename.to_string(),
                    report,
                })
            }
        }
    }

    fn processed(
        &self,
        command: &Command,
        source: Option<String>,
        format: OutputFormat,
        image: RasterImage,
    ) -> Result<Artifact, ImagingError> {
        let quality = Quality::new(self.config.compression.transcode_quality);
        let (image, bytes) = encode_for(image, format, quality)?;
        Ok(still_artifact(command.name(), source, format, "processed", image, bytes))
    }

    fn compress(
        &self,
        image: RasterImage,
        source: Option<String>,
        target_kb: Option<u64>,
        quality: u32,
        resize_percent: Option<u32>,
    ) -> Result<Artifact, ImagingError> {
        if !(1..=100).contains(&quality) {
            return Err(ImagingError::InvalidParameter(format!(
                "quality must be between 1 and 100, got {quality}"
            )));
        }
        if target_kb == Some(0) {
            return Err(ImagingError::InvalidParameter(
                "target size must be positive".into(),
            ));
        }

        let mut image = normalize(image, &OutputFormat::Jpeg.profile());
        if let Some(percent) = resize_percent {
            if percent == 0 {
                return Err(ImagingError::InvalidGeometry(
                    "resize percentage must be positive".into(),
                ));
            }
            let (width, height) = scale_by_percent(image.dimensions(), percent);
            self.config.limits.safety_limits().check_output(width, height)?;
            // Both axes are within the u32 dimension ceiling now.
            let (width, height) = (width as u32, height as u32);
            if (width, height) != image.dimensions() {
                image = resample(image, width, height);
            }
        }

        let bytes = match target_kb {
            Some(kb) => {
                let target_bytes = kb.checked_mul(1024).ok_or_else(|| {
                    ImagingError::InvalidParameter(format!("target size of {kb} KB is too large"))
                })?;
                let budget = self.config.compression.budget(target_bytes)?;
                compress_to_budget(&JpegQualityEncoder, image.pixels(), &budget)?.bytes
            }
            None => encode(image.pixels(), OutputFormat::Jpeg, Quality::new(quality))?,
        };

        Ok(still_artifact("compress", source, OutputFormat::Jpeg, "custom", image, bytes))
    }
}

/// True when the artifact `command` produces can carry an animation, so
/// every source frame has to be decoded.
fn keeps_frames(bytes: &[u8], command: &Command) -> bool {
    let target = match command {
        Command::Transcode { target } => *target,
        Command::Resize(_) | Command::Crop(_) => {
            processed_format(image::guess_format(bytes).ok())
        }
        Command::Compress { .. } | Command::Favicon(_) | Command::Optimize(_) => return false,
    };
    target.profile().supports_animation
}

/// Normalize to the target profile and encode, keeping frames when the
/// target can carry them.
fn encode_for(
    image: RasterImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<(RasterImage, Vec<u8>), ImagingError> {
    let profile = format.profile();
    if should_preserve(&image, &profile) {
        let bytes = encode_animation(&image, format)?;
        return Ok((image, bytes));
    }
    let image = normalize(image, &profile);
    let bytes = encode(image.pixels(), format, quality)?;
    Ok((image, bytes))
}

/// Resize and crop keep the source container when it has a profile.
fn processed_format(source: Option<ImageFormat>) -> OutputFormat {
    source
        .and_then(OutputFormat::from_image_format)
        .unwrap_or(OutputFormat::Png)
}

fn source_format_name(format: Option<ImageFormat>) -> Option<String> {
    let format = format?;
    Some(match OutputFormat::from_image_format(format) {
        Some(known) => known.name().to_string(),
        None => format!("{format:?}").to_lowercase(),
    })
}

fn still_artifact(
    command: &'static str,
    source: Option<String>,
    format: OutputFormat,
    stem: &str,
    image: RasterImage,
    bytes: Vec<u8>,
) -> Artifact {
    let (width, height) = encoded_dimensions(format, &image);
    Artifact {
        report: ArtifactReport {
            command,
            source_format: source,
            target_format: format.name().to_string(),
            width,
            height,
            byte_size: bytes.len() as u64,
        },
        bytes,
        content_type: format.mime_type(),
        filename: format!("{stem}.{}", format.extension()),
    }
}

/// ICO output is fitted into 256x256, so report what was actually stored.
fn encoded_dimensions(format: OutputFormat, image: &RasterImage) -> (u32, u32) {
    match format {
        OutputFormat::Ico => fit_within(image.dimensions(), (ICO_MAX_SIDE, ICO_MAX_SIDE)),
        _ => image.dimensions(),
    }
}

fn archive_artifact(
    command: &'static str,
    source: Option<String>,
    bytes: Vec<u8>,
    filename: &str,
    (width, height): (u32, u32),
) -> Artifact {
    Artifact {
        report: ArtifactReport {
            command,
            source_format: source,
            target_format: "zip".to_string(),
            width,
            height,
            byte_size: bytes.len() as u64,
        },
        bytes,
        content_type: ZIP_CONTENT_TYPE,
        filename: filename.to_string(),
    }
}
