//! Error kinds for the imaging core.
//!
//! Validation-class errors are the caller's fault and carry a message that
//! is safe to show. Internal-class errors come from the underlying codecs;
//! their detail is logged but never returned to the caller verbatim.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    /// The input buffer is not a decodable image.
    #[error("Invalid image data: {0}")]
    InvalidImageData(String),

    /// No capability profile exists for the requested target.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Decoded pixel count is over the configured ceiling.
    #[error("Image too large: {width}x{height} exceeds the {limit} pixel limit")]
    DimensionTooLarge { width: u32, height: u32, limit: u64 },

    /// Non-positive, out-of-bounds or over-ceiling geometry request.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Source is below the minimum usable size for favicon generation.
    #[error("Image too small: {width}x{height}, minimum is {minimum}x{minimum}")]
    ImageTooSmall { width: u32, height: u32, minimum: u32 },

    /// A caller parameter could not be interpreted.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Unexpected codec failure while producing output.
    #[error("Encoding failed: {0}")]
    EncodingFailure(String),
}

/// Coarse classification used by callers to decide how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Validation,
    Internal,
}

/// Message shown in place of internal failure detail.
pub const GENERIC_FAILURE_MESSAGE: &str = "Image processing failed.";

impl ImagingError {
    /// Map a decoder failure.
    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::InvalidImageData(err.to_string())
    }

    /// Map an encoder or archive-writer failure.
    pub fn encode(err: impl std::fmt::Display) -> Self {
        Self::EncodingFailure(err.to_string())
    }

    /// Stable identifier for audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidImageData(_) => "invalid_image_data",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::DimensionTooLarge { .. } => "dimension_too_large",
            Self::InvalidGeometry(_) => "invalid_geometry",
            Self::ImageTooSmall { .. } => "image_too_small",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::EncodingFailure(_) => "encoding_failure",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidImageData(_) | Self::EncodingFailure(_) => ErrorClass::Internal,
            _ => ErrorClass::Validation,
        }
    }

    /// HTTP-style status a serving layer would attach.
    pub fn status_code(&self) -> u16 {
        match self.class() {
            ErrorClass::Validation => 400,
            ErrorClass::Internal => 500,
        }
    }

    /// Caller-facing message. Internal detail is replaced by a generic one.
    pub fn public_message(&self) -> String {
        match self.class() {
            ErrorClass::Validation => self.to_string(),
            ErrorClass::Internal => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}
