//! Audit fields handed to whatever records usage.
//!
//! Nothing here persists anything. A [`AuditRecord`] is a flat, serializable
//! row; the caller decides where it goes.

use crate::imaging::{ErrorClass, ImagingError};
use serde::Serialize;
use std::time::Duration;

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactReport {
    /// Command name, e.g. `transcode` or `favicon`.
    pub command: &'static str,
    /// Detected source container, when it has a name.
    pub source_format: Option<String>,
    /// Output format, or `zip` for archives.
    pub target_format: String,
    /// Final dimensions. Archives report their master canvas.
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub endpoint: String,
    pub success: bool,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<ErrorClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Input size in bytes.
    pub file_size: u64,
    pub original_format: Option<String>,
    pub target_format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub processing_time_ms: u64,
}

impl AuditRecord {
    pub fn success(report: &ArtifactReport, input_size: u64, elapsed: Duration) -> Self {
        Self {
            endpoint: report.command.to_string(),
            success: true,
            status_code: 200,
            error_class: None,
            error_type: None,
            error_message: None,
            file_size: input_size,
            original_format: report.source_format.clone(),
            target_format: Some(report.target_format.clone()),
            width: Some(report.width),
            height: Some(report.height),
            processing_time_ms: elapsed.as_millis() as u64,
        }
    }

    /// Failure row. Only the caller-facing message is recorded.
    pub fn failure(endpoint: &str, error: &ImagingError, input_size: u64, elapsed: Duration) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            success: false,
            status_code: error.status_code(),
            error_class: Some(error.class()),
            error_type: Some(error.kind()),
            error_message: Some(error.public_message()),
            file_size: input_size,
            original_format: None,
            target_format: None,
            width: None,
            height: None,
            processing_time_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn to_json(&self) -> String {
        // Every field is a plain scalar or string.
        serde_json::to_string(self).unwrap_or_default()
    }
}
