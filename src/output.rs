//! CLI output formatting.
//!
//! # Output Format
//!
//! One block per input, in input order. The header names the input and
//! where its artifact went; indented lines carry the report.
//!
//! ```text
//! logo.png → out/logo-favicon-package.zip
//!     favicon: png → zip
//!     512x512, 48.3 KB
//! broken.jpg ✗ invalid_image_data
//!     Image processing failed.
//!
//! 1 succeeded, 1 failed
//! ```
//!
//! Internal failures only ever show the public message; the detail is in
//! the logs.
//!
//! # Architecture
//!
//! Each block has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::audit::{ArtifactReport, AuditRecord};

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Bytes as B, KB or MB with one decimal.
fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

pub fn format_artifact(input: &str, written: &str, report: &ArtifactReport) -> Vec<String> {
    let source = report.source_format.as_deref().unwrap_or("unknown");
    vec![
        format!("{input} → {written}"),
        format!(
            "{}{}: {} → {}",
            indent(1),
            report.command,
            source,
            report.target_format
        ),
        format!(
            "{}{}x{}, {}",
            indent(1),
            report.width,
            report.height,
            human_size(report.byte_size)
        ),
    ]
}

pub fn format_failure(input: &str, record: &AuditRecord) -> Vec<String> {
    let kind = record.error_type.unwrap_or("error");
    let mut lines = vec![format!("{input} ✗ {kind}")];
    if let Some(message) = &record.error_message {
        lines.push(format!("{}{}", indent(1), message));
    }
    lines
}

/// Failure that happened before the pipeline ran, e.g. an unreadable file.
pub fn format_io_failure(input: &str, message: &str) -> Vec<String> {
    vec![format!("{input} ✗ io"), format!("{}{}", indent(1), message)]
}

pub fn format_summary(succeeded: usize, failed: usize) -> Vec<String> {
    vec![String::new(), format!("{succeeded} succeeded, {failed} failed")]
}

pub fn print_artifact(input: &str, written: &str, report: &ArtifactReport) {
    for line in format_artifact(input, written, report) {
        println!("{}", line);
    }
}

pub fn print_failure(input: &str, record: &AuditRecord) {
    for line in format_failure(input, record) {
        println!("{}", line);
    }
}

pub fn print_io_failure(input: &str, message: &str) {
    for line in format_io_failure(input, message) {
        println!("{}", line);
    }
}

pub fn print_summary(succeeded: usize, failed: usize) {
    for line in format_summary(succeeded, failed) {
        println!("{}", line);
    }
}
