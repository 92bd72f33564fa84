//! Pipeline configuration.
//!
//! Handles loading, validating, and merging a `rasterforge.toml` file. The
//! user file is sparse and layered over stock defaults, so it only needs the
//! keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [limits]
//! max_pixels = 50000000     # Decoded pixel ceiling (decompression-bomb guard)
//! max_dimension = 8000      # Per-axis ceiling for requested output sizes
//!
//! [compression]
//! quality_min = 20          # Budget search lower bound
//! quality_max = 95          # Budget search upper bound
//! default_quality = 85      # Compress without a byte target
//! transcode_quality = 90    # Transcode/resize/crop lossy quality
//!
//! [favicon]
//! sizes = [16, 32, 48, 64, 180, 192, 512]
//! icon_sizes = [16, 32, 48, 64]
//! min_source_size = 256
//! max_padding = 200
//! dark_size = 32
//! app_name = "Website"
//! short_name = "Site"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::SafetyLimits;
use crate::imaging::codec::ICO_MAX_SIDE;
use crate::imaging::params::CompressionBudget;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration consumed by the pipeline and the worker pool.
///
/// All fields have defaults; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Safety ceilings.
    pub limits: LimitsConfig,
    /// Quality settings for lossy output.
    pub compression: CompressionConfig,
    /// Favicon package layout.
    pub favicon: FaviconConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.into()));

        if self.limits.max_pixels == 0 || self.limits.max_dimension == 0 {
            return invalid("limits.max_pixels and limits.max_dimension must be non-zero");
        }

        let c = &self.compression;
        if c.quality_min == 0 || c.quality_max > 100 || c.quality_min > c.quality_max {
            return invalid("compression quality bounds must satisfy 1 <= quality_min <= quality_max <= 100");
        }
        if !(1..=100).contains(&c.default_quality) || !(1..=100).contains(&c.transcode_quality) {
            return invalid("compression.default_quality and transcode_quality must be 1-100");
        }

        let f = &self.favicon;
        if f.sizes.is_empty() || f.icon_sizes.is_empty() {
            return invalid("favicon.sizes and favicon.icon_sizes must not be empty");
        }
        if f.sizes.contains(&0) || f.icon_sizes.contains(&0) {
            return invalid("favicon sizes must be non-zero");
        }
        if f.icon_sizes.iter().any(|&s| s > ICO_MAX_SIDE) {
            return invalid("favicon.icon_sizes must be at most 256");
        }
        if f.dark_size == 0 {
            return invalid("favicon.dark_size must be non-zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_pixels: u64,
    pub max_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = SafetyLimits::default();
        Self {
            max_pixels: limits.max_pixels,
            max_dimension: limits.max_dimension,
        }
    }
}

impl LimitsConfig {
    pub fn safety_limits(&self) -> SafetyLimits {
        SafetyLimits {
            max_pixels: self.max_pixels,
            max_dimension: self.max_dimension,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    pub quality_min: u8,
    pub quality_max: u8,
    pub default_quality: u32,
    pub transcode_quality: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            quality_min: 20,
            quality_max: 95,
            default_quality: 85,
            transcode_quality: 90,
        }
    }
}

impl CompressionConfig {
    /// Byte budget using the configured search bounds.
    pub fn budget(&self, target_bytes: u64) -> Result<CompressionBudget, crate::imaging::ImagingError> {
        CompressionBudget::with_bounds(target_bytes, self.quality_min, self.quality_max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaviconConfig {
    /// Square renditions emitted as separate files, in order.
    pub sizes: Vec<u32>,
    /// Entries bundled into the single `favicon.ico`.
    pub icon_sizes: Vec<u32>,
    /// Shorter source side below which the package is refused.
    pub min_source_size: u32,
    pub max_padding: u32,
    /// Side of the dark-mode variant.
    pub dark_size: u32,
    /// Manifest `name`.
    pub app_name: String,
    /// Manifest `short_name`.
    pub short_name: String,
}

impl Default for FaviconConfig {
    fn default() -> Self {
        Self {
            sizes: vec![16, 32, 48, 64, 180, 192, 512],
            icon_sizes: vec![16, 32, 48, 64],
            min_source_size: 256,
            max_padding: 200,
            dark_size: 32,
            app_name: "Website".to_string(),
            short_name: "Site".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// The stock defaults as a `toml::Value::Table`, parsed from
/// [`stock_config_toml`]. This is the base layer user files merge onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::from_str(stock_config_toml())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// With no path the stock defaults are used. A path that does not exist is
/// an error: it was asked for explicitly.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `rasterforge.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# rasterforge Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Safety limits
# ---------------------------------------------------------------------------
[limits]
# Sources whose width x height exceeds this are rejected before their pixels
# are decoded.
max_pixels = 50000000

# Requested output sizes (resize targets, favicon canvases) may not exceed
# this on either axis.
max_dimension = 8000

# ---------------------------------------------------------------------------
# Lossy compression
# ---------------------------------------------------------------------------
[compression]
# Inclusive quality range searched when compressing to a byte target.
quality_min = 20
quality_max = 95

# JPEG quality for `compress` without a byte target.
default_quality = 85

# Quality for transcode, resize and crop when the target is lossy.
transcode_quality = 90

# ---------------------------------------------------------------------------
# Favicon package
# ---------------------------------------------------------------------------
[favicon]
# Square renditions written as individual files.
sizes = [16, 32, 48, 64, 180, 192, 512]

# Entries bundled into favicon.ico (each at most 256).
icon_sizes = [16, 32, 48, 64]

# Sources whose shorter side is below this are refused.
min_source_size = 256

# Largest accepted padding around the logo, in pixels.
max_padding = 200

# Side of the black-background dark-mode icon.
dark_size = 32

# Names written into site.webmanifest.
app_name = "Website"
short_name = "Site"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
