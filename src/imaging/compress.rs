//! Size-targeted lossy compression.
//!
//! Binary search over the integer quality range, assuming encoded size is
//! non-decreasing in quality. That holds for baseline JPEG on typical
//! content but is not guaranteed; on a non-monotonic curve the search still
//! returns an encoding within budget, just not necessarily the highest
//! quality that would have fit.

use super::codec::QualityEncoder;
use super::error::ImagingError;
use super::params::CompressionBudget;
use image::DynamicImage;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    pub bytes: Vec<u8>,
    /// Quality of the returned encoding.
    pub quality: u8,
    /// False when nothing in the bounds fit and the floor-quality encoding
    /// was returned instead.
    pub met_budget: bool,
    /// Number of encoder invocations, fallback included.
    pub attempts: u32,
}

/// Find the highest quality in the budget's bounds whose encoding fits in
/// `target_bytes`. Never fails because the target is unreachable; only
/// encoder errors are returned.
pub fn compress_to_budget(
    encoder: &dyn QualityEncoder,
    pixels: &DynamicImage,
    budget: &CompressionBudget,
) -> Result<CompressionOutcome, ImagingError> {
    let mut lo = budget.quality_min() as i32;
    let mut hi = budget.quality_max() as i32;
    let mut best: Option<(u8, Vec<u8>)> = None;
    let mut attempts = 0u32;

    while lo <= hi {
        let mid = (lo + hi) / 2;
        let quality = mid as u8;
        let bytes = encoder.encode_at(pixels, quality)?;
        attempts += 1;
        let fits = bytes.len() as u64 <= budget.target_bytes;
        debug!(quality, size = bytes.len(), target = budget.target_bytes, fits, "compression probe");
        if fits {
            best = Some((quality, bytes));
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }

    let outcome = match best {
        Some((quality, bytes)) => CompressionOutcome {
            bytes,
            quality,
            met_budget: true,
            attempts,
        },
        None => {
            let quality = budget.quality_min();
            let bytes = encoder.encode_at(pixels, quality)?;
            CompressionOutcome {
                bytes,
                quality,
                met_budget: false,
                attempts: attempts + 1,
            }
        }
    };

    info!(
        quality = outcome.quality,
        size = outcome.bytes.len(),
        target = budget.target_bytes,
        met_budget = outcome.met_budget,
        attempts = outcome.attempts,
        "compression finished"
    );
    Ok(outcome)
}
