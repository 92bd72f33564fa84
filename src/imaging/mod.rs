//! Image processing core, built on the `image` crate's codecs.
//!
//! | Stage | Module | Entry point |
//! |---|---|---|
//! | **Decode + guard** | [`raster`], [`safety`] | [`decode`], [`decode_animated`] |
//! | **Orientation** | [`orientation`] | [`correct_orientation`] |
//! | **Format lookup** | [`format`] | [`profile_for`] |
//! | **Mode normalization** | [`normalize`] | [`normalize()`](normalize::normalize) |
//! | **Resize / crop** | [`geometry`] | [`resize`], [`crop`] |
//! | **Encode** | [`codec`] | [`encode`] |
//! | **Byte-budget search** | [`compress`] | [`compress_to_budget`] |
//! | **Animation** | [`animation`] | [`encode_animation`] |
//! | **Branding** | [`color`] | [`sample_brand_color`], [`trim_transparent`] |
//!
//! Every stage takes its [`RasterImage`] by value and returns a new one.
//! Dimension math lives in [`calculations`] as pure functions so it can be
//! tested without touching pixels.

pub mod animation;
pub mod calculations;
pub mod codec;
pub mod color;
pub mod compress;
pub mod error;
pub mod format;
pub mod geometry;
pub mod normalize;
pub mod orientation;
pub mod params;
pub mod raster;
pub mod safety;

pub use animation::encode_animation;
pub use codec::{JpegQualityEncoder, QualityEncoder, encode, encode_icon_container};
pub use color::{BackgroundPolicy, sample_brand_color, trim_transparent};
pub use compress::{CompressionOutcome, compress_to_budget};
pub use error::{ErrorClass, ImagingError};
pub use format::{FormatProfile, OutputFormat, profile_for};
pub use geometry::{crop, resize};
pub use orientation::correct_orientation;
pub use params::{CompressionBudget, CropBox, Quality, ResizeParams};
pub use raster::{ColorMode, LoopCount, RasterImage, decode, decode_animated};
pub use safety::SafetyLimits;
