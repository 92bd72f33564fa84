//! # Rasterforge
//!
//! A raster-image transformation core: transcode, resize, crop, compress to a
//! byte budget, build favicon packages and run named optimization presets.
//! Input is an encoded byte buffer, output is an encoded byte buffer plus a
//! report. Nothing here touches the network or keeps state between calls.
//!
//! # Architecture: One Pipeline, Many Commands
//!
//! Every command shares the same prefix:
//!
//! ```text
//! 1. Decode     bytes        →  RasterImage   (pixel ceiling checked from the header)
//! 2. Orient     RasterImage  →  RasterImage   (stored orientation applied, then cleared)
//! 3. Component  RasterImage  →  Artifact      (geometry, codec, compressor, favicon, preset)
//! ```
//!
//! Each stage takes ownership of the image and returns a new one, so stages
//! can be reordered or run on different threads without sharing buffers.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Pixel-level primitives: decode, format profiles, mode normalization, geometry, codecs, budget compression |
//! | [`pipeline`] | Command dispatch from raw bytes to an [`pipeline::Artifact`] |
//! | [`favicon`] | Favicon package: renditions, multi-size ICO, dark variant, social preview, manifest, HTML |
//! | [`presets`] | Named publishing presets (twitter, web, youtube, seo, ...) |
//! | [`archive`] | In-memory ZIP assembly for multi-artifact outputs |
//! | [`worker`] | Bounded rayon pool that runs jobs and produces audit rows |
//! | [`audit`] | Audit-record fields for whatever persists usage |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Closed Format Set
//!
//! Output formats are an enum with a static capability table
//! ([`imaging::FormatProfile`]). Anything outside the table is rejected with
//! `UnsupportedFormat` before a pixel is touched, and every `match` over the
//! set is exhaustive.
//!
//! ## Errors Split by Audience
//!
//! [`imaging::ImagingError`] separates caller mistakes (validation class, 400,
//! message shown as-is) from codec failures (internal class, 500, generic
//! message). Internal detail goes to the log, never to the caller.
//!
//! ## Codecs
//!
//! Decoding and most encoding go through the `image` crate; lossy WebP is
//! written by libwebp through the `webp` crate. AVIF is encode-only: there is
//! no decoder compiled in, so AVIF sources are reported as undecodable.

pub mod archive;
pub mod audit;
pub mod config;
pub mod favicon;
pub mod imaging;
pub mod output;
pub mod pipeline;
pub mod presets;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_helpers;
