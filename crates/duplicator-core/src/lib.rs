#![forbid(unsafe_code)]

//! SVG image swapping model (headless).
//!
//! Load one SVG, list the raster images embedded in it, point any of them at new image data,
//! preview the result with a canvas outline and export it as a PNG at a chosen size.
//!
//! Design goals:
//! - edits touch only the bytes they target (everything else round-trips verbatim)
//! - positional image ids, re-derived after every mutation instead of patched
//! - no rendering backend in the core: PNG export goes through a [`Rasterizer`]
//! - runtime-agnostic async APIs (no specific executor required)

pub(crate) mod edit;

pub mod document;
pub mod editor;
pub mod error;
pub mod export;
pub mod notice;
pub mod options;
pub mod rasterize;
pub mod registry;
pub mod source;

pub use document::{Document, FILL_AND_CROP, NaturalSize};
pub use editor::Editor;
pub use error::{Error, Result};
pub use export::{ExportDimensions, ExportSize};
pub use notice::{Notice, NoticeLevel};
pub use options::{EditorOptions, OutlineStyle};
pub use rasterize::{RasterizeError, Rasterizer};
pub use registry::{HrefAttr, ImageId, ImageRef};
pub use source::{ImageSource, SvgUpload};

#[cfg(test)]
mod tests;
