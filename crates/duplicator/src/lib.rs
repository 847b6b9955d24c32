#![forbid(unsafe_code)]

//! `duplicator` swaps the raster images embedded in an SVG and exports the result.
//!
//! The document model lives in `duplicator-core` and is re-exported here unchanged.
//!
//! # Features
//!
//! - `raster`: PNG export via pure-Rust SVG rasterization (`duplicator::raster`)

pub use duplicator_core::*;

#[cfg(feature = "raster")]
pub mod raster;
