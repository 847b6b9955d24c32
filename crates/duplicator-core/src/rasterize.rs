use crate::export::ExportSize;

/// Failure reported by a [`Rasterizer`].
///
/// The editor treats this as a single failed attempt: nothing is written and nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rasterization failed: {message}")]
pub struct RasterizeError {
    pub message: String,
}

impl RasterizeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Turns export-ready SVG markup into PNG bytes of exactly `size`.
///
/// The core never links a rendering backend itself. Integrations pass one in at export time
/// (see `duplicator::raster::ResvgRasterizer` behind the `raster` feature).
pub trait Rasterizer {
    fn rasterize(&self, svg: &str, size: ExportSize) -> Result<Vec<u8>, RasterizeError>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for &R {
    fn rasterize(&self, svg: &str, size: ExportSize) -> Result<Vec<u8>, RasterizeError> {
        (**self).rasterize(svg, size)
    }
}
