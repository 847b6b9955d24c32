#![forbid(unsafe_code)]

use duplicator_core::{ExportSize, RasterizeError, Rasterizer};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("SVG has an empty canvas")]
    EmptyCanvas,
    #[error("failed to allocate a {width}x{height} pixmap")]
    PixmapAlloc { width: u32, height: u32 },
    #[error("failed to encode PNG")]
    PngEncode,
}

pub type Result<T> = std::result::Result<T, RasterError>;

impl From<RasterError> for RasterizeError {
    fn from(value: RasterError) -> Self {
        RasterizeError::new(value.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RasterOptions {
    /// CSS color painted under the artwork. Transparent when `None` or unparseable.
    pub background: Option<String>,
    /// Directory relative image `href`s are resolved against.
    pub resources_dir: Option<PathBuf>,
}

/// [`Rasterizer`] backed by `resvg`.
#[derive(Debug, Clone, Default)]
pub struct ResvgRasterizer {
    options: RasterOptions,
}

impl ResvgRasterizer {
    pub fn new(options: RasterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RasterOptions {
        &self.options
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(
        &self,
        svg: &str,
        size: ExportSize,
    ) -> std::result::Result<Vec<u8>, RasterizeError> {
        Ok(svg_to_png(svg, size, &self.options)?)
    }
}

/// Renders `svg` into a PNG of exactly `size` pixels.
///
/// The SVG canvas is scaled onto the pixmap, so markup from [`duplicator_core::Document::export_markup`]
/// (already sized to `size`) renders 1:1.
pub fn svg_to_png(svg: &str, size: ExportSize, options: &RasterOptions) -> Result<Vec<u8>> {
    let pixmap = svg_to_pixmap(svg, size, options)?;
    pixmap.encode_png().map_err(|_| RasterError::PngEncode)
}

fn svg_to_pixmap(
    svg: &str,
    size: ExportSize,
    options: &RasterOptions,
) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options {
        resources_dir: options.resources_dir.clone(),
        ..Default::default()
    };
    // System fonts cover any text in the artwork.
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|_| RasterError::SvgParse)?;
    let canvas = tree.size();
    if !(canvas.width() > 0.0 && canvas.height() > 0.0) {
        return Err(RasterError::EmptyCanvas);
    }

    let (width, height) = (size.width.max(1), size.height.max(1));
    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or(RasterError::PixmapAlloc { width, height })?;

    if let Some(color) = options.background.as_deref().and_then(parse_tiny_skia_color) {
        pixmap.fill(color);
    }

    let transform = tiny_skia::Transform::from_scale(
        width as f32 / canvas.width(),
        height as f32 / canvas.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Parses `transparent`, `white`, `black` and `#rgb`/`#rgba`/`#rrggbb`/`#rrggbbaa`.
pub fn parse_tiny_skia_color(text: &str) -> Option<tiny_skia::Color> {
    let s = text.trim().to_ascii_lowercase();
    match s.as_str() {
        "transparent" => return Some(tiny_skia::Color::TRANSPARENT),
        "white" => return Some(tiny_skia::Color::WHITE),
        "black" => return Some(tiny_skia::Color::BLACK),
        _ => {}
    }

    let digits: Vec<u8> = s
        .strip_prefix('#')?
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    let channel = |i: usize, wide: bool| {
        if wide {
            (digits[2 * i] << 4) | digits[2 * i + 1]
        } else {
            digits[i] * 0x11
        }
    };
    let (wide, alpha) = match digits.len() {
        3 => (false, None),
        4 => (false, Some(3)),
        6 => (true, None),
        8 => (true, Some(3)),
        _ => return None,
    };
    Some(tiny_skia::Color::from_rgba8(
        channel(0, wide),
        channel(1, wide),
        channel(2, wide),
        alpha.map_or(255, |i| channel(i, wide)),
    ))
}
