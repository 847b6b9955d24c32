//! Export size controller with an optional aspect-ratio lock.

use crate::document::NaturalSize;
use crate::edit;
use serde::Serialize;

/// Pixel size of a PNG export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExportSize {
    pub width: u32,
    pub height: u32,
}

impl ExportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Rounds a natural size to whole pixels (at least 1x1).
    pub fn from_natural(size: NaturalSize) -> Self {
        Self {
            width: round_px(size.width),
            height: round_px(size.height),
        }
    }
}

fn round_px(v: f64) -> u32 {
    if !v.is_finite() {
        return 1;
    }
    v.round().clamp(1.0, f64::from(u32::MAX)) as u32
}

/// Width/height fields plus the lock toggle.
///
/// While locked, editing one field recomputes the other from the natural aspect ratio. Invalid
/// input (zero, negative, non-numeric) is rejected and the previous value is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDimensions {
    size: ExportSize,
    locked: bool,
    aspect_ratio: f64,
}

impl Default for ExportDimensions {
    fn default() -> Self {
        Self::for_natural(NaturalSize::default())
    }
}

impl ExportDimensions {
    /// Starts at the natural size, locked.
    pub fn for_natural(natural: NaturalSize) -> Self {
        Self {
            size: ExportSize::from_natural(natural),
            locked: true,
            aspect_ratio: natural.aspect_ratio(),
        }
    }

    pub fn size(&self) -> ExportSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// Adopts a newly loaded document's natural size. The lock state is kept.
    pub fn reset_to(&mut self, natural: NaturalSize) {
        self.size = ExportSize::from_natural(natural);
        self.aspect_ratio = natural.aspect_ratio();
    }

    /// Flips the lock. Neither field is recomputed until the next edit.
    pub fn toggle_lock(&mut self) {
        self.locked = !self.locked;
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Returns `false` (and changes nothing) for a zero width.
    pub fn set_width(&mut self, width: u32) -> bool {
        if width == 0 {
            return false;
        }
        self.size.width = width;
        if self.locked {
            self.size.height = round_px(f64::from(width) / self.aspect_ratio);
        }
        true
    }

    /// Returns `false` (and changes nothing) for a zero height.
    pub fn set_height(&mut self, height: u32) -> bool {
        if height == 0 {
            return false;
        }
        self.size.height = height;
        if self.locked {
            self.size.width = round_px(f64::from(height) * self.aspect_ratio);
        }
        true
    }

    /// Applies raw field text, e.g. `"400"` or `"400px"`.
    pub fn set_width_text(&mut self, text: &str) -> bool {
        parse_field(text).is_some_and(|w| self.set_width(w))
    }

    pub fn set_height_text(&mut self, text: &str) -> bool {
        parse_field(text).is_some_and(|h| self.set_height(h))
    }
}

fn parse_field(text: &str) -> Option<u32> {
    let value = edit::parse_leading_int(text)?;
    u32::try_from(value).ok().filter(|v| *v > 0)
}
