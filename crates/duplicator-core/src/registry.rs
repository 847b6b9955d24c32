//! Embedded image registry.
//!
//! SVG gives `<image>` elements no stable identity, so images are addressed by their position in
//! document order (`image-0`, `image-1`, ...). The registry is a view: it is derived from a
//! [`Document`] and must be derived again after every mutation. An id taken from an older
//! derivation may point at a different element, or at nothing.

use crate::document::Document;
use crate::error::Result;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Positional image identifier, rendered as `image-<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(usize);

impl ImageId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid image id `{0}` (expected `image-<n>`)")]
pub struct ParseImageIdError(String);

impl FromStr for ImageId {
    type Err = ParseImageIdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim()
            .strip_prefix("image-")
            .and_then(|n| n.parse::<usize>().ok())
            .map(Self)
            .ok_or_else(|| ParseImageIdError(s.to_string()))
    }
}

impl Serialize for ImageId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Which attribute supplied an image's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HrefAttr {
    /// `href` without a namespace (SVG 2).
    Plain,
    /// An attribute literally written `xlink:href`.
    XlinkLegacy,
    /// `href` in the XLink namespace under some other prefix.
    Namespaced,
    /// No non-empty source attribute.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub id: ImageId,
    /// Position in document order; equal to `id.index()`.
    #[serde(skip)]
    pub index: usize,
    /// Source URL or `data:` URL; empty when the element has none.
    pub href: String,
    #[serde(rename = "attr")]
    pub href_attr: HrefAttr,
    /// `false` for images expanded from a DTD entity; replacements skip them.
    pub editable: bool,
}

/// Lists every image in document order with freshly assigned ids.
pub fn derive(document: &Document) -> Vec<ImageRef> {
    let images: Vec<ImageRef> = document
        .image_scans()
        .iter()
        .enumerate()
        .map(|(index, scan)| ImageRef {
            id: ImageId(index),
            index,
            href: scan.href.clone(),
            href_attr: scan.href_attr,
            editable: scan.editable,
        })
        .collect();
    tracing::debug!(count = images.len(), "derived image registry");
    images
}

/// Points the image currently identified by `id` at `href`.
///
/// A stale or unknown id, or a read-only image, is a silent no-op and yields `Ok(false)`.
/// Callers re-derive the registry afterwards.
pub fn replace_one(document: &mut Document, id: ImageId, href: &str) -> Result<bool> {
    let replaced = document.set_image_sources([(id.index(), href)])?;
    if replaced == 0 {
        tracing::debug!(%id, "no editable image with this id; replacement skipped");
    }
    Ok(replaced > 0)
}

/// Most sources a single batch replacement applies.
pub const BATCH_LIMIT: usize = 3;

/// Replaces the first images in document order with `hrefs`, position by position.
///
/// Only the first [`BATCH_LIMIT`] sources are used. See [`replace_batch_with_limit`].
pub fn replace_batch<S: AsRef<str>>(document: &mut Document, hrefs: &[S]) -> Result<usize> {
    replace_batch_with_limit(document, hrefs, BATCH_LIMIT)
}

/// Replaces the first images in document order with at most `limit` of `hrefs`.
///
/// Sources past `limit` and positions past the last image are discarded; nothing is inserted or
/// reordered. Read-only images keep their source. Returns the number of images replaced.
/// Callers re-derive the registry afterwards.
pub fn replace_batch_with_limit<S: AsRef<str>>(
    document: &mut Document,
    hrefs: &[S],
    limit: usize,
) -> Result<usize> {
    let hrefs = &hrefs[..hrefs.len().min(limit)];
    let available = document.image_count();
    if hrefs.len() > available {
        tracing::debug!(
            requested = hrefs.len(),
            available,
            "batch longer than the image list; extra sources discarded"
        );
    }
    document.set_image_sources(hrefs.iter().map(|s| AsRef::<str>::as_ref(s)).enumerate())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_id_round_trips_through_text() {
        let id: ImageId = "image-12".parse().unwrap();
        assert_eq!(id.index(), 12);
        assert_eq!(id.to_string(), "image-12");
    }

    #[test]
    fn image_id_rejects_other_shapes() {
        assert!("img-1".parse::<ImageId>().is_err());
        assert!("image-".parse::<ImageId>().is_err());
        assert!("image--1".parse::<ImageId>().is_err());
    }

    #[test]
    fn image_ref_serializes_with_textual_id() {
        let r = ImageRef {
            id: ImageId::new(0),
            index: 0,
            href: "a.png".to_string(),
            href_attr: HrefAttr::XlinkLegacy,
            editable: true,
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "image-0",
                "href": "a.png",
                "attr": "xlink-legacy",
                "editable": true
            })
        );
    }
}
