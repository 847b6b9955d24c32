//! Replacement image payloads and SVG uploads.
//!
//! These stand in for what a file picker or a drop target hands over: a file name, an optional
//! declared MIME type and the raw bytes.

use crate::document::{Document, NaturalSize};
use crate::error::{Error, Result};
use base64::Engine as _;

/// An image that can be written into an `<image>` element's source attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub name: String,
    pub mime: String,
    /// URL placed into the document: a `data:` URL for byte payloads.
    pub href: String,
}

impl ImageSource {
    /// Sniffs the payload and embeds it as a base64 `data:` URL.
    ///
    /// Fails with [`Error::UnsupportedImage`] for anything that is not a recognizable image.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let Some(mime) = sniff_image_mime(&name, bytes) else {
            return Err(Error::UnsupportedImage { name });
        };
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        let href = format!("data:{mime};base64,{payload}");
        Ok(Self { name, mime, href })
    }

    /// Wraps an already addressable source (remote URL, relative path, data URL).
    pub fn from_href(href: impl Into<String>) -> Self {
        let href = href.into();
        let mime = href
            .strip_prefix("data:")
            .and_then(|rest| rest.split([';', ',']).next())
            .filter(|m| !m.is_empty())
            .unwrap_or("image/*")
            .to_string();
        Self {
            name: href.clone(),
            mime,
            href,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Returns the MIME type of an image payload, or `None` when it is not an image.
pub fn sniff_image_mime(name: &str, bytes: &[u8]) -> Option<String> {
    if let Ok(format) = image::guess_format(bytes) {
        return Some(format.to_mime_type().to_string());
    }
    if looks_like_svg(name, bytes) {
        return Some("image/svg+xml".to_string());
    }
    None
}

fn looks_like_svg(name: &str, bytes: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return false;
    };
    let head: String = text.chars().take(1024).collect();
    head.contains("<svg") || (name.to_ascii_lowercase().ends_with(".svg") && head.contains('<'))
}

/// Keeps the image payloads among `files` (name, bytes), preserving order.
///
/// Non-image files are dropped with a debug log line; this mirrors a drop target that only
/// accepts `image/*`.
pub fn filter_images<N, B>(files: impl IntoIterator<Item = (N, B)>) -> Vec<ImageSource>
where
    N: Into<String>,
    B: AsRef<[u8]>,
{
    files
        .into_iter()
        .filter_map(|(name, bytes)| match ImageSource::from_bytes(name, bytes.as_ref()) {
            Ok(source) => Some(source),
            Err(err) => {
                tracing::debug!(%err, "ignoring non-image file");
                None
            }
        })
        .collect()
}

/// An SVG upload that has been accepted as a [`Document`].
#[derive(Debug, Clone)]
pub struct SvgUpload {
    pub name: String,
    pub document: Document,
    /// The uploaded file as a `data:` URL (used as the session icon when it has no images).
    pub data_url: String,
}

impl SvgUpload {
    /// Accepts an SVG upload from any entry point (picker or drop) with one rule: the bytes
    /// must be UTF-8 text that loads as an SVG document.
    ///
    /// The file name and declared MIME type are advisory; a mismatch is logged, not rejected.
    pub fn accept(
        name: &str,
        declared_mime: Option<&str>,
        bytes: &[u8],
        fallback_size: NaturalSize,
    ) -> Result<Self> {
        let advertised_svg = declared_mime == Some("image/svg+xml")
            || name.to_ascii_lowercase().ends_with(".svg");
        if !advertised_svg {
            tracing::debug!(name, ?declared_mime, "upload is not labelled as SVG; parsing anyway");
        }

        let text = std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let document = Document::load_with_default_size(text, fallback_size)?;
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);

        Ok(Self {
            name: name.to_string(),
            document,
            data_url: format!("data:image/svg+xml;base64,{payload}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    #[test]
    fn png_bytes_become_a_data_url() {
        let source = ImageSource::from_bytes("cat.png", PNG_1X1).unwrap();
        assert_eq!(source.mime, "image/png");
        assert!(source.href.starts_with("data:image/png;base64,iVBORw0KGgo"));
        assert!(source.is_image());
    }

    #[test]
    fn jpeg_is_detected_by_content_not_name() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        let source = ImageSource::from_bytes("photo.bin", &jpeg).unwrap();
        assert_eq!(source.mime, "image/jpeg");
    }

    #[test]
    fn svg_text_is_an_image() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#;
        let source = ImageSource::from_bytes("logo.svg", svg).unwrap();
        assert_eq!(source.mime, "image/svg+xml");
    }

    #[test]
    fn text_files_are_rejected() {
        let err = ImageSource::from_bytes("notes.txt", b"hello").unwrap_err();
        assert!(matches!(err, Error::UnsupportedImage { name } if name == "notes.txt"));
    }

    #[test]
    fn filter_images_drops_non_images_in_order() {
        let files = vec![
            ("a.txt", b"plain".to_vec()),
            ("b.png", PNG_1X1.to_vec()),
            ("c.md", b"# doc".to_vec()),
        ];
        let images = filter_images(files);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].name, "b.png");
    }

    #[test]
    fn href_sources_keep_data_url_mime() {
        let source = ImageSource::from_href("data:image/gif;base64,R0lGOD");
        assert_eq!(source.mime, "image/gif");
        let remote = ImageSource::from_href("https://example.com/a.png");
        assert_eq!(remote.mime, "image/*");
    }

    #[test]
    fn upload_rule_ignores_the_file_name() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="20"/>"#;
        let upload = SvgUpload::accept("drawing.txt", None, svg, NaturalSize::default()).unwrap();
        assert_eq!(upload.document.natural_size(), NaturalSize::new(10.0, 20.0));
        assert!(upload.data_url.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn upload_rejects_malformed_and_non_svg_payloads() {
        let bad = SvgUpload::accept("x.svg", None, b"<svg><g></svg>", NaturalSize::default());
        assert!(matches!(bad, Err(Error::Parse { .. })));

        let html = SvgUpload::accept("x.svg", None, b"<html/>", NaturalSize::default());
        assert!(matches!(html, Err(Error::NotSvg { root }) if root == "html"));

        let binary = SvgUpload::accept("x.svg", None, &[0xff, 0xfe, 0x00], NaturalSize::default());
        assert!(matches!(binary, Err(Error::InvalidUtf8)));
    }
}
