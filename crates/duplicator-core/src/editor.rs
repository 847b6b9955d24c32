//! Single editing session: the loaded document, its pristine snapshot, the derived image
//! registry and the export settings.
//!
//! All mutations are synchronous and each one re-derives the registry before returning, so the
//! ids handed out by [`Editor::images`] always describe the current document.

use crate::document::{Document, NaturalSize};
use crate::error::{Error, Result};
use crate::export::{ExportDimensions, ExportSize};
use crate::notice::{Notice, NoticeLevel};
use crate::options::EditorOptions;
use crate::rasterize::Rasterizer;
use crate::registry::{self, ImageId, ImageRef};
use crate::source::{ImageSource, SvgUpload};

#[derive(Debug, Clone, Default)]
pub struct Editor {
    options: EditorOptions,
    document: Option<Document>,
    pristine: Option<Document>,
    images: Vec<ImageRef>,
    dimensions: ExportDimensions,
    notices: Vec<Notice>,
}

impl Editor {
    pub fn new(options: EditorOptions) -> Self {
        let fallback = NaturalSize::new(options.default_width, options.default_height);
        Self {
            options,
            dimensions: ExportDimensions::for_natural(fallback),
            ..Default::default()
        }
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    fn fallback_size(&self) -> NaturalSize {
        NaturalSize::new(self.options.default_width, self.options.default_height)
    }

    fn notify(&mut self, notice: Notice) {
        // Hosts surface diagnostics themselves; the log only traces the queue.
        match &notice {
            Notice::Icon { href } => tracing::debug!(len = href.len(), "icon notice queued"),
            Notice::Diagnostic { level, message } => {
                tracing::debug!(?level, message = message.as_str(), "diagnostic queued")
            }
        }
        self.notices.push(notice);
    }

    /// Drains the notices queued since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn rederive(&mut self) {
        self.images = self
            .document
            .as_ref()
            .map(registry::derive)
            .unwrap_or_default();
    }

    fn install(&mut self, document: Document) {
        self.dimensions.reset_to(document.natural_size());
        self.pristine = Some(document.clone());
        self.document = Some(document);
        self.rederive();
    }

    /// Loads an uploaded SVG file, replacing the current session.
    ///
    /// On rejection the previous session is left as it was, an error notice is queued and the
    /// error is returned. On success the icon becomes the first image's source, or the SVG
    /// itself when it embeds none.
    pub fn upload_svg(
        &mut self,
        name: &str,
        declared_mime: Option<&str>,
        bytes: &[u8],
    ) -> Result<()> {
        let upload = match SvgUpload::accept(name, declared_mime, bytes, self.fallback_size()) {
            Ok(upload) => upload,
            Err(err) => {
                self.notify(Notice::error(format!("Rejected SVG upload {name}: {err}")));
                return Err(err);
            }
        };
        self.install(upload.document);

        let icon = self
            .images
            .first()
            .map(|image| image.href.clone())
            .filter(|href| !href.is_empty())
            .unwrap_or(upload.data_url);
        self.notify(Notice::Icon { href: icon });
        Ok(())
    }

    /// Loads SVG markup directly (no file metadata, no icon change).
    pub fn load_markup(&mut self, text: &str) -> Result<()> {
        let document = Document::load_with_default_size(text, self.fallback_size())?;
        self.install(document);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// The current image registry, in document order.
    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn markup(&self) -> Option<&str> {
        self.document.as_ref().map(Document::markup)
    }

    pub fn natural_size(&self) -> Option<NaturalSize> {
        self.document.as_ref().map(Document::natural_size)
    }

    /// Current markup plus the canvas outline; never stored, never exported.
    pub fn preview_markup(&self) -> Option<String> {
        self.document
            .as_ref()
            .map(|doc| doc.preview_markup(&self.options.outline))
    }

    /// Restores the document captured at load time, undoing every replacement.
    pub fn reset(&mut self) -> Result<()> {
        let pristine = self.pristine.clone().ok_or(Error::NoDocument)?;
        self.dimensions.reset_to(pristine.natural_size());
        self.document = Some(pristine);
        self.rederive();
        Ok(())
    }

    /// Drops the document, its snapshot and the registry.
    pub fn clear(&mut self) {
        self.document = None;
        self.pristine = None;
        self.rederive();
    }

    /// Replaces the image currently identified by `id`.
    ///
    /// Returns `Ok(false)` when `id` no longer names an image, or names a read-only one
    /// (nothing changes).
    pub fn replace_image(&mut self, id: ImageId, source: &ImageSource) -> Result<bool> {
        if !source.is_image() {
            return Err(Error::UnsupportedImage {
                name: source.name.clone(),
            });
        }
        let document = self.document.as_mut().ok_or(Error::NoDocument)?;
        let replaced = registry::replace_one(document, id, &source.href)?;
        self.rederive();
        if replaced {
            self.notify(Notice::Icon {
                href: source.href.clone(),
            });
        }
        Ok(replaced)
    }

    /// Replaces the first images in document order with `sources`, one per position.
    ///
    /// Non-image sources are ignored and at most `batch_limit` sources are used. Positions
    /// beyond the last image, and read-only images, are reported and skipped. Returns how many
    /// images were replaced.
    pub fn replace_images(&mut self, sources: &[ImageSource]) -> Result<usize> {
        let document = self.document.as_mut().ok_or(Error::NoDocument)?;
        let batch: Vec<&ImageSource> = sources.iter().filter(|s| s.is_image()).collect();
        let limit = self.options.batch_limit;
        let batch = &batch[..batch.len().min(limit)];
        let available = document.image_count();
        let read_only: Vec<usize> = self
            .images
            .iter()
            .take(batch.len())
            .filter(|image| !image.editable)
            .map(|image| image.index)
            .collect();
        let hrefs: Vec<&str> = batch.iter().map(|s| s.href.as_str()).collect();
        let replaced = registry::replace_batch_with_limit(document, &hrefs, limit)?;
        self.rederive();

        let names: Vec<&str> = batch.iter().map(|s| s.name.as_str()).collect();
        self.notify(Notice::info(format!("Dropped files: {}", names.join(", "))));
        for &idx in &read_only {
            self.notify(Notice::Diagnostic {
                level: NoticeLevel::Warn,
                message: format!(
                    "SVG image at index {idx} comes from a DTD entity and was not replaced."
                ),
            });
        }
        for idx in available..batch.len() {
            self.notify(Notice::Diagnostic {
                level: NoticeLevel::Warn,
                message: format!("No SVG image at index {idx} to replace."),
            });
        }
        let last_applied = batch.len() <= available
            && batch
                .len()
                .checked_sub(1)
                .is_some_and(|last| !read_only.contains(&last));
        if let Some(last) = batch.last().filter(|_| last_applied) {
            self.notify(Notice::Icon {
                href: last.href.clone(),
            });
        }
        Ok(replaced)
    }

    pub fn dimensions(&self) -> &ExportDimensions {
        &self.dimensions
    }

    pub fn dimensions_mut(&mut self) -> &mut ExportDimensions {
        &mut self.dimensions
    }

    pub fn export_size(&self) -> ExportSize {
        self.dimensions.size()
    }

    /// File name the exported PNG is saved under.
    pub fn export_file_name(&self) -> &str {
        &self.options.export_file_name
    }

    /// Synchronous variant of [`Editor::export_png`].
    pub fn export_png_sync(&mut self, rasterizer: &dyn Rasterizer) -> Result<Vec<u8>> {
        let document = self.document.as_ref().ok_or(Error::NoDocument)?;
        let size = self.dimensions.size();
        match document.export_raster_sync(size, rasterizer) {
            Ok(png) => {
                tracing::debug!(
                    width = size.width,
                    height = size.height,
                    bytes = png.len(),
                    "exported PNG"
                );
                Ok(png)
            }
            Err(err) => {
                tracing::warn!(%err, "PNG export failed");
                self.notify(Notice::error(format!("Error converting to PNG: {err}")));
                Err(err)
            }
        }
    }

    /// Rasterizes the current document at the current export size.
    ///
    /// One attempt, no retry: on failure an error notice is queued and nothing is produced.
    pub async fn export_png(&mut self, rasterizer: &dyn Rasterizer) -> Result<Vec<u8>> {
        self.export_png_sync(rasterizer)
    }
}
