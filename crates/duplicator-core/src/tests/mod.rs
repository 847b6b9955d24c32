mod registry;

/// Three images: plain `href`, legacy `xlink:href` with its own aspect setting, and one nested in a
/// group.
pub(crate) const THREE_IMAGES: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="300" height="200">
  <image href="a.png" x="0" y="0" width="100" height="100"/>
  <image xlink:href="b.png" x="100" width="100" height="100" preserveAspectRatio="none"/>
  <g><image href="c.png" x="200" width="100" height="100"/></g>
</svg>"#;

pub(crate) const VIEW_BOX_ONLY: &str =
    r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 640 480"/>"#;

pub(crate) const UNSIZED: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="5" height="5"/></svg>"#;

/// Records every call and answers with a fake PNG signature.
#[derive(Default)]
pub(crate) struct RecordingRasterizer {
    pub(crate) calls: std::cell::RefCell<Vec<(String, crate::ExportSize)>>,
}

impl crate::Rasterizer for RecordingRasterizer {
    fn rasterize(
        &self,
        svg: &str,
        size: crate::ExportSize,
    ) -> Result<Vec<u8>, crate::RasterizeError> {
        self.calls.borrow_mut().push((svg.to_string(), size));
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }
}

pub(crate) struct FailingRasterizer;

impl crate::Rasterizer for FailingRasterizer {
    fn rasterize(
        &self,
        _svg: &str,
        _size: crate::ExportSize,
    ) -> Result<Vec<u8>, crate::RasterizeError> {
        Err(crate::RasterizeError::new("boom"))
    }
}
