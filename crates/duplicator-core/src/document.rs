//! The SVG document being edited.
//!
//! A [`Document`] owns canonical markup text. It is parsed with `roxmltree` to locate the root
//! element and every embedded `<image>`, and all mutations are byte-range splices against that
//! text (see [`crate::edit`]). After each mutation the document re-scans itself from scratch.

use crate::edit::{self, Splice};
use crate::error::{Error, Result};
use crate::export::ExportSize;
use crate::options::OutlineStyle;
use crate::rasterize::Rasterizer;
use crate::registry::HrefAttr;
use std::ops::Range;
use std::str::FromStr;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// `preserveAspectRatio` forced onto every image: scale to cover the frame, centered, cropped.
pub const FILL_AND_CROP: &str = "xMidYMid slice";

/// Marker attribute carried by the preview-only outline rectangle.
pub const OUTLINE_MARKER: &str = "data-duplicator-outline";

/// Size of the canvas in user units, as declared by the SVG root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaturalSize {
    pub width: f64,
    pub height: f64,
}

impl Default for NaturalSize {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl NaturalSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
struct RootScan {
    qname: String,
    name_end: usize,
    width: Option<Range<usize>>,
    height: Option<Range<usize>>,
    has_view_box: bool,
    declared_size: Option<NaturalSize>,
    close: RootClose,
    outlines: Vec<Range<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RootClose {
    /// Byte range of the `/>` of a self-closing root.
    SelfClosing(usize),
    /// Offset of the `</` that starts the root end tag.
    EndTag(usize),
}

/// One `<image>` element as found by the latest scan.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ImageScan {
    pub(crate) href: String,
    pub(crate) href_attr: HrefAttr,
    /// The attribute a replacement rewrites: its whole `name="value"` range and qualified name.
    source_slot: Option<(Range<usize>, String)>,
    name_end: usize,
    aspect: Option<(Range<usize>, String)>,
    /// `false` when the element was expanded from a DTD entity: its byte ranges point into the
    /// entity declaration, so it is listed but never spliced.
    pub(crate) editable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    markup: String,
    natural_size: NaturalSize,
    root: RootScan,
    images: Vec<ImageScan>,
}

fn parse_tree(text: &str) -> Result<roxmltree::Document<'_>> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    Ok(roxmltree::Document::parse_with_options(text, options)?)
}

fn is_image(node: &roxmltree::Node<'_, '_>) -> bool {
    node.is_element()
        && node.tag_name().name() == "image"
        && matches!(node.tag_name().namespace(), None | Some(SVG_NS))
}

fn plain_attr<'a, 'input>(
    node: &roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Attribute<'a, 'input>> {
    node.attributes()
        .find(|a| a.namespace().is_none() && a.name() == name)
}

fn parse_view_box_size(raw: &str) -> Option<NaturalSize> {
    let vb = svgtypes::ViewBox::from_str(raw).ok()?;
    (vb.w.is_finite() && vb.h.is_finite() && vb.w > 0.0 && vb.h > 0.0).then_some(NaturalSize {
        width: vb.w,
        height: vb.h,
    })
}

fn declared_size(root: &roxmltree::Node<'_, '_>) -> Option<NaturalSize> {
    let explicit = root
        .attribute("width")
        .and_then(edit::parse_length)
        .zip(root.attribute("height").and_then(edit::parse_length));
    if let Some((width, height)) = explicit {
        return Some(NaturalSize { width, height });
    }
    root.attribute("viewBox").and_then(parse_view_box_size)
}

fn non_empty(a: &roxmltree::Attribute<'_, '_>) -> bool {
    !a.value().is_empty()
}

/// Resolves an image's source: plain `href`, then a literal `xlink:href`, then any XLink-namespaced
/// `href`. Empty values fall through to the next candidate.
fn resolve_href<'a, 'input>(
    text: &str,
    node: &roxmltree::Node<'a, 'input>,
) -> (HrefAttr, Option<roxmltree::Attribute<'a, 'input>>) {
    if let Some(a) = plain_attr(node, "href").filter(non_empty) {
        return (HrefAttr::Plain, Some(a));
    }
    if let Some(a) = node
        .attributes()
        .find(|a| &text[a.range_qname()] == "xlink:href" && non_empty(a))
    {
        return (HrefAttr::XlinkLegacy, Some(a));
    }
    if let Some(a) = node
        .attributes()
        .find(|a| a.namespace() == Some(XLINK_NS) && a.name() == "href" && non_empty(a))
    {
        return (HrefAttr::Namespaced, Some(a));
    }
    (HrefAttr::Missing, None)
}

fn within(outer: &Range<usize>, inner: &Range<usize>) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

fn scan_image(text: &str, root: &Range<usize>, node: &roxmltree::Node<'_, '_>) -> ImageScan {
    let (href_attr, resolved) = resolve_href(text, node);
    let href = resolved
        .as_ref()
        .map(|a| a.value().to_string())
        .unwrap_or_default();
    // An empty plain `href` still occupies the slot; inserting a second one would be a duplicate.
    let source_slot = resolved
        .or_else(|| plain_attr(node, "href"))
        .map(|a| (a.range(), text[a.range_qname()].to_string()));
    let aspect =
        plain_attr(node, "preserveAspectRatio").map(|a| (a.range(), a.value().to_string()));

    ImageScan {
        href,
        href_attr,
        source_slot,
        name_end: edit::start_tag_name_end(text, node.range().start),
        aspect,
        editable: within(root, &node.range()),
    }
}

fn scan_root(text: &str, root: &roxmltree::Node<'_, '_>) -> RootScan {
    let range = root.range();
    let element = &text[range.clone()];
    let close = if !root.has_children() && element.ends_with("/>") {
        RootClose::SelfClosing(range.end - 2)
    } else {
        let end_tag = element.rfind("</").map_or(range.end, |i| range.start + i);
        RootClose::EndTag(end_tag)
    };
    let outlines = root
        .children()
        .filter(|c| c.is_element() && c.has_tag_name("rect") && c.has_attribute(OUTLINE_MARKER))
        .map(|c| c.range())
        .filter(|r| within(&range, r))
        .collect();

    RootScan {
        qname: edit::start_tag_name(text, range.start).to_string(),
        name_end: edit::start_tag_name_end(text, range.start),
        width: plain_attr(root, "width").map(|a| a.range()),
        height: plain_attr(root, "height").map(|a| a.range()),
        has_view_box: root.has_attribute("viewBox"),
        declared_size: declared_size(root),
        close,
        outlines,
    }
}

fn scan(text: &str) -> Result<(RootScan, Vec<ImageScan>)> {
    let tree = parse_tree(text)?;
    let root = tree.root_element();
    if root.tag_name().name() != "svg" {
        return Err(Error::NotSvg {
            root: edit::start_tag_name(text, root.range().start).to_string(),
        });
    }
    let root_range = root.range();
    let images: Vec<ImageScan> = tree
        .descendants()
        .filter(is_image)
        .map(|n| scan_image(text, &root_range, &n))
        .collect();
    let locked = images.iter().filter(|i| !i.editable).count();
    if locked > 0 {
        tracing::debug!(locked, "images expanded from DTD entities are read-only");
    }
    Ok((scan_root(text, &root), images))
}

fn fill_and_crop_splice(image: &ImageScan) -> Option<Splice> {
    if !image.editable {
        return None;
    }
    match &image.aspect {
        Some((_, value)) if value == FILL_AND_CROP => None,
        Some((range, _)) => Some(Splice::replace(
            range.clone(),
            edit::attr("preserveAspectRatio", FILL_AND_CROP),
        )),
        None => Some(Splice::insert(
            image.name_end,
            format!(" {}", edit::attr("preserveAspectRatio", FILL_AND_CROP)),
        )),
    }
}

fn source_splice(image: &ImageScan, href: &str) -> Splice {
    match &image.source_slot {
        Some((range, qname)) => Splice::replace(range.clone(), edit::attr(qname, href)),
        None => Splice::insert(image.name_end, format!(" {}", edit::attr("href", href))),
    }
}

impl Document {
    /// Parses SVG markup, falling back to 800x600 when the root declares no size.
    pub fn load(text: &str) -> Result<Self> {
        Self::load_with_default_size(text, NaturalSize::default())
    }

    /// Parses SVG markup and forces fill-and-crop scaling onto every image.
    ///
    /// Fails with [`Error::Parse`] when the text is not well-formed XML and with
    /// [`Error::NotSvg`] when the root element is not `<svg>`.
    pub fn load_with_default_size(text: &str, fallback: NaturalSize) -> Result<Self> {
        let (root, images) = scan(text)?;
        let natural_size = root.declared_size.unwrap_or(fallback);

        let splices = images.iter().filter_map(fill_and_crop_splice).collect();
        let markup = edit::apply(text, splices);
        let (root, images) = scan(&markup)?;

        tracing::debug!(
            width = natural_size.width,
            height = natural_size.height,
            images = images.len(),
            "loaded SVG document"
        );
        Ok(Self {
            markup,
            natural_size,
            root,
            images,
        })
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Canonical markup reflecting every mutation and the fill-and-crop normalization.
    pub fn serialize(&self) -> String {
        self.markup.clone()
    }

    pub fn into_markup(self) -> String {
        self.markup
    }

    pub fn natural_size(&self) -> NaturalSize {
        self.natural_size
    }

    /// `true` when the root declares its own size (via `width`/`height` or `viewBox`).
    pub fn has_declared_size(&self) -> bool {
        self.root.declared_size.is_some()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub(crate) fn image_scans(&self) -> &[ImageScan] {
        &self.images
    }

    /// Points the images at `edits` (`(traversal index, new source)`) at new sources and
    /// re-applies fill-and-crop scaling to each of them. Indices without a matching image, and
    /// images expanded from DTD entities, are skipped. Returns how many images were rewritten.
    pub(crate) fn set_image_sources<'s>(
        &mut self,
        edits: impl IntoIterator<Item = (usize, &'s str)>,
    ) -> Result<usize> {
        let mut splices = Vec::new();
        let mut touched: Vec<usize> = Vec::new();
        for (index, href) in edits {
            let Some(image) = self.images.get(index) else {
                continue;
            };
            if !image.editable || touched.contains(&index) {
                continue;
            }
            touched.push(index);
            splices.push(source_splice(image, href));
            splices.extend(fill_and_crop_splice(image));
        }
        if touched.is_empty() {
            return Ok(0);
        }

        let markup = edit::apply(&self.markup, splices);
        let (root, images) = scan(&markup)?;
        self.markup = markup;
        self.root = root;
        self.images = images;
        Ok(touched.len())
    }

    /// Markup with a canvas outline appended to the root, for on-screen preview only.
    ///
    /// The outline is never stored: [`Document::serialize`] and exports stay free of it.
    /// Without a declared canvas size there is nothing to outline and the markup is returned as is.
    pub fn preview_markup(&self, style: &OutlineStyle) -> String {
        let Some(size) = self.root.declared_size else {
            return self.markup.clone();
        };

        let rect_name = match self.root.qname.split_once(':') {
            Some((prefix, _)) => format!("{prefix}:rect"),
            None => "rect".to_string(),
        };
        let rect = format!(
            "<{rect_name} {} {} {} {} {} {} {} {} {}/>",
            edit::attr("x", "0"),
            edit::attr("y", "0"),
            edit::attr("width", &size.width.to_string()),
            edit::attr("height", &size.height.to_string()),
            edit::attr("fill", "none"),
            edit::attr("stroke", &style.stroke),
            edit::attr("stroke-width", &style.stroke_width.to_string()),
            edit::attr(OUTLINE_MARKER, "true"),
            edit::attr("pointer-events", "none"),
        );

        let mut splices: Vec<Splice> = self
            .root
            .outlines
            .iter()
            .map(|r| Splice::replace(r.clone(), ""))
            .collect();
        match self.root.close {
            RootClose::SelfClosing(at) => splices.push(Splice::replace(
                at..at + 2,
                format!(">{rect}</{}>", self.root.qname),
            )),
            RootClose::EndTag(at) => splices.push(Splice::insert(at, rect)),
        }
        edit::apply(&self.markup, splices)
    }

    /// A detached copy of the markup sized for export.
    ///
    /// The root `width`/`height` are overridden with `size`. A root without `viewBox` gets one
    /// spanning the natural size so the artwork scales with the export instead of being clipped.
    pub fn export_markup(&self, size: ExportSize) -> String {
        let mut splices = Vec::new();
        let mut inserted = String::new();

        let width = edit::attr("width", &size.width.to_string());
        match &self.root.width {
            Some(range) => splices.push(Splice::replace(range.clone(), width)),
            None => inserted.push_str(&format!(" {width}")),
        }
        let height = edit::attr("height", &size.height.to_string());
        match &self.root.height {
            Some(range) => splices.push(Splice::replace(range.clone(), height)),
            None => inserted.push_str(&format!(" {height}")),
        }
        if !self.root.has_view_box {
            let n = self.natural_size;
            let view_box = format!("0 0 {} {}", n.width, n.height);
            inserted.push_str(&format!(" {}", edit::attr("viewBox", &view_box)));
        }
        if !inserted.is_empty() {
            splices.push(Splice::insert(self.root.name_end, inserted));
        }
        edit::apply(&self.markup, splices)
    }

    /// Synchronous variant of [`Document::export_raster`].
    pub fn export_raster_sync(
        &self,
        size: ExportSize,
        rasterizer: &dyn Rasterizer,
    ) -> Result<Vec<u8>> {
        let svg = self.export_markup(size);
        Ok(rasterizer.rasterize(&svg, size)?)
    }

    /// Renders the document at `size` through `rasterizer`.
    ///
    /// Either a complete image is produced or the call fails as a whole. The live document is
    /// not touched.
    pub async fn export_raster(
        &self,
        size: ExportSize,
        rasterizer: &dyn Rasterizer,
    ) -> Result<Vec<u8>> {
        self.export_raster_sync(size, rasterizer)
    }
}
