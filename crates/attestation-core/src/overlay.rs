//! Overlay plan and its application to a PDF template
//!
//! Rendering is split in two: the renderer first lays out an
//! [`OverlayPlan`] (pure, easy to inspect in tests), then
//! [`apply_overlay`] writes that plan into the template as extra content
//! streams on each page.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::AttestationError;
use crate::layout::{PdfRect, Point, A4_HEIGHT, A4_WIDTH};
use crate::metrics::encode_win_ansi;
use crate::qr::QrImage;

/// Resource name of the embedded Helvetica font
pub const FONT_RESOURCE: &str = "FAtt";
/// Resource name of the QR image XObject
pub const QR_RESOURCE: &str = "QrAtt";

/// Guards against cyclic `/Parent` chains in broken page trees
const MAX_TREE_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Left-anchored single-line text
    Text {
        page: u32,
        at: Point,
        size: f32,
        text: String,
    },
    /// Checkbox tick
    Mark {
        page: u32,
        at: Point,
        size: f32,
        glyph: String,
    },
    /// The QR code image
    QrCode { page: u32, placement: QrPlacement },
}

/// Where a QR image goes on its page
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QrPlacement {
    /// Absolute rectangle in page space
    Fixed(PdfRect),
    /// Square of side `size` whose bottom edge sits `top_offset` below the
    /// top of the target page's media box
    FromTop { x: f32, top_offset: f32, size: f32 },
}

impl QrPlacement {
    /// Resolve to a rectangle on a page of height `page_height`
    pub fn resolve(&self, page_height: f32) -> PdfRect {
        match *self {
            QrPlacement::Fixed(rect) => rect,
            QrPlacement::FromTop {
                x,
                top_offset,
                size,
            } => PdfRect {
                x,
                y: page_height - top_offset,
                width: size,
                height: size,
            },
        }
    }
}

impl DrawOp {
    pub fn page(&self) -> u32 {
        match self {
            DrawOp::Text { page, .. } => *page,
            DrawOp::Mark { page, .. } => *page,
            DrawOp::QrCode { page, .. } => *page,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverlayPlan {
    ops: Vec<DrawOp>,
    appended_pages: u32,
}

impl OverlayPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn text(&mut self, page: u32, at: Point, size: f32, text: impl Into<String>) {
        self.add(DrawOp::Text {
            page,
            at,
            size,
            text: text.into(),
        });
    }

    /// Request one blank A4 page at the end of the document
    pub fn append_page(&mut self) {
        self.appended_pages += 1;
    }

    pub fn appended_pages(&self) -> u32 {
        self.appended_pages
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn ops_for_page(&self, page: u32) -> Vec<&DrawOp> {
        self.ops.iter().filter(|op| op.page() == page).collect()
    }

    /// Positions of every checkbox mark, in drawing order
    pub fn marks(&self) -> Vec<Point> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Mark { at, .. } => Some(*at),
                _ => None,
            })
            .collect()
    }

    /// Text op drawn at exactly `at`, if any
    pub fn text_at(&self, at: Point) -> Option<(&str, f32)> {
        self.ops.iter().find_map(|op| match op {
            DrawOp::Text {
                at: p, size, text, ..
            } if *p == at => Some((text.as_str(), *size)),
            _ => None,
        })
    }

    /// Highest page number the plan draws on
    pub fn last_page(&self) -> u32 {
        self.ops.iter().map(DrawOp::page).max().unwrap_or(0)
    }

}

fn op_err(e: lopdf::Error) -> AttestationError {
    AttestationError::OperationError(e.to_string())
}

/// Write the plan into `doc`.
///
/// The requested blank A4 pages are appended first; pages the plan still
/// draws on beyond the end of the document are appended the same way. The
/// font and the QR image are added once and shared by every page that uses
/// them.
pub fn apply_overlay(
    doc: &mut Document,
    plan: &OverlayPlan,
    qr: &QrImage,
) -> Result<(), AttestationError> {
    if doc.get_pages().is_empty() {
        return Err(AttestationError::EmptyTemplate);
    }

    for _ in 0..plan.appended_pages() {
        append_blank_page(doc, A4_WIDTH, A4_HEIGHT)?;
    }
    while (doc.get_pages().len() as u32) < plan.last_page() {
        append_blank_page(doc, A4_WIDTH, A4_HEIGHT)?;
    }

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(qr.width() as i64),
            "Height" => Object::Integer(qr.width() as i64),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => Object::Integer(8),
            "Filter" => "FlateDecode",
        },
        qr.to_flate()?,
    ));

    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    for (page_num, page_id) in pages {
        let ops = plan.ops_for_page(page_num);
        if ops.is_empty() {
            continue;
        }

        let mut content = Vec::new();
        let mut uses_font = false;
        let mut uses_image = false;
        for op in ops {
            match op {
                DrawOp::Text { at, size, text, .. } => {
                    write_text(&mut content, *at, *size, text);
                    uses_font = true;
                }
                DrawOp::Mark {
                    at, size, glyph, ..
                } => {
                    write_text(&mut content, *at, *size, glyph);
                    uses_font = true;
                }
                DrawOp::QrCode { placement, .. } => {
                    let rect = placement.resolve(page_height(doc, page_id)?);
                    content.extend_from_slice(
                        format!(
                            "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
                            rect.width, rect.height, rect.x, rect.y, QR_RESOURCE
                        )
                        .as_bytes(),
                    );
                    uses_image = true;
                }
            }
        }

        if uses_font {
            register_resource(doc, page_id, b"Font", FONT_RESOURCE, font_id)?;
        }
        if uses_image {
            register_resource(doc, page_id, b"XObject", QR_RESOURCE, image_id)?;
        }
        append_page_content(doc, page_id, content)?;
    }

    Ok(())
}

fn write_text(content: &mut Vec<u8>, at: Point, size: f32, text: &str) {
    content.extend_from_slice(
        format!(
            "BT\n/{} {} Tf\n{} {} Td\n(",
            FONT_RESOURCE, size, at.x, at.y
        )
        .as_bytes(),
    );
    for byte in encode_win_ansi(text) {
        if matches!(byte, b'(' | b')' | b'\\') {
            content.push(b'\\');
        }
        content.push(byte);
    }
    content.extend_from_slice(b") Tj\nET\n");
}

/// Append an empty page at the end of the root page tree
fn append_blank_page(
    doc: &mut Document,
    width: f32,
    height: f32,
) -> Result<ObjectId, AttestationError> {
    let pages_id = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(op_err)?;

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width),
            Object::Real(height),
        ],
        "Resources" => Dictionary::new(),
    });

    let pages = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(op_err)?;
    let mut kids = pages
        .get(b"Kids")
        .and_then(Object::as_array)
        .cloned()
        .unwrap_or_default();
    kids.push(Object::Reference(page_id));
    let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    pages.set("Kids", Object::Array(kids));
    pages.set("Count", Object::Integer(count + 1));

    tracing::debug!(?page_id, "appended blank page");
    Ok(page_id)
}

/// Wrap the page's existing content in `q`/`Q` and append `content` after it
fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), AttestationError> {
    let existing: Vec<Object> = {
        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(op_err)?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), content));
    let mut contents = Vec::with_capacity(existing.len() + 3);
    if existing.is_empty() {
        contents.push(Object::Reference(overlay_id));
    } else {
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let restore_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        contents.push(Object::Reference(restore_id));
        contents.push(Object::Reference(overlay_id));
    }

    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(op_err)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Add `name -> target` to the page's resource sub-dictionary `category`
fn register_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &[u8],
    name: &str,
    target: ObjectId,
) -> Result<(), AttestationError> {
    let resources_id = page_resources_id(doc, page_id)?;

    let mut entries = {
        let resources = doc
            .get_object(resources_id)
            .and_then(Object::as_dict)
            .map_err(op_err)?;
        match resources.get(category) {
            Ok(Object::Reference(id)) => doc
                .get_object(*id)
                .and_then(Object::as_dict)
                .map_err(op_err)?
                .clone(),
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        }
    };
    entries.set(name, Object::Reference(target));

    doc.get_object_mut(resources_id)
        .and_then(Object::as_dict_mut)
        .map_err(op_err)?
        .set(category.to_vec(), Object::Dictionary(entries));
    Ok(())
}

/// Id of the page's own resource dictionary, materialising one from the
/// inline or inherited resources when needed
fn page_resources_id(doc: &mut Document, page_id: ObjectId) -> Result<ObjectId, AttestationError> {
    let resources = {
        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(op_err)?;
        match page.get(b"Resources") {
            Ok(Object::Reference(id)) => return Ok(*id),
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => inherited_resources(doc, page)?,
        }
    };

    let resources_id = doc.add_object(resources);
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(op_err)?
        .set("Resources", Object::Reference(resources_id));
    Ok(resources_id)
}

/// Height of the page's media box, looked up through the page tree.
/// Pages without one are treated as A4.
fn page_height(doc: &Document, page_id: ObjectId) -> Result<f32, AttestationError> {
    let mut node_id = Some(page_id);
    let mut depth = 0;
    while let Some(id) = node_id {
        if depth == MAX_TREE_DEPTH {
            break;
        }
        depth += 1;

        let node = doc.get_object(id).and_then(Object::as_dict).map_err(op_err)?;
        let media_box = match node.get(b"MediaBox") {
            Ok(Object::Reference(box_id)) => doc.get_object(*box_id).and_then(Object::as_array).ok(),
            Ok(Object::Array(items)) => Some(items),
            _ => None,
        };
        if let Some(items) = media_box {
            let coords: Vec<f32> = items.iter().filter_map(|v| v.as_float().ok()).collect();
            if let [_, lly, _, ury] = coords[..] {
                return Ok((ury - lly).abs());
            }
        }
        node_id = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Ok(A4_HEIGHT)
}

fn inherited_resources(doc: &Document, page: &Dictionary) -> Result<Dictionary, AttestationError> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(node_id) = parent {
        if depth == MAX_TREE_DEPTH {
            break;
        }
        depth += 1;

        let node = doc
            .get_object(node_id)
            .and_then(Object::as_dict)
            .map_err(op_err)?;
        match node.get(b"Resources") {
            Ok(Object::Reference(id)) => {
                return doc
                    .get_object(*id)
                    .and_then(Object::as_dict)
                    .cloned()
                    .map_err(op_err)
            }
            Ok(Object::Dictionary(dict)) => return Ok(dict.clone()),
            _ => {}
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Ok(Dictionary::new())
}
