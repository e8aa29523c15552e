//! Page views

use crate::annotations::Annotation;
use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::forms::{Field, FieldInfo};
use crate::geometry::Rectangle;
use crate::graph::{Graph, NodePath};
use crate::objects::{Object, ObjectId};
use crate::view::{type_mismatch, Dictionary, Obj, Ref};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// One page of a loaded document.
///
/// Geometry and rotation are read from the graph on every call, with
/// inheritable attributes taken from the nearest ancestor that has them.
#[derive(Clone)]
pub struct Page<'d> {
    doc: &'d Document,
    id: ObjectId,
    index: usize,
}

impl fmt::Debug for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("index", &self.index)
            .finish()
    }
}

impl<'d> Page<'d> {
    pub(crate) fn new(doc: &'d Document, id: ObjectId, index: usize) -> Self {
        Self { doc, id, index }
    }

    /// 1-based page number
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reference(&self) -> Ref {
        Ref::from(self.id)
    }

    pub fn get_object(&self) -> Obj<'d> {
        Obj::new(self.doc, NodePath::indirect(self.id))
    }

    /// Where an inheritable attribute lives, following a reference to its target.
    fn inherited_path(&self, key: &str) -> Result<Option<NodePath>> {
        let graph = self.doc.graph()?;
        let mut current = Some(self.id);
        let mut visited = HashSet::new();
        while let Some(id) = current {
            if !visited.insert(id) {
                break;
            }
            let dict = graph.dict(id)?;
            if let Some(value) = dict.get(key) {
                return Ok(Some(match value {
                    Object::Reference(target) => NodePath::indirect(*target),
                    _ => NodePath::indirect(id).key(key),
                }));
            }
            current = dict.get_reference("Parent");
        }
        Ok(None)
    }

    fn read_rect(&self, key: &str, inherit: bool) -> Result<Option<Rectangle>> {
        let graph = self.doc.graph()?;
        let value = if inherit {
            graph.inherited(self.id, key)
        } else {
            graph.dict(self.id)?.get(key)
        };
        let Some(value) = value else {
            return Ok(None);
        };
        match Rectangle::from_object(graph.resolve(value)?) {
            Ok(rect) => Ok(Some(rect)),
            Err(e) => {
                warn!("Ignoring malformed /{} on page {}: {}", key, self.number(), e);
                Ok(None)
            }
        }
    }

    /// Falls back to US Letter when no ancestor defines `/MediaBox`.
    pub fn media_box(&self) -> Result<Rectangle> {
        Ok(self.read_rect("MediaBox", true)?.unwrap_or(Rectangle::LETTER))
    }

    /// `/CropBox` clipped to the media box, or the media box itself.
    pub fn crop_box(&self) -> Result<Rectangle> {
        let media = self.media_box()?;
        Ok(self
            .read_rect("CropBox", true)?
            .and_then(|crop| crop.intersect(&media))
            .unwrap_or(media))
    }

    pub fn bleed_box(&self) -> Result<Rectangle> {
        self.own_box_or_crop("BleedBox")
    }

    pub fn trim_box(&self) -> Result<Rectangle> {
        self.own_box_or_crop("TrimBox")
    }

    pub fn art_box(&self) -> Result<Rectangle> {
        self.own_box_or_crop("ArtBox")
    }

    fn own_box_or_crop(&self, key: &str) -> Result<Rectangle> {
        match self.read_rect(key, false)? {
            Some(rect) => Ok(rect),
            None => self.crop_box(),
        }
    }

    pub fn width(&self) -> Result<f64> {
        self.media_box().map(|rect| rect.width())
    }

    pub fn height(&self) -> Result<f64> {
        self.media_box().map(|rect| rect.height())
    }

    /// Clockwise rotation in degrees, normalised into `0..360`.
    pub fn rotation(&self) -> Result<i64> {
        let graph = self.doc.graph()?;
        let rotate = match graph.inherited(self.id, "Rotate") {
            Some(value) => graph.resolve(value)?.as_integer().unwrap_or(0),
            None => 0,
        };
        Ok(rotate.rem_euclid(360))
    }

    /// Stages a new rotation on the page dictionary. Only multiples of 90 are
    /// accepted; the change becomes durable with the next write.
    pub fn set_rotation(&self, degrees: i64) -> Result<()> {
        if degrees % 90 != 0 {
            return Err(PdfError::InvalidArgument(format!(
                "rotation must be a multiple of 90, got {degrees}"
            )));
        }
        let mut graph = self.doc.graph_mut()?;
        graph.dict_mut(self.id)?.set("Rotate", degrees.rem_euclid(360));
        Ok(())
    }

    /// Decoded content, with the parts of a content array joined by newlines.
    /// `raw` keeps the stored (still filtered) bytes.
    pub fn get_contents(&self, raw: bool) -> Result<Vec<u8>> {
        let graph = self.doc.graph()?;
        let Some(contents) = graph.dict(self.id)?.get("Contents") else {
            return Ok(Vec::new());
        };
        let parts: Vec<&Object> = match graph.resolve(contents)? {
            Object::Array(items) => items
                .iter()
                .map(|item| graph.resolve(item))
                .collect::<Result<_>>()?,
            single => vec![single],
        };

        let mut out = Vec::new();
        for (i, part) in parts.into_iter().enumerate() {
            let stream = part
                .as_stream()
                .ok_or_else(|| type_mismatch("Stream", part))?;
            if i > 0 {
                out.push(b'\n');
            }
            if raw {
                out.extend_from_slice(stream.raw_content());
            } else {
                out.extend(stream.decoded_content()?);
            }
        }
        Ok(out)
    }

    /// The page's resource dictionary, inherited if necessary.
    pub fn get_resources(&self) -> Result<Dictionary<'d>> {
        let path = self
            .inherited_path("Resources")?
            .ok_or_else(|| PdfError::KeyNotFound("Resources".into()))?;
        Obj::new(self.doc, path).as_dictionary()
    }

    fn annotation_paths(&self) -> Result<Vec<NodePath>> {
        let graph = self.doc.graph()?;
        annotation_paths(&graph, self.id)
    }

    pub fn get_num_annots(&self) -> Result<usize> {
        self.annotation_paths().map(|paths| paths.len())
    }

    pub fn get_annotation(&self, index: usize) -> Result<Annotation<'d>> {
        let paths = self.annotation_paths()?;
        let len = paths.len();
        let path = paths
            .into_iter()
            .nth(index)
            .ok_or(PdfError::IndexOutOfRange { index, len })?;
        Ok(Annotation::new(Obj::new(self.doc, path)))
    }

    pub fn annotations(&self) -> Result<Vec<Annotation<'d>>> {
        Ok(self
            .annotation_paths()?
            .into_iter()
            .map(|path| Annotation::new(Obj::new(self.doc, path)))
            .collect())
    }

    /// Widget annotations of this page, in `/Annots` order.
    fn widget_paths(&self) -> Result<Vec<NodePath>> {
        let graph = self.doc.graph()?;
        let mut widgets = Vec::new();
        for path in annotation_paths(&graph, self.id)? {
            let is_widget = graph
                .node(&path)?
                .as_dict()
                .is_some_and(|dict| dict.get_name("Subtype") == Some("Widget"));
            if is_widget {
                widgets.push(path);
            }
        }
        Ok(widgets)
    }

    pub fn get_num_fields(&self) -> Result<usize> {
        self.widget_paths().map(|paths| paths.len())
    }

    pub fn get_field(&self, index: usize) -> Result<Field<'d>> {
        let paths = self.widget_paths()?;
        let len = paths.len();
        let path = paths
            .into_iter()
            .nth(index)
            .ok_or(PdfError::IndexOutOfRange { index, len })?;
        Ok(Field::new(Obj::new(self.doc, path)))
    }

    pub fn get_fields(&self) -> Result<Vec<Field<'d>>> {
        Ok(self
            .widget_paths()?
            .into_iter()
            .map(|path| Field::new(Obj::new(self.doc, path)))
            .collect())
    }

    pub fn get_fields_info(&self) -> Result<Vec<FieldInfo>> {
        self.get_fields()?.iter().map(Field::info).collect()
    }
}

/// Paths of the entries in `/Annots`, indirect entries by their own id.
fn annotation_paths(graph: &Graph, page: ObjectId) -> Result<Vec<NodePath>> {
    let (annots, items) = match graph.dict(page)?.get("Annots") {
        None => return Ok(Vec::new()),
        Some(Object::Reference(id)) => (NodePath::indirect(*id), graph.get(*id)?),
        Some(direct) => (NodePath::indirect(page).key("Annots"), direct),
    };
    let items = items
        .as_array()
        .ok_or_else(|| type_mismatch("Array", items))?;
    Ok(items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Object::Reference(id) => NodePath::indirect(*id),
            _ => annots.index(i),
        })
        .collect())
}
