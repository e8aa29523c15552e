use super::{type_mismatch, Arr, Dictionary, Ref};
use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::graph::NodePath;
use crate::objects::{self, Object, ObjectType, PdfString};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::path::Path;

/// One node of a document's object graph.
///
/// Readers check the node's tag first: asking a Name for its number is a
/// [`PdfError::TypeMismatch`], never a coercion.
#[derive(Clone)]
pub struct Obj<'d> {
    doc: &'d Document,
    path: NodePath,
}

impl fmt::Debug for Obj<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Obj").field("path", &self.path).finish()
    }
}

impl<'d> Obj<'d> {
    pub(crate) fn new(doc: &'d Document, path: NodePath) -> Self {
        Self { doc, path }
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn document(&self) -> &'d Document {
        self.doc
    }

    /// The reference naming this node, when it is a whole indirect object.
    pub fn reference(&self) -> Option<Ref> {
        self.path
            .root_id()
            .filter(|_| self.path.is_indirect_root())
            .map(Ref::from)
    }

    pub(crate) fn with<T>(&self, f: impl FnOnce(&Object) -> Result<T>) -> Result<T> {
        self.doc.graph()?.with_node(&self.path, f)
    }

    pub(crate) fn with_mut<T>(&self, f: impl FnOnce(&mut Object) -> Result<T>) -> Result<T> {
        self.doc.graph_mut()?.with_node_mut(&self.path, f)
    }

    pub(crate) fn with_dict<T>(&self, f: impl FnOnce(&objects::Dictionary) -> Result<T>) -> Result<T> {
        self.with(|object| match object.as_dict() {
            Some(dict) => f(dict),
            None => Err(type_mismatch("Dictionary", object)),
        })
    }

    pub(crate) fn with_dict_mut<T>(
        &self,
        f: impl FnOnce(&mut objects::Dictionary) -> Result<T>,
    ) -> Result<T> {
        self.with_mut(|object| {
            let found = object.object_type().as_str();
            match object.as_dict_mut() {
                Some(dict) => f(dict),
                None => Err(PdfError::TypeMismatch {
                    expected: "Dictionary",
                    found,
                }),
            }
        })
    }

    pub fn kind(&self) -> Result<ObjectType> {
        self.with(|object| Ok(object.object_type()))
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.with(|object| match object {
            Object::Boolean(b) => Ok(*b),
            other => Err(type_mismatch("Boolean", other)),
        })
    }

    /// Integer nodes only.
    pub fn as_number(&self) -> Result<i64> {
        self.with(|object| match object {
            Object::Integer(n) => Ok(*n),
            other => Err(type_mismatch("Integer", other)),
        })
    }

    /// Real nodes only.
    pub fn as_real(&self) -> Result<f64> {
        self.with(|object| match object {
            Object::Real(r) => Ok(*r),
            other => Err(type_mismatch("Real", other)),
        })
    }

    /// A String node decoded as text.
    pub fn as_string(&self) -> Result<String> {
        self.as_pdf_string().map(|s| s.to_text())
    }

    pub fn as_pdf_string(&self) -> Result<PdfString> {
        self.with(|object| match object {
            Object::String(s) => Ok(s.clone()),
            other => Err(type_mismatch("String", other)),
        })
    }

    pub fn as_name(&self) -> Result<String> {
        self.with(|object| match object {
            Object::Name(name) => Ok(name.clone()),
            other => Err(type_mismatch("Name", other)),
        })
    }

    pub fn as_reference(&self) -> Result<Ref> {
        self.with(|object| match object {
            Object::Reference(id) => Ok(Ref::from(*id)),
            other => Err(type_mismatch("Reference", other)),
        })
    }

    pub fn as_array(&self) -> Result<Arr<'d>> {
        self.with(|object| match object {
            Object::Array(_) => Ok(()),
            other => Err(type_mismatch("Array", other)),
        })?;
        Ok(Arr::new(self.clone()))
    }

    /// Valid on Dictionary and Stream nodes.
    pub fn as_dictionary(&self) -> Result<Dictionary<'d>> {
        self.with_dict(|_| Ok(()))?;
        Ok(Dictionary::new(self.clone()))
    }

    pub fn has_stream(&self) -> Result<bool> {
        self.with(|object| Ok(matches!(object, Object::Stream(_))))
    }

    /// Stream content with its filters undone.
    pub fn stream(&self) -> Result<Vec<u8>> {
        self.with(|object| match object {
            Object::Stream(stream) => stream.decoded_content(),
            other => Err(type_mismatch("Stream", other)),
        })
    }

    /// Stream content as stored.
    pub fn raw_stream(&self) -> Result<Vec<u8>> {
        self.with(|object| match object {
            Object::Stream(stream) => Ok(stream.raw_content().to_vec()),
            other => Err(type_mismatch("Stream", other)),
        })
    }

    /// Size of the node in PDF syntax.
    pub fn length(&self) -> Result<usize> {
        self.with(|object| Ok(object.to_pdf_bytes().len()))
    }

    /// Follows references until a non-reference node. The result is a view,
    /// so self-referencing structures never expand recursively.
    pub fn resolve(&self) -> Result<Obj<'d>> {
        let graph = self.doc.graph()?;
        let mut path = self.path.clone();
        let mut seen = HashSet::new();
        while let Some(id) = graph.with_node(&path, |object| Ok(object.as_reference()))? {
            if !seen.insert(id) {
                return Err(PdfError::CircularReference(id));
            }
            path = NodePath::indirect(id);
        }
        Ok(Obj::new(self.doc, path))
    }

    /// Deep copy of the node's value.
    pub fn to_object(&self) -> Result<Object> {
        self.with(|object| Ok(object.clone()))
    }

    /// Both views address the same node of the same document.
    pub fn same_node(&self, other: &Obj<'_>) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.path == other.path
    }

    /// Empties a Dictionary, Array or Stream node in place.
    pub fn clear(&self) -> Result<()> {
        self.with_mut(|object| match object {
            Object::Dictionary(dict) => {
                dict.clear();
                Ok(())
            }
            Object::Array(items) => {
                items.clear();
                Ok(())
            }
            Object::Stream(stream) => {
                stream.clear();
                Ok(())
            }
            other => Err(type_mismatch("Dictionary, Array or Stream", other)),
        })
    }

    /// Adds FlateDecode in front of the stream's existing filters.
    #[cfg(feature = "compression")]
    pub fn flate_compress_stream(&self) -> Result<()> {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        self.with_mut(|object| {
            let stream = match object {
                Object::Stream(stream) => stream,
                other => return Err(type_mismatch("Stream", other)),
            };
            let mut filters: Vec<Object> =
                stream.filters().into_iter().map(Object::Name).collect();
            if filters.first().and_then(Object::as_name) == Some("FlateDecode") {
                return Ok(());
            }

            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(stream.raw_content())?;
            let compressed = encoder.finish()?;

            let params = stream.dictionary().get("DecodeParms").cloned();
            let dict = stream.dictionary_mut();
            match params {
                Some(Object::Array(mut items)) => {
                    items.insert(0, Object::Null);
                    dict.set("DecodeParms", items);
                }
                Some(single) => dict.set("DecodeParms", vec![Object::Null, single]),
                None => {}
            }
            filters.insert(0, Object::name("FlateDecode"));
            if filters.len() == 1 {
                dict.set("Filter", Object::name("FlateDecode"));
            } else {
                dict.set("Filter", filters);
            }
            stream.set_content(compressed);
            Ok(())
        })
    }

    /// Writes the node in PDF syntax to `path`, for inspection.
    pub fn write(
        &self,
        path: impl AsRef<Path>,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        let rendered = self.with(|object| Ok(object.to_pdf_bytes()));
        super::write_bytes(path.as_ref().to_path_buf(), rendered)
    }
}
