use super::Obj;
use crate::document::Document;
use crate::error::Result;
use crate::graph::NodePath;
use crate::objects::{Object, ObjectId};
use std::fmt;
use std::future::Future;
use std::path::Path;

/// An indirect reference: object number plus generation.
///
/// A `Ref` is only a lookup key. It owns nothing and can be resolved
/// against any loaded document with [`Ref::deref`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ref {
    object_number: u32,
    generation: u16,
}

impl Ref {
    pub fn new(object_number: u32, generation: u16) -> Self {
        Self {
            object_number,
            generation,
        }
    }

    pub fn object_number(&self) -> u32 {
        self.object_number
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }

    pub fn set_object_number(&mut self, object_number: u32) {
        self.object_number = object_number;
    }

    pub fn set_generation(&mut self, generation: u16) {
        self.generation = generation;
    }

    /// False only for the canonical `0 0` null reference.
    pub fn is_indirect(&self) -> bool {
        self.object_number != 0 || self.generation != 0
    }

    pub fn id(&self) -> ObjectId {
        ObjectId::new(self.object_number, self.generation)
    }

    /// The referenced node of `document`.
    ///
    /// Fails with [`NotLoaded`](crate::PdfError::NotLoaded) before the
    /// document is ready and with
    /// [`ObjectNotFound`](crate::PdfError::ObjectNotFound) when the pair is
    /// not in its graph.
    pub fn deref<'d>(&self, document: &'d Document) -> Result<Obj<'d>> {
        document.graph()?.get(self.id())?;
        Ok(Obj::new(document, NodePath::indirect(self.id())))
    }

    /// Writes `N G R` to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> impl Future<Output = Result<()>> + Send + 'static {
        super::write_bytes(path.as_ref().to_path_buf(), Ok(self.to_string().into_bytes()))
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.object_number, self.generation)
    }
}

impl From<ObjectId> for Ref {
    fn from(id: ObjectId) -> Self {
        Self::new(id.number(), id.generation())
    }
}

impl From<Ref> for ObjectId {
    fn from(reference: Ref) -> Self {
        reference.id()
    }
}

impl From<Ref> for Object {
    fn from(reference: Ref) -> Self {
        Object::Reference(reference.id())
    }
}
