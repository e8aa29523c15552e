use super::{type_mismatch, Obj};
use crate::error::{PdfError, Result};
use crate::objects::Object;
use std::future::Future;
use std::path::Path;

/// Array projection of an [`Obj`].
///
/// Reads go to the live graph array. [`Arr::to_array`] hands out a detached
/// `Vec`, and [`Arr::push`] is the only way to grow the array.
#[derive(Debug, Clone)]
pub struct Arr<'d> {
    obj: Obj<'d>,
}

impl<'d> Arr<'d> {
    pub(crate) fn new(obj: Obj<'d>) -> Self {
        Self { obj }
    }

    pub fn as_obj(&self) -> &Obj<'d> {
        &self.obj
    }

    fn with_items<T>(&self, f: impl FnOnce(&Vec<Object>) -> Result<T>) -> Result<T> {
        self.obj.with(|object| match object {
            Object::Array(items) => f(items),
            other => Err(type_mismatch("Array", other)),
        })
    }

    /// Length of the live array.
    pub fn len(&self) -> Result<usize> {
        self.with_items(|items| Ok(items.len()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// Element views taken now. Changing the returned `Vec` never touches
    /// the graph.
    pub fn to_array(&self) -> Result<Vec<Obj<'d>>> {
        let len = self.len()?;
        Ok((0..len)
            .map(|i| Obj::new(self.obj.document(), self.obj.path().index(i)))
            .collect())
    }

    /// Appends `value` to the graph array.
    pub fn push(&self, value: impl Into<Object>) -> Result<()> {
        let value = value.into();
        self.obj.with_mut(|object| {
            let found = object.object_type().as_str();
            match object.as_array_mut() {
                Some(items) => {
                    items.push(value);
                    Ok(())
                }
                None => Err(PdfError::TypeMismatch {
                    expected: "Array",
                    found,
                }),
            }
        })
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        self.index_of(key).map(|index| index.is_some())
    }

    /// Position of the first Name or String element equal to `key`.
    pub fn index_of(&self, key: &str) -> Result<Option<usize>> {
        self.with_items(|items| Ok(items.iter().position(|item| matches_key(item, key))))
    }

    /// The live element at `index`.
    pub fn at(&self, index: usize) -> Result<Obj<'d>> {
        let len = self.len()?;
        if index >= len {
            return Err(PdfError::IndexOutOfRange { index, len });
        }
        Ok(Obj::new(self.obj.document(), self.obj.path().index(index)))
    }

    pub fn write(&self, path: impl AsRef<Path>) -> impl Future<Output = Result<()>> + Send + 'static {
        self.obj.write(path)
    }
}

fn matches_key(item: &Object, key: &str) -> bool {
    match item {
        Object::Name(name) => name == key,
        Object::String(s) => s.to_text() == key,
        _ => false,
    }
}
