//! Borrowed handles into a document's object graph
//!
//! Every view is a `&Document` plus a [`NodePath`](crate::graph::NodePath).
//! Nothing is cached: each accessor walks the path again, so views stay in
//! step with mutations made through other views, and the borrow checker
//! keeps them from outliving the document that owns the graph.

mod array;
mod dictionary;
mod obj;
mod reference;

pub use array::Arr;
pub use dictionary::Dictionary;
pub use obj::Obj;
pub use reference::Ref;

use crate::error::{PdfError, Result};
use crate::objects::Object;
use std::future::Future;
use std::path::PathBuf;

pub(crate) fn type_mismatch(expected: &'static str, found: &Object) -> PdfError {
    PdfError::TypeMismatch {
        expected,
        found: found.object_type().as_str(),
    }
}

/// Writes already-rendered bytes; the future owns everything it touches.
pub(crate) fn write_bytes(
    path: PathBuf,
    rendered: Result<Vec<u8>>,
) -> impl Future<Output = Result<()>> + Send + 'static {
    async move {
        tokio::fs::write(&path, rendered?).await?;
        Ok(())
    }
}
