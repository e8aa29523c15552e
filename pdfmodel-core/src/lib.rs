//! # pdfmodel
//!
//! A typed, navigable object model over the object graph of PDF files.
//!
//! A [`Document`] owns the graph of one file and drives its load lifecycle.
//! Once it is ready, [`Obj`], [`Ref`], [`Arr`] and [`Dictionary`] views
//! read and write through to that graph, and [`Page`], [`Field`] and
//! [`Form`] build on them. Parsing and serialization are delegated to a
//! [`PdfEngine`]; [`NativeEngine`] is the one used by default.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfmodel::{Document, LoadOptions, Permission};
//!
//! # async fn run() -> pdfmodel::Result<()> {
//! let mut doc = Document::default();
//! doc.load("report.pdf", LoadOptions::new())?.await?;
//!
//! for page in doc.pages()? {
//!     println!("page {}: {} x {}", page.number(), page.width()?, page.height()?);
//!     for info in page.get_fields_info()? {
//!         println!("  {} = {:?}", info.name, info.value);
//!     }
//! }
//!
//! if doc.is_allowed(Permission::DocAssembly)? {
//!     doc.merge_document("appendix.pdf", None).await?;
//!     doc.write_to("combined.pdf").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod annotations;
pub mod document;
pub mod encryption;
pub mod engine;
pub mod error;
pub mod forms;
pub mod geometry;
pub mod graph;
pub mod objects;
pub mod operations;
pub mod page;
pub mod view;

#[cfg(test)]
mod test_support;

pub use annotations::{Annotation, AnnotationFlags, AnnotationType};
pub use document::{Document, LoadOptions, LoadState, PdfVersion, WriteMode, WriteOutcome};
pub use encryption::{Algorithm, Encrypt, EncryptInfo, EncryptOptions, KeyLength, Permission, Permissions};
pub use engine::{NativeEngine, PdfEngine};
pub use error::{ErrorCategory, PdfError, Result};
pub use forms::{CheckBox, ChoiceField, Field, FieldInfo, FieldKind, Form, TextField, TypedField};
pub use geometry::{Point, Rectangle};
pub use graph::{Graph, NodePath};
pub use objects::ObjectId;
pub use page::Page;
pub use view::{Arr, Dictionary, Obj, Ref};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
