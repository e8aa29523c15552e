use crate::objects::ObjectId;
use thiserror::Error;

/// Broad failure classes callers can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A graph accessor was used before the document finished loading.
    Lifecycle,
    /// A protected document was opened without a valid credential.
    Authentication,
    /// An index was outside the bounds of a page, field, annotation or array.
    Range,
    /// A value was read or converted through the wrong type.
    TypeContract,
    /// A reference or key did not resolve inside the document graph.
    Resolution,
    /// File transport failed.
    Io,
    /// The byte-level engine rejected the input or could not serialize.
    Engine,
}

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Document is not loaded")]
    NotLoaded,

    #[error("Invalid document state: expected {expected}, found {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("InvalidPassword")]
    InvalidPassword,

    #[error("Page index {index} out of range (page count {count})")]
    PageOutOfRange { index: usize, count: usize },

    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Field type mismatch: expected {expected}, found {found}")]
    FieldTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unknown field type: {0}")]
    UnknownFieldType(String),

    #[error("Encrypt instance has no encryption options")]
    MissingEncryptOptions,

    #[error("Invalid encryption options: {0}")]
    InvalidEncryptOptions(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Object {0} not found")]
    ObjectNotFound(ObjectId),

    #[error("Object {0} has been released")]
    ObjectReleased(ObjectId),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("View no longer matches the document graph: {0}")]
    StaleView(String),

    #[error("Circular reference through {0}")]
    CircularReference(ObjectId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax error at byte {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Invalid PDF structure: {0}")]
    InvalidStructure(String),
}

impl PdfError {
    /// Taxonomy case of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PdfError::NotLoaded | PdfError::InvalidState { .. } => ErrorCategory::Lifecycle,
            PdfError::InvalidPassword => ErrorCategory::Authentication,
            PdfError::PageOutOfRange { .. } | PdfError::IndexOutOfRange { .. } => {
                ErrorCategory::Range
            }
            PdfError::TypeMismatch { .. }
            | PdfError::FieldTypeMismatch { .. }
            | PdfError::UnknownFieldType(_)
            | PdfError::MissingEncryptOptions
            | PdfError::InvalidEncryptOptions(_)
            | PdfError::InvalidArgument(_) => ErrorCategory::TypeContract,
            PdfError::ObjectNotFound(_)
            | PdfError::ObjectReleased(_)
            | PdfError::KeyNotFound(_)
            | PdfError::StaleView(_)
            | PdfError::CircularReference(_) => ErrorCategory::Resolution,
            PdfError::Io(_) => ErrorCategory::Io,
            PdfError::Syntax { .. } | PdfError::Engine(_) | PdfError::InvalidStructure(_) => {
                ErrorCategory::Engine
            }
        }
    }

    pub fn is_invalid_password(&self) -> bool {
        matches!(self, PdfError::InvalidPassword)
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;
