//! Owned PDF object values.
//!
//! These are the values stored in a document's object graph. Callers normally
//! reach them through the borrowed views in [`crate::view`].

mod dictionary;
mod primitive;
mod serialize;
mod stream;
mod string;

pub use dictionary::Dictionary;
pub use primitive::{Object, ObjectId, ObjectType};
pub use serialize::{write_dictionary, write_object};
pub use stream::Stream;
pub use string::{PdfString, StringFormat};
