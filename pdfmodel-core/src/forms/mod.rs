//! Interactive forms: the AcroForm dictionary, fields and their typed variants

mod field;
mod form;
mod typed;

pub use field::{Field, FieldInfo, FieldKind};
pub use form::Form;
pub use typed::{CheckBox, ChoiceField, TextField, TypedField};
