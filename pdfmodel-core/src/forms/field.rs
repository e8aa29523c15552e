use super::typed::{CheckBox, ChoiceField, TextField, TypedField};
use crate::error::{PdfError, Result};
use crate::graph::{Graph, NodePath};
use crate::objects::{Dictionary, Object, PdfString};
use crate::view::Obj;
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// Field flag bits (`/Ff`)
pub(crate) mod flags {
    pub const READ_ONLY: i64 = 1;
    pub const REQUIRED: i64 = 1 << 1;
    pub const MULTILINE: i64 = 1 << 12;
    pub const PASSWORD: i64 = 1 << 13;
    pub const RADIO: i64 = 1 << 15;
    pub const PUSHBUTTON: i64 = 1 << 16;
    pub const COMBO: i64 = 1 << 17;
    pub const EDIT: i64 = 1 << 18;
    pub const MULTI_SELECT: i64 = 1 << 21;
}

/// The field types of an interactive form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    TextField,
    CheckBox,
    RadioButton,
    PushButton,
    ComboBox,
    ListBox,
    Signature,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::TextField => "TextField",
            FieldKind::CheckBox => "CheckBox",
            FieldKind::RadioButton => "RadioButton",
            FieldKind::PushButton => "PushButton",
            FieldKind::ComboBox => "ComboBox",
            FieldKind::ListBox => "ListBox",
            FieldKind::Signature => "Signature",
        }
    }

    /// Kind from `/FT` and the `/Ff` button and choice bits.
    pub fn from_entries(field_type: &str, bits: i64) -> Result<Self> {
        match field_type {
            "Tx" => Ok(FieldKind::TextField),
            "Btn" if bits & flags::PUSHBUTTON != 0 => Ok(FieldKind::PushButton),
            "Btn" if bits & flags::RADIO != 0 => Ok(FieldKind::RadioButton),
            "Btn" => Ok(FieldKind::CheckBox),
            "Ch" if bits & flags::COMBO != 0 => Ok(FieldKind::ComboBox),
            "Ch" => Ok(FieldKind::ListBox),
            "Sig" => Ok(FieldKind::Signature),
            other => Err(PdfError::UnknownFieldType(other.to_string())),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one field, as returned by
/// [`Page::get_fields_info`](crate::Page::get_fields_info)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub alternate_name: Option<String>,
    pub kind: FieldKind,
    pub value: Option<String>,
    pub required: bool,
    pub read_only: bool,
}

/// A form field, addressed through its widget or its field dictionary.
///
/// Field entries (`/FT`, `/Ff`, `/V`, ...) are inherited through `/Parent`;
/// setters write to the terminal field dictionary, the nearest node in the
/// chain that carries a partial name.
#[derive(Debug, Clone)]
pub struct Field<'d> {
    obj: Obj<'d>,
}

impl<'d> Field<'d> {
    pub(crate) fn new(obj: Obj<'d>) -> Self {
        Self { obj }
    }

    pub fn get_object(&self) -> Obj<'d> {
        self.obj.clone()
    }

    pub(crate) fn obj(&self) -> &Obj<'d> {
        &self.obj
    }

    pub fn kind(&self) -> Result<FieldKind> {
        let graph = self.obj.document().graph()?;
        let chain = lineage(&graph, self.obj.path())?;
        let field_type = inherited(&chain, "FT")
            .and_then(Object::as_name)
            .ok_or_else(|| PdfError::UnknownFieldType(format!("no /FT at {}", self.obj.path())))?;
        let bits = inherited(&chain, "Ff")
            .and_then(Object::as_integer)
            .unwrap_or(0);
        FieldKind::from_entries(field_type, bits)
    }

    /// Partial name (`/T`) of the terminal field, empty when unnamed.
    pub fn field_name(&self) -> Result<String> {
        let graph = self.obj.document().graph()?;
        let chain = lineage(&graph, self.obj.path())?;
        Ok(chain
            .iter()
            .find_map(|(_, dict)| text(dict.get("T")))
            .unwrap_or_default())
    }

    /// Partial names from the root of the field tree, joined with `.`.
    pub fn full_name(&self) -> Result<String> {
        let graph = self.obj.document().graph()?;
        let chain = lineage(&graph, self.obj.path())?;
        let names: Vec<String> = chain
            .iter()
            .rev()
            .filter_map(|(_, dict)| text(dict.get("T")))
            .collect();
        Ok(names.join("."))
    }

    pub fn alternate_name(&self) -> Result<Option<String>> {
        self.inherited_text("TU")
    }

    pub fn set_alternate_name(&self, name: &str) -> Result<()> {
        self.set_entry("TU", PdfString::from_text(name))
    }

    pub fn mapping_name(&self) -> Result<Option<String>> {
        self.inherited_text("TM")
    }

    pub fn set_mapping_name(&self, name: &str) -> Result<()> {
        self.set_entry("TM", PdfString::from_text(name))
    }

    pub fn is_required(&self) -> Result<bool> {
        self.has_flag(flags::REQUIRED)
    }

    pub fn set_required(&self, required: bool) -> Result<()> {
        self.set_flag(flags::REQUIRED, required)
    }

    pub fn is_read_only(&self) -> Result<bool> {
        self.has_flag(flags::READ_ONLY)
    }

    pub fn set_read_only(&self, read_only: bool) -> Result<()> {
        self.set_flag(flags::READ_ONLY, read_only)
    }

    /// `/V` rendered as text: strings decoded, names bare, arrays joined.
    pub fn value(&self) -> Result<Option<String>> {
        Ok(self.inherited_value("V")?.map(|value| display(&value)))
    }

    pub fn info(&self) -> Result<FieldInfo> {
        Ok(FieldInfo {
            name: self.full_name()?,
            alternate_name: self.alternate_name()?,
            kind: self.kind()?,
            value: self.value()?,
            required: self.is_required()?,
            read_only: self.is_read_only()?,
        })
    }

    /// The kind-specific variant of this field.
    pub fn typed(self) -> Result<TypedField<'d>> {
        Ok(match self.kind()? {
            FieldKind::TextField => TypedField::Text(TextField::try_from(self)?),
            FieldKind::CheckBox => TypedField::CheckBox(CheckBox::try_from(self)?),
            FieldKind::ComboBox | FieldKind::ListBox => {
                TypedField::Choice(ChoiceField::try_from(self)?)
            }
            FieldKind::RadioButton => TypedField::RadioButton(self),
            FieldKind::PushButton => TypedField::PushButton(self),
            FieldKind::Signature => TypedField::Signature(self),
        })
    }

    pub(crate) fn inherited_value(&self, key: &str) -> Result<Option<Object>> {
        let graph = self.obj.document().graph()?;
        let chain = lineage(&graph, self.obj.path())?;
        match inherited(&chain, key) {
            Some(value) => Ok(Some(graph.resolve(value)?.clone())),
            None => Ok(None),
        }
    }

    fn inherited_text(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inherited_value(key)?.as_ref().and_then(|v| text(Some(v))))
    }

    pub(crate) fn flags(&self) -> Result<i64> {
        Ok(self
            .inherited_value("Ff")?
            .and_then(|value| value.as_integer())
            .unwrap_or(0))
    }

    fn has_flag(&self, bit: i64) -> Result<bool> {
        Ok(self.flags()? & bit != 0)
    }

    fn set_flag(&self, bit: i64, on: bool) -> Result<()> {
        let current = self.flags()?;
        let updated = if on { current | bit } else { current & !bit };
        self.set_entry("Ff", updated)
    }

    /// Path of the terminal field dictionary.
    pub(crate) fn field_path(&self) -> Result<NodePath> {
        let graph = self.obj.document().graph()?;
        let chain = lineage(&graph, self.obj.path())?;
        Ok(chain
            .iter()
            .find(|(_, dict)| dict.contains_key("T"))
            .map(|(path, _)| path.clone())
            .unwrap_or_else(|| self.obj.path().clone()))
    }

    pub(crate) fn set_entry(&self, key: &str, value: impl Into<Object>) -> Result<()> {
        let target = self.field_path()?;
        let value = value.into();
        Obj::new(self.obj.document(), target).with_dict_mut(|dict| {
            dict.set(key, value);
            Ok(())
        })
    }
}

/// The node's dictionary followed by each ancestor through `/Parent`.
pub(crate) fn lineage<'g>(
    graph: &'g Graph,
    path: &NodePath,
) -> Result<Vec<(NodePath, &'g Dictionary)>> {
    let node = graph.node(path)?;
    let dict = node.as_dict().ok_or(PdfError::TypeMismatch {
        expected: "Dictionary",
        found: node.object_type().as_str(),
    })?;
    let mut chain = vec![(path.clone(), dict)];
    let mut visited = HashSet::new();
    let mut next = dict.get_reference("Parent");
    while let Some(id) = next {
        if !visited.insert(id) {
            warn!("Field parent chain loops through {}", id);
            break;
        }
        let parent = graph.dict(id)?;
        chain.push((NodePath::indirect(id), parent));
        next = parent.get_reference("Parent");
    }
    Ok(chain)
}

pub(crate) fn inherited<'g>(chain: &[(NodePath, &'g Dictionary)], key: &str) -> Option<&'g Object> {
    chain.iter().find_map(|&(_, dict)| dict.get(key))
}

fn text(value: Option<&Object>) -> Option<String> {
    value.and_then(Object::as_pdf_string).map(PdfString::to_text)
}

pub(crate) fn display(value: &Object) -> String {
    match value {
        Object::String(s) => s.to_text(),
        Object::Name(name) => name.clone(),
        Object::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(", "),
        other => String::from_utf8_lossy(&other.to_pdf_bytes()).into_owned(),
    }
}
