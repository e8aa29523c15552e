use super::field::{flags, lineage, Field, FieldKind};
use crate::error::{PdfError, Result};
use crate::graph::NodePath;
use crate::objects::{Object, PdfString};
use crate::view::Obj;

/// A field together with its kind-specific capabilities.
#[derive(Debug, Clone)]
pub enum TypedField<'d> {
    Text(TextField<'d>),
    CheckBox(CheckBox<'d>),
    Choice(ChoiceField<'d>),
    RadioButton(Field<'d>),
    PushButton(Field<'d>),
    Signature(Field<'d>),
}

impl<'d> TypedField<'d> {
    pub fn field(&self) -> &Field<'d> {
        match self {
            TypedField::Text(text) => text.field(),
            TypedField::CheckBox(check) => check.field(),
            TypedField::Choice(choice) => choice.field(),
            TypedField::RadioButton(field)
            | TypedField::PushButton(field)
            | TypedField::Signature(field) => field,
        }
    }
}

fn expect_kind(field: &Field<'_>, expected: &'static str, accepts: &[FieldKind]) -> Result<()> {
    let kind = field.kind()?;
    if accepts.contains(&kind) {
        Ok(())
    } else {
        Err(PdfError::FieldTypeMismatch {
            expected,
            found: kind.as_str(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TextField<'d> {
    field: Field<'d>,
}

impl<'d> TryFrom<Field<'d>> for TextField<'d> {
    type Error = PdfError;

    fn try_from(field: Field<'d>) -> Result<Self> {
        expect_kind(&field, "TextField", &[FieldKind::TextField])?;
        Ok(Self { field })
    }
}

impl<'d> TextField<'d> {
    pub fn field(&self) -> &Field<'d> {
        &self.field
    }

    /// Current value, empty when unset.
    pub fn text(&self) -> Result<String> {
        Ok(match self.field.inherited_value("V")? {
            Some(Object::String(s)) => s.to_text(),
            _ => String::new(),
        })
    }

    /// Fails with `InvalidArgument` when `text` is longer than `/MaxLen`.
    pub fn set_text(&self, text: &str) -> Result<()> {
        if let Some(max) = self.max_len()? {
            let len = text.chars().count();
            if len as i64 > max {
                return Err(PdfError::InvalidArgument(format!(
                    "text of {len} characters exceeds /MaxLen {max}"
                )));
            }
        }
        self.field.set_entry("V", PdfString::from_text(text))
    }

    pub fn max_len(&self) -> Result<Option<i64>> {
        Ok(self
            .field
            .inherited_value("MaxLen")?
            .and_then(|value| value.as_integer()))
    }

    pub fn is_multiline(&self) -> Result<bool> {
        Ok(self.field.flags()? & flags::MULTILINE != 0)
    }

    pub fn is_password(&self) -> Result<bool> {
        Ok(self.field.flags()? & flags::PASSWORD != 0)
    }
}

#[derive(Debug, Clone)]
pub struct CheckBox<'d> {
    field: Field<'d>,
}

impl<'d> TryFrom<Field<'d>> for CheckBox<'d> {
    type Error = PdfError;

    fn try_from(field: Field<'d>) -> Result<Self> {
        expect_kind(&field, "CheckBox", &[FieldKind::CheckBox])?;
        Ok(Self { field })
    }
}

impl<'d> CheckBox<'d> {
    pub fn field(&self) -> &Field<'d> {
        &self.field
    }

    /// The node itself when it is a widget, plus the widgets under the field.
    fn widget_paths(&self) -> Result<Vec<NodePath>> {
        let obj = self.field.obj();
        let field_path = self.field.field_path()?;
        let graph = obj.document().graph()?;

        let mut paths = Vec::new();
        let is_widget = |path: &NodePath| {
            graph.node(path).ok().and_then(Object::as_dict).is_some_and(|dict| {
                dict.get_name("Subtype") == Some("Widget") || dict.contains_key("AP")
            })
        };
        if is_widget(obj.path()) {
            paths.push(obj.path().clone());
        }
        let kids = graph
            .node(&field_path)?
            .as_dict()
            .and_then(|dict| dict.get("Kids"))
            .and_then(Object::as_array)
            .cloned()
            .unwrap_or_default();
        for kid in kids.iter().filter_map(Object::as_reference) {
            let path = NodePath::indirect(kid);
            if !paths.contains(&path) && is_widget(&path) {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Name of the checked appearance state, `Yes` when none is declared.
    pub fn on_state(&self) -> Result<String> {
        let graph = self.field.obj().document().graph()?;
        for path in self.widget_paths()? {
            let Some(dict) = graph.node(&path)?.as_dict() else {
                continue;
            };
            let normal = dict
                .get("AP")
                .and_then(|ap| graph.resolve_dict(ap))
                .and_then(|ap| ap.get("N"))
                .and_then(|n| graph.resolve_dict(n));
            if let Some(state) = normal.and_then(|n| n.keys().find(|k| k.as_str() != "Off")) {
                return Ok(state.clone());
            }
        }
        Ok("Yes".to_string())
    }

    pub fn is_checked(&self) -> Result<bool> {
        if let Some(value) = self.field.inherited_value("V")? {
            return Ok(value.as_name().is_some_and(|state| state != "Off"));
        }
        let graph = self.field.obj().document().graph()?;
        let appearance = lineage(&graph, self.field.obj().path())?
            .first()
            .and_then(|(_, dict)| dict.get_name("AS"))
            .map(str::to_string);
        Ok(appearance.is_some_and(|state| state != "Off"))
    }

    /// Sets `/V` on the field and `/AS` on each of its widgets.
    pub fn set_checked(&self, checked: bool) -> Result<()> {
        let state = if checked {
            self.on_state()?
        } else {
            "Off".to_string()
        };
        self.field.set_entry("V", Object::name(state.as_str()))?;
        let document = self.field.obj().document();
        for path in self.widget_paths()? {
            Obj::new(document, path).with_dict_mut(|dict| {
                dict.set("AS", Object::name(state.as_str()));
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// A combo box or list box
#[derive(Debug, Clone)]
pub struct ChoiceField<'d> {
    field: Field<'d>,
}

impl<'d> TryFrom<Field<'d>> for ChoiceField<'d> {
    type Error = PdfError;

    fn try_from(field: Field<'d>) -> Result<Self> {
        expect_kind(
            &field,
            "ComboBox or ListBox",
            &[FieldKind::ComboBox, FieldKind::ListBox],
        )?;
        Ok(Self { field })
    }
}

impl<'d> ChoiceField<'d> {
    pub fn field(&self) -> &Field<'d> {
        &self.field
    }

    pub fn is_combo(&self) -> Result<bool> {
        Ok(self.field.flags()? & flags::COMBO != 0)
    }

    pub fn is_multi_select(&self) -> Result<bool> {
        Ok(self.field.flags()? & flags::MULTI_SELECT != 0)
    }

    /// `(export value, display text)` pairs from `/Opt`.
    pub fn option_pairs(&self) -> Result<Vec<(String, String)>> {
        let Some(Object::Array(items)) = self.field.inherited_value("Opt")? else {
            return Ok(Vec::new());
        };
        Ok(items
            .iter()
            .filter_map(|item| match item {
                Object::String(s) => Some((s.to_text(), s.to_text())),
                Object::Array(pair) => match pair.as_slice() {
                    [Object::String(export), Object::String(display)] => {
                        Some((export.to_text(), display.to_text()))
                    }
                    _ => None,
                },
                _ => None,
            })
            .collect())
    }

    /// Display texts of the options.
    pub fn options(&self) -> Result<Vec<String>> {
        Ok(self
            .option_pairs()?
            .into_iter()
            .map(|(_, display)| display)
            .collect())
    }

    pub fn selected(&self) -> Result<Vec<String>> {
        Ok(match self.field.inherited_value("V")? {
            Some(Object::String(s)) => vec![s.to_text()],
            Some(Object::Name(name)) => vec![name],
            Some(Object::Array(items)) => items
                .iter()
                .filter_map(Object::as_pdf_string)
                .map(PdfString::to_text)
                .collect(),
            _ => Vec::new(),
        })
    }

    /// Selects the option whose export value or display text is `value`.
    /// Editable combo boxes also accept free text.
    pub fn select(&self, value: &str) -> Result<()> {
        let pairs = self.option_pairs()?;
        let export = pairs
            .iter()
            .find(|(export, display)| export == value || display == value)
            .map(|(export, _)| export.clone());
        let editable = self.field.flags()? & (flags::COMBO | flags::EDIT)
            == (flags::COMBO | flags::EDIT);
        let chosen = match export {
            Some(export) => export,
            None if editable => value.to_string(),
            None => {
                return Err(PdfError::InvalidArgument(format!(
                    "'{value}' is not one of the field's options"
                )))
            }
        };
        self.field.set_entry("V", PdfString::from_text(&chosen))?;
        let target = self.field.field_path()?;
        Obj::new(self.field.obj().document(), target).with_dict_mut(|dict| {
            dict.remove("I");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::test_fixtures::form_document;

    #[test]
    fn test_text_field() {
        let doc = form_document();
        let field = doc.get_page(0).unwrap().get_field(0).unwrap();
        let text = TextField::try_from(field).unwrap();
        assert_eq!(text.text().unwrap(), "Ada");
        assert_eq!(text.max_len().unwrap(), Some(10));
        assert!(!text.is_multiline().unwrap());

        text.set_text("Grace").unwrap();
        assert_eq!(text.text().unwrap(), "Grace");
        assert!(matches!(
            text.set_text("Far too long for it"),
            Err(PdfError::InvalidArgument(_))
        ));
        assert_eq!(text.text().unwrap(), "Grace");
    }

    #[test]
    fn test_wrong_variant_is_contract_error() {
        let doc = form_document();
        let field = doc.get_page(0).unwrap().get_field(0).unwrap();
        let err = CheckBox::try_from(field).unwrap_err();
        assert!(matches!(
            err,
            PdfError::FieldTypeMismatch {
                expected: "CheckBox",
                found: "TextField"
            }
        ));

        let check = doc.get_page(0).unwrap().get_field(1).unwrap();
        assert!(matches!(
            TextField::try_from(check),
            Err(PdfError::FieldTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_check_box() {
        let doc = form_document();
        let field = doc.get_page(0).unwrap().get_field(1).unwrap();
        let check = CheckBox::try_from(field).unwrap();
        assert_eq!(check.on_state().unwrap(), "Yes");
        assert!(check.is_checked().unwrap());

        check.set_checked(false).unwrap();
        assert!(!check.is_checked().unwrap());
        let widget = check.field().get_object().as_dictionary().unwrap();
        assert_eq!(widget.get_key_as_name("AS").unwrap(), "Off");
        assert_eq!(widget.get_key_as_name("V").unwrap(), "Off");

        check.set_checked(true).unwrap();
        assert_eq!(widget.get_key_as_name("AS").unwrap(), "Yes");
    }

    #[test]
    fn test_choice_field() {
        let doc = form_document();
        let field = doc.get_page(0).unwrap().get_field(2).unwrap();
        let choice = ChoiceField::try_from(field).unwrap();
        assert!(choice.is_combo().unwrap());
        assert_eq!(choice.options().unwrap(), ["LT", "LV", "Estonia"]);
        assert_eq!(choice.selected().unwrap(), ["LT"]);

        choice.select("Estonia").unwrap();
        assert_eq!(choice.selected().unwrap(), ["EE"]);
        assert!(matches!(
            choice.select("Atlantis"),
            Err(PdfError::InvalidArgument(_))
        ));
        assert_eq!(choice.selected().unwrap(), ["EE"]);
    }

    #[test]
    fn test_typed_dispatch() {
        let doc = form_document();
        let page = doc.get_page(0).unwrap();
        assert!(matches!(
            page.get_field(0).unwrap().typed().unwrap(),
            TypedField::Text(_)
        ));
        assert!(matches!(
            page.get_field(1).unwrap().typed().unwrap(),
            TypedField::CheckBox(_)
        ));
        let choice = page.get_field(2).unwrap().typed().unwrap();
        assert_eq!(choice.field().field_name().unwrap(), "country");
    }
}
