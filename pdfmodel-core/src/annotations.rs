//! Page annotations (ISO 32000-1 Section 12.5)

use crate::error::{PdfError, Result};
use crate::geometry::Rectangle;
use crate::objects::{Object, PdfString};
use crate::view::Obj;
use bitflags::bitflags;
use tracing::warn;

/// Annotation subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationType {
    /// Text annotation (sticky note)
    Text,
    Link,
    FreeText,
    Line,
    Square,
    Circle,
    Polygon,
    PolyLine,
    Highlight,
    Underline,
    Squiggly,
    StrikeOut,
    /// Rubber stamp annotation
    Stamp,
    Caret,
    Ink,
    Popup,
    FileAttachment,
    Sound,
    Movie,
    /// Widget annotation (form field)
    Widget,
    Screen,
    PrinterMark,
    TrapNet,
    Watermark,
    /// A subtype this model does not know
    Unknown,
}

impl AnnotationType {
    /// Get PDF subtype name
    pub fn pdf_name(&self) -> &'static str {
        match self {
            AnnotationType::Text => "Text",
            AnnotationType::Link => "Link",
            AnnotationType::FreeText => "FreeText",
            AnnotationType::Line => "Line",
            AnnotationType::Square => "Square",
            AnnotationType::Circle => "Circle",
            AnnotationType::Polygon => "Polygon",
            AnnotationType::PolyLine => "PolyLine",
            AnnotationType::Highlight => "Highlight",
            AnnotationType::Underline => "Underline",
            AnnotationType::Squiggly => "Squiggly",
            AnnotationType::StrikeOut => "StrikeOut",
            AnnotationType::Stamp => "Stamp",
            AnnotationType::Caret => "Caret",
            AnnotationType::Ink => "Ink",
            AnnotationType::Popup => "Popup",
            AnnotationType::FileAttachment => "FileAttachment",
            AnnotationType::Sound => "Sound",
            AnnotationType::Movie => "Movie",
            AnnotationType::Widget => "Widget",
            AnnotationType::Screen => "Screen",
            AnnotationType::PrinterMark => "PrinterMark",
            AnnotationType::TrapNet => "TrapNet",
            AnnotationType::Watermark => "Watermark",
            AnnotationType::Unknown => "Unknown",
        }
    }

    pub fn from_pdf_name(name: &str) -> Option<Self> {
        let kind = match name {
            "Text" => AnnotationType::Text,
            "Link" => AnnotationType::Link,
            "FreeText" => AnnotationType::FreeText,
            "Line" => AnnotationType::Line,
            "Square" => AnnotationType::Square,
            "Circle" => AnnotationType::Circle,
            "Polygon" => AnnotationType::Polygon,
            "PolyLine" => AnnotationType::PolyLine,
            "Highlight" => AnnotationType::Highlight,
            "Underline" => AnnotationType::Underline,
            "Squiggly" => AnnotationType::Squiggly,
            "StrikeOut" => AnnotationType::StrikeOut,
            "Stamp" => AnnotationType::Stamp,
            "Caret" => AnnotationType::Caret,
            "Ink" => AnnotationType::Ink,
            "Popup" => AnnotationType::Popup,
            "FileAttachment" => AnnotationType::FileAttachment,
            "Sound" => AnnotationType::Sound,
            "Movie" => AnnotationType::Movie,
            "Widget" => AnnotationType::Widget,
            "Screen" => AnnotationType::Screen,
            "PrinterMark" => AnnotationType::PrinterMark,
            "TrapNet" => AnnotationType::TrapNet,
            "Watermark" => AnnotationType::Watermark,
            _ => return None,
        };
        Some(kind)
    }
}

bitflags! {
    /// Annotation flags (`/F`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AnnotationFlags: u32 {
        const INVISIBLE = 1;
        const HIDDEN = 1 << 1;
        const PRINT = 1 << 2;
        const NO_ZOOM = 1 << 3;
        const NO_ROTATE = 1 << 4;
        const NO_VIEW = 1 << 5;
        const READ_ONLY = 1 << 6;
        const LOCKED = 1 << 7;
        const TOGGLE_NO_VIEW = 1 << 8;
        const LOCKED_CONTENTS = 1 << 9;
    }
}

/// View of one annotation dictionary on a page
#[derive(Debug, Clone)]
pub struct Annotation<'d> {
    obj: Obj<'d>,
}

impl<'d> Annotation<'d> {
    pub(crate) fn new(obj: Obj<'d>) -> Self {
        Self { obj }
    }

    pub fn get_object(&self) -> Obj<'d> {
        self.obj.clone()
    }

    pub fn annotation_type(&self) -> Result<AnnotationType> {
        let subtype = self.obj.with_dict(|dict| {
            dict.get_name("Subtype")
                .map(str::to_string)
                .ok_or_else(|| PdfError::KeyNotFound("Subtype".into()))
        })?;
        Ok(AnnotationType::from_pdf_name(&subtype).unwrap_or_else(|| {
            warn!("Unknown annotation subtype /{} at {}", subtype, self.obj.path());
            AnnotationType::Unknown
        }))
    }

    pub fn flags(&self) -> Result<AnnotationFlags> {
        self.obj.with_dict(|dict| {
            let bits = dict.get_integer("F").unwrap_or(0);
            Ok(AnnotationFlags::from_bits_truncate(bits as u32))
        })
    }

    pub fn set_flags(&self, flags: AnnotationFlags) -> Result<()> {
        self.obj.with_dict_mut(|dict| {
            dict.set("F", flags.bits() as i64);
            Ok(())
        })
    }

    fn text_entry(&self, key: &str) -> Result<Option<String>> {
        self.obj.with_dict(|dict| {
            Ok(dict
                .get(key)
                .and_then(Object::as_pdf_string)
                .map(PdfString::to_text))
        })
    }

    fn set_text_entry(&self, key: &str, text: &str) -> Result<()> {
        self.obj.with_dict_mut(|dict| {
            dict.set(key, PdfString::from_text(text));
            Ok(())
        })
    }

    /// `/T`, the author for markup annotations.
    pub fn title(&self) -> Result<Option<String>> {
        self.text_entry("T")
    }

    pub fn set_title(&self, title: &str) -> Result<()> {
        self.set_text_entry("T", title)
    }

    pub fn contents(&self) -> Result<Option<String>> {
        self.text_entry("Contents")
    }

    pub fn set_contents(&self, contents: &str) -> Result<()> {
        self.set_text_entry("Contents", contents)
    }

    pub fn rect(&self) -> Result<Rectangle> {
        let rect = self.obj.as_dictionary()?.get_key("Rect")?;
        rect.with(Rectangle::from_object)
    }

    /// Colour components of `/C`; an empty array means transparent.
    pub fn color(&self) -> Result<Option<Vec<f64>>> {
        self.obj.with_dict(|dict| {
            Ok(dict
                .get("C")
                .and_then(Object::as_array)
                .map(|items| items.iter().filter_map(Object::as_f64).collect()))
        })
    }

    pub fn has_appearance_stream(&self) -> Result<bool> {
        self.obj.with_dict(|dict| Ok(dict.contains_key("AP")))
    }

    pub fn has_action(&self) -> Result<bool> {
        self.obj.with_dict(|dict| Ok(dict.contains_key("A")))
    }

    /// Target of a `/URI` action.
    pub fn action_uri(&self) -> Result<Option<String>> {
        let dict = self.obj.as_dictionary()?;
        if !dict.has_key("A")? {
            return Ok(None);
        }
        let action = dict.get_key("A")?;
        action.with_dict(|action| {
            if action.get_name("S") != Some("URI") {
                return Ok(None);
            }
            Ok(action
                .get("URI")
                .and_then(Object::as_pdf_string)
                .map(PdfString::to_text))
        })
    }

    pub fn has_file_attachment(&self) -> Result<bool> {
        self.obj.with_dict(|dict| Ok(dict.contains_key("FS")))
    }

    pub fn is_open(&self) -> Result<bool> {
        self.obj.with_dict(|dict| {
            Ok(dict.get("Open").and_then(Object::as_bool).unwrap_or(false))
        })
    }

    pub fn set_open(&self, open: bool) -> Result<()> {
        self.obj.with_dict_mut(|dict| {
            dict.set("Open", open);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Dictionary, ObjectId};
    use crate::test_support::{load, page_id, sample_graph};

    fn document() -> crate::Document {
        let mut graph = sample_graph(1);

        let mut action = Dictionary::new();
        action.set("S", Object::name("URI"));
        action.set("URI", Object::string("https://example.com"));
        graph.insert(ObjectId::new(80, 0), action.into());

        let mut link = Dictionary::new();
        link.set("Type", Object::name("Annot"));
        link.set("Subtype", Object::name("Link"));
        link.set("Rect", vec![10.into(), 10.into(), 110.into(), 30.into()]);
        link.set("A", ObjectId::new(80, 0));
        link.set("F", 4);
        graph.insert(ObjectId::new(81, 0), link.into());

        let mut note = Dictionary::new();
        note.set("Subtype", Object::name("Text"));
        note.set("Rect", vec![0.into(), 0.into(), 20.into(), 20.into()]);
        note.set("Contents", Object::string("Check totals"));
        note.set("T", Object::string("Reviewer"));
        note.set("C", vec![1.into(), 0.into(), 0.into()]);

        let mut odd = Dictionary::new();
        odd.set("Subtype", Object::name("3D"));
        odd.set("Rect", vec![0.into(), 0.into(), 1.into(), 1.into()]);

        graph.dict_mut(page_id(0)).unwrap().set(
            "Annots",
            vec![
                Object::Reference(ObjectId::new(81, 0)),
                note.into(),
                odd.into(),
            ],
        );
        load(graph)
    }

    #[test]
    fn test_link_annotation() {
        let doc = document();
        let link = doc.get_page(0).unwrap().get_annotation(0).unwrap();
        assert_eq!(link.annotation_type().unwrap(), AnnotationType::Link);
        assert!(link.has_action().unwrap());
        assert_eq!(
            link.action_uri().unwrap().as_deref(),
            Some("https://example.com")
        );
        assert_eq!(link.flags().unwrap(), AnnotationFlags::PRINT);
        assert_eq!(link.rect().unwrap().width(), 100.0);
        assert!(!link.has_appearance_stream().unwrap());
    }

    #[test]
    fn test_inline_text_annotation() {
        let doc = document();
        let note = doc.get_page(0).unwrap().get_annotation(1).unwrap();
        assert_eq!(note.annotation_type().unwrap(), AnnotationType::Text);
        assert_eq!(note.contents().unwrap().as_deref(), Some("Check totals"));
        assert_eq!(note.title().unwrap().as_deref(), Some("Reviewer"));
        assert_eq!(note.color().unwrap(), Some(vec![1.0, 0.0, 0.0]));
        assert_eq!(note.action_uri().unwrap(), None);

        note.set_contents("Done").unwrap();
        note.set_open(true).unwrap();
        note.set_flags(AnnotationFlags::HIDDEN | AnnotationFlags::LOCKED)
            .unwrap();
        let again = doc.get_page(0).unwrap().get_annotation(1).unwrap();
        assert_eq!(again.contents().unwrap().as_deref(), Some("Done"));
        assert!(again.is_open().unwrap());
        assert!(again.flags().unwrap().contains(AnnotationFlags::LOCKED));
    }

    #[test]
    fn test_unknown_subtype() {
        let doc = document();
        let odd = doc.get_page(0).unwrap().get_annotation(2).unwrap();
        assert_eq!(odd.annotation_type().unwrap(), AnnotationType::Unknown);
    }

    #[test]
    fn test_subtype_names() {
        assert_eq!(AnnotationType::Widget.pdf_name(), "Widget");
        assert_eq!(
            AnnotationType::from_pdf_name("FileAttachment"),
            Some(AnnotationType::FileAttachment)
        );
        assert_eq!(AnnotationType::from_pdf_name("Bogus"), None);
    }
}
