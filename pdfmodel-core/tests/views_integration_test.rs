//! Views over a loaded document: arrays, dictionaries and references

use pdfmodel::graph::Graph;
use pdfmodel::objects::{Dictionary as PdfDictionary, Object, ObjectId};
use pdfmodel::{Document, LoadOptions, NativeEngine, PdfEngine, PdfError, Ref};
use proptest::prelude::*;

/// Three pages plus a self-referencing object 20 and a two-object cycle 21 <-> 22.
fn document() -> Document {
    let mut graph = Graph::new("1.7");
    let mut catalog = PdfDictionary::new();
    catalog.set("Type", Object::name("Catalog"));
    catalog.set("Pages", ObjectId::new(2, 0));
    graph.insert(ObjectId::new(1, 0), catalog.into());

    let mut kids = Vec::new();
    for n in 3..6 {
        let mut page = PdfDictionary::new();
        page.set("Type", Object::name("Page"));
        page.set("Parent", ObjectId::new(2, 0));
        graph.insert(ObjectId::new(n, 0), page.into());
        kids.push(Object::Reference(ObjectId::new(n, 0)));
    }
    let mut root = PdfDictionary::new();
    root.set("Type", Object::name("Pages"));
    root.set("Kids", kids);
    root.set("Count", 3);
    graph.insert(ObjectId::new(2, 0), root.into());

    let mut itself = PdfDictionary::new();
    itself.set("Me", ObjectId::new(20, 0));
    graph.insert(ObjectId::new(20, 0), itself.into());
    graph.insert(ObjectId::new(21, 0), Object::Reference(ObjectId::new(22, 0)));
    graph.insert(ObjectId::new(22, 0), Object::Reference(ObjectId::new(21, 0)));

    let mut trailer = PdfDictionary::new();
    trailer.set("Root", ObjectId::new(1, 0));
    graph.set_trailer(trailer);

    let bytes = NativeEngine.serialize(&graph, None).unwrap();
    let mut doc = Document::default();
    doc.load_bytes(&bytes, LoadOptions::new()).unwrap();
    doc
}

fn kids(doc: &Document) -> pdfmodel::Arr<'_> {
    doc.get_trailer()
        .unwrap()
        .as_dictionary()
        .unwrap()
        .get_key("Root")
        .unwrap()
        .as_dictionary()
        .unwrap()
        .get_key("Pages")
        .unwrap()
        .as_dictionary()
        .unwrap()
        .get_key("Kids")
        .unwrap()
        .as_array()
        .unwrap()
}

#[test]
fn test_snapshot_is_detached() {
    let doc = document();
    let kids = kids(&doc);
    let mut snapshot = kids.to_array().unwrap();
    assert_eq!(snapshot.len(), kids.len().unwrap());

    snapshot.pop();
    snapshot.clear();
    assert_eq!(kids.len().unwrap(), 3);
    assert_eq!(doc.get_page_count().unwrap(), 3);
}

#[test]
fn test_push_is_visible_to_fresh_snapshot() {
    let doc = document();
    let kids = kids(&doc);
    let before = kids.to_array().unwrap();

    kids.push(Object::name("Marker")).unwrap();
    assert_eq!(kids.len().unwrap(), 4);
    assert_eq!(before.len(), 3);

    let after = kids.to_array().unwrap();
    assert_eq!(after.len(), 4);
    assert_eq!(after[3].as_name().unwrap(), "Marker");
    assert!(kids.contains("Marker").unwrap());
    assert_eq!(kids.index_of("Marker").unwrap(), Some(3));
    assert!(matches!(
        kids.at(4),
        Err(PdfError::IndexOutOfRange { index: 4, len: 4 })
    ));
}

#[test]
fn test_self_reference_resolves_to_a_view() {
    let doc = document();
    let me = Ref::new(20, 0).deref(&doc).unwrap();
    let again = me.as_dictionary().unwrap().get_key("Me").unwrap();
    assert!(again.same_node(&me));
    assert_eq!(again.reference(), Some(Ref::new(20, 0)));
}

#[test]
fn test_reference_cycle_is_reported() {
    let doc = document();
    let looped = Ref::new(21, 0).deref(&doc).unwrap();
    assert!(matches!(
        looped.resolve(),
        Err(PdfError::CircularReference(_))
    ));
}

#[test]
fn test_deref_of_missing_object() {
    let doc = document();
    assert!(matches!(
        Ref::new(999, 0).deref(&doc),
        Err(PdfError::ObjectNotFound(id)) if id == ObjectId::new(999, 0)
    ));
    assert!(matches!(
        Ref::new(1, 0).deref(&Document::default()),
        Err(PdfError::NotLoaded)
    ));
}

#[test]
fn test_tag_mismatch_is_an_error() {
    let doc = document();
    let root = Ref::new(1, 0).deref(&doc).unwrap();
    assert!(matches!(
        root.as_number(),
        Err(PdfError::TypeMismatch {
            expected: "Integer",
            found: "Dictionary"
        })
    ));
    assert!(root.as_array().is_err());
}

proptest! {
    #[test]
    fn prop_push_grows_length(values in proptest::collection::vec(any::<i32>(), 0..16)) {
        let doc = document();
        let kids = kids(&doc);
        for (pushed, value) in values.iter().enumerate() {
            kids.push(*value).unwrap();
            prop_assert_eq!(kids.len().unwrap(), 3 + pushed + 1);
        }
        prop_assert_eq!(kids.to_array().unwrap().len(), 3 + values.len());
    }

    #[test]
    fn prop_indirect_iff_nonzero(number in 0u32..4, generation in 0u16..4) {
        let reference = Ref::new(number, generation);
        prop_assert_eq!(reference.is_indirect(), number != 0 || generation != 0);
    }
}
