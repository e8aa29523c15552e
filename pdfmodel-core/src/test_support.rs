//! Graph fixtures shared by the unit tests

use crate::document::{Document, LoadOptions};
use crate::engine::{NativeEngine, PdfEngine};
use crate::graph::Graph;
use crate::objects::{Dictionary, Object, ObjectId, Stream};

pub(crate) fn page_id(index: usize) -> ObjectId {
    ObjectId::new(3 + 2 * index as u32, 0)
}

/// Catalog 1, flat page tree 2, page `i` at `3 + 2i` with its content stream next to it.
pub(crate) fn sample_graph(pages: usize) -> Graph {
    let mut graph = Graph::new("1.7");
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::name("Catalog"));
    catalog.set("Pages", ObjectId::new(2, 0));
    graph.insert(ObjectId::new(1, 0), catalog.into());

    let mut kids = Vec::new();
    for i in 0..pages {
        let id = page_id(i);
        let content_id = ObjectId::new(id.number() + 1, 0);
        let mut page = Dictionary::new();
        page.set("Type", Object::name("Page"));
        page.set("Parent", ObjectId::new(2, 0));
        page.set("Contents", content_id);
        graph.insert(id, page.into());
        graph.insert(
            content_id,
            Stream::new(Dictionary::new(), format!("BT (page {}) Tj ET", i + 1).into_bytes()).into(),
        );
        kids.push(Object::Reference(id));
    }

    let mut root = Dictionary::new();
    root.set("Type", Object::name("Pages"));
    root.set("Kids", kids);
    root.set("Count", pages);
    root.set(
        "MediaBox",
        vec![0.into(), 0.into(), 612.into(), 792.into()],
    );
    root.set("Resources", Dictionary::new());
    graph.insert(ObjectId::new(2, 0), root.into());

    let mut trailer = Dictionary::new();
    trailer.set("Root", ObjectId::new(1, 0));
    graph.set_trailer(trailer);
    graph
}

/// Serializes `graph` with the native engine and loads it into a fresh document.
pub(crate) fn load(graph: Graph) -> Document {
    let bytes = NativeEngine.serialize(&graph, None).unwrap();
    let mut document = Document::default();
    document.load_bytes(&bytes, LoadOptions::new()).unwrap();
    document
}

pub(crate) fn sample_document(pages: usize) -> Document {
    load(sample_graph(pages))
}
