//! End-to-end lifecycle properties against hand-built fixtures

use pdfmodel::{Document, LoadState, PdfError, PdfVersion};
use pdfmodel_test_suite::generators::invalid_pdfs::{generate_invalid_pdf, InvalidPdfType};
use pdfmodel_test_suite::utils::{create_test_output_dir, load_bytes, load_path, write_fixture};
use pdfmodel_test_suite::TestPdfBuilder;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

fn trailer_keys(doc: &Document) -> BTreeSet<String> {
    doc.get_trailer()
        .and_then(|trailer| trailer.as_dictionary())
        .and_then(|dict| dict.get_keys())
        .unwrap()
        .into_iter()
        .collect()
}

fn page_text(doc: &Document, index: usize) -> String {
    let contents = doc.get_page(index).unwrap().get_contents(false).unwrap();
    String::from_utf8_lossy(&contents).into_owned()
}

#[tokio::test]
async fn test_ready_document_has_pages() {
    let dir = create_test_output_dir().unwrap();
    for count in [1, 3, 12] {
        let pdf = TestPdfBuilder::new().with_text_pages(count).build();
        let path = write_fixture(dir.path(), &format!("pages_{count}.pdf"), &pdf).unwrap();
        let doc = load_path(&path, None).await.unwrap();
        assert_eq!(doc.state(), LoadState::Ready);
        assert_eq!(doc.get_page_count().unwrap(), count);
    }
}

#[tokio::test]
async fn test_delete_first_page_of_five() {
    let dir = create_test_output_dir().unwrap();
    let pdf = TestPdfBuilder::new().with_text_pages(5).build();
    let source = write_fixture(dir.path(), "five.pdf", &pdf).unwrap();
    let output = dir.path().join("four.pdf");

    let mut doc = load_path(&source, None).await.unwrap();
    doc.delete_page(0).unwrap();
    doc.write_to(&output).await.unwrap();

    let reloaded = load_path(&output, None).await.unwrap();
    assert_eq!(reloaded.get_page_count().unwrap(), 4);
    assert!(page_text(&reloaded, 0).contains("(Page 2) Tj"));
}

#[tokio::test]
async fn test_delete_last_page() {
    let dir = create_test_output_dir().unwrap();
    let pdf = TestPdfBuilder::new().with_text_pages(3).build();
    let source = write_fixture(dir.path(), "three.pdf", &pdf).unwrap();
    let output = dir.path().join("two.pdf");

    let mut doc = load_path(&source, None).await.unwrap();
    let count = doc.get_page_count().unwrap();
    doc.delete_page(count - 1).unwrap();
    doc.write_to(&output).await.unwrap();

    let reloaded = load_path(&output, None).await.unwrap();
    assert_eq!(reloaded.get_page_count().unwrap(), count - 1);
    assert!(page_text(&reloaded, 1).contains("(Page 2) Tj"));
}

#[tokio::test]
async fn test_merge_self_doubles_pages() {
    let dir = create_test_output_dir().unwrap();
    let pdf = TestPdfBuilder::new()
        .with_text_pages(3)
        .with_text_field("email", "ada@example.com")
        .build();
    let source = write_fixture(dir.path(), "form.pdf", &pdf).unwrap();
    let output = dir.path().join("doubled.pdf");

    let mut doc = load_path(&source, None).await.unwrap();
    let added = doc.merge_document(&source, None).await.unwrap();
    assert_eq!(added, 3);
    doc.write_to(&output).await.unwrap();

    let reloaded = load_path(&output, None).await.unwrap();
    assert_eq!(reloaded.get_page_count().unwrap(), 6);
    assert!(page_text(&reloaded, 3).contains("(Page 1) Tj"));
    assert!(page_text(&reloaded, 5).contains("(Page 3) Tj"));

    let form = reloaded.get_form().unwrap().expect("merged form");
    assert_eq!(form.fields().unwrap().len(), 2);
    assert_eq!(reloaded.get_page(3).unwrap().get_num_fields().unwrap(), 1);
}

#[tokio::test]
async fn test_merge_keeps_inherited_rotation() {
    let dir = create_test_output_dir().unwrap();
    let plain = TestPdfBuilder::new().with_text_pages(1).build();
    let rotated = TestPdfBuilder::new()
        .with_text_pages(2)
        .with_inherited_rotation(90)
        .build();
    let target = write_fixture(dir.path(), "plain.pdf", &plain).unwrap();
    let source = write_fixture(dir.path(), "rotated.pdf", &rotated).unwrap();

    let mut doc = load_path(&target, None).await.unwrap();
    doc.merge_document(&source, None).await.unwrap();

    let rotations: Vec<i64> = doc.pages().unwrap().map(|p| p.rotation().unwrap()).collect();
    assert_eq!(rotations, vec![0, 90, 90]);
}

#[tokio::test]
async fn test_round_trip_preserves_pages_and_trailer_keys() {
    let dir = create_test_output_dir().unwrap();
    let pdf = TestPdfBuilder::new()
        .with_text_pages(4)
        .with_title("Round trip")
        .build();
    let source = write_fixture(dir.path(), "source.pdf", &pdf).unwrap();
    let output = dir.path().join("copy.pdf");

    let doc = load_path(&source, None).await.unwrap();
    doc.write_to(&output).await.unwrap();
    let copy = load_path(&output, None).await.unwrap();

    assert_eq!(copy.get_page_count().unwrap(), doc.get_page_count().unwrap());
    assert_eq!(trailer_keys(&copy), trailer_keys(&doc));
    assert!(trailer_keys(&doc).contains("Info"));
}

#[test]
fn test_page_index_out_of_range_does_not_mutate() {
    let mut doc = load_bytes(&TestPdfBuilder::new().with_text_pages(2).build(), None).unwrap();
    let before = doc.write_to_buffer().unwrap();

    assert!(matches!(
        doc.get_page(2),
        Err(PdfError::PageOutOfRange { index: 2, count: 2 })
    ));
    assert!(matches!(
        doc.delete_page(7),
        Err(PdfError::PageOutOfRange { index: 7, count: 2 })
    ));
    assert_eq!(doc.get_page_count().unwrap(), 2);
    assert_eq!(doc.write_to_buffer().unwrap(), before);
}

#[test]
fn test_xref_stream_fixture() {
    let pdf = TestPdfBuilder::new().with_text_pages(3).with_xref_stream(true).build();
    let doc = load_bytes(&pdf, None).unwrap();
    assert_eq!(doc.get_page_count().unwrap(), 3);
    assert_eq!(doc.get_version().unwrap(), PdfVersion::V1_5);
    // Layout keys of the xref stream do not leak into the trailer
    let keys = trailer_keys(&doc);
    assert!(!keys.contains("W"));
    assert!(!keys.contains("Type"));
}

#[test]
fn test_object_stream_fixture() {
    let pdf = TestPdfBuilder::new()
        .with_text_pages(4)
        .with_object_streams(true)
        .with_text_field("name", "Grace")
        .build();
    let doc = load_bytes(&pdf, None).unwrap();
    assert_eq!(doc.get_page_count().unwrap(), 4);
    assert!(page_text(&doc, 3).contains("(Page 4) Tj"));
    let fields = doc.get_page(0).unwrap().get_fields_info().unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "name");
    assert_eq!(fields[0].value.as_deref(), Some("Grace"));
}

#[test]
fn test_compressed_fixture() {
    let pdf = TestPdfBuilder::new()
        .with_text_pages(2)
        .with_compression(true)
        .with_object_streams(true)
        .build();
    let doc = load_bytes(&pdf, None).unwrap();
    let page = doc.get_page(1).unwrap();
    assert!(page_text(&doc, 1).contains("(Page 2) Tj"));
    assert_ne!(page.get_contents(true).unwrap(), page.get_contents(false).unwrap());
}

#[test]
fn test_broken_startxref_recovers() {
    let pdf = TestPdfBuilder::new()
        .with_text_pages(2)
        .with_invalid_xref()
        .build();
    let doc = load_bytes(&pdf, None).unwrap();
    assert_eq!(doc.get_page_count().unwrap(), 2);
}

#[test]
fn test_circular_fixture_loads() {
    let pdf = TestPdfBuilder::new()
        .with_text_pages(1)
        .with_circular_reference()
        .build();
    let doc = load_bytes(&pdf, None).unwrap();
    assert_eq!(doc.get_page_count().unwrap(), 1);
    assert!(doc.get_objects().unwrap().len() >= 6);
}

#[test]
fn test_page_geometry() {
    let mut builder = TestPdfBuilder::new();
    builder.add_empty_page(300.0, 400.0);
    builder.add_text_page("letter");
    let doc = load_bytes(&builder.build(), None).unwrap();

    let small = doc.get_page(0).unwrap();
    assert_eq!(small.width().unwrap(), 300.0);
    assert_eq!(small.height().unwrap(), 400.0);
    assert!(small.get_contents(false).unwrap().is_empty());

    // MediaBox inherited from the page tree root
    let letter = doc.get_page(1).unwrap();
    assert_eq!(letter.width().unwrap(), 612.0);
    assert!(letter.get_resources().unwrap().has_key("Font").unwrap());
}

#[test]
fn test_invalid_inputs() {
    for kind in InvalidPdfType::ALL {
        let pdf = generate_invalid_pdf(kind);
        let mut doc = Document::default();
        let result = doc.load_bytes(&pdf, Default::default());
        if kind.recoverable() {
            assert!(result.is_ok(), "{kind:?} should recover: {result:?}");
            assert_eq!(doc.get_page_count().unwrap(), 2);
        } else {
            assert!(result.is_err(), "{kind:?} should fail");
            assert_eq!(doc.state(), LoadState::Failed);
            assert!(doc.load_error().is_some());
            assert!(matches!(doc.get_page_count(), Err(PdfError::NotLoaded)));
        }
    }
}

#[test]
fn test_pageless_document_is_rejected() {
    let pdf = generate_invalid_pdf(InvalidPdfType::NoPages);
    assert!(matches!(
        load_bytes(&pdf, None),
        Err(PdfError::InvalidStructure(_))
    ));
}
