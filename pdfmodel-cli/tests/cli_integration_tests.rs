//! Integration tests for the pdfmodel CLI
//!
//! Fixtures are generated with the library and the binary is run as a
//! child process against them.

use anyhow::Result;
use pdfmodel::graph::Graph;
use pdfmodel::objects::{Dictionary, Object, ObjectId, Stream};
use pdfmodel::{Document, LoadOptions, NativeEngine, PdfEngine};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

fn run_cli_command(args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_pdfmodel")).args(args).output()?)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// A `pages`-page document whose first page carries one text field.
fn write_fixture(dir: &TempDir, name: &str, pages: usize) -> PathBuf {
    let mut graph = Graph::new("1.7");
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::name("Catalog"));
    catalog.set("Pages", ObjectId::new(2, 0));
    graph.insert(ObjectId::new(1, 0), catalog.into());

    let mut root = Dictionary::new();
    root.set("Type", Object::name("Pages"));
    root.set("Count", pages);
    root.set("MediaBox", vec![0.into(), 0.into(), 612.into(), 792.into()]);
    graph.insert(ObjectId::new(2, 0), root.into());

    let mut kids = Vec::new();
    for i in 0..pages {
        let content = graph.add_object(Stream::new(
            Dictionary::new(),
            format!("BT (page {}) Tj ET", i + 1).into_bytes(),
        ))
        .unwrap();
        let mut page = Dictionary::new();
        page.set("Type", Object::name("Page"));
        page.set("Parent", ObjectId::new(2, 0));
        page.set("Contents", content);
        kids.push(Object::Reference(graph.add_object(page).unwrap()));
    }

    let first_page = kids[0].as_reference().unwrap();
    let mut field = Dictionary::new();
    field.set("Type", Object::name("Annot"));
    field.set("Subtype", Object::name("Widget"));
    field.set("FT", Object::name("Tx"));
    field.set("T", Object::string("email"));
    field.set("V", Object::string("ada@example.com"));
    field.set("Rect", vec![10.into(), 10.into(), 200.into(), 30.into()]);
    field.set("P", first_page);
    let field_id = graph.add_object(field).unwrap();
    graph
        .dict_mut(first_page)
        .unwrap()
        .set("Annots", vec![Object::Reference(field_id)]);
    let mut form = Dictionary::new();
    form.set("Fields", vec![Object::Reference(field_id)]);
    graph
        .dict_mut(ObjectId::new(1, 0))
        .unwrap()
        .set("AcroForm", form);

    graph.dict_mut(ObjectId::new(2, 0)).unwrap().set("Kids", kids);
    let mut trailer = Dictionary::new();
    trailer.set("Root", ObjectId::new(1, 0));
    graph.set_trailer(trailer);

    let path = dir.path().join(name);
    std::fs::write(&path, NativeEngine.serialize(&graph, None).unwrap()).unwrap();
    path
}

async fn page_count(path: &Path, password: Option<&str>) -> pdfmodel::Result<usize> {
    let mut options = LoadOptions::new();
    if let Some(password) = password {
        options = options.password(password);
    }
    let mut doc = Document::default();
    doc.load(path, options)?.await?;
    doc.get_page_count()
}

#[test]
fn test_cli_info_command_with_nonexistent_file() {
    let output = run_cli_command(&["info", "/no/such/file.pdf"]).unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot open"));
}

#[test]
fn test_cli_info_command() {
    let dir = tempdir().unwrap();
    let input = write_fixture(&dir, "info.pdf", 3);
    let output = run_cli_command(&["info", input.to_str().unwrap(), "--detailed"]).unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("PDF Version: 1.7"));
    assert!(text.contains("Pages: 3"));
    assert!(text.contains("Encrypted: No"));
    assert!(text.contains("Has AcroForm: Yes"));
    assert!(text.contains("Form fields: 1"));
}

#[test]
fn test_cli_pages_command() {
    let dir = tempdir().unwrap();
    let input = write_fixture(&dir, "pages.pdf", 2);
    let output = run_cli_command(&["pages", input.to_str().unwrap()]).unwrap();
    assert!(output.status.success());
    let lines: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Page 1: 612x792 pts, rotation 0, 1 annotations, 1 fields"));
    assert!(lines[1].starts_with("Page 2: 612x792 pts, rotation 0, 0 annotations, 0 fields"));
}

#[test]
fn test_cli_trailer_command() {
    let dir = tempdir().unwrap();
    let input = write_fixture(&dir, "trailer.pdf", 1);
    let output = run_cli_command(&["trailer", input.to_str().unwrap()]).unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("/Root 1 0 R"));
}

#[tokio::test]
async fn test_cli_delete_page_command() {
    let dir = tempdir().unwrap();
    let input = write_fixture(&dir, "five.pdf", 5);
    let out = dir.path().join("four.pdf");
    let output = run_cli_command(&[
        "delete-page",
        input.to_str().unwrap(),
        "--page",
        "1",
        "--output",
        out.to_str().unwrap(),
    ])
    .unwrap();
    assert!(output.status.success());
    assert_eq!(page_count(&out, None).await.unwrap(), 4);
}

#[test]
fn test_cli_delete_page_out_of_range() {
    let dir = tempdir().unwrap();
    let input = write_fixture(&dir, "two.pdf", 2);
    let out = dir.path().join("never.pdf");
    let output = run_cli_command(&[
        "delete-page",
        input.to_str().unwrap(),
        "-p",
        "3",
        "-o",
        out.to_str().unwrap(),
    ])
    .unwrap();
    assert!(!output.status.success());
    assert!(!out.exists());
}

#[tokio::test]
async fn test_cli_merge_command() {
    let dir = tempdir().unwrap();
    let first = write_fixture(&dir, "a.pdf", 2);
    let second = write_fixture(&dir, "b.pdf", 3);
    let out = dir.path().join("merged.pdf");
    let output = run_cli_command(&[
        "merge",
        first.to_str().unwrap(),
        second.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ])
    .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(page_count(&out, None).await.unwrap(), 5);
}

#[test]
fn test_cli_rotate_command() {
    let dir = tempdir().unwrap();
    let input = write_fixture(&dir, "rotate.pdf", 3);
    let out = dir.path().join("rotated.pdf");
    let output = run_cli_command(&[
        "rotate",
        input.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "-a",
        "270",
        "-p",
        "2",
    ])
    .unwrap();
    assert!(output.status.success());

    let pages = run_cli_command(&["pages", out.to_str().unwrap()]).unwrap();
    let text = stdout(&pages);
    assert!(text.contains("Page 1: 612x792 pts, rotation 0"));
    assert!(text.contains("Page 2: 612x792 pts, rotation 270"));
}

#[tokio::test]
async fn test_cli_encrypt_command() {
    let dir = tempdir().unwrap();
    let input = write_fixture(&dir, "plain.pdf", 2);
    let out = dir.path().join("locked.pdf");
    let output = run_cli_command(&[
        "encrypt",
        input.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--owner",
        "owner-secret",
        "--user",
        "reader",
        "--allow",
        "print,copy",
    ])
    .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert!(page_count(&out, None).await.unwrap_err().is_invalid_password());
    assert_eq!(page_count(&out, Some("reader")).await.unwrap(), 2);

    let info = run_cli_command(&["info", out.to_str().unwrap(), "--password", "reader"]).unwrap();
    let text = stdout(&info);
    assert!(text.contains("Encrypted: aesv2 (128 bits)"));
    assert!(text.contains("Print"));
}

#[test]
fn test_cli_encrypt_rejects_bad_key_length() {
    let dir = tempdir().unwrap();
    let input = write_fixture(&dir, "plain.pdf", 1);
    let out = dir.path().join("bad.pdf");
    let output = run_cli_command(&[
        "encrypt",
        input.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--owner",
        "x",
        "--algorithm",
        "aesv3",
        "--key-length",
        "128",
    ])
    .unwrap();
    assert!(!output.status.success());
    assert!(!out.exists());
}

#[test]
fn test_cli_fields_command() {
    let dir = tempdir().unwrap();
    let input = write_fixture(&dir, "form.pdf", 1);
    let output = run_cli_command(&["fields", input.to_str().unwrap()]).unwrap();
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "page 1 email [TextField] = ada@example.com");
}
