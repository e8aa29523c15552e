//! Test Suite for pdfmodel
//!
//! Byte-level fixture generators plus helpers for driving a
//! [`Document`](pdfmodel::Document) through its lifecycle in tests.

pub mod generators;

pub use generators::test_pdf_builder::TestPdfBuilder;

/// Common test utilities
pub mod utils {
    use pdfmodel::{Document, LoadOptions};
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Create a temporary directory for test outputs
    pub fn create_test_output_dir() -> anyhow::Result<tempfile::TempDir> {
        Ok(tempfile::tempdir()?)
    }

    /// Write fixture bytes under `dir`
    pub fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    fn options(password: Option<&str>) -> LoadOptions {
        match password {
            Some(password) => LoadOptions::new().password(password),
            None => LoadOptions::new(),
        }
    }

    /// Load a document from memory
    pub fn load_bytes(bytes: &[u8], password: Option<&str>) -> pdfmodel::Result<Document> {
        let mut doc = Document::default();
        doc.load_bytes(bytes, options(password))?;
        Ok(doc)
    }

    /// Load a document from disk through the asynchronous entry point
    pub async fn load_path(path: &Path, password: Option<&str>) -> pdfmodel::Result<Document> {
        let mut doc = Document::default();
        doc.load(path, options(password))?.await?;
        Ok(doc)
    }
}
