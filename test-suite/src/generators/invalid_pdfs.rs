//! Malformed inputs for failure-path tests

use super::test_pdf_builder::TestPdfBuilder;

/// Types of malformed PDFs that can be generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidPdfType {
    /// Bytes with no PDF structure at all
    Garbage,
    /// Valid body without the `%PDF-` marker
    MissingHeader,
    /// Cut off inside the cross-reference section
    TruncatedXref,
    /// Well-formed file whose page tree is empty
    NoPages,
    /// Header only
    HeaderOnly,
}

impl InvalidPdfType {
    pub const ALL: [InvalidPdfType; 5] = [
        InvalidPdfType::Garbage,
        InvalidPdfType::MissingHeader,
        InvalidPdfType::TruncatedXref,
        InvalidPdfType::NoPages,
        InvalidPdfType::HeaderOnly,
    ];

    /// Whether the reader's recovery scan is expected to cope
    pub fn recoverable(self) -> bool {
        matches!(self, InvalidPdfType::TruncatedXref)
    }
}

/// Generate a malformed PDF of the given type
pub fn generate_invalid_pdf(kind: InvalidPdfType) -> Vec<u8> {
    match kind {
        InvalidPdfType::Garbage => b"This is not a PDF file at all.\n\x00\x01\x02".to_vec(),
        InvalidPdfType::MissingHeader => {
            let pdf = TestPdfBuilder::minimal().build();
            let body_start = pdf
                .iter()
                .position(|&b| b == b'\n')
                .map_or(0, |newline| newline + 1);
            pdf[body_start..].to_vec()
        }
        InvalidPdfType::TruncatedXref => {
            let pdf = TestPdfBuilder::new().with_text_pages(2).build();
            let xref = pdf
                .windows(6)
                .position(|w| w == b"\nxref\n")
                .unwrap_or(pdf.len());
            // Keep a few entries so the table is cut mid-row
            let cut = (xref + 40).min(pdf.len());
            pdf[..cut].to_vec()
        }
        InvalidPdfType::NoPages => TestPdfBuilder::new().build(),
        InvalidPdfType::HeaderOnly => b"%PDF-1.7\n%%EOF".to_vec(),
    }
}
