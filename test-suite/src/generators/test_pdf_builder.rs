//! Test PDF Builder
//!
//! Writes PDF bytes by hand, without going through the engine under test,
//! so fixtures exercise the reader independently of the writer.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdfmodel::PdfVersion;
use std::collections::BTreeMap;
use std::io::Write;

/// Builder for creating test PDFs
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    version: PdfVersion,
    pages: Vec<PageContent>,
    info: Vec<(String, String)>,
    compress_streams: bool,
    use_xref_stream: bool,
    use_object_streams: bool,
    broken_xref: bool,
    circular_reference: bool,
    text_field: Option<(String, String)>,
    inherited_rotation: Option<i64>,
}

#[derive(Debug, Clone)]
struct PageContent {
    width: f32,
    height: f32,
    content_stream: String,
}

/// Where an object ends up in the finished file
enum Placement {
    Direct(usize),
    Packed { container: u32, index: u32 },
}

impl TestPdfBuilder {
    /// Create a new PDF builder with default settings
    pub fn new() -> Self {
        Self {
            version: PdfVersion::V1_4,
            pages: Vec::new(),
            info: Vec::new(),
            compress_streams: false,
            use_xref_stream: false,
            use_object_streams: false,
            broken_xref: false,
            circular_reference: false,
            text_field: None,
            inherited_rotation: None,
        }
    }

    /// Create a minimal valid PDF
    pub fn minimal() -> Self {
        Self::new().with_text_pages(1)
    }

    /// `count` letter pages reading "Page 1", "Page 2", ...
    pub fn with_text_pages(mut self, count: usize) -> Self {
        for i in 0..count {
            self.add_text_page(&format!("Page {}", i + 1));
        }
        self
    }

    /// Set PDF version
    pub fn with_version(mut self, version: PdfVersion) -> Self {
        self.version = version;
        self
    }

    /// Add document info
    pub fn with_info(mut self, key: &str, value: &str) -> Self {
        self.info.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_title(self, title: &str) -> Self {
        self.with_info("Title", title)
    }

    /// Add an empty page
    pub fn add_empty_page(&mut self, width: f32, height: f32) -> &mut Self {
        self.pages.push(PageContent {
            width,
            height,
            content_stream: String::new(),
        });
        self
    }

    /// Add a page with text
    pub fn add_text_page(&mut self, text: &str) -> &mut Self {
        self.pages.push(PageContent {
            width: 612.0,
            height: 792.0,
            content_stream: format!(
                "BT\n/F1 12 Tf\n100 700 Td\n({}) Tj\nET",
                escape_pdf_string(text)
            ),
        });
        self
    }

    /// Enable stream compression
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress_streams = compress;
        self
    }

    /// Use cross-reference streams (PDF 1.5+)
    pub fn with_xref_stream(mut self, use_xref: bool) -> Self {
        self.use_xref_stream = use_xref;
        if use_xref && self.version < PdfVersion::V1_5 {
            self.version = PdfVersion::V1_5;
        }
        self
    }

    /// Pack page dictionaries into an object stream (implies an xref stream)
    pub fn with_object_streams(mut self, packed: bool) -> Self {
        self.use_object_streams = packed;
        if packed {
            self = self.with_xref_stream(true);
        }
        self
    }

    /// Point `startxref` past the end of the file
    pub fn with_invalid_xref(mut self) -> Self {
        self.broken_xref = true;
        self
    }

    /// Create circular reference
    pub fn with_circular_reference(mut self) -> Self {
        self.circular_reference = true;
        self
    }

    /// A text field widget on the first page
    pub fn with_text_field(mut self, name: &str, value: &str) -> Self {
        self.text_field = Some((name.to_string(), value.to_string()));
        self
    }

    /// `/Rotate` on the page tree root, inherited by every page
    pub fn with_inherited_rotation(mut self, degrees: i64) -> Self {
        self.inherited_rotation = Some(degrees);
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Build the PDF
    pub fn build(&self) -> Vec<u8> {
        let mut objects: BTreeMap<u32, Vec<u8>> = BTreeMap::new();
        let mut packable: Vec<u32> = Vec::new();
        let page_count = self.pages.len() as u32;
        let mut next = 3 + 2 * page_count;

        let field_id = self.text_field.as_ref().map(|_| {
            next += 1;
            next - 1
        });
        let info_id = (!self.info.is_empty()).then(|| {
            next += 1;
            next - 1
        });

        let mut catalog = "<< /Type /Catalog /Pages 2 0 R".to_string();
        if let Some(field) = field_id {
            catalog.push_str(&format!(" /AcroForm << /Fields [{field} 0 R] >>"));
        }
        catalog.push_str(" >>");
        objects.insert(1, catalog.into_bytes());

        let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();
        let mut root = format!(
            "<< /Type /Pages /Kids [{}] /Count {} /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> >> >>",
            kids.join(" "),
            page_count
        );
        if let Some(rotation) = self.inherited_rotation {
            root.push_str(&format!(" /Rotate {rotation}"));
        }
        root.push_str(" >>");
        objects.insert(2, root.into_bytes());

        for (i, page) in self.pages.iter().enumerate() {
            let page_id = 3 + 2 * i as u32;
            let content_id = page_id + 1;
            let mut dict = "<< /Type /Page /Parent 2 0 R".to_string();
            if page.width != 612.0 || page.height != 792.0 {
                dict.push_str(&format!(" /MediaBox [0 0 {} {}]", page.width, page.height));
            }
            dict.push_str(&format!(" /Contents {content_id} 0 R"));
            if let (0, Some(field)) = (i, field_id) {
                dict.push_str(&format!(" /Annots [{field} 0 R]"));
            }
            dict.push_str(" >>");
            objects.insert(page_id, dict.into_bytes());
            packable.push(page_id);
            objects.insert(content_id, self.stream_object("", page.content_stream.as_bytes()));
        }

        if let (Some(id), Some((name, value))) = (field_id, &self.text_field) {
            let field = format!(
                "<< /Type /Annot /Subtype /Widget /FT /Tx /T ({}) /V ({}) /Rect [100 600 300 620] /P 3 0 R >>",
                escape_pdf_string(name),
                escape_pdf_string(value)
            );
            objects.insert(id, field.into_bytes());
            packable.push(id);
        }

        if let Some(id) = info_id {
            let mut info = "<< ".to_string();
            for (key, value) in &self.info {
                info.push_str(&format!("/{} ({}) ", key, escape_pdf_string(value)));
            }
            info.push_str(">>");
            objects.insert(id, info.into_bytes());
        }

        if self.circular_reference {
            let first = next;
            objects.insert(first, format!("<< /Type /Test /Next {} 0 R >>", first + 1).into_bytes());
            objects.insert(first + 1, format!("<< /Type /Test /Next {first} 0 R >>").into_bytes());
            next += 2;
        }

        let mut placements: BTreeMap<u32, Placement> = BTreeMap::new();
        if self.use_object_streams && !packable.is_empty() {
            let container = next;
            next += 1;
            let mut header = String::new();
            let mut body = Vec::new();
            for (index, id) in packable.iter().enumerate() {
                header.push_str(&format!("{} {} ", id, body.len()));
                body.extend_from_slice(&objects[id]);
                body.push(b'\n');
                placements.insert(
                    *id,
                    Placement::Packed {
                        container,
                        index: index as u32,
                    },
                );
            }
            let first = header.len();
            let mut content = header.into_bytes();
            content.extend_from_slice(&body);
            let extra = format!("/Type /ObjStm /N {} /First {first} ", packable.len());
            let stream = self.stream_object(&extra, &content);
            for id in &packable {
                objects.remove(id);
            }
            objects.insert(container, stream);
        }

        let mut pdf = format!("%PDF-{}\n", self.version).into_bytes();
        pdf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        for (id, body) in &objects {
            placements.insert(*id, Placement::Direct(pdf.len()));
            pdf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
            pdf.extend_from_slice(body);
            pdf.extend_from_slice(b"\nendobj\n");
        }

        let mut trailer_entries = "/Root 1 0 R".to_string();
        if let Some(id) = info_id {
            trailer_entries.push_str(&format!(" /Info {id} 0 R"));
        }

        let xref_offset = pdf.len();
        if self.use_xref_stream {
            let xref_id = next;
            placements.insert(xref_id, Placement::Direct(xref_offset));
            let size = xref_id + 1;
            let mut rows = Vec::new();
            for number in 0..size {
                let (kind, field1, field2): (u8, u32, u16) = match placements.get(&number) {
                    Some(Placement::Direct(offset)) => (1, *offset as u32, 0),
                    Some(Placement::Packed { container, index }) => (2, *container, *index as u16),
                    None => (0, 0, if number == 0 { 65535 } else { 0 }),
                };
                rows.push(kind);
                rows.extend_from_slice(&field1.to_be_bytes());
                rows.extend_from_slice(&field2.to_be_bytes());
            }
            let extra = format!("/Type /XRef /Size {size} /W [1 4 2] {trailer_entries} ");
            pdf.extend_from_slice(format!("{xref_id} 0 obj\n").as_bytes());
            pdf.extend_from_slice(&self.stream_object(&extra, &rows));
            pdf.extend_from_slice(b"\nendobj\n");
        } else {
            let size = placements.keys().next_back().map_or(1, |max| max + 1);
            pdf.extend_from_slice(format!("xref\n0 {size}\n").as_bytes());
            for number in 0..size {
                match placements.get(&number) {
                    Some(Placement::Direct(offset)) => {
                        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes())
                    }
                    _ => pdf.extend_from_slice(b"0000000000 65535 f \n"),
                }
            }
            pdf.extend_from_slice(
                format!("trailer\n<< /Size {size} {trailer_entries} >>\n").as_bytes(),
            );
        }

        let startxref = if self.broken_xref {
            pdf.len() + 4096
        } else {
            xref_offset
        };
        pdf.extend_from_slice(format!("startxref\n{startxref}\n%%EOF").as_bytes());
        pdf
    }

    /// Stream object body: dictionary with `extra` entries, then the data.
    fn stream_object(&self, extra: &str, data: &[u8]) -> Vec<u8> {
        let (data, filter) = if self.compress_streams {
            (compress(data), "/Filter /FlateDecode ")
        } else {
            (data.to_vec(), "")
        };
        let mut out = format!("<< {extra}{filter}/Length {} >>\nstream\n", data.len()).into_bytes();
        out.extend_from_slice(&data);
        out.extend_from_slice(b"\nendstream");
        out
    }
}

fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // Writing into a Vec cannot fail
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

/// Escape special characters in PDF strings
fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\\' => "\\\\".to_string(),
            '\n' => "\\n".to_string(),
            '\r' => "\\r".to_string(),
            '\t' => "\\t".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_pdf_generation() {
        let pdf = TestPdfBuilder::minimal().build();
        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(pdf.ends_with(b"%%EOF"));
    }

    #[test]
    fn test_xref_stream_bumps_version() {
        let pdf = TestPdfBuilder::minimal().with_xref_stream(true).build();
        assert!(pdf.starts_with(b"%PDF-1.5"));
        assert!(!pdf.windows(6).any(|w| w == b"\nxref\n"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_pdf_string("a(b)\\"), "a\\(b\\)\\\\");
    }
}
