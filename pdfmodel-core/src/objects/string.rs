/// How a string was (or will be) written in PDF syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringFormat {
    #[default]
    Literal,
    Hexadecimal,
}

/// A PDF string: raw bytes plus the syntax it was written in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PdfString {
    bytes: Vec<u8>,
    format: StringFormat,
}

const UTF16BE_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

impl PdfString {
    pub fn new(bytes: Vec<u8>, format: StringFormat) -> Self {
        Self { bytes, format }
    }

    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(bytes.into(), StringFormat::Literal)
    }

    pub fn hexadecimal(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(bytes.into(), StringFormat::Hexadecimal)
    }

    /// Encodes text as a text string: single bytes when every character fits
    /// in Latin-1, otherwise UTF-16BE with a byte order mark.
    pub fn from_text(text: &str) -> Self {
        if text.chars().all(|c| (c as u32) < 0x100) {
            return Self::literal(text.chars().map(|c| c as u8).collect::<Vec<u8>>());
        }
        let mut bytes = UTF16BE_BOM.to_vec();
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Self::literal(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn format(&self) -> StringFormat {
        self.format
    }

    pub(crate) fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.bytes = bytes;
    }

    /// Decodes the bytes as a text string.
    pub fn to_text(&self) -> String {
        if let Some(body) = self.bytes.strip_prefix(&UTF16BE_BOM) {
            let units: Vec<u16> = body
                .chunks(2)
                .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]))
                .collect();
            return String::from_utf16_lossy(&units);
        }
        if let Some(body) = self.bytes.strip_prefix(&UTF8_BOM) {
            return String::from_utf8_lossy(body).into_owned();
        }
        self.bytes.iter().map(|&b| pdf_doc_char(b)).collect()
    }
}

/// PDFDocEncoding differs from Latin-1 only in 0x18..0x1F and 0x80..0xA0.
fn pdf_doc_char(byte: u8) -> char {
    let mapped = match byte {
        0x18 => 0x02D8,
        0x19 => 0x02C7,
        0x1A => 0x02C6,
        0x1B => 0x02D9,
        0x1C => 0x02DD,
        0x1D => 0x02DB,
        0x1E => 0x02DA,
        0x1F => 0x02DC,
        0x80 => 0x2022,
        0x81 => 0x2020,
        0x82 => 0x2021,
        0x83 => 0x2026,
        0x84 => 0x2014,
        0x85 => 0x2013,
        0x86 => 0x0192,
        0x87 => 0x2044,
        0x88 => 0x2039,
        0x89 => 0x203A,
        0x8A => 0x2212,
        0x8B => 0x2030,
        0x8C => 0x201E,
        0x8D => 0x201C,
        0x8E => 0x201D,
        0x8F => 0x2018,
        0x90 => 0x2019,
        0x91 => 0x201A,
        0x92 => 0x2122,
        0x93 => 0xFB01,
        0x94 => 0xFB02,
        0x95 => 0x0141,
        0x96 => 0x0152,
        0x97 => 0x0160,
        0x98 => 0x0178,
        0x99 => 0x017D,
        0x9A => 0x0131,
        0x9B => 0x0142,
        0x9C => 0x0153,
        0x9D => 0x0161,
        0x9E => 0x017E,
        0xA0 => 0x20AC,
        other => other as u32,
    };
    char::from_u32(mapped).unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_round_trip() {
        let s = PdfString::from_text("Hello World");
        assert_eq!(s.as_bytes(), b"Hello World");
        assert_eq!(s.to_text(), "Hello World");
        assert_eq!(s.format(), StringFormat::Literal);
    }

    #[test]
    fn test_non_latin_text_uses_utf16() {
        let s = PdfString::from_text("Ωmega");
        assert_eq!(&s.as_bytes()[..2], &[0xFE, 0xFF]);
        assert_eq!(s.to_text(), "Ωmega");
    }

    #[test]
    fn test_latin1_stays_single_byte() {
        let s = PdfString::from_text("café");
        assert_eq!(s.as_bytes().len(), 4);
        assert_eq!(s.to_text(), "café");
    }

    #[test]
    fn test_utf8_bom_decoding() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("naïve".as_bytes());
        assert_eq!(PdfString::literal(bytes).to_text(), "naïve");
    }

    #[test]
    fn test_pdf_doc_encoding_specials() {
        let s = PdfString::literal(vec![0x80, b'a', 0x92]);
        assert_eq!(s.to_text(), "\u{2022}a\u{2122}");
    }

    #[test]
    fn test_odd_length_utf16_does_not_panic() {
        let s = PdfString::hexadecimal(vec![0xFE, 0xFF, 0x00, 0x41, 0x00]);
        assert!(s.to_text().starts_with('A'));
        assert_eq!(s.format(), StringFormat::Hexadecimal);
    }
}
