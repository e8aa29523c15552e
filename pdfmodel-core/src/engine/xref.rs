//! Cross-reference sections
//!
//! Reads classic tables (ISO 32000-1 Section 7.5.4) and cross-reference
//! streams (Section 7.5.8), following `/Prev` and hybrid `/XRefStm`
//! links back to the oldest revision.

use super::lexer::Token;
use super::parser::Parser;
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Where an object lives in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    Free,
    InUse { offset: usize, generation: u16 },
    /// Object `index` inside object stream `container`
    Compressed { container: u32, index: u32 },
}

/// Merged view over every revision of the file.
#[derive(Debug, Clone, Default)]
pub struct XrefTable {
    entries: BTreeMap<u32, XrefEntry>,
    trailer: Dictionary,
}

impl XrefTable {
    pub fn entries(&self) -> &BTreeMap<u32, XrefEntry> {
        &self.entries
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    pub fn into_parts(self) -> (BTreeMap<u32, XrefEntry>, Dictionary) {
        (self.entries, self.trailer)
    }

    /// Later (newer) sections win: entries already present are kept.
    fn merge_older(&mut self, entries: BTreeMap<u32, XrefEntry>, trailer: &Dictionary) {
        for (number, entry) in entries {
            self.entries.entry(number).or_insert(entry);
        }
        for (key, value) in trailer.iter() {
            if !self.trailer.contains_key(key) {
                self.trailer.set(key.clone(), value.clone());
            }
        }
    }

    /// Reads the newest section and every section it links to.
    pub fn load(data: &[u8]) -> Result<Self> {
        let start = find_startxref(data)?;
        let mut table = XrefTable::default();
        let mut visited = HashSet::new();
        let mut pending = vec![start];

        while let Some(offset) = pending.pop() {
            if !visited.insert(offset) {
                debug!("Skipping already visited xref section at {}", offset);
                continue;
            }
            let section = read_section(data, offset)?;
            table.merge_older(section.entries, &section.trailer);

            // Hybrid files: the stream's entries take precedence over /Prev
            if let Some(prev) = offset_entry(&section.trailer, "Prev") {
                pending.push(prev);
            }
            if let Some(stm) = offset_entry(&section.trailer, "XRefStm") {
                pending.push(stm);
            }
        }

        if !table.trailer.contains_key("Root") {
            return Err(PdfError::InvalidStructure(
                "trailer has no /Root entry".into(),
            ));
        }
        Ok(table)
    }
}

struct Section {
    entries: BTreeMap<u32, XrefEntry>,
    trailer: Dictionary,
}

fn offset_entry(dict: &Dictionary, key: &str) -> Option<usize> {
    dict.get_integer(key)
        .filter(|&n| n >= 0)
        .map(|n| n as usize)
}

/// Offset recorded after the last `startxref` keyword.
pub fn find_startxref(data: &[u8]) -> Result<usize> {
    let window = data.len().saturating_sub(2048);
    let tail = &data[window..];
    let keyword = tail
        .windows(b"startxref".len())
        .rposition(|w| w == b"startxref")
        .ok_or_else(|| PdfError::InvalidStructure("startxref not found".into()))?;
    let mut parser = Parser::at(data, window + keyword + b"startxref".len());
    match parser.next_token()? {
        Token::Integer(offset) if offset >= 0 && (offset as usize) < data.len() => {
            Ok(offset as usize)
        }
        other => Err(PdfError::InvalidStructure(format!(
            "invalid startxref offset {other:?}"
        ))),
    }
}

fn read_section(data: &[u8], offset: usize) -> Result<Section> {
    let mut parser = Parser::at(data, offset);
    match parser.peek_token()? {
        Token::Keyword(k) if k == "xref" => {
            parser.next_token()?;
            read_table(&mut parser)
        }
        Token::Integer(_) => read_stream_section(&mut parser),
        other => Err(PdfError::InvalidStructure(format!(
            "no cross-reference section at offset {offset}: {other:?}"
        ))),
    }
}

fn read_table(parser: &mut Parser<'_>) -> Result<Section> {
    let mut entries = BTreeMap::new();
    loop {
        let first = match parser.next_token()? {
            Token::Keyword(k) if k == "trailer" => break,
            Token::Integer(n) => u32::try_from(n).map_err(|_| {
                PdfError::InvalidStructure(format!("xref subsection start {n} out of range"))
            })?,
            other => {
                return Err(PdfError::InvalidStructure(format!(
                    "malformed xref subsection header: {other:?}"
                )))
            }
        };
        let count = match parser.next_token()? {
            Token::Integer(n) => u32::try_from(n).map_err(|_| {
                PdfError::InvalidStructure(format!("xref subsection count {n} out of range"))
            })?,
            other => {
                return Err(PdfError::InvalidStructure(format!(
                    "malformed xref subsection count: {other:?}"
                )))
            }
        };
        for i in 0..count {
            let offset = parser.next_token()?;
            let generation = parser.next_token()?;
            let flag = parser.next_token()?;
            let entry = match (offset, generation, flag) {
                (Token::Integer(o), Token::Integer(g), Token::Keyword(f)) if f == "n" => {
                    XrefEntry::InUse {
                        offset: o.max(0) as usize,
                        generation: g.clamp(0, u16::MAX as i64) as u16,
                    }
                }
                (Token::Integer(_), Token::Integer(_), Token::Keyword(f)) if f == "f" => {
                    XrefEntry::Free
                }
                other => {
                    return Err(PdfError::InvalidStructure(format!(
                        "malformed xref entry: {other:?}"
                    )))
                }
            };
            let number = first.checked_add(i).ok_or_else(|| {
                PdfError::InvalidStructure(format!("xref subsection {first} {count} out of range"))
            })?;
            entries.insert(number, entry);
        }
    }

    let trailer = match parser.parse_object()? {
        Object::Dictionary(dict) => dict,
        other => {
            return Err(PdfError::InvalidStructure(format!(
                "trailer is a {}",
                other.object_type()
            )))
        }
    };
    Ok(Section { entries, trailer })
}

fn read_stream_section(parser: &mut Parser<'_>) -> Result<Section> {
    let (id, object) = parser.parse_indirect(&|_| None)?;
    let stream = match object {
        Object::Stream(stream) if stream.dictionary().has_type("XRef") => stream,
        _ => {
            return Err(PdfError::InvalidStructure(format!(
                "object {id} is not a cross-reference stream"
            )))
        }
    };
    let dict = stream.dictionary();
    let widths: Vec<usize> = dict
        .get("W")
        .and_then(Object::as_array)
        .map(|w| {
            w.iter()
                .map(|v| v.as_integer().unwrap_or(0).max(0) as usize)
                .collect()
        })
        .unwrap_or_default();
    if widths.len() != 3 {
        return Err(PdfError::InvalidStructure(
            "W array must have exactly 3 elements".into(),
        ));
    }
    let size = dict.get_integer("Size").unwrap_or(0).clamp(0, u32::MAX as i64) as u32;
    let index: Vec<(u32, u32)> = match dict.get("Index").and_then(Object::as_array) {
        Some(items) => items
            .chunks(2)
            .filter_map(|pair| match pair {
                [first, count] => Some((
                    u32::try_from(first.as_integer()?).ok()?,
                    u32::try_from(count.as_integer()?).ok()?,
                )),
                _ => None,
            })
            .collect(),
        None => vec![(0, size)],
    };

    let data = stream.decoded_content()?;
    let row = widths.iter().sum::<usize>();
    let mut entries = BTreeMap::new();
    let mut rows = data.chunks_exact(row.max(1));

    'sections: for (first, count) in index {
        for i in 0..count {
            let Some(bytes) = rows.next() else {
                break 'sections;
            };
            let (f0, rest) = bytes.split_at(widths[0]);
            let (f1, f2) = rest.split_at(widths[1]);
            // A zero-width type field defaults to 1
            let kind = if widths[0] == 0 { 1 } else { be_number(f0) };
            let entry = match kind {
                0 => XrefEntry::Free,
                1 => XrefEntry::InUse {
                    offset: be_number(f1) as usize,
                    generation: be_number(f2) as u16,
                },
                2 => match (u32::try_from(be_number(f1)), u32::try_from(be_number(f2))) {
                    (Ok(container), Ok(index)) => XrefEntry::Compressed { container, index },
                    _ => XrefEntry::Free,
                },
                // Unknown types are treated as null references
                _ => XrefEntry::Free,
            };
            let Some(number) = first.checked_add(i) else {
                break 'sections;
            };
            entries.insert(number, entry);
        }
    }

    let mut trailer = dict.clone();
    for key in ["Length", "Filter", "DecodeParms", "W", "Index", "Type"] {
        trailer.remove(key);
    }
    Ok(Section { entries, trailer })
}

fn be_number(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}
