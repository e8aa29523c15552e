//! Builds a [`Graph`] from file bytes
//!
//! Reads the header, the cross-reference chain (or rebuilds it by
//! scanning for object headers when it is damaged), every live object,
//! the standard security handler and any object streams.

use super::parser::Parser;
use super::security::SecurityState;
use super::xref::{XrefEntry, XrefTable};
use crate::error::{PdfError, Result};
use crate::graph::Graph;
use crate::objects::{Dictionary, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Parses `data` into a graph, authenticating with `password` when the
/// file is encrypted. An empty user password is always tried as well.
pub fn read_graph(data: &[u8], password: Option<&str>) -> Result<Graph> {
    let header_version = read_header(data)?;

    let (mut objects, compressed, mut trailer) = match XrefTable::load(data) {
        Ok(table) => {
            let (entries, trailer) = table.into_parts();
            let (objects, compressed) = read_entries(data, &entries);
            (objects, compressed, trailer)
        }
        Err(e) => {
            warn!("Cross-reference data unusable ({}), scanning for objects", e);
            let (objects, trailer) = recover(data)?;
            (objects, BTreeMap::new(), trailer)
        }
    };

    let security = open_security(&mut objects, &trailer, password)?;

    expand_object_streams(&mut objects, &compressed);

    objects.retain(|_, object| {
        !object
            .as_stream()
            .is_some_and(|s| s.dictionary().has_type("XRef") || s.dictionary().has_type("ObjStm"))
    });

    let version = catalog_version(&objects, &trailer)
        .filter(|v| version_number(v) > version_number(&header_version))
        .unwrap_or(header_version);

    normalize_trailer(&mut trailer);
    let mut graph = Graph::new(version);
    graph.set_trailer(trailer);
    for (id, object) in objects {
        graph.insert(id, object);
    }
    graph.security = security;
    debug!(
        "Loaded {} objects (PDF {}), encrypted: {}",
        graph.len(),
        graph.version(),
        graph.security.is_some()
    );
    Ok(graph)
}

/// Version from the `%PDF-x.y` marker within the first kilobyte.
pub fn read_header(data: &[u8]) -> Result<String> {
    let window = &data[..data.len().min(1024)];
    let start = window
        .windows(5)
        .position(|w| w == b"%PDF-")
        .ok_or_else(|| PdfError::Engine("not a PDF file: missing %PDF header".into()))?;
    let version: String = window[start + 5..]
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b'.')
        .map(|&b| b as char)
        .collect();
    if version.is_empty() {
        return Err(PdfError::Engine("not a PDF file: malformed %PDF header".into()));
    }
    Ok(version)
}

fn version_number(version: &str) -> (u32, u32) {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().unwrap_or(0));
    (parts.next().unwrap_or(0), parts.next().unwrap_or(0))
}

fn catalog_version(objects: &BTreeMap<ObjectId, Object>, trailer: &Dictionary) -> Option<String> {
    let root = trailer.get_reference("Root")?;
    objects
        .get(&root)?
        .as_dict()?
        .get_name("Version")
        .map(str::to_string)
}

/// Bookkeeping keys that only describe the file layout just read.
fn normalize_trailer(trailer: &mut Dictionary) {
    for key in ["Prev", "XRefStm", "Length", "Filter", "DecodeParms", "W", "Index", "Type"] {
        trailer.remove(key);
    }
}

type ObjectMap = BTreeMap<ObjectId, Object>;

fn read_entries(data: &[u8], entries: &BTreeMap<u32, XrefEntry>) -> (ObjectMap, BTreeMap<u32, u32>) {
    let mut objects = BTreeMap::new();
    let mut compressed = BTreeMap::new();

    // Resolves an indirect /Length by reading the referenced integer
    let length_of = |id: ObjectId| -> Option<i64> {
        match entries.get(&id.number())? {
            XrefEntry::InUse { offset, .. } => {
                match Parser::at(data, *offset).parse_indirect(&|_| None).ok()? {
                    (_, Object::Integer(n)) => Some(n),
                    _ => None,
                }
            }
            _ => None,
        }
    };

    for (&number, entry) in entries {
        match *entry {
            XrefEntry::Free => {}
            XrefEntry::Compressed { container, .. } => {
                compressed.insert(number, container);
            }
            XrefEntry::InUse { offset, generation } => {
                if number == 0 {
                    continue;
                }
                match Parser::at(data, offset).parse_indirect(&length_of) {
                    Ok((id, object)) if id.number() == number => {
                        if id.generation() != generation {
                            debug!("Object {} found with generation {}", number, id.generation());
                        }
                        objects.insert(id, object);
                    }
                    Ok((id, _)) => {
                        warn!("xref entry {} points at object {}, skipping", number, id);
                    }
                    Err(e) => {
                        warn!("Failed to parse object {} at offset {}: {}", number, offset, e);
                    }
                }
            }
        }
    }
    (objects, compressed)
}

/// Rebuilds the object table by scanning for `num gen obj` headers.
fn recover(data: &[u8]) -> Result<(ObjectMap, Dictionary)> {
    let mut objects = BTreeMap::new();
    let mut resume = 0usize;
    let mut i = 0usize;

    while let Some(found) = find(data, b"obj", i) {
        i = found + 3;
        if found < resume || (found >= 3 && &data[found - 3..found] == b"end") {
            continue;
        }
        if data.get(found + 3).is_some_and(|b| b.is_ascii_alphanumeric()) {
            continue;
        }
        let Some(start) = header_start(data, found) else {
            continue;
        };
        let mut parser = Parser::at(data, start);
        match parser.parse_indirect(&|_| None) {
            Ok((id, object)) => {
                // Later definitions belong to later revisions
                objects.insert(id, object);
                resume = parser.position();
            }
            Err(e) => debug!("Recovery skipped candidate at {}: {}", start, e),
        }
    }

    if objects.is_empty() {
        return Err(PdfError::Engine("no objects found in file".into()));
    }

    let trailer = recover_trailer(data, &objects)?;
    Ok((objects, trailer))
}

fn find(data: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    data.get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Walks back from `obj` over `gen` and `num` to the header start.
fn header_start(data: &[u8], obj: usize) -> Option<usize> {
    let mut pos = obj;
    let skip_ws = |mut p: usize| {
        while p > 0 && data[p - 1].is_ascii_whitespace() {
            p -= 1;
        }
        p
    };
    let skip_digits = |mut p: usize| {
        let end = p;
        while p > 0 && data[p - 1].is_ascii_digit() {
            p -= 1;
        }
        (p < end).then_some(p)
    };
    pos = skip_ws(pos);
    pos = skip_digits(pos)?;
    let before_gen = skip_ws(pos);
    if before_gen == pos {
        return None;
    }
    let start = skip_digits(before_gen)?;
    if start > 0 && !matches!(data[start - 1], b'\n' | b'\r' | b' ' | b'\t' | b'>' | b']' | b')')
    {
        return None;
    }
    Some(start)
}

fn recover_trailer(data: &[u8], objects: &ObjectMap) -> Result<Dictionary> {
    let mut trailer = Dictionary::new();
    let mut from = 0;
    while let Some(found) = find(data, b"trailer", from) {
        from = found + 7;
        if let Ok(Object::Dictionary(dict)) = Parser::at(data, from).parse_object() {
            for (key, value) in dict {
                trailer.set(key, value);
            }
        }
    }
    if trailer.contains_key("Root") {
        return Ok(trailer);
    }

    if let Some(dict) = objects.values().rev().find_map(|object| {
        object
            .as_stream()
            .map(|s| s.dictionary())
            .filter(|d| d.has_type("XRef") && d.contains_key("Root"))
    }) {
        return Ok(dict.clone());
    }

    let catalog = objects
        .iter()
        .find(|(_, object)| object.as_dict().is_some_and(|d| d.has_type("Catalog")))
        .map(|(id, _)| *id)
        .ok_or_else(|| PdfError::InvalidStructure("no document catalog found".into()))?;
    trailer.set("Root", catalog);
    Ok(trailer)
}

fn open_security(
    objects: &mut ObjectMap,
    trailer: &Dictionary,
    password: Option<&str>,
) -> Result<Option<SecurityState>> {
    let (encrypt_id, dict) = match trailer.get("Encrypt") {
        None => return Ok(None),
        Some(Object::Reference(id)) => match objects.get(id).and_then(Object::as_dict) {
            Some(dict) => (Some(*id), dict.clone()),
            None => {
                return Err(PdfError::InvalidStructure(format!(
                    "encryption dictionary {id} is missing"
                )))
            }
        },
        Some(Object::Dictionary(dict)) => (None, dict.clone()),
        Some(other) => {
            return Err(PdfError::InvalidStructure(format!(
                "/Encrypt is a {}",
                other.object_type()
            )))
        }
    };
    let doc_id = trailer
        .get("ID")
        .and_then(Object::as_array)
        .and_then(|ids| ids.first())
        .and_then(Object::as_pdf_string)
        .map(|s| s.as_bytes().to_vec())
        .unwrap_or_default();

    let mut candidates: Vec<&[u8]> = Vec::new();
    if let Some(password) = password {
        candidates.push(password.as_bytes());
    }
    candidates.push(b"");

    let mut state = None;
    for candidate in candidates {
        if let Some(opened) = SecurityState::open(&dict, &doc_id, candidate, encrypt_id)? {
            state = Some(opened);
            break;
        }
    }
    let state = state.ok_or(PdfError::InvalidPassword)?;

    for (id, object) in objects.iter_mut() {
        state.decrypt_object(*id, object);
    }
    Ok(Some(state))
}

fn expand_object_streams(objects: &mut ObjectMap, compressed: &BTreeMap<u32, u32>) {
    let containers: Vec<ObjectId> = objects
        .iter()
        .filter(|(_, object)| {
            object
                .as_stream()
                .is_some_and(|s| s.dictionary().has_type("ObjStm"))
        })
        .map(|(id, _)| *id)
        .collect();

    for container in containers {
        let Some(stream) = objects.get(&container).and_then(Object::as_stream) else {
            continue;
        };
        let members = match read_object_stream(stream.dictionary(), stream.decoded_content()) {
            Ok(members) => members,
            Err(e) => {
                warn!("Failed to expand object stream {}: {}", container, e);
                continue;
            }
        };
        for (number, object) in members {
            let id = ObjectId::new(number, 0);
            let listed_here = compressed.get(&number) == Some(&container.number());
            // Without an xref entry, keep any direct definition found elsewhere
            if listed_here || (!compressed.contains_key(&number) && !objects.contains_key(&id)) {
                objects.insert(id, object);
            }
        }
    }
}

fn read_object_stream(dict: &Dictionary, content: Result<Vec<u8>>) -> Result<Vec<(u32, Object)>> {
    let content = content?;
    let count = dict.get_integer("N").unwrap_or(0).max(0) as usize;
    let first = dict.get_integer("First").unwrap_or(0).max(0) as usize;
    let mut header = Parser::new(&content[..first.min(content.len())]);
    // Each header pair takes at least four bytes
    let mut offsets = Vec::with_capacity(count.min(first / 4));
    for _ in 0..count {
        match (header.parse_object(), header.parse_object()) {
            (Ok(Object::Integer(number)), Ok(Object::Integer(offset))) => {
                match (u32::try_from(number), usize::try_from(offset)) {
                    (Ok(number), Ok(offset)) => offsets.push((number, offset)),
                    _ => debug!("Skipping object stream member {} at {}", number, offset),
                }
            }
            _ => break,
        }
    }

    let mut members = Vec::with_capacity(offsets.len());
    for (number, offset) in offsets {
        match Parser::at(&content, first + offset).parse_object() {
            Ok(object) => members.push((number, object)),
            Err(e) => warn!("Object {} in object stream unreadable: {}", number, e),
        }
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_pdf(with_xref: bool) -> Vec<u8> {
        pdf_with_catalog("<< /Type /Catalog /Pages 2 0 R >>", with_xref)
    }

    fn pdf_with_catalog(catalog: &str, with_xref: bool) -> Vec<u8> {
        let bodies = [
            catalog,
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>",
        ];
        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in bodies.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }
        if with_xref {
            let xref = pdf.len();
            pdf.extend_from_slice(b"xref\n0 4\n0000000000 65535 f \n");
            for offset in offsets {
                pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
            }
            pdf.extend_from_slice(
                format!("trailer\n<< /Size 4 /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n").as_bytes(),
            );
        } else {
            pdf.extend_from_slice(b"trailer\n<< /Root 1 0 R >>\n%%EOF\n");
        }
        pdf
    }

    #[test]
    fn test_read_minimal() {
        let graph = read_graph(&minimal_pdf(true), None).unwrap();
        assert_eq!(graph.version(), "1.4");
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.page_ids().unwrap(), vec![ObjectId::new(3, 0)]);
    }

    #[test]
    fn test_recovery_without_xref() {
        let graph = read_graph(&minimal_pdf(false), None).unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.catalog_id().unwrap(), ObjectId::new(1, 0));
    }

    #[test]
    fn test_missing_header() {
        let err = read_graph(b"hello world", None).unwrap_err();
        assert!(matches!(err, PdfError::Engine(_)));
    }

    #[test]
    fn test_header_start() {
        let data = b"junk\n12 0 obj";
        assert_eq!(header_start(data, 10), Some(5));
        assert_eq!(header_start(b"x12 0 obj", 6), None);
    }

    #[test]
    fn test_object_stream_members() {
        let content = b"10 0 11 4 42  (hi)".to_vec();
        let mut dict = Dictionary::new();
        dict.set("N", 2);
        dict.set("First", 10);
        let members = read_object_stream(&dict, Ok(content)).unwrap();
        assert_eq!(members[0], (10, Object::Integer(42)));
        assert_eq!(members[1].0, 11);
    }

    #[test]
    fn test_catalog_version_upgrade() {
        let pdf = pdf_with_catalog("<< /Type /Catalog /Pages 2 0 R /Version /1.7 >>", true);
        assert_eq!(read_graph(&pdf, None).unwrap().version(), "1.7");

        let pdf = pdf_with_catalog("<< /Type /Catalog /Pages 2 0 R /Version /1.2 >>", true);
        assert_eq!(read_graph(&pdf, None).unwrap().version(), "1.4");
    }
}
