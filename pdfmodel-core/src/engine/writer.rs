use super::security::SecurityState;
use crate::encryption::EncryptOptions;
use crate::error::Result;
use crate::graph::Graph;
use crate::objects::{write_dictionary, write_object, Object, ObjectId, PdfString};
use rand::RngCore;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::debug;

/// Serializes a graph as a single revision with a classic xref table.
pub struct PdfWriter<W: Write> {
    writer: W,
    xref_positions: BTreeMap<u32, (u64, u16)>,
    current_position: u64,
}

impl<W: Write> PdfWriter<W> {
    pub fn new_with_writer(writer: W) -> Self {
        Self {
            writer,
            xref_positions: BTreeMap::new(),
            current_position: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes `graph`. With `encrypt` set, the output is encrypted with a
    /// fresh handler; otherwise a graph loaded from an encrypted file is
    /// written back under its original handler.
    pub fn write_graph(&mut self, graph: &Graph, encrypt: Option<&EncryptOptions>) -> Result<()> {
        let mut trailer = graph.trailer().clone();
        let mut max_number = graph.max_id();
        let mut extra: Vec<(ObjectId, Object)> = Vec::new();
        let mut skip: Option<ObjectId> = None;

        let security = match encrypt {
            Some(options) => {
                let doc_id = document_id(&trailer);
                let mut state = SecurityState::create(options, &doc_id)?;
                skip = graph
                    .security
                    .as_ref()
                    .and_then(SecurityState::encrypt_id)
                    .or_else(|| trailer.get_reference("Encrypt"));
                max_number += 1;
                let encrypt_id = ObjectId::new(max_number, 0);
                state.set_encrypt_id(encrypt_id);
                extra.push((encrypt_id, Object::Dictionary(state.handler().to_dictionary())));
                trailer.set("Encrypt", encrypt_id);
                trailer.set(
                    "ID",
                    vec![
                        Object::String(PdfString::hexadecimal(doc_id.clone())),
                        Object::String(PdfString::hexadecimal(doc_id)),
                    ],
                );
                Some(state)
            }
            None => graph.security.clone(),
        };

        self.write_header(graph.version())?;

        for (id, object) in graph.iter() {
            if Some(*id) == skip {
                continue;
            }
            match &security {
                Some(state) => {
                    let mut object = object.clone();
                    state.encrypt_object(*id, &mut object)?;
                    self.write_object(*id, &object)?;
                }
                None => self.write_object(*id, object)?,
            }
        }
        for (id, object) in &extra {
            self.write_object(*id, object)?;
        }

        let xref_position = self.current_position;
        self.write_xref(max_number)?;

        for key in ["Prev", "XRefStm", "Length", "Filter", "DecodeParms", "W", "Index", "Type"] {
            trailer.remove(key);
        }
        trailer.set("Size", max_number as i64 + 1);
        let mut body = b"trailer\n".to_vec();
        write_dictionary(&mut body, &trailer)?;
        self.write_bytes(&body)?;
        self.write_bytes(format!("\nstartxref\n{xref_position}\n%%EOF\n").as_bytes())?;
        self.writer.flush()?;
        debug!(
            "Wrote {} objects, encrypted: {}",
            self.xref_positions.len(),
            security.is_some()
        );
        Ok(())
    }

    fn write_header(&mut self, version: &str) -> Result<()> {
        self.write_bytes(format!("%PDF-{version}\n").as_bytes())?;
        // Binary comment to ensure file is treated as binary
        self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])?;
        Ok(())
    }

    fn write_object(&mut self, id: ObjectId, object: &Object) -> Result<()> {
        self.xref_positions
            .insert(id.number(), (self.current_position, id.generation()));

        let header = format!("{} {} obj\n", id.number(), id.generation());
        self.write_bytes(header.as_bytes())?;

        let mut body = Vec::new();
        write_object(&mut body, object)?;
        self.write_bytes(&body)?;

        self.write_bytes(b"\nendobj\n")?;
        Ok(())
    }

    fn write_xref(&mut self, max_number: u32) -> Result<()> {
        self.write_bytes(b"xref\n")?;
        self.write_bytes(format!("0 {}\n", max_number + 1).as_bytes())?;

        // Write free object entry
        self.write_bytes(b"0000000000 65535 f \n")?;

        // Gaps become free entries
        for number in 1..=max_number {
            let entry = match self.xref_positions.get(&number) {
                Some((position, generation)) => format!("{position:010} {generation:05} n \n"),
                None => "0000000000 00001 f \n".to_string(),
            };
            self.write_bytes(entry.as_bytes())?;
        }
        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.current_position += data.len() as u64;
        Ok(())
    }
}

/// First `/ID` entry of the trailer, or 16 fresh random bytes.
fn document_id(trailer: &crate::objects::Dictionary) -> Vec<u8> {
    trailer
        .get("ID")
        .and_then(Object::as_array)
        .and_then(|ids| ids.first())
        .and_then(Object::as_pdf_string)
        .map(|s| s.as_bytes().to_vec())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| {
            let mut id = vec![0u8; 16];
            rand::thread_rng().fill_bytes(&mut id);
            id
        })
}

/// Serializes `graph` into a fresh buffer.
pub fn write_graph(graph: &Graph, encrypt: Option<&EncryptOptions>) -> Result<Vec<u8>> {
    let mut writer = PdfWriter::new_with_writer(Vec::new());
    writer.write_graph(graph, encrypt)?;
    Ok(writer.into_inner())
}
