//! PDF object syntax output (ISO 32000-1 Section 7.3)

use crate::objects::{Dictionary, Object, PdfString, StringFormat};
use std::io::{self, Write};

impl Object {
    /// Renders the object in PDF syntax. Streams include their dictionary,
    /// the `stream` keyword and the stored bytes.
    pub fn to_pdf_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = write_object(&mut out, self);
        out
    }
}

pub fn write_object<W: Write>(out: &mut W, object: &Object) -> io::Result<()> {
    match object {
        Object::Null => out.write_all(b"null"),
        Object::Boolean(b) => out.write_all(if *b { b"true" } else { b"false" }),
        Object::Integer(i) => write!(out, "{i}"),
        Object::Real(f) => out.write_all(format_real(*f).as_bytes()),
        Object::String(s) => write_string(out, s),
        Object::Name(n) => write_name(out, n),
        Object::Array(items) => {
            out.write_all(b"[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_all(b" ")?;
                }
                write_object(out, item)?;
            }
            out.write_all(b"]")
        }
        Object::Dictionary(dict) => write_dictionary(out, dict),
        Object::Stream(stream) => {
            let mut dict = stream.dictionary().clone();
            dict.set("Length", stream.raw_content().len());
            write_dictionary(out, &dict)?;
            out.write_all(b"\nstream\n")?;
            out.write_all(stream.raw_content())?;
            out.write_all(b"\nendstream")
        }
        Object::Reference(id) => write!(out, "{} {} R", id.number(), id.generation()),
    }
}

pub fn write_dictionary<W: Write>(out: &mut W, dict: &Dictionary) -> io::Result<()> {
    out.write_all(b"<<")?;
    for (key, value) in dict.iter() {
        write_name(out, key)?;
        out.write_all(b" ")?;
        write_object(out, value)?;
        out.write_all(b" ")?;
    }
    out.write_all(b">>")
}

fn write_name<W: Write>(out: &mut W, name: &str) -> io::Result<()> {
    out.write_all(b"/")?;
    for ch in name.chars() {
        let code = ch as u32;
        let delimiter = matches!(ch, '(' | ')' | '<' | '>' | '[' | ']' | '{' | '}' | '/' | '%' | '#');
        if code > 0x20 && code < 0x7F && !delimiter {
            out.write_all(&[code as u8])?;
        } else if code < 0x100 {
            write!(out, "#{code:02X}")?;
        } else {
            let mut buf = [0u8; 4];
            for byte in ch.encode_utf8(&mut buf).bytes() {
                write!(out, "#{byte:02X}")?;
            }
        }
    }
    Ok(())
}

fn write_string<W: Write>(out: &mut W, s: &PdfString) -> io::Result<()> {
    match s.format() {
        StringFormat::Hexadecimal => {
            out.write_all(b"<")?;
            for byte in s.as_bytes() {
                write!(out, "{byte:02X}")?;
            }
            out.write_all(b">")
        }
        StringFormat::Literal => {
            out.write_all(b"(")?;
            for &byte in s.as_bytes() {
                match byte {
                    b'(' | b')' | b'\\' => out.write_all(&[b'\\', byte])?,
                    b'\r' => out.write_all(b"\\r")?,
                    b'\n' => out.write_all(b"\\n")?,
                    _ => out.write_all(&[byte])?,
                }
            }
            out.write_all(b")")
        }
    }
}

fn format_real(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{value:.1}");
    }
    let text = format!("{value:.6}");
    let trimmed = text.trim_end_matches('0');
    trimmed.strip_suffix('.').unwrap_or(trimmed).to_string()
}
