use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object};

#[cfg(feature = "compression")]
use flate2::read::ZlibDecoder;
#[cfg(feature = "compression")]
use std::io::Read;

/// A stream node: its dictionary plus the content bytes as stored in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    dictionary: Dictionary,
    content: Vec<u8>,
}

impl Stream {
    pub fn new(mut dictionary: Dictionary, content: Vec<u8>) -> Self {
        dictionary.set("Length", content.len());
        Self {
            dictionary,
            content,
        }
    }

    /// Wraps bytes read from a file, keeping the dictionary as found.
    pub(crate) fn from_raw(dictionary: Dictionary, content: Vec<u8>) -> Self {
        Self {
            dictionary,
            content,
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }

    /// Content exactly as stored, filters still applied.
    pub fn raw_content(&self) -> &[u8] {
        &self.content
    }

    pub fn set_content(&mut self, content: Vec<u8>) {
        self.dictionary.set("Length", content.len());
        self.content = content;
    }

    /// Replaces stored bytes without touching the dictionary.
    pub(crate) fn replace_raw(&mut self, content: Vec<u8>) {
        self.content = content;
    }

    pub fn filters(&self) -> Vec<String> {
        match self.dictionary.get("Filter") {
            Some(Object::Name(name)) => vec![name.clone()],
            Some(Object::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_name().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Content with every filter in `/Filter` undone.
    pub fn decoded_content(&self) -> Result<Vec<u8>> {
        let filters = self.filters();
        let params = decode_params(&self.dictionary, filters.len());
        let mut data = self.content.clone();
        for (filter, params) in filters.iter().zip(params) {
            data = apply_filter(filter, &data)?;
            if let Some(params) = params {
                data = apply_predictor(&data, &params)?;
            }
        }
        Ok(data)
    }

    /// Empties the stream and drops its filters.
    pub fn clear(&mut self) {
        self.dictionary.remove("Filter");
        self.dictionary.remove("DecodeParms");
        self.set_content(Vec::new());
    }
}

fn decode_params(dict: &Dictionary, count: usize) -> Vec<Option<Dictionary>> {
    match dict.get("DecodeParms") {
        Some(Object::Dictionary(params)) => {
            let mut list = vec![Some(params.clone())];
            list.resize(count.max(1), None);
            list
        }
        Some(Object::Array(items)) => {
            let mut list: Vec<Option<Dictionary>> =
                items.iter().map(|item| item.as_dict().cloned()).collect();
            list.resize(count, None);
            list
        }
        _ => vec![None; count],
    }
}

fn apply_filter(filter: &str, data: &[u8]) -> Result<Vec<u8>> {
    match filter {
        "FlateDecode" | "Fl" => decode_flate(data),
        "ASCIIHexDecode" | "AHx" => decode_ascii_hex(data),
        "ASCII85Decode" | "A85" => decode_ascii85(data),
        other => Err(PdfError::Engine(format!("unsupported filter {other}"))),
    }
}

#[cfg(feature = "compression")]
fn decode_flate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut result = Vec::new();
    match decoder.read_to_end(&mut result) {
        Ok(_) => Ok(result),
        // Truncated zlib trailers are common; keep what inflated cleanly.
        Err(_) if !result.is_empty() => Ok(result),
        Err(e) => Err(PdfError::Engine(format!("Flate decode error: {e}"))),
    }
}

#[cfg(not(feature = "compression"))]
fn decode_flate(_data: &[u8]) -> Result<Vec<u8>> {
    Err(PdfError::Engine(
        "FlateDecode requires the 'compression' feature".to_string(),
    ))
}

fn decode_ascii_hex(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;
    for &ch in data {
        if ch == b'>' {
            break;
        }
        if ch.is_ascii_whitespace() {
            continue;
        }
        let value = (ch as char)
            .to_digit(16)
            .ok_or_else(|| PdfError::Engine(format!("invalid hex digit {:?}", ch as char)))?
            as u8;
        match high.take() {
            Some(h) => result.push(h << 4 | value),
            None => high = Some(value),
        }
    }
    if let Some(h) = high {
        result.push(h << 4);
    }
    Ok(result)
}

fn decode_ascii85(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut filled = 0;
    let body = data.strip_prefix(b"<~").unwrap_or(data);
    for &ch in body {
        match ch {
            b'~' => break,
            b'z' if filled == 0 => result.extend_from_slice(&[0; 4]),
            b'!'..=b'u' => {
                group[filled] = ch - b'!';
                filled += 1;
                if filled == 5 {
                    result.extend_from_slice(&ascii85_group(&group));
                    filled = 0;
                }
            }
            c if c.is_ascii_whitespace() => {}
            other => {
                return Err(PdfError::Engine(format!(
                    "invalid ASCII85 character {:?}",
                    other as char
                )))
            }
        }
    }
    if filled > 1 {
        for slot in group.iter_mut().skip(filled) {
            *slot = 84;
        }
        result.extend_from_slice(&ascii85_group(&group)[..filled - 1]);
    }
    Ok(result)
}

fn ascii85_group(group: &[u8; 5]) -> [u8; 4] {
    let value = group
        .iter()
        .fold(0u64, |acc, &digit| acc * 85 + digit as u64) as u32;
    value.to_be_bytes()
}

/// Undoes a TIFF or PNG predictor described by decode parameters.
fn apply_predictor(data: &[u8], params: &Dictionary) -> Result<Vec<u8>> {
    let predictor = params.get_integer("Predictor").unwrap_or(1);
    if predictor < 10 {
        return Ok(data.to_vec());
    }
    let colors = params.get_integer("Colors").unwrap_or(1).max(1) as usize;
    let bits = params.get_integer("BitsPerComponent").unwrap_or(8).max(1) as usize;
    let columns = params.get_integer("Columns").unwrap_or(1).max(1) as usize;
    let overflow = || {
        PdfError::Engine(format!(
            "predictor row of {columns} columns x {colors} colors x {bits} bits is too large"
        ))
    };
    let sample_bits = colors.checked_mul(bits).ok_or_else(overflow)?;
    let bpp = sample_bits.div_ceil(8);
    let row_len = sample_bits.checked_mul(columns).ok_or_else(overflow)?.div_ceil(8);
    let chunk_len = row_len.checked_add(1).ok_or_else(overflow)?;
    // No decoded row can be longer than the data itself
    let width = row_len.min(data.len());

    let mut output = Vec::with_capacity(data.len());
    let mut previous = vec![0u8; width];
    for chunk in data.chunks(chunk_len) {
        if chunk.len() < 2 {
            break;
        }
        let filter = chunk[0];
        let mut row = chunk[1..].to_vec();
        for i in 0..row.len() {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = previous.get(i).copied().unwrap_or(0);
            let up_left = if i >= bpp {
                previous.get(i - bpp).copied().unwrap_or(0)
            } else {
                0
            };
            row[i] = match filter {
                0 => row[i],
                1 => row[i].wrapping_add(left),
                2 => row[i].wrapping_add(up),
                3 => row[i].wrapping_add(((left as u16 + up as u16) / 2) as u8),
                4 => row[i].wrapping_add(paeth(left, up, up_left)),
                other => {
                    return Err(PdfError::Engine(format!(
                        "unknown PNG predictor row filter {other}"
                    )))
                }
            };
        }
        output.extend_from_slice(&row);
        row.resize(width, 0);
        previous = row;
    }
    Ok(output)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
