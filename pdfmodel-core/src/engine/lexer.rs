//! PDF Lexer
//!
//! Tokenizes PDF syntax according to ISO 32000-1 Section 7.2, over an
//! in-memory byte slice so the parser can seek to cross-reference offsets.

use crate::error::{PdfError, Result};
use crate::objects::PdfString;

/// PDF Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Boolean: true or false
    Boolean(bool),

    /// Integer number
    Integer(i64),

    /// Real number
    Real(f64),

    /// String (literal or hexadecimal)
    String(PdfString),

    /// Name object (e.g., /Type)
    Name(String),

    /// Left square bracket [
    ArrayStart,

    /// Right square bracket ]
    ArrayEnd,

    /// Dictionary start <<
    DictStart,

    /// Dictionary end >>
    DictEnd,

    /// Bare keyword: obj, endobj, stream, R, xref, trailer, ...
    Keyword(String),

    /// Null object
    Null,

    /// End of input
    Eof,
}

pub fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\r' | b'\n' | b'\x0C' | b'\0')
}

pub fn is_delimiter(ch: u8) -> bool {
    matches!(
        ch,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Lexer over a complete PDF buffer.
pub struct Lexer<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn at(data: &'a [u8], position: usize) -> Self {
        Self {
            data,
            position: position.min(data.len()),
        }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.data.len());
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.position += 1;
        Some(ch)
    }

    fn error(&self, message: impl Into<String>) -> PdfError {
        PdfError::Syntax {
            position: self.position,
            message: message.into(),
        }
    }

    /// Skips whitespace and comments.
    pub fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if is_whitespace(ch) {
                self.position += 1;
            } else if ch == b'%' {
                while let Some(ch) = self.peek() {
                    if ch == b'\n' || ch == b'\r' {
                        break;
                    }
                    self.position += 1;
                }
            } else {
                break;
            }
        }
    }

    /// Consumes the end-of-line marker that follows the `stream` keyword.
    pub fn skip_stream_eol(&mut self) {
        match self.peek() {
            Some(b'\r') => {
                self.position += 1;
                if self.peek() == Some(b'\n') {
                    self.position += 1;
                }
            }
            Some(b'\n') => self.position += 1,
            // Some writers put spaces before the line break
            Some(b' ') => {
                let rest = &self.data[self.position..];
                let spaces = rest.iter().take_while(|&&b| b == b' ').count();
                if matches!(rest.get(spaces), Some(b'\r' | b'\n')) {
                    self.position += spaces;
                    self.skip_stream_eol();
                }
            }
            _ => {}
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        match ch {
            b'/' => self.read_name(),
            b'(' => self.read_literal_string(),
            b'<' => {
                if self.data.get(self.position + 1) == Some(&b'<') {
                    self.position += 2;
                    Ok(Token::DictStart)
                } else {
                    self.read_hex_string()
                }
            }
            b'>' => {
                if self.data.get(self.position + 1) == Some(&b'>') {
                    self.position += 2;
                    Ok(Token::DictEnd)
                } else {
                    Err(self.error("Expected '>' after '>'"))
                }
            }
            b'[' => {
                self.position += 1;
                Ok(Token::ArrayStart)
            }
            b']' => {
                self.position += 1;
                Ok(Token::ArrayEnd)
            }
            b'+' | b'-' | b'0'..=b'9' | b'.' => self.read_number(),
            _ if ch.is_ascii_alphabetic() => {
                let word = self.read_word();
                Ok(match word.as_str() {
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    "null" => Token::Null,
                    _ => Token::Keyword(word),
                })
            }
            _ => Err(self.error(format!("Unexpected character: {}", ch as char))),
        }
    }

    /// Read a name object (e.g., /Type)
    fn read_name(&mut self) -> Result<Token> {
        self.position += 1;
        let mut name = String::new();

        while let Some(ch) = self.peek() {
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.position += 1;

            // Hex codes in names (e.g., /A#20B means /A B)
            if ch == b'#' {
                let hex = self
                    .data
                    .get(self.position..self.position + 2)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(value) => {
                        self.position += 2;
                        name.push(value as char);
                    }
                    None => name.push('#'),
                }
            } else {
                name.push(ch as char);
            }
        }

        Ok(Token::Name(name))
    }

    /// Read a literal string (parentheses)
    fn read_literal_string(&mut self) -> Result<Token> {
        self.position += 1;
        let mut string = Vec::new();
        let mut depth = 1;

        loop {
            let ch = self.bump().ok_or_else(|| self.error("Unterminated string"))?;
            match ch {
                b'\\' => {
                    let escaped = self.bump().ok_or_else(|| self.error("Unterminated string"))?;
                    match escaped {
                        b'n' => string.push(b'\n'),
                        b'r' => string.push(b'\r'),
                        b't' => string.push(b'\t'),
                        b'b' => string.push(0x08),
                        b'f' => string.push(0x0C),
                        b'0'..=b'7' => {
                            let mut value = (escaped - b'0') as u32;
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        self.position += 1;
                                        value = value * 8 + (d - b'0') as u32;
                                    }
                                    _ => break,
                                }
                            }
                            string.push(value as u8);
                        }
                        // Line continuation
                        b'\r' => {
                            if self.peek() == Some(b'\n') {
                                self.position += 1;
                            }
                        }
                        b'\n' => {}
                        other => string.push(other),
                    }
                }
                b'(' => {
                    depth += 1;
                    string.push(ch);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    string.push(ch);
                }
                _ => string.push(ch),
            }
        }

        Ok(Token::String(PdfString::literal(string)))
    }

    fn read_hex_string(&mut self) -> Result<Token> {
        self.position += 1;
        let mut digits = Vec::new();

        loop {
            let ch = self
                .bump()
                .ok_or_else(|| self.error("Unterminated hex string"))?;
            match ch {
                b'>' => break,
                _ if ch.is_ascii_hexdigit() => digits.push(ch),
                _ if is_whitespace(ch) => {}
                _ => return Err(self.error("Invalid character in hex string")),
            }
        }

        // Pad with 0 if odd number of digits
        if digits.len() % 2 != 0 {
            digits.push(b'0');
        }
        let bytes = digits
            .chunks(2)
            .map(|pair| (hex_value(pair[0]) << 4) | hex_value(pair[1]))
            .collect::<Vec<u8>>();

        Ok(Token::String(PdfString::hexadecimal(bytes)))
    }

    /// Read a number (integer or real)
    fn read_number(&mut self) -> Result<Token> {
        let start = self.position;
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.position += 1;
        }
        let mut has_dot = false;
        while let Some(ch) = self.peek() {
            match ch {
                b'0'..=b'9' => self.position += 1,
                b'.' if !has_dot => {
                    has_dot = true;
                    self.position += 1;
                }
                // Some writers emit "--5" or "1.2.3"; stop at the second marker
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.data[start..self.position])
            .map_err(|_| self.error("Invalid number"))?;
        let text = text.trim_start_matches('+');

        if text.is_empty() || text == "-" || text == "." || text == "-." {
            // A lone sign or dot reads as zero
            return Ok(Token::Integer(0));
        }
        if has_dot {
            text.parse::<f64>()
                .map(Token::Real)
                .map_err(|_| self.error(format!("Invalid real number: '{text}'")))
        } else {
            match text.parse::<i64>() {
                Ok(value) => Ok(Token::Integer(value)),
                // Out of range integers degrade to reals
                Err(_) => text
                    .parse::<f64>()
                    .map(Token::Real)
                    .map_err(|_| self.error(format!("Invalid integer: '{text}'"))),
            }
        }
    }

    /// Read a word (sequence of non-delimiter characters)
    fn read_word(&mut self) -> String {
        let start = self.position;
        while let Some(ch) = self.peek() {
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.position += 1;
        }
        String::from_utf8_lossy(&self.data[start..self.position]).into_owned()
    }
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::StringFormat;

    fn tokens(input: &[u8]) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                break;
            }
            out.push(token);
        }
        out
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            tokens(b"<< /Type /Page /Count 3 >> [1.5 -2 true null]"),
            vec![
                Token::DictStart,
                Token::Name("Type".into()),
                Token::Name("Page".into()),
                Token::Name("Count".into()),
                Token::Integer(3),
                Token::DictEnd,
                Token::ArrayStart,
                Token::Real(1.5),
                Token::Integer(-2),
                Token::Boolean(true),
                Token::Null,
                Token::ArrayEnd,
            ]
        );
    }

    #[test]
    fn test_keywords_and_comments() {
        assert_eq!(
            tokens(b"%PDF-1.7\n12 0 obj % trailing\nendobj"),
            vec![
                Token::Integer(12),
                Token::Integer(0),
                Token::Keyword("obj".into()),
                Token::Keyword("endobj".into()),
            ]
        );
    }

    #[test]
    fn test_literal_string_escapes() {
        let t = tokens(b"(a\\(b\\) \\101 (nested) line\\\ncont)");
        match &t[0] {
            Token::String(s) => {
                assert_eq!(s.as_bytes(), b"a(b) A (nested) linecont");
                assert_eq!(s.format(), StringFormat::Literal);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_hex_string() {
        match &tokens(b"<48 65 6C6C 6F7>")[0] {
            Token::String(s) => {
                assert_eq!(s.as_bytes(), b"Hellop");
                assert_eq!(s.format(), StringFormat::Hexadecimal);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_name_hex_escape() {
        assert_eq!(tokens(b"/A#20B"), vec![Token::Name("A B".into())]);
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let mut lexer = Lexer::new(b"(never closed");
        assert!(matches!(
            lexer.next_token(),
            Err(PdfError::Syntax { .. })
        ));
    }

    #[test]
    fn test_stream_eol() {
        let data = b"stream\r\nBODY";
        let mut lexer = Lexer::new(data);
        assert_eq!(lexer.next_token().unwrap(), Token::Keyword("stream".into()));
        lexer.skip_stream_eol();
        assert_eq!(&data[lexer.position()..], b"BODY");
    }
}
