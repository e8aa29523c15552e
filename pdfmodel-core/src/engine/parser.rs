//! Object parser on top of [`Lexer`]
//!
//! Builds [`Object`] values from tokens, resolving the `num gen R`
//! reference form with two tokens of lookahead, and reads indirect
//! object definitions including their stream bodies.

use super::lexer::{Lexer, Token};
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectId, Stream};
use std::collections::VecDeque;

/// Maximum nesting of arrays and dictionaries
const MAX_DEPTH: usize = 256;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: VecDeque<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::at(data, 0)
    }

    pub fn at(data: &'a [u8], position: usize) -> Self {
        Self {
            lexer: Lexer::at(data, position),
            peeked: VecDeque::new(),
        }
    }

    /// Byte offset after the last consumed token.
    pub fn position(&self) -> usize {
        self.lexer.position()
    }

    pub fn next_token(&mut self) -> Result<Token> {
        match self.peeked.pop_front() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(),
        }
    }

    fn peek_nth(&mut self, n: usize) -> Result<&Token> {
        while self.peeked.len() <= n {
            let token = self.lexer.next_token()?;
            self.peeked.push_back(token);
        }
        Ok(&self.peeked[n])
    }

    pub fn peek_token(&mut self) -> Result<&Token> {
        self.peek_nth(0)
    }

    pub fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        match self.next_token()? {
            Token::Keyword(k) if k == keyword => Ok(()),
            other => Err(PdfError::Syntax {
                position: self.position(),
                message: format!("Expected '{keyword}', found {other:?}"),
            }),
        }
    }

    pub fn parse_object(&mut self) -> Result<Object> {
        self.parse_nested(0)
    }

    fn parse_nested(&mut self, depth: usize) -> Result<Object> {
        if depth > MAX_DEPTH {
            return Err(PdfError::Syntax {
                position: self.position(),
                message: "Objects nested too deeply".to_string(),
            });
        }
        let token = self.next_token()?;
        self.object_from(token, depth)
    }

    fn object_from(&mut self, token: Token, depth: usize) -> Result<Object> {
        match token {
            Token::Null => Ok(Object::Null),
            Token::Boolean(b) => Ok(Object::Boolean(b)),
            Token::Real(r) => Ok(Object::Real(r)),
            Token::String(s) => Ok(Object::String(s)),
            Token::Name(n) => Ok(Object::Name(n)),
            Token::Integer(number) => {
                if let Some(id) = self.try_reference(number)? {
                    return Ok(Object::Reference(id));
                }
                Ok(Object::Integer(number))
            }
            Token::ArrayStart => {
                let mut items = Vec::new();
                loop {
                    match self.next_token()? {
                        Token::ArrayEnd => break,
                        Token::Eof => {
                            return Err(PdfError::Syntax {
                                position: self.position(),
                                message: "Unterminated array".to_string(),
                            })
                        }
                        token => items.push(self.object_from(token, depth + 1)?),
                    }
                }
                Ok(Object::Array(items))
            }
            Token::DictStart => Ok(Object::Dictionary(self.parse_dictionary_body(depth)?)),
            other => Err(PdfError::Syntax {
                position: self.position(),
                message: format!("Unexpected token {other:?}"),
            }),
        }
    }

    /// `num gen R` with both numbers in range
    fn try_reference(&mut self, number: i64) -> Result<Option<ObjectId>> {
        let generation = match self.peek_nth(0)? {
            Token::Integer(g) => *g,
            _ => return Ok(None),
        };
        if !matches!(self.peek_nth(1)?, Token::Keyword(k) if k == "R") {
            return Ok(None);
        }
        if !(0..=u32::MAX as i64).contains(&number) || !(0..=u16::MAX as i64).contains(&generation)
        {
            return Ok(None);
        }
        self.peeked.pop_front();
        self.peeked.pop_front();
        Ok(Some(ObjectId::new(number as u32, generation as u16)))
    }

    fn parse_dictionary_body(&mut self, depth: usize) -> Result<Dictionary> {
        let mut dict = Dictionary::new();
        loop {
            match self.next_token()? {
                Token::DictEnd => break,
                Token::Name(key) => {
                    // A key directly followed by '>>' has no value
                    if matches!(self.peek_token()?, Token::DictEnd) {
                        dict.set(key, Object::Null);
                        continue;
                    }
                    let value = self.parse_nested(depth + 1)?;
                    dict.set(key, value);
                }
                Token::Eof => {
                    return Err(PdfError::Syntax {
                        position: self.position(),
                        message: "Unterminated dictionary".to_string(),
                    })
                }
                other => {
                    return Err(PdfError::Syntax {
                        position: self.position(),
                        message: format!("Dictionary key must be a name, found {other:?}"),
                    })
                }
            }
        }
        Ok(dict)
    }

    /// Reads `num gen obj ... endobj` starting at the current position.
    ///
    /// `length_of` resolves an indirect `/Length` for stream bodies.
    pub fn parse_indirect(
        &mut self,
        length_of: &dyn Fn(ObjectId) -> Option<i64>,
    ) -> Result<(ObjectId, Object)> {
        let number = match self.next_token()? {
            Token::Integer(n) => u32::try_from(n).map_err(|_| PdfError::Syntax {
                position: self.position(),
                message: format!("Object number {n} out of range"),
            })?,
            other => {
                return Err(PdfError::Syntax {
                    position: self.position(),
                    message: format!("Expected object number, found {other:?}"),
                })
            }
        };
        let generation = match self.next_token()? {
            Token::Integer(g) if (0..=u16::MAX as i64).contains(&g) => g as u16,
            other => {
                return Err(PdfError::Syntax {
                    position: self.position(),
                    message: format!("Expected generation number, found {other:?}"),
                })
            }
        };
        self.expect_keyword("obj")?;
        let id = ObjectId::new(number, generation);

        // "1 0 obj endobj" defines null
        if matches!(self.peek_token()?, Token::Keyword(k) if k == "endobj") {
            self.next_token()?;
            return Ok((id, Object::Null));
        }

        let object = self.parse_object()?;
        let has_body = matches!(self.peek_token()?, Token::Keyword(k) if k == "stream");
        let object = match object {
            Object::Dictionary(dict) if has_body => self.read_stream(dict, length_of)?,
            other => other,
        };
        Ok((id, object))
    }

    fn read_stream(
        &mut self,
        dict: Dictionary,
        length_of: &dyn Fn(ObjectId) -> Option<i64>,
    ) -> Result<Object> {
        // The keyword is sitting in the lookahead queue
        self.peeked.clear();
        self.lexer.skip_stream_eol();
        let data = self.lexer.data();
        let start = self.lexer.position();

        let declared = match dict.get("Length") {
            Some(Object::Integer(n)) => Some(*n),
            Some(Object::Reference(id)) => length_of(*id),
            _ => None,
        };

        let end = declared
            .filter(|&n| n >= 0)
            .map(|n| start + n as usize)
            .filter(|&end| end <= data.len() && endstream_follows(data, end))
            .or_else(|| find_endstream(data, start))
            .ok_or_else(|| PdfError::Syntax {
                position: start,
                message: "Stream has no endstream".to_string(),
            })?;

        let content = data[start..end].to_vec();
        self.lexer.seek(end);
        self.expect_keyword("endstream")?;
        Ok(Object::Stream(Stream::from_raw(dict, content)))
    }
}

fn endstream_follows(data: &[u8], end: usize) -> bool {
    let rest = &data[end..];
    let skipped = rest
        .iter()
        .take_while(|b| matches!(b, b' ' | b'\r' | b'\n' | b'\t'))
        .count();
    rest[skipped..].starts_with(b"endstream")
}

/// Locates the body end when `/Length` is missing or wrong. The EOL
/// before `endstream` is not part of the data.
fn find_endstream(data: &[u8], start: usize) -> Option<usize> {
    let found = data[start..]
        .windows(b"endstream".len())
        .position(|w| w == b"endstream")?;
    let mut end = start + found;
    if end > start && data[end - 1] == b'\n' {
        end -= 1;
    }
    if end > start && data[end - 1] == b'\r' {
        end -= 1;
    }
    Some(end)
}
