use std::io::{self, BufRead, Read};
use std::sync::Arc;

use super::DecoderConfig;
use crate::constants::STRING_PREALLOC_LIMIT;
use crate::error::BencodeError;
use crate::grammar::{self, Token, TokenKind, END, LENGTH_SEPARATOR};

/// Cursor over one decode call.
///
/// Tracks the byte offset for diagnostics, accumulates integer and length
/// digits in a scratch buffer, and can record the exact bytes of a value
/// for custom decode hooks.
pub(crate) struct Scanner<'a> {
    src: &'a mut dyn BufRead,
    offset: u64,
    scratch: &'a mut Vec<u8>,
    capture: Option<Vec<u8>>,
    depth: usize,
    config: &'a DecoderConfig,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(
        src: &'a mut dyn BufRead,
        offset: u64,
        scratch: &'a mut Vec<u8>,
        config: &'a DecoderConfig,
    ) -> Self {
        scratch.clear();
        Self {
            src,
            offset,
            scratch,
            capture: None,
            depth: 0,
            config,
        }
    }

    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn strict(&self) -> bool {
        self.config.strict
    }

    fn io_error(&self, err: io::Error) -> BencodeError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            return BencodeError::UnexpectedEof {
                offset: self.offset,
            };
        }
        BencodeError::Io {
            offset: self.offset,
            source: Arc::new(err),
        }
    }

    /// Looks at the next byte without consuming it; `None` at end of input.
    pub(crate) fn peek(&mut self) -> Result<Option<u8>, BencodeError> {
        loop {
            match self.src.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(self.io_error(err)),
            }
        }
    }

    fn next_byte(&mut self) -> Result<u8, BencodeError> {
        let byte = self.peek()?.ok_or(BencodeError::UnexpectedEof {
            offset: self.offset,
        })?;
        self.src.consume(1);
        self.offset += 1;
        if let Some(capture) = &mut self.capture {
            capture.push(byte);
        }
        Ok(byte)
    }

    /// Consumes the lead byte of the next value or an end marker.
    pub(crate) fn next_token(&mut self) -> Result<Token, BencodeError> {
        let offset = self.offset;
        let lead = self.next_byte()?;
        let kind = TokenKind::classify(lead).ok_or_else(|| {
            BencodeError::syntax(offset, format!("unexpected byte 0x{:02x}", lead))
        })?;
        Ok(Token { kind, lead, offset })
    }

    /// Like [`next_token`](Self::next_token), but an end marker is an error.
    pub(crate) fn next_value_token(&mut self) -> Result<Token, BencodeError> {
        let token = self.next_token()?;
        if token.kind == TokenKind::End {
            return Err(BencodeError::syntax(
                token.offset,
                "expected a value, found end marker",
            ));
        }
        Ok(token)
    }

    pub(crate) fn mismatch(&self, token: Token, expected: &'static str) -> BencodeError {
        BencodeError::TypeMismatch {
            found: token.kind.describe(),
            expected,
            offset: token.offset,
            context: None,
        }
    }

    /// Reads digits into the scratch buffer until `terminator`.
    fn read_digits(&mut self, terminator: u8, allow_sign: bool) -> Result<(), BencodeError> {
        loop {
            let offset = self.offset;
            let byte = self.next_byte()?;
            if byte == terminator {
                return Ok(());
            }
            if !(byte.is_ascii_digit() || (allow_sign && byte == b'-')) {
                return Err(BencodeError::syntax(
                    offset,
                    format!("unexpected byte 0x{:02x} in number", byte),
                ));
            }
            self.scratch.push(byte);
        }
    }

    /// Reads the rest of an integer token and parses its text.
    ///
    /// `parse` returning `None` means the value does not fit `target`.
    pub(crate) fn read_integer<N>(
        &mut self,
        token: Token,
        target: &'static str,
        parse: impl FnOnce(&str) -> Option<N>,
    ) -> Result<N, BencodeError> {
        if token.kind != TokenKind::Integer {
            return Err(self.mismatch(token, target));
        }
        self.scratch.clear();
        self.read_digits(END, true)?;
        grammar::check_integer(&self.scratch[..])
            .map_err(|reason| BencodeError::syntax(token.offset, reason))?;
        let text = std::str::from_utf8(&self.scratch[..])
            .map_err(|_| BencodeError::syntax(token.offset, "integer is not ascii"))?;
        parse(text).ok_or_else(|| BencodeError::Overflow {
            digits: text.to_owned(),
            target,
            offset: token.offset,
            context: None,
        })
    }

    fn read_length(&mut self, token: Token) -> Result<usize, BencodeError> {
        self.scratch.clear();
        self.scratch.push(token.lead);
        self.read_digits(LENGTH_SEPARATOR, false)?;
        grammar::parse_length(&self.scratch[..])
            .map_err(|reason| BencodeError::syntax(token.offset, reason))
    }

    /// Reads the rest of a byte string token and returns its contents.
    pub(crate) fn read_string(&mut self, token: Token) -> Result<Vec<u8>, BencodeError> {
        let len = self.read_length(token)?;
        let mut out = Vec::with_capacity(len.min(STRING_PREALLOC_LIMIT));
        let result = Read::take(&mut *self.src, len as u64).read_to_end(&mut out);
        let read = result.map_err(|err| self.io_error(err))?;
        self.offset += read as u64;
        if let Some(capture) = &mut self.capture {
            capture.extend_from_slice(&out);
        }
        if read < len {
            return Err(BencodeError::UnexpectedEof {
                offset: self.offset,
            });
        }
        Ok(out)
    }

    fn enter(&mut self, token: Token) -> Result<(), BencodeError> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(BencodeError::NestingTooDeep {
                limit: self.config.max_depth,
                offset: token.offset,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Walks the elements of a list whose lead byte was consumed.
    pub(crate) fn read_list(
        &mut self,
        token: Token,
        mut element: impl FnMut(&mut Self, Token) -> Result<(), BencodeError>,
    ) -> Result<(), BencodeError> {
        self.enter(token)?;
        loop {
            let next = self.next_token()?;
            if next.kind == TokenKind::End {
                break;
            }
            element(self, next)?;
        }
        self.leave();
        Ok(())
    }

    /// Walks the entries of a dictionary whose lead byte was consumed.
    ///
    /// Keys must be byte strings and every key must be followed by a value.
    pub(crate) fn read_dict(
        &mut self,
        token: Token,
        mut entry: impl FnMut(&mut Self, Vec<u8>, Token) -> Result<(), BencodeError>,
    ) -> Result<(), BencodeError> {
        self.enter(token)?;
        loop {
            let key_token = self.next_token()?;
            match key_token.kind {
                TokenKind::End => break,
                TokenKind::ByteString => {}
                _ => {
                    return Err(BencodeError::syntax(
                        key_token.offset,
                        "dictionary key must be a byte string",
                    ))
                }
            }
            let key = self.read_string(key_token)?;
            let value = self.next_value_token()?;
            entry(self, key, value)?;
        }
        self.leave();
        Ok(())
    }

    /// Consumes and validates one value, discarding it.
    pub(crate) fn skip(&mut self, token: Token) -> Result<(), BencodeError> {
        match token.kind {
            TokenKind::Integer => self.read_integer(token, "integer", |_| Some(())),
            TokenKind::ByteString => self.read_string(token).map(drop),
            TokenKind::List => self.read_list(token, |scan, next| scan.skip(next)),
            TokenKind::Dict => self.read_dict(token, |scan, _, value| scan.skip(value)),
            TokenKind::End => Err(BencodeError::syntax(
                token.offset,
                "expected a value, found end marker",
            )),
        }
    }

    /// Consumes one value and returns its exact encoded bytes.
    pub(crate) fn capture(&mut self, token: Token) -> Result<Vec<u8>, BencodeError> {
        let outer = self.capture.replace(vec![token.lead]);
        let result = self.skip(token);
        let captured = std::mem::replace(&mut self.capture, outer).unwrap_or_default();
        if let Some(outer) = &mut self.capture {
            outer.extend_from_slice(captured.get(1..).unwrap_or_default());
        }
        result.map(|()| captured)
    }
}
