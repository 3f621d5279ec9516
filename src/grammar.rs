//! Byte-level bencode grammar shared by the encoder and the decoder.
//!
//! ```text
//! value   := integer | string | list | dict
//! integer := 'i' ['-'] digit+ 'e'
//! string  := length ':' bytes
//! list    := 'l' value* 'e'
//! dict    := 'd' (string value)* 'e'
//! ```
//!
//! An `e` where a value is expected closes the enclosing container and is
//! not itself a value.

pub(crate) const INTEGER_START: u8 = b'i';
pub(crate) const LIST_START: u8 = b'l';
pub(crate) const DICT_START: u8 = b'd';
pub(crate) const END: u8 = b'e';
pub(crate) const LENGTH_SEPARATOR: u8 = b':';

/// What the lead byte of a value announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Integer,
    ByteString,
    List,
    Dict,
    End,
}

impl TokenKind {
    pub(crate) fn classify(byte: u8) -> Option<Self> {
        match byte {
            INTEGER_START => Some(TokenKind::Integer),
            LIST_START => Some(TokenKind::List),
            DICT_START => Some(TokenKind::Dict),
            END => Some(TokenKind::End),
            b'0'..=b'9' => Some(TokenKind::ByteString),
            _ => None,
        }
    }

    pub(crate) fn describe(self) -> &'static str {
        match self {
            TokenKind::Integer => "integer",
            TokenKind::ByteString => "byte string",
            TokenKind::List => "list",
            TokenKind::Dict => "dictionary",
            TokenKind::End => "end marker",
        }
    }
}

/// The consumed lead byte of a value and where it sat in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) lead: u8,
    pub(crate) offset: u64,
}

/// Checks the text between `i` and `e`.
pub(crate) fn check_integer(text: &[u8]) -> Result<(), &'static str> {
    let digits = text.strip_prefix(b"-").unwrap_or(text);
    if digits.is_empty() {
        return Err("empty integer");
    }
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err("non-digit in integer");
    }
    if digits[0] == b'0' && (digits.len() > 1 || digits.len() != text.len()) {
        return Err("leading zero or negative zero in integer");
    }
    Ok(())
}

/// Checks and parses the length prefix of a byte string.
pub(crate) fn parse_length(text: &[u8]) -> Result<usize, &'static str> {
    if text.is_empty() {
        return Err("empty string length");
    }
    if !text.iter().all(u8::is_ascii_digit) {
        return Err("non-digit in string length");
    }
    if text[0] == b'0' && text.len() > 1 {
        return Err("leading zero in string length");
    }
    text.iter().try_fold(0usize, |len, digit| {
        len.checked_mul(10)
            .and_then(|len| len.checked_add(usize::from(digit - b'0')))
            .ok_or("string length too large")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_integer() {
        assert!(check_integer(b"0").is_ok());
        assert!(check_integer(b"-12").is_ok());
        assert!(check_integer(b"9223372036854775808").is_ok());
        assert!(check_integer(b"").is_err());
        assert!(check_integer(b"-").is_err());
        assert!(check_integer(b"-0").is_err());
        assert!(check_integer(b"03").is_err());
        assert!(check_integer(b"+3").is_err());
        assert!(check_integer(b"1-2").is_err());
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length(b"0"), Ok(0));
        assert_eq!(parse_length(b"42"), Ok(42));
        assert!(parse_length(b"").is_err());
        assert!(parse_length(b"04").is_err());
        assert!(parse_length(b"-1").is_err());
        assert!(parse_length(b"99999999999999999999999").is_err());
    }

    #[test]
    fn test_classify() {
        assert_eq!(TokenKind::classify(b'i'), Some(TokenKind::Integer));
        assert_eq!(TokenKind::classify(b'7'), Some(TokenKind::ByteString));
        assert_eq!(TokenKind::classify(b'e'), Some(TokenKind::End));
        assert_eq!(TokenKind::classify(b'x'), None);
    }
}
