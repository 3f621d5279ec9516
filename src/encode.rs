use std::fmt::Display;
use std::io::Write;

use crate::error::BencodeError;
use crate::grammar::{DICT_START, END, INTEGER_START, LENGTH_SEPARATOR, LIST_START};
use crate::pool::PooledBuffer;
use crate::registry::Registry;
use crate::strategy::Bencode;

/// Output sink for one encode call.
pub(crate) struct Encoder {
    buf: PooledBuffer,
}

impl Encoder {
    pub(crate) fn new(buf: PooledBuffer) -> Self {
        Self { buf }
    }

    pub(crate) fn write_integer(&mut self, n: impl Display) -> Result<(), BencodeError> {
        self.buf.push(INTEGER_START);
        write!(*self.buf, "{}", n)?;
        self.buf.push(END);
        Ok(())
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BencodeError> {
        write!(*self.buf, "{}", bytes.len())?;
        self.buf.push(LENGTH_SEPARATOR);
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    pub(crate) fn begin_list(&mut self) {
        self.buf.push(LIST_START);
    }

    pub(crate) fn begin_dict(&mut self) {
        self.buf.push(DICT_START);
    }

    pub(crate) fn end(&mut self) {
        self.buf.push(END);
    }

    /// Writes a pre-formed fragment verbatim.
    pub(crate) fn write_raw(&mut self, raw: &[u8]) {
        self.buf.extend_from_slice(raw);
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

/// Encodes a value to a byte vector.
///
/// The output is canonical: dictionary and record keys are emitted in
/// ascending byte order, so equal values always encode to equal bytes.
/// On failure no bytes are returned.
///
/// # Errors
///
/// Returns [`BencodeError::UnsupportedType`] when `T` (or a type it
/// contains) has no bencode form, and [`BencodeError::Marshaler`] when a
/// custom encode hook fails.
///
/// # Examples
///
/// ```
/// use bencodec::encode;
/// use std::collections::BTreeMap;
///
/// assert_eq!(encode(&42i64).unwrap(), b"i42e");
/// assert_eq!(encode(&"hello".to_string()).unwrap(), b"5:hello");
/// assert_eq!(encode(&vec![1u32, 2]).unwrap(), b"li1ei2ee");
/// assert_eq!(encode(&vec![1u8, 2, 3]).unwrap(), b"3:\x01\x02\x03");
///
/// let mut dict = BTreeMap::new();
/// dict.insert("b".to_string(), 2i64);
/// dict.insert("a".to_string(), 1i64);
/// assert_eq!(encode(&dict).unwrap(), b"d1:ai1e1:bi2ee");
/// ```
pub fn encode<T: Bencode>(value: &T) -> Result<Vec<u8>, BencodeError> {
    Registry::global().encode(value)
}

/// Encodes a value and writes it to `writer`.
///
/// Nothing is written unless encoding succeeds.
pub fn encode_to<T: Bencode, W: Write>(value: &T, writer: &mut W) -> Result<(), BencodeError> {
    Registry::global().encode_with(value, |bytes| {
        writer.write_all(bytes)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests;
