mod scanner;

use std::io::BufRead;

use tracing::trace;

use crate::constants::MAX_DEPTH;
use crate::error::BencodeError;
use crate::pool::{BufferPool, PooledBuffer};
use crate::registry::Registry;
use crate::strategy::Bencode;
use crate::value::Value;

pub(crate) use scanner::Scanner;

/// Decoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum nesting of lists and dictionaries.
    pub max_depth: usize,
    /// Reject dictionary keys that match no field of the target record.
    pub strict: bool,
}

impl DecoderConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            strict: false,
        }
    }
}

/// A streaming decoder reading consecutive top-level values from a byte source.
///
/// Each call to [`decode_next`](Decoder::decode_next) consumes exactly one
/// value. Running out of input between values is a clean end of stream;
/// running out inside a value is [`BencodeError::UnexpectedEof`].
///
/// # Examples
///
/// ```
/// use bencodec::Decoder;
///
/// let mut decoder = Decoder::new(&b"i1ei2e4:spam"[..]);
/// assert_eq!(decoder.decode_next::<i64>().unwrap(), Some(1));
/// assert_eq!(decoder.decode_next::<i64>().unwrap(), Some(2));
/// assert_eq!(decoder.decode_next::<String>().unwrap(), Some("spam".to_string()));
/// assert_eq!(decoder.decode_next::<i64>().unwrap(), None);
/// ```
pub struct Decoder<'r, R> {
    reader: R,
    offset: u64,
    scratch: PooledBuffer,
    config: DecoderConfig,
    registry: &'r Registry,
}

impl<R: BufRead> Decoder<'static, R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, DecoderConfig::default())
    }

    pub fn with_config(reader: R, config: DecoderConfig) -> Self {
        Decoder::with_registry(reader, config, Registry::global())
    }
}

impl<'r, R: BufRead> Decoder<'r, R> {
    /// Creates a decoder resolving strategies through `registry`.
    pub fn with_registry(reader: R, config: DecoderConfig, registry: &'r Registry) -> Self {
        Self {
            reader,
            offset: 0,
            scratch: BufferPool::global().lease(),
            config,
            registry,
        }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Decodes the next value into `target`.
    ///
    /// Returns `Ok(false)` without touching `target` when the source is
    /// exhausted. After an error the state of `target` is unspecified.
    pub fn decode_next_into<T: Bencode>(&mut self, target: &mut T) -> Result<bool, BencodeError> {
        let strategy = self.registry.strategy_for::<T>()?;
        let mut scan = Scanner::new(
            &mut self.reader,
            self.offset,
            &mut self.scratch,
            &self.config,
        );
        let result = match scan.peek() {
            Ok(None) => Ok(false),
            Ok(Some(_)) => scan
                .next_value_token()
                .and_then(|token| strategy.decode(&mut scan, token, target))
                .map(|()| true),
            Err(err) => Err(err),
        };
        self.offset = scan.offset();
        if let Ok(false) = result {
            trace!(offset = self.offset, "bencode stream exhausted");
        }
        result
    }

    /// Decodes the next value, or returns `None` at the end of the stream.
    pub fn decode_next<T: Bencode + Default>(&mut self) -> Result<Option<T>, BencodeError> {
        let mut value = T::default();
        Ok(self.decode_next_into(&mut value)?.then_some(value))
    }

    /// Decodes exactly one value and requires the source to end right after it.
    pub(crate) fn decode_exact<T: Bencode>(&mut self, target: &mut T) -> Result<(), BencodeError> {
        if !self.decode_next_into(target)? {
            return Err(BencodeError::UnexpectedEof {
                offset: self.offset,
            });
        }
        let mut scan = Scanner::new(
            &mut self.reader,
            self.offset,
            &mut self.scratch,
            &self.config,
        );
        if scan.peek()?.is_some() {
            return Err(BencodeError::syntax(
                self.offset,
                "trailing data after value",
            ));
        }
        Ok(())
    }
}

/// Checks that `raw` holds exactly one well-formed value.
pub(crate) fn validate(raw: &[u8]) -> Result<(), BencodeError> {
    let mut src = raw;
    let mut scratch = Vec::new();
    let config = DecoderConfig::default();
    let mut scan = Scanner::new(&mut src, 0, &mut scratch, &config);
    let token = scan.next_value_token()?;
    scan.skip(token)?;
    if scan.peek()?.is_some() {
        return Err(BencodeError::syntax(scan.offset(), "trailing data after value"));
    }
    Ok(())
}

/// Decodes a single value of type `T`.
///
/// The input must hold exactly one value; trailing bytes are a syntax error.
///
/// # Examples
///
/// ```
/// use bencodec::decode;
///
/// let n: i64 = decode(b"i42e").unwrap();
/// assert_eq!(n, 42);
///
/// let words: Vec<String> = decode(b"l4:spam4:eggse").unwrap();
/// assert_eq!(words, ["spam", "eggs"]);
/// ```
pub fn decode<T: Bencode + Default>(data: &[u8]) -> Result<T, BencodeError> {
    let mut value = T::default();
    decode_into(data, &mut value)?;
    Ok(value)
}

/// Decodes a single value into an existing target.
///
/// Records and maps keep entries the input does not mention; sequences are
/// replaced. After an error the state of `target` is unspecified.
pub fn decode_into<T: Bencode>(data: &[u8], target: &mut T) -> Result<(), BencodeError> {
    Registry::global().decode_into(data, target)
}

/// Decodes a single value with explicit decoder settings.
pub fn decode_with_config<T: Bencode + Default>(
    data: &[u8],
    config: DecoderConfig,
) -> Result<T, BencodeError> {
    let mut value = T::default();
    Decoder::with_config(data, config).decode_exact(&mut value)?;
    Ok(value)
}

/// Decodes a single value into a dynamic [`Value`] tree.
pub fn decode_value(data: &[u8]) -> Result<Value, BencodeError> {
    decode(data)
}

#[cfg(test)]
mod tests;
