//! Extension hooks for types that produce or parse their own bytes.
//!
//! A type implementing [`Marshal`] and/or [`Unmarshal`] opts in from its
//! [`Bencode`] impl, either for both directions with [`Strategy::custom`]
//! or for one direction on top of another strategy with
//! [`Strategy::with_marshaler`] / [`Strategy::with_unmarshaler`].

use std::any::type_name;
use std::sync::Arc;

use bytes::Bytes;

use crate::decode::{self, Scanner};
use crate::encode::Encoder;
use crate::error::{BencodeError, BoxError};
use crate::grammar::Token;
use crate::registry::Registry;
use crate::strategy::{Bencode, Kind, Strategy};

/// Produces the complete encoded form of a value.
///
/// The returned bytes are written verbatim. Keeping them one well-formed
/// bencode value is up to the implementation.
pub trait Marshal {
    fn marshal_bencode(&self) -> Result<Vec<u8>, BoxError>;
}

/// Parses a value from the exact bytes of one encoded value.
pub trait Unmarshal {
    fn unmarshal_bencode(&mut self, raw: &[u8]) -> Result<(), BoxError>;
}

fn marshal<T: Marshal>(value: &T, out: &mut Encoder) -> Result<(), BencodeError> {
    let raw = value
        .marshal_bencode()
        .map_err(|source| BencodeError::Marshaler {
            type_name: type_name::<T>(),
            source: Arc::from(source),
        })?;
    out.write_raw(&raw);
    Ok(())
}

fn unmarshal<T: Unmarshal>(
    scan: &mut Scanner<'_>,
    token: Token,
    target: &mut T,
) -> Result<(), BencodeError> {
    let raw = scan.capture(token)?;
    target
        .unmarshal_bencode(&raw)
        .map_err(|source| BencodeError::Unmarshaler {
            type_name: type_name::<T>(),
            offset: token.offset,
            source: Arc::from(source),
        })
}

impl<T: Marshal + 'static> Strategy<T> {
    /// Replaces the encode half with [`Marshal::marshal_bencode`].
    pub fn with_marshaler(mut self) -> Self {
        self.set_encode(Kind::Custom, Box::new(marshal::<T>));
        self
    }
}

impl<T: Unmarshal + 'static> Strategy<T> {
    /// Replaces the decode half with [`Unmarshal::unmarshal_bencode`].
    pub fn with_unmarshaler(mut self) -> Self {
        self.set_decode(Kind::Custom, Box::new(unmarshal::<T>));
        self
    }
}

impl<T: Marshal + Unmarshal + 'static> Strategy<T> {
    /// Strategy driven entirely by the type's own hooks.
    pub fn custom() -> Self {
        Strategy::new(Kind::Custom, marshal::<T>, unmarshal::<T>)
    }
}

/// The verbatim bytes of one encoded value.
///
/// Decoding captures the value exactly as it appeared in the input and
/// encoding writes it back unchanged, so hashes computed over the bytes
/// (such as a torrent's info hash) survive a decode/encode round trip even
/// when the input was not canonical.
///
/// # Examples
///
/// ```
/// use bencodec::{bencode_record, decode, encode, RawValue};
///
/// bencode_record! {
///     #[derive(Debug, Default)]
///     pub struct Torrent {
///         pub announce: String,
///         pub info: RawValue,
///     }
/// }
///
/// let input = b"d8:announce3:url4:infod1:bi1e1:ai2eee";
/// let torrent: Torrent = decode(input).unwrap();
/// assert_eq!(torrent.info.as_bytes(), b"d1:bi1e1:ai2ee");
/// assert_eq!(encode(&torrent).unwrap(), input);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawValue(Bytes);

impl RawValue {
    /// Wraps already-encoded bytes after checking they hold exactly one value.
    pub fn from_encoded(raw: impl Into<Bytes>) -> Result<Self, BencodeError> {
        let raw = raw.into();
        decode::validate(&raw)?;
        Ok(RawValue(raw))
    }

    /// Encodes `value` and keeps the bytes.
    pub fn encode<T: Bencode>(value: &T) -> Result<Self, BencodeError> {
        crate::encode(value).map(|raw| RawValue(Bytes::from(raw)))
    }

    /// Decodes the held bytes as `T`.
    pub fn decode<T: Bencode + Default>(&self) -> Result<T, BencodeError> {
        crate::decode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Marshal for RawValue {
    fn marshal_bencode(&self) -> Result<Vec<u8>, BoxError> {
        if self.0.is_empty() {
            return Err("raw value holds no bytes".into());
        }
        Ok(self.0.to_vec())
    }
}

impl Unmarshal for RawValue {
    fn unmarshal_bencode(&mut self, raw: &[u8]) -> Result<(), BoxError> {
        self.0 = Bytes::copy_from_slice(raw);
        Ok(())
    }
}

impl Bencode for RawValue {
    fn strategy(_: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Ok(Strategy::custom())
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}
