use std::fmt::Display;
use std::str::FromStr;

use bytes::Bytes;
use num_bigint::BigInt;

use super::{Bencode, KeyCodec, Kind, Strategy};
use crate::error::BencodeError;
use crate::grammar::TokenKind;
use crate::registry::Registry;

mod sealed {
    pub trait Sealed {}
}

/// Primitive integers with a fixed range.
///
/// Decoding text outside the range fails with
/// [`BencodeError::Overflow`].
pub trait FixedWidth:
    Copy + Default + Display + FromStr + PartialEq + Send + Sync + 'static + sealed::Sealed
{
    /// Type name used in error messages.
    const NAME: &'static str;
}

macro_rules! fixed_width {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl FixedWidth for $ty {
                const NAME: &'static str = stringify!($ty);
            }

            impl Bencode for $ty {
                fn strategy(_: &Registry) -> Result<Strategy<Self>, BencodeError> {
                    Ok(Strategy::integer())
                }

                fn is_empty_value(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

fixed_width!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl<T: FixedWidth> Strategy<T> {
    /// Integer strategy for a fixed-width primitive.
    pub fn integer() -> Self {
        Strategy::new(
            Kind::Integer,
            |value: &T, out| out.write_integer(value),
            |scan, token, target: &mut T| {
                *target = scan.read_integer(token, T::NAME, |text| text.parse().ok())?;
                Ok(())
            },
        )
    }
}

impl Strategy<bool> {
    /// Booleans travel as `i0e` and `i1e`; any nonzero integer decodes as `true`.
    pub fn boolean() -> Self {
        Strategy::new(
            Kind::Integer,
            |value: &bool, out| out.write_integer(u8::from(*value)),
            |scan, token, target: &mut bool| {
                *target = scan.read_integer(token, "bool", |text| Some(text != "0"))?;
                Ok(())
            },
        )
    }
}

impl Bencode for bool {
    fn strategy(_: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Ok(Strategy::boolean())
    }

    fn is_empty_value(&self) -> bool {
        !*self
    }
}

impl Strategy<BigInt> {
    /// Integer strategy without a range limit.
    pub fn big_integer() -> Self {
        Strategy::new(
            Kind::Integer,
            |value: &BigInt, out| out.write_integer(value),
            |scan, token, target: &mut BigInt| {
                *target = scan.read_integer(token, "BigInt", |text| text.parse().ok())?;
                Ok(())
            },
        )
    }
}

impl Bencode for BigInt {
    fn strategy(_: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Ok(Strategy::big_integer())
    }

    fn is_empty_value(&self) -> bool {
        *self == BigInt::default()
    }
}

fn text_from_key(key: &[u8]) -> Option<String> {
    std::str::from_utf8(key).ok().map(str::to_owned)
}

impl Strategy<String> {
    /// UTF-8 text as a byte string. Usable as a dictionary key.
    pub fn text() -> Self {
        Strategy::new(
            Kind::ByteString,
            |value: &String, out| out.write_bytes(value.as_bytes()),
            |scan, token, target: &mut String| {
                if token.kind != TokenKind::ByteString {
                    return Err(scan.mismatch(token, "string"));
                }
                let bytes = scan.read_string(token)?;
                *target = String::from_utf8(bytes).map_err(|_| BencodeError::TypeMismatch {
                    found: "non-utf-8 byte string",
                    expected: "string",
                    offset: token.offset,
                    context: None,
                })?;
                Ok(())
            },
        )
        .with_key(KeyCodec {
            to_key: String::as_bytes,
            from_key: text_from_key,
        })
    }
}

impl Bencode for String {
    fn strategy(_: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Ok(Strategy::text())
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

/// Owned byte buffers written as bencode byte strings.
pub trait ByteContainer: Default + Send + Sync + 'static + sealed::Sealed {
    fn as_byte_slice(&self) -> &[u8];
    fn from_byte_vec(bytes: Vec<u8>) -> Self;
}

impl sealed::Sealed for Bytes {}

impl ByteContainer for Bytes {
    fn as_byte_slice(&self) -> &[u8] {
        self
    }

    fn from_byte_vec(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes)
    }
}

impl sealed::Sealed for Vec<u8> {}

impl ByteContainer for Vec<u8> {
    fn as_byte_slice(&self) -> &[u8] {
        self
    }

    fn from_byte_vec(bytes: Vec<u8>) -> Self {
        bytes
    }
}

fn container_from_key<T: ByteContainer>(key: &[u8]) -> Option<T> {
    Some(T::from_byte_vec(key.to_vec()))
}

impl<T: ByteContainer> Strategy<T> {
    /// Raw bytes as a byte string. Usable as a dictionary key.
    pub fn byte_string() -> Self {
        Strategy::new(
            Kind::ByteString,
            |value: &T, out| out.write_bytes(value.as_byte_slice()),
            |scan, token, target: &mut T| {
                if token.kind != TokenKind::ByteString {
                    return Err(scan.mismatch(token, "byte string"));
                }
                *target = T::from_byte_vec(scan.read_string(token)?);
                Ok(())
            },
        )
        .with_key(KeyCodec {
            to_key: T::as_byte_slice,
            from_key: container_from_key::<T>,
        })
    }
}

impl Bencode for Bytes {
    fn strategy(_: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Ok(Strategy::byte_string())
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: 'static> Strategy<T> {
    /// Fails the build of `T` with an [`UnsupportedType`] error.
    ///
    /// [`UnsupportedType`]: BencodeError::UnsupportedType
    pub fn unsupported(reason: impl Into<String>) -> Result<Self, BencodeError> {
        Err(BencodeError::unsupported::<T>(reason))
    }
}

impl Bencode for f32 {
    fn strategy(_: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Strategy::unsupported("bencode has no floating point form")
    }
}

impl Bencode for f64 {
    fn strategy(_: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Strategy::unsupported("bencode has no floating point form")
    }
}

impl Bencode for char {
    fn strategy(_: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Strategy::unsupported("use String for text")
    }
}
