use std::any::{Any, TypeId};
use std::sync::Arc;

use super::{Bencode, KeyCodec, Kind, Strategy};
use crate::encode::Encoder;
use crate::error::BencodeError;
use crate::grammar::{Token, TokenKind};
use crate::registry::Registry;

fn is_bytes<E: 'static>() -> bool {
    TypeId::of::<E>() == TypeId::of::<u8>()
}

fn same_type<T: 'static>() -> BencodeError {
    BencodeError::unsupported::<T>("byte container changed type after dispatch")
}

fn byte_vec_key<E: 'static>(value: &Vec<E>) -> &[u8] {
    match (value as &dyn Any).downcast_ref::<Vec<u8>>() {
        Some(bytes) => bytes.as_slice(),
        None => &[],
    }
}

fn byte_vec_from_key<E: 'static>(key: &[u8]) -> Option<Vec<E>> {
    let boxed: Box<dyn Any> = Box::new(key.to_vec());
    boxed.downcast::<Vec<E>>().ok().map(|vec| *vec)
}

impl<E: Bencode + Default> Strategy<Vec<E>> {
    /// Growable sequence strategy.
    ///
    /// `Vec<u8>` is a byte string; every other element type is a list whose
    /// elements use the element strategy. Decoding replaces the contents.
    pub fn sequence(registry: &Registry) -> Result<Self, BencodeError> {
        if is_bytes::<E>() {
            return Ok(byte_vec());
        }
        let element = registry.strategy_for::<E>()?;
        let decoder = Arc::clone(&element);
        Ok(Strategy::new(
            Kind::List,
            move |value: &Vec<E>, out: &mut Encoder| {
                out.begin_list();
                for item in value {
                    element.encode(item, out)?;
                }
                out.end();
                Ok(())
            },
            move |scan, token, target: &mut Vec<E>| {
                if token.kind != TokenKind::List {
                    return Err(scan.mismatch(token, "list"));
                }
                target.clear();
                scan.read_list(token, |scan, next| {
                    let mut item = E::default();
                    decoder.decode(scan, next, &mut item)?;
                    target.push(item);
                    Ok(())
                })
            },
        ))
    }
}

fn byte_vec<E: Bencode>() -> Strategy<Vec<E>> {
    Strategy::new(
        Kind::ByteString,
        |value: &Vec<E>, out: &mut Encoder| {
            let bytes = (value as &dyn Any)
                .downcast_ref::<Vec<u8>>()
                .ok_or_else(same_type::<Vec<E>>)?;
            out.write_bytes(bytes)
        },
        |scan, token, target: &mut Vec<E>| {
            if token.kind != TokenKind::ByteString {
                return Err(scan.mismatch(token, "byte string"));
            }
            let bytes = scan.read_string(token)?;
            let target = (target as &mut dyn Any)
                .downcast_mut::<Vec<u8>>()
                .ok_or_else(same_type::<Vec<E>>)?;
            *target = bytes;
            Ok(())
        },
    )
    .with_key(KeyCodec {
        to_key: byte_vec_key::<E>,
        from_key: byte_vec_from_key::<E>,
    })
}

impl<E: Bencode + Default> Bencode for Vec<E> {
    fn strategy(registry: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Strategy::sequence(registry)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

fn wrong_length(token: Token, expected: &'static str) -> BencodeError {
    BencodeError::TypeMismatch {
        found: "value of a different length",
        expected,
        offset: token.offset,
        context: None,
    }
}

impl<E: Bencode, const N: usize> Strategy<[E; N]> {
    /// Fixed-length sequence strategy. Decoding requires exactly `N` elements.
    pub fn array(registry: &Registry) -> Result<Self, BencodeError> {
        if is_bytes::<E>() {
            return Ok(byte_array());
        }
        let element = registry.strategy_for::<E>()?;
        let decoder = Arc::clone(&element);
        Ok(Strategy::new(
            Kind::List,
            move |value: &[E; N], out: &mut Encoder| {
                out.begin_list();
                for item in value {
                    element.encode(item, out)?;
                }
                out.end();
                Ok(())
            },
            move |scan, token, target: &mut [E; N]| {
                if token.kind != TokenKind::List {
                    return Err(scan.mismatch(token, "list"));
                }
                let mut filled = 0;
                scan.read_list(token, |scan, next| {
                    let slot = target
                        .get_mut(filled)
                        .ok_or_else(|| wrong_length(next, "array of fixed length"))?;
                    decoder.decode(scan, next, slot)?;
                    filled += 1;
                    Ok(())
                })?;
                if filled != N {
                    return Err(wrong_length(token, "array of fixed length"));
                }
                Ok(())
            },
        ))
    }
}

fn byte_array<E: Bencode, const N: usize>() -> Strategy<[E; N]> {
    Strategy::new(
        Kind::ByteString,
        |value: &[E; N], out: &mut Encoder| {
            let bytes = (value as &dyn Any)
                .downcast_ref::<[u8; N]>()
                .ok_or_else(same_type::<[E; N]>)?;
            out.write_bytes(bytes)
        },
        |scan, token, target: &mut [E; N]| {
            if token.kind != TokenKind::ByteString {
                return Err(scan.mismatch(token, "byte string"));
            }
            let bytes = scan.read_string(token)?;
            let target = (target as &mut dyn Any)
                .downcast_mut::<[u8; N]>()
                .ok_or_else(same_type::<[E; N]>)?;
            if bytes.len() != N {
                return Err(wrong_length(token, "byte array of fixed length"));
            }
            target.copy_from_slice(&bytes);
            Ok(())
        },
    )
}

impl<E: Bencode, const N: usize> Bencode for [E; N] {
    fn strategy(registry: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Strategy::array(registry)
    }

    fn is_empty_value(&self) -> bool {
        N == 0
    }
}
