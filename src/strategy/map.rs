use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use super::{Bencode, Kind, Strategy};
use crate::encode::Encoder;
use crate::error::BencodeError;
use crate::grammar::TokenKind;
use crate::registry::Registry;

/// Collections encoded as dictionaries.
///
/// The key type must be string-like (its strategy must be usable as a
/// dictionary key); otherwise building the strategy fails.
pub trait Mapping: Send + Sync + 'static {
    type Key: Bencode;
    type Value: Bencode + Default;

    fn entries(&self) -> Vec<(&Self::Key, &Self::Value)>;
    fn insert_entry(&mut self, key: Self::Key, value: Self::Value);
}

impl<K: Bencode + Ord, V: Bencode + Default> Mapping for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn entries(&self) -> Vec<(&K, &V)> {
        self.iter().collect()
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<K, V, S> Mapping for HashMap<K, V, S>
where
    K: Bencode + Eq + Hash,
    V: Bencode + Default,
    S: BuildHasher + Send + Sync + 'static,
{
    type Key = K;
    type Value = V;

    fn entries(&self) -> Vec<(&K, &V)> {
        self.iter().collect()
    }

    fn insert_entry(&mut self, key: K, value: V) {
        self.insert(key, value);
    }
}

impl<M: Mapping> Strategy<M> {
    /// Dictionary strategy for a string-keyed collection.
    ///
    /// Entries are written in ascending key byte order. Decoding inserts into
    /// the existing collection; entries the input does not mention are kept.
    pub fn mapping(registry: &Registry) -> Result<Self, BencodeError> {
        let keys = registry.strategy_for::<M::Key>()?;
        let codec = keys
            .key_codec()
            .ok_or_else(|| BencodeError::unsupported::<M>("dictionary keys must be strings"))?;
        let values = registry.strategy_for::<M::Value>()?;
        let decoder = Arc::clone(&values);
        Ok(Strategy::new(
            Kind::Dictionary,
            move |map: &M, out: &mut Encoder| {
                let mut entries: Vec<(&[u8], &M::Value)> = map
                    .entries()
                    .into_iter()
                    .map(|(key, value)| ((codec.to_key)(key), value))
                    .collect();
                entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
                out.begin_dict();
                for (key, value) in entries {
                    out.write_bytes(key)?;
                    values.encode(value, out)?;
                }
                out.end();
                Ok(())
            },
            move |scan, token, target: &mut M| {
                if token.kind != TokenKind::Dict {
                    return Err(scan.mismatch(token, "dictionary"));
                }
                scan.read_dict(token, |scan, key, next| {
                    let key = (codec.from_key)(&key).ok_or(BencodeError::TypeMismatch {
                        found: "non-utf-8 byte string",
                        expected: "dictionary key",
                        offset: next.offset,
                        context: None,
                    })?;
                    let mut value = M::Value::default();
                    decoder.decode(scan, next, &mut value)?;
                    target.insert_entry(key, value);
                    Ok(())
                })
            },
        ))
    }
}

impl<K: Bencode + Ord, V: Bencode + Default> Bencode for BTreeMap<K, V> {
    fn strategy(registry: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Strategy::mapping(registry)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> Bencode for HashMap<K, V, S>
where
    K: Bencode + Eq + Hash,
    V: Bencode + Default,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    fn strategy(registry: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Strategy::mapping(registry)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}
