use std::any::type_name;
use std::sync::Arc;

use tracing::trace;

use super::{Kind, Strategy};
use crate::encode::Encoder;
use crate::error::BencodeError;
use crate::fields::{BoundField, Record};
use crate::grammar::TokenKind;
use crate::registry::Registry;

impl<T: Record> Strategy<T> {
    /// Dictionary strategy over the declared fields of a record.
    ///
    /// Fields are written in ascending wire-name order; `omitempty` fields
    /// holding their empty value are left out. Decoding matches keys to
    /// fields, leaving fields the input does not mention untouched. Keys
    /// without a field are skipped, or rejected with
    /// [`UnknownField`](BencodeError::UnknownField) by a strict decoder.
    pub fn record(registry: &Registry) -> Result<Self, BencodeError> {
        let fields = registry.fields::<T>()?;
        let bound: Arc<Vec<BoundField<T>>> = Arc::new(
            fields
                .iter()
                .map(|field| field.bind(registry))
                .collect::<Result<_, _>>()?,
        );
        let (encode_fields, encode_bound) = (Arc::clone(&fields), Arc::clone(&bound));

        Ok(Strategy::new(
            Kind::Dictionary,
            move |record: &T, out: &mut Encoder| {
                out.begin_dict();
                for (field, bound) in encode_fields.iter().zip(encode_bound.iter()) {
                    if field.omit_empty() && field.is_empty_in(record) {
                        continue;
                    }
                    out.write_bytes(field.key().as_bytes())?;
                    (bound.encode)(record, out)?;
                }
                out.end();
                Ok(())
            },
            move |scan, token, target: &mut T| {
                if token.kind != TokenKind::Dict {
                    return Err(scan.mismatch(token, type_name::<T>()));
                }
                scan.read_dict(token, |scan, key, value| {
                    match fields.binary_search_by(|field| field.key().as_bytes().cmp(key.as_slice())) {
                        Ok(index) => (bound[index].decode)(scan, value, target)
                            .map_err(|err| err.within_field(type_name::<T>(), fields[index].key())),
                        Err(_) if scan.strict() => Err(BencodeError::UnknownField {
                            key: String::from_utf8_lossy(&key).into_owned(),
                            type_name: type_name::<T>(),
                            offset: value.offset,
                        }),
                        Err(_) => {
                            trace!(
                                type_name = type_name::<T>(),
                                key = %String::from_utf8_lossy(&key),
                                offset = value.offset,
                                "skipping unknown record key"
                            );
                            scan.skip(value)
                        }
                    }
                })
            },
        ))
    }
}
