use std::sync::Arc;

use super::{Bencode, Kind, Strategy};
use crate::encode::Encoder;
use crate::error::BencodeError;
use crate::registry::Registry;

/// Owning indirections encoded as their pointee.
pub trait Pointer: Send + Sync + 'static {
    type Target: Bencode;

    fn pointee(&self) -> &Self::Target;

    /// Mutable access for decoding, or `None` when the pointee is shared.
    fn pointee_mut(&mut self) -> Option<&mut Self::Target>;
}

impl<T: Bencode> Pointer for Box<T> {
    type Target = T;

    fn pointee(&self) -> &T {
        self
    }

    fn pointee_mut(&mut self) -> Option<&mut T> {
        Some(&mut **self)
    }
}

impl<T: Bencode> Pointer for Arc<T> {
    type Target = T;

    fn pointee(&self) -> &T {
        self
    }

    fn pointee_mut(&mut self) -> Option<&mut T> {
        Arc::get_mut(self)
    }
}

impl<P: Pointer> Strategy<P> {
    /// Transparent strategy for a pointer type.
    ///
    /// The pointee strategy may still be under construction when this runs,
    /// which is how recursive types such as trees resolve.
    pub fn pointer(registry: &Registry) -> Result<Self, BencodeError> {
        let inner = registry.strategy_for::<P::Target>()?;
        let (decoder, resolver) = (Arc::clone(&inner), Arc::clone(&inner));
        Ok(Strategy::new(
            inner.kind(),
            move |value: &P, out: &mut Encoder| inner.encode(value.pointee(), out),
            move |scan, token, target: &mut P| {
                let pointee = target.pointee_mut().ok_or(BencodeError::InvalidTarget {
                    type_name: std::any::type_name::<P>(),
                    reason: "pointee is shared",
                })?;
                decoder.decode(scan, token, pointee)
            },
        )
        .with_resolved_kind(move |mode| resolver.kind_with(mode)))
    }
}

impl<T: Bencode> Bencode for Box<T> {
    fn strategy(registry: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Strategy::pointer(registry)
    }

    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

impl<T: Bencode> Bencode for Arc<T> {
    fn strategy(registry: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Strategy::pointer(registry)
    }

    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

impl<T: Bencode + Default> Strategy<Option<T>> {
    /// Strategy for an optional value.
    ///
    /// `None` is written as the empty form of `T`: `le` for a sequence, `de`
    /// for a mapping or record, and the encoding of `T::default()` otherwise.
    /// An absent record is therefore `de`, not the record with every field at
    /// its zero value; this keeps self-referential types such as
    /// `Option<Box<Node>>` finite. Fields that should disappear instead are
    /// tagged `omitempty`. Decoding fills `None` with `T::default()` first.
    pub fn optional(registry: &Registry) -> Result<Self, BencodeError> {
        let inner = registry.strategy_for::<T>()?;
        let (decoder, resolver) = (Arc::clone(&inner), Arc::clone(&inner));
        Ok(Strategy::new(
            inner.kind(),
            move |value: &Option<T>, out: &mut Encoder| match value {
                Some(value) => inner.encode(value, out),
                None => match inner.resolved_kind() {
                    Kind::List => {
                        out.begin_list();
                        out.end();
                        Ok(())
                    }
                    Kind::Dictionary => {
                        out.begin_dict();
                        out.end();
                        Ok(())
                    }
                    _ => inner.encode(&T::default(), out),
                },
            },
            move |scan, token, target: &mut Option<T>| {
                decoder.decode(scan, token, target.get_or_insert_with(T::default))
            },
        )
        .with_resolved_kind(move |mode| resolver.kind_with(mode)))
    }
}

impl<T: Bencode + Default> Bencode for Option<T> {
    fn strategy(registry: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Strategy::optional(registry)
    }

    fn is_empty_value(&self) -> bool {
        self.is_none()
    }
}
