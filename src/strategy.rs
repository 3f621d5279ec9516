//! Per-type encode/decode strategies.
//!
//! A [`Strategy`] is the pair of functions the [`Registry`] binds to one
//! type. Types opt in by implementing [`Bencode`], whose `strategy` function
//! picks one of the shape constructors below:
//!
//! | Shape | Constructor | Wire form |
//! |-------|-------------|-----------|
//! | boolean | [`Strategy::boolean`] | `i0e` / `i1e` |
//! | fixed-width integer | [`Strategy::integer`] | `i<n>e` |
//! | unbounded integer | [`Strategy::big_integer`] | `i<n>e` |
//! | text | [`Strategy::text`] | `<len>:<utf-8>` |
//! | byte buffer | [`Strategy::byte_string`] | `<len>:<bytes>` |
//! | `Vec<E>` / `[E; N]` | [`Strategy::sequence`] / [`Strategy::array`] | list, or byte string when `E = u8` |
//! | string-keyed map | [`Strategy::mapping`] | dictionary, keys sorted |
//! | record | [`Strategy::record`] | dictionary in field order |
//! | `Box` / `Arc` / `Option` | [`Strategy::pointer`] / [`Strategy::optional`] | the pointee |
//! | [`Value`](crate::Value) | [`Strategy::dynamic`] | any |
//! | custom hooks | [`Strategy::custom`] | whatever the hook writes |
//!
//! [`Registry`]: crate::Registry

mod dynamic;
mod map;
mod pointer;
mod record;
mod scalar;
mod sequence;

use crate::decode::Scanner;
use crate::encode::Encoder;
use crate::error::BencodeError;
use crate::grammar::Token;
use crate::registry::Registry;

pub use map::Mapping;
pub use pointer::Pointer;
pub use scalar::{ByteContainer, FixedWidth};

pub(crate) type EncodeFn<T> =
    dyn Fn(&T, &mut Encoder) -> Result<(), BencodeError> + Send + Sync;
pub(crate) type DecodeFn<T> =
    dyn Fn(&mut Scanner<'_>, Token, &mut T) -> Result<(), BencodeError> + Send + Sync;
type ResolveFn = dyn Fn(Resolve) -> Kind + Send + Sync;
type ResolveKeyFn<T> = dyn Fn() -> Option<KeyCodec<T>> + Send + Sync;

/// How far kind resolution may go through strategies still being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolve {
    /// Report `Pending` for anything not yet published.
    Peek,
    /// Wait for publication, except on the thread running the build.
    Block,
}

/// A type with a bencode representation.
///
/// Implementations describe *how* to build the strategy; the registry
/// decides *when*, building it once per type and sharing it afterwards.
/// A strategy may request the strategies of contained types through the
/// registry, including its own type when the type is recursive.
///
/// Records are usually declared with [`bencode_record!`](crate::bencode_record),
/// which implements this trait.
pub trait Bencode: Sized + Send + Sync + 'static {
    /// Computes the strategy for this type.
    fn strategy(registry: &Registry) -> Result<Strategy<Self>, BencodeError>;

    /// Returns true for the zero or empty value of this type.
    ///
    /// Fields tagged `omitempty` are skipped when this returns true.
    fn is_empty_value(&self) -> bool {
        false
    }
}

/// The wire shape a strategy produces and accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Integer,
    ByteString,
    List,
    Dictionary,
    /// Any shape; decodes into a generic value tree.
    Dynamic,
    /// Bytes are produced and parsed by extension hooks.
    Custom,
    /// Reported only while the strategy of this type, or of a type it
    /// forwards to, is still being built.
    Pending,
}

/// Conversion between a string-like type and dictionary key bytes.
pub(crate) struct KeyCodec<T> {
    pub(crate) to_key: for<'a> fn(&'a T) -> &'a [u8],
    pub(crate) from_key: fn(&[u8]) -> Option<T>,
}

impl<T> Clone for KeyCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for KeyCodec<T> {}

/// The encode and decode functions bound to one type.
pub struct Strategy<T> {
    kind: Kind,
    encode: Box<EncodeFn<T>>,
    decode: Box<DecodeFn<T>>,
    key: Option<KeyCodec<T>>,
    resolve: Option<Box<ResolveFn>>,
    resolve_key: Option<Box<ResolveKeyFn<T>>>,
}

impl<T: 'static> Strategy<T> {
    pub(crate) fn new<E, D>(kind: Kind, encode: E, decode: D) -> Self
    where
        E: Fn(&T, &mut Encoder) -> Result<(), BencodeError> + Send + Sync + 'static,
        D: Fn(&mut Scanner<'_>, Token, &mut T) -> Result<(), BencodeError> + Send + Sync + 'static,
    {
        Self {
            kind,
            encode: Box::new(encode),
            decode: Box::new(decode),
            key: None,
            resolve: None,
            resolve_key: None,
        }
    }

    /// The wire shape of this strategy.
    ///
    /// Strategies that forward to another type (pointers, optionals, and
    /// the placeholder handed out during a build) report the shape of that
    /// type once it is published, and [`Kind::Pending`] before.
    pub fn kind(&self) -> Kind {
        self.kind_with(Resolve::Peek)
    }

    /// Whether values of this type may be used as dictionary keys.
    ///
    /// Waits for a strategy under construction on another thread.
    pub fn is_key(&self) -> bool {
        self.key_codec().is_some()
    }

    /// The wire shape once every forwarding placeholder has been resolved.
    ///
    /// Blocks while a strategy this one forwards to is still being built on
    /// another thread.
    pub(crate) fn resolved_kind(&self) -> Kind {
        self.kind_with(Resolve::Block)
    }

    pub(crate) fn kind_with(&self, mode: Resolve) -> Kind {
        match &self.resolve {
            Some(resolve) => resolve(mode),
            None => self.kind,
        }
    }

    pub(crate) fn with_resolved_kind(
        mut self,
        resolve: impl Fn(Resolve) -> Kind + Send + Sync + 'static,
    ) -> Self {
        self.resolve = Some(Box::new(resolve));
        self
    }

    pub(crate) fn with_resolved_key(
        mut self,
        resolve: impl Fn() -> Option<KeyCodec<T>> + Send + Sync + 'static,
    ) -> Self {
        self.resolve_key = Some(Box::new(resolve));
        self
    }

    pub(crate) fn encode(&self, value: &T, out: &mut Encoder) -> Result<(), BencodeError> {
        (self.encode)(value, out)
    }

    pub(crate) fn decode(
        &self,
        scan: &mut Scanner<'_>,
        token: Token,
        target: &mut T,
    ) -> Result<(), BencodeError> {
        (self.decode)(scan, token, target)
    }

    pub(crate) fn with_key(mut self, codec: KeyCodec<T>) -> Self {
        self.key = Some(codec);
        self
    }

    /// The key codec, looked up through a forwarding placeholder if needed.
    pub(crate) fn key_codec(&self) -> Option<KeyCodec<T>> {
        match &self.resolve_key {
            Some(resolve) => resolve(),
            None => self.key,
        }
    }

    pub(crate) fn set_encode(&mut self, kind: Kind, encode: Box<EncodeFn<T>>) {
        self.kind = kind;
        self.resolve = None;
        self.encode = encode;
    }

    pub(crate) fn set_decode(&mut self, kind: Kind, decode: Box<DecodeFn<T>>) {
        self.kind = kind;
        self.resolve = None;
        self.decode = decode;
    }
}

impl<T> std::fmt::Debug for Strategy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy")
            .field("type", &std::any::type_name::<T>())
            .field("kind", &self.kind)
            .field("key", &self.key.is_some())
            .finish()
    }
}
