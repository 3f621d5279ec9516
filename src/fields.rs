//! Field introspection for record types.
//!
//! A [`Record`] declares its fields once; the registry turns the declaration
//! into a list of [`FieldDescriptor`]s sorted by wire name, which is exactly
//! the order the encoder emits. Each field carries a tag:
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `""` | wire name is the declared field name |
//! | `"piece length"` | wire name override |
//! | `"length,omitempty"` | override, and skip the field when it is empty |
//! | `",omitempty"` | declared name, skipped when empty |
//! | `"-"` | never encoded or decoded |

use std::sync::Arc;

use crate::decode::Scanner;
use crate::encode::Encoder;
use crate::error::BencodeError;
use crate::grammar::Token;
use crate::registry::Registry;
use crate::strategy::{Bencode, Strategy};

/// A struct encoded as a dictionary of its fields.
///
/// Usually implemented through [`bencode_record!`](crate::bencode_record).
/// Manual implementations declare every field with [`FieldSet::field`] and
/// implement [`Bencode`] with [`Strategy::record`].
///
/// ```
/// use bencodec::{encode, Bencode, BencodeError, FieldSet, Record, Registry, Strategy};
///
/// #[derive(Default)]
/// struct Peer {
///     ip: String,
///     port: u16,
/// }
///
/// impl Record for Peer {
///     fn declare(fields: &mut FieldSet<Self>) {
///         fields
///             .field("ip", "", |p| &p.ip, |p| &mut p.ip)
///             .field("port", "", |p| &p.port, |p| &mut p.port);
///     }
/// }
///
/// impl Bencode for Peer {
///     fn strategy(registry: &Registry) -> Result<Strategy<Self>, BencodeError> {
///         Strategy::record(registry)
///     }
/// }
///
/// let peer = Peer { ip: "10.0.0.1".into(), port: 6881 };
/// assert_eq!(encode(&peer).unwrap(), b"d2:ip8:10.0.0.14:porti6881ee");
/// ```
pub trait Record: Bencode {
    fn declare(fields: &mut FieldSet<Self>);
}

/// Parsed form of a field tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    pub key: Option<&'a str>,
    pub omit_empty: bool,
    pub ignored: bool,
}

impl<'a> Tag<'a> {
    pub fn parse(tag: &'a str) -> Self {
        if tag == "-" {
            return Tag {
                key: None,
                omit_empty: false,
                ignored: true,
            };
        }
        let mut parts = tag.split(',');
        let key = parts.next().filter(|key| !key.is_empty());
        let omit_empty = parts.any(|option| option == "omitempty");
        Tag {
            key,
            omit_empty,
            ignored: false,
        }
    }
}

/// Collects field declarations for one record type.
pub struct FieldSet<T> {
    declared: Vec<FieldDescriptor<T>>,
    ignored: Vec<&'static str>,
}

impl<T: Record> FieldSet<T> {
    fn new() -> Self {
        Self {
            declared: Vec::new(),
            ignored: Vec::new(),
        }
    }

    /// Declares a field with its name, tag and accessors.
    pub fn field<F: Bencode>(
        &mut self,
        name: &'static str,
        tag: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        let index = self.declared.len() + self.ignored.len();
        let tag = Tag::parse(tag);
        if tag.ignored {
            return self.ignore(name);
        }
        self.declared.push(FieldDescriptor {
            index,
            name,
            key: tag.key.unwrap_or(name),
            omit_empty: tag.omit_empty,
            access: Box::new(Accessor { get, get_mut }),
        });
        self
    }
}

impl<T> FieldSet<T> {
    /// Declares a field that is never encoded or decoded.
    ///
    /// The field still takes a declaration position, and its type needs no
    /// bencode form.
    pub fn ignore(&mut self, name: &'static str) -> &mut Self {
        self.ignored.push(name);
        self
    }

    /// Names of the fields declared with the `"-"` tag or [`ignore`](Self::ignore).
    pub fn ignored(&self) -> &[&'static str] {
        &self.ignored
    }
}

/// One serializable field of a record.
pub struct FieldDescriptor<T> {
    index: usize,
    name: &'static str,
    key: &'static str,
    omit_empty: bool,
    access: Box<dyn FieldAccess<T>>,
}

impl<T> FieldDescriptor<T> {
    /// Position of the field in declaration order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Declared field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Dictionary key the field is written under.
    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn omit_empty(&self) -> bool {
        self.omit_empty
    }

    /// Whether the field currently holds its empty value in `record`.
    pub fn is_empty_in(&self, record: &T) -> bool {
        self.access.is_empty(record)
    }

    pub(crate) fn bind(&self, registry: &Registry) -> Result<BoundField<T>, BencodeError> {
        self.access.bind(registry)
    }
}

impl<T> std::fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("key", &self.key)
            .field("omit_empty", &self.omit_empty)
            .finish()
    }
}

/// A field's encode/decode functions with the field strategy resolved.
pub(crate) struct BoundField<T> {
    pub(crate) encode: Box<dyn Fn(&T, &mut Encoder) -> Result<(), BencodeError> + Send + Sync>,
    pub(crate) decode:
        Box<dyn Fn(&mut Scanner<'_>, Token, &mut T) -> Result<(), BencodeError> + Send + Sync>,
}

trait FieldAccess<T>: Send + Sync {
    fn is_empty(&self, record: &T) -> bool;
    fn bind(&self, registry: &Registry) -> Result<BoundField<T>, BencodeError>;
}

struct Accessor<T, F> {
    get: fn(&T) -> &F,
    get_mut: fn(&mut T) -> &mut F,
}

impl<T: 'static, F: Bencode> FieldAccess<T> for Accessor<T, F> {
    fn is_empty(&self, record: &T) -> bool {
        (self.get)(record).is_empty_value()
    }

    fn bind(&self, registry: &Registry) -> Result<BoundField<T>, BencodeError> {
        let strategy: Arc<Strategy<F>> = registry.strategy_for::<F>()?;
        let encoder = Arc::clone(&strategy);
        let (get, get_mut) = (self.get, self.get_mut);
        Ok(BoundField {
            encode: Box::new(move |record, out| encoder.encode(get(record), out)),
            decode: Box::new(move |scan, token, record| strategy.decode(scan, token, get_mut(record))),
        })
    }
}

/// Computes the sorted descriptor list of `T`.
pub(crate) fn introspect<T: Record>() -> Result<Vec<FieldDescriptor<T>>, BencodeError> {
    let mut set = FieldSet::new();
    T::declare(&mut set);
    let mut fields = set.declared;
    fields.sort_by(|a, b| a.key.as_bytes().cmp(b.key.as_bytes()));
    if let Some(pair) = fields.windows(2).find(|pair| pair[0].key == pair[1].key) {
        return Err(BencodeError::unsupported::<T>(format!(
            "fields {} and {} share the key {:?}",
            pair[0].name, pair[1].name, pair[0].key
        )));
    }
    Ok(fields)
}
