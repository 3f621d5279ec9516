use bytes::Bytes;
use indexmap::IndexMap;
use num_bigint::BigInt;

/// Dictionary storage of a dynamic [`Value`], in input order.
pub type Dict = IndexMap<Bytes, Value>;

/// A dynamically shaped bencode value.
///
/// This is what an open decode target becomes: integers that fit `i64` are
/// [`Value::Integer`], larger ones fall back to [`Value::BigInteger`], and
/// dictionaries keep the order their keys arrived in. Encoding a value
/// always emits dictionary keys in ascending byte order regardless.
///
/// # Examples
///
/// ```
/// use bencodec::{decode_value, Value};
///
/// let value = decode_value(b"d3:bar4:spam3:fooi42ee").unwrap();
/// assert_eq!(value.get(b"bar").and_then(Value::as_str), Some("spam"));
/// assert_eq!(value.get(b"foo").and_then(Value::as_integer), Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// An integer that fits in 64 signed bits.
    Integer(i64),
    /// An integer outside the `i64` range.
    BigInteger(BigInt),
    /// A byte string (may or may not be valid UTF-8).
    Bytes(Bytes),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A dictionary with byte string keys.
    Dict(Dict),
}

impl Value {
    /// Creates a byte string value from a UTF-8 string.
    ///
    /// # Examples
    ///
    /// ```
    /// use bencodec::Value;
    ///
    /// let value = Value::string("hello");
    /// assert_eq!(value.as_str(), Some("hello"));
    /// ```
    pub fn string(s: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }

    /// Creates an integer value, using [`Value::Integer`] whenever it fits.
    pub fn big(n: BigInt) -> Self {
        match i64::try_from(&n) {
            Ok(small) => Value::Integer(small),
            Err(_) => Value::BigInteger(n),
        }
    }

    /// Builds a dictionary from key/value pairs, keeping their order.
    pub fn dict<K, I>(entries: I) -> Self
    where
        K: Into<Bytes>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns the value as an integer, if it is one that fits `i64`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bencodec::Value;
    ///
    /// let int = Value::Integer(42);
    /// assert_eq!(int.as_integer(), Some(42));
    ///
    /// let string = Value::string("hello");
    /// assert_eq!(string.as_integer(), None);
    /// ```
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as an arbitrary precision integer, if it is an integer.
    pub fn as_big_integer(&self) -> Option<BigInt> {
        match self {
            Value::Integer(i) => Some(BigInt::from(*i)),
            Value::BigInteger(n) => Some(n.clone()),
            _ => None,
        }
    }

    /// Returns the value as a byte string, if it is one.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value as a UTF-8 string, if it is a valid UTF-8 byte string.
    ///
    /// Returns `None` if the value is not a byte string or if the bytes are not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Returns the value as a list, if it is one.
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the value as a dictionary reference, if it is one.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Consumes the value and returns the dictionary, if it is one.
    pub fn into_dict(self) -> Option<Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Looks up a key in this value if it is a dictionary.
    ///
    /// Returns `None` if the value is not a dictionary or if the key is not present.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.as_dict()?.get(key)
    }
}

impl Default for Value {
    /// The empty byte string.
    fn default() -> Self {
        Value::Bytes(Bytes::new())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::big(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<Dict> for Value {
    fn from(d: Dict) -> Self {
        Value::Dict(d)
    }
}
