//! bencodec - typed bencode serialization
//!
//! Bencode is the serialization format BitTorrent uses for `.torrent` files,
//! tracker responses and DHT messages. This crate maps it onto Rust types:
//! every type implementing [`Bencode`] has a [`Strategy`] that the
//! [`Registry`] builds once and reuses for every later call.
//!
//! # Data Types
//!
//! | Wire type | Format | Rust targets |
//! |-----------|--------|--------------|
//! | Integer | `i<number>e` | `bool`, `i8`..`u128`, `BigInt` |
//! | Byte String | `<length>:<data>` | `String`, `Bytes`, `Vec<u8>`, `[u8; N]` |
//! | List | `l<items>e` | `Vec<E>`, `[E; N]` |
//! | Dictionary | `d<key><value>...e` | records, `BTreeMap`, `HashMap` |
//!
//! [`Value`] decodes any of them, and [`RawValue`] keeps a value's exact bytes.
//!
//! # Examples
//!
//! ```
//! use bencodec::{bencode_record, decode, encode};
//!
//! bencode_record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Info {
//!         pub name: String,
//!         pub piece_length: u32 => "piece length",
//!         pub private: bool => ",omitempty",
//!     }
//! }
//!
//! let info = Info { name: "a.txt".into(), piece_length: 16384, private: false };
//! let bytes = encode(&info).unwrap();
//! assert_eq!(bytes, b"d4:name5:a.txt12:piece lengthi16384ee");
//! assert_eq!(decode::<Info>(&bytes).unwrap(), info);
//! ```
//!
//! Output is canonical: dictionary and record keys are always written in
//! ascending byte order. Input dictionaries may arrive in any order.

mod constants;
mod decode;
mod encode;
mod error;
mod fields;
mod grammar;
mod hooks;
mod macros;
mod pool;
mod registry;
mod strategy;
mod value;

pub use decode::{decode, decode_into, decode_value, decode_with_config, Decoder, DecoderConfig};
pub use encode::{encode, encode_to};
pub use error::{BencodeError, BoxError, ErrorKind, FieldContext};
pub use fields::{FieldDescriptor, FieldSet, Record, Tag};
pub use hooks::{Marshal, RawValue, Unmarshal};
pub use pool::BufferPool;
pub use registry::Registry;
pub use strategy::{Bencode, ByteContainer, FixedWidth, Kind, Mapping, Pointer, Strategy};
pub use value::{Dict, Value};
