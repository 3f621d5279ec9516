use bytes::Bytes;
use num_bigint::BigInt;

use super::{Bencode, Kind, Strategy};
use crate::decode::Scanner;
use crate::encode::Encoder;
use crate::error::BencodeError;
use crate::grammar::{Token, TokenKind};
use crate::registry::Registry;
use crate::value::{Dict, Value};

/// Integer text that does not fit `i64` becomes a big integer.
enum Parsed {
    Small(i64),
    Big(BigInt),
}

fn parse_integer(text: &str) -> Option<Parsed> {
    match text.parse::<i64>() {
        Ok(n) => Some(Parsed::Small(n)),
        Err(_) => text.parse::<BigInt>().ok().map(Parsed::Big),
    }
}

fn read_value(scan: &mut Scanner<'_>, token: Token) -> Result<Value, BencodeError> {
    match token.kind {
        TokenKind::Integer => Ok(match scan.read_integer(token, "integer", parse_integer)? {
            Parsed::Small(n) => Value::Integer(n),
            Parsed::Big(n) => Value::BigInteger(n),
        }),
        TokenKind::ByteString => Ok(Value::Bytes(Bytes::from(scan.read_string(token)?))),
        TokenKind::List => {
            let mut list = Vec::new();
            scan.read_list(token, |scan, next| {
                list.push(read_value(scan, next)?);
                Ok(())
            })?;
            Ok(Value::List(list))
        }
        TokenKind::Dict => {
            let mut dict = Dict::new();
            scan.read_dict(token, |scan, key, next| {
                let value = read_value(scan, next)?;
                dict.insert(Bytes::from(key), value);
                Ok(())
            })?;
            Ok(Value::Dict(dict))
        }
        TokenKind::End => Err(BencodeError::syntax(
            token.offset,
            "expected a value, found end marker",
        )),
    }
}

fn write_value(value: &Value, out: &mut Encoder) -> Result<(), BencodeError> {
    match value {
        Value::Integer(n) => out.write_integer(n),
        Value::BigInteger(n) => out.write_integer(n),
        Value::Bytes(bytes) => out.write_bytes(bytes),
        Value::List(list) => {
            out.begin_list();
            for item in list {
                write_value(item, out)?;
            }
            out.end();
            Ok(())
        }
        Value::Dict(dict) => {
            let mut entries: Vec<(&Bytes, &Value)> = dict.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            out.begin_dict();
            for (key, value) in entries {
                out.write_bytes(key)?;
                write_value(value, out)?;
            }
            out.end();
            Ok(())
        }
    }
}

impl Strategy<Value> {
    /// Strategy for an open target: accepts any value and builds a tree.
    pub fn dynamic() -> Self {
        Strategy::new(
            Kind::Dynamic,
            write_value,
            |scan, token, target: &mut Value| {
                *target = read_value(scan, token)?;
                Ok(())
            },
        )
    }
}

impl Bencode for Value {
    fn strategy(_: &Registry) -> Result<Strategy<Self>, BencodeError> {
        Ok(Strategy::dynamic())
    }

    fn is_empty_value(&self) -> bool {
        match self {
            Value::Integer(n) => *n == 0,
            Value::BigInteger(_) => false,
            Value::Bytes(bytes) => bytes.is_empty(),
            Value::List(list) => list.is_empty(),
            Value::Dict(dict) => dict.is_empty(),
        }
    }
}
