use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bytes::Bytes;
use num_bigint::BigInt;

use super::*;
use crate::error::ErrorKind;
use crate::value::Value;

crate::bencode_record! {
    #[derive(Debug, Default)]
    struct Node {
        name: String,
        children: Vec<String> => ",omitempty",
        extra: Option<Vec<i64>>,
        meta: Option<BTreeMap<String, i64>>,
    }
}

#[test]
fn test_encode_integer() {
    assert_eq!(encode(&42i64).unwrap(), b"i42e");
    assert_eq!(encode(&-42i32).unwrap(), b"i-42e");
    assert_eq!(encode(&0u8).unwrap(), b"i0e");
    assert_eq!(encode(&true).unwrap(), b"i1e");
    assert_eq!(encode(&false).unwrap(), b"i0e");
}

#[test]
fn test_encode_integer_extremes() {
    assert_eq!(encode(&i64::MIN).unwrap(), b"i-9223372036854775808e");
    assert_eq!(encode(&i64::MAX).unwrap(), b"i9223372036854775807e");
    assert_eq!(encode(&u64::MAX).unwrap(), b"i18446744073709551615e");
    assert_eq!(encode(&i8::MIN).unwrap(), b"i-128e");
    assert_eq!(
        encode(&i128::MIN).unwrap(),
        format!("i{}e", i128::MIN).as_bytes()
    );
}

#[test]
fn test_encode_big_integer() {
    let n: BigInt = "-123456789012345678901234567890".parse().unwrap();
    assert_eq!(
        encode(&n).unwrap(),
        b"i-123456789012345678901234567890e"
    );
}

#[test]
fn test_encode_strings() {
    assert_eq!(encode(&"spam".to_string()).unwrap(), b"4:spam");
    assert_eq!(encode(&String::new()).unwrap(), b"0:");
    assert_eq!(encode(&Bytes::from_static(b"\x00\xff")).unwrap(), b"2:\x00\xff");
}

#[test]
fn test_encode_byte_sequences() {
    assert_eq!(encode(&vec![1u8, 2, 3]).unwrap(), b"3:\x01\x02\x03");
    assert_eq!(encode(&Vec::<u8>::new()).unwrap(), b"0:");
    assert_eq!(encode(&[0xabu8; 2]).unwrap(), b"2:\xab\xab");
}

#[test]
fn test_encode_lists() {
    assert_eq!(encode(&vec![1i64, 2, 3]).unwrap(), b"li1ei2ei3ee");
    assert_eq!(encode(&Vec::<i64>::new()).unwrap(), b"le");
    assert_eq!(
        encode(&vec![vec!["a".to_string()], vec![]]).unwrap(),
        b"ll1:aelee"
    );
    assert_eq!(encode(&[1u16, 2]).unwrap(), b"li1ei2ee");
}

#[test]
fn test_encode_maps_sorted() {
    let mut map = HashMap::new();
    for key in ["zeta", "alpha", "mid", "Alpha", "a"] {
        map.insert(key.to_string(), key.len() as i64);
    }
    assert_eq!(
        encode(&map).unwrap(),
        b"d5:Alphai5e1:ai1e5:alphai5e3:midi3e4:zetai4ee"
    );

    let mut bytes_keyed = BTreeMap::new();
    bytes_keyed.insert(Bytes::from_static(b"\xff"), 1i64);
    bytes_keyed.insert(Bytes::from_static(b"\x00"), 2i64);
    assert_eq!(encode(&bytes_keyed).unwrap(), b"d1:\x00i2e1:\xffi1ee");
}

#[test]
fn test_encode_map_with_unsupported_key() {
    let mut map = BTreeMap::new();
    map.insert(1i64, 1i64);
    let err = encode(&map).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);
}

#[test]
fn test_encode_value_sorts_keys() {
    let value = Value::dict([
        ("foo", Value::Integer(42)),
        ("bar", Value::string("spam")),
    ]);
    assert_eq!(encode(&value).unwrap(), b"d3:bar4:spam3:fooi42ee");
}

#[test]
fn test_encode_pointers() {
    assert_eq!(encode(&Box::new(7i64)).unwrap(), b"i7e");
    assert_eq!(encode(&Arc::new("x".to_string())).unwrap(), b"1:x");
    assert_eq!(encode(&Some(3u8)).unwrap(), b"i3e");
    assert_eq!(encode(&None::<Vec<i64>>).unwrap(), b"le");
}

#[test]
fn test_encode_absent_containers_in_record() {
    let node = Node {
        name: "root".into(),
        ..Default::default()
    };
    assert_eq!(
        encode(&node).unwrap(),
        b"d5:extrale4:metade4:name4:roote"
    );
}

#[test]
fn test_encode_omitempty() {
    let mut node = Node {
        name: "n".into(),
        extra: Some(vec![1]),
        ..Default::default()
    };
    assert_eq!(encode(&node).unwrap(), b"d5:extrali1ee4:metade4:name1:ne");

    node.children.push("c".into());
    assert_eq!(
        encode(&node).unwrap(),
        b"d8:childrenl1:ce5:extrali1ee4:metade4:name1:ne"
    );
}

#[test]
fn test_encode_unsupported_types() {
    assert_eq!(encode(&1.5f64).unwrap_err().kind(), ErrorKind::UnsupportedType);
    assert_eq!(encode(&'c').unwrap_err().kind(), ErrorKind::UnsupportedType);
    assert_eq!(
        encode(&vec![1.0f32]).unwrap_err().kind(),
        ErrorKind::UnsupportedType
    );
}

#[test]
fn test_encode_to_writer() {
    let mut out = Vec::new();
    encode_to(&vec!["a".to_string()], &mut out).unwrap();
    assert_eq!(out, b"l1:ae");

    encode_to(&1i64, &mut out).unwrap();
    assert_eq!(out, b"l1:aei1e");
}

#[test]
fn test_encode_to_writes_nothing_on_failure() {
    let mut out = Vec::new();
    assert!(encode_to(&vec![0.5f64], &mut out).is_err());
    assert!(out.is_empty());
}

#[test]
fn test_encoder_primitives() {
    let mut out = Encoder::new(crate::pool::BufferPool::global().lease());
    out.begin_dict();
    out.write_bytes(b"k").unwrap();
    out.begin_list();
    out.write_integer(-1).unwrap();
    out.write_raw(b"0:");
    out.end();
    out.end();
    assert_eq!(out.as_bytes(), b"d1:kli-1e0:ee");
}
