use std::collections::BTreeMap;
use std::io::{self, BufReader, Read};
use std::sync::Arc;

use bytes::Bytes;
use num_bigint::BigInt;

use super::*;
use crate::error::ErrorKind;

crate::bencode_record! {
    #[derive(Debug, Default, PartialEq)]
    struct File {
        name: String,
        length: i64,
    }
}

crate::bencode_record! {
    #[derive(Debug, Default, PartialEq)]
    struct Outer {
        file: File,
        note: String,
    }
}

#[test]
fn test_decode_integer() {
    assert_eq!(decode::<i64>(b"i42e").unwrap(), 42);
    assert_eq!(decode::<i64>(b"i-42e").unwrap(), -42);
    assert_eq!(decode::<i64>(b"i0e").unwrap(), 0);
    assert_eq!(decode::<u8>(b"i255e").unwrap(), 255);
}

#[test]
fn test_decode_integer_invalid() {
    for input in [&b"i-0e"[..], b"i03e", b"ie", b"i-e", b"i1x2e", b"i+1e"] {
        let err = decode::<i64>(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax, "{:?}", input);
    }
}

#[test]
fn test_decode_integer_overflow() {
    let err = decode::<u8>(b"i256e").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Overflow);
    assert_eq!(err.offset(), Some(0));
    assert!(err.to_string().contains("256"));

    let err = decode::<i64>(b"i9223372036854775808e").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Overflow);

    let err = decode::<u32>(b"i-1e").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Overflow);
}

#[test]
fn test_decode_integer_extremes() {
    assert_eq!(decode::<i64>(b"i9223372036854775807e").unwrap(), i64::MAX);
    assert_eq!(decode::<i64>(b"i-9223372036854775808e").unwrap(), i64::MIN);
    assert_eq!(
        decode::<u64>(b"i18446744073709551615e").unwrap(),
        u64::MAX
    );
    assert_eq!(decode::<i8>(b"i-128e").unwrap(), i8::MIN);
}

#[test]
fn test_decode_big_integer() {
    let n: BigInt = decode(b"i12345678901234567890e").unwrap();
    assert_eq!(n.to_string(), "12345678901234567890");

    let value = decode_value(b"i12345678901234567890e").unwrap();
    assert_eq!(value, Value::BigInteger(n));

    let value = decode_value(b"i-9223372036854775808e").unwrap();
    assert_eq!(value, Value::Integer(i64::MIN));
}

#[test]
fn test_decode_bool() {
    assert!(!decode::<bool>(b"i0e").unwrap());
    assert!(decode::<bool>(b"i1e").unwrap());
    assert!(decode::<bool>(b"i-7e").unwrap());
    assert_eq!(
        decode::<bool>(b"0:").unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_decode_strings() {
    assert_eq!(decode::<String>(b"4:spam").unwrap(), "spam");
    assert_eq!(decode::<String>(b"0:").unwrap(), "");
    assert_eq!(decode::<Bytes>(b"3:\x00\x01\x02").unwrap(), &b"\x00\x01\x02"[..]);
    assert_eq!(decode::<Vec<u8>>(b"3:abc").unwrap(), b"abc");
}

#[test]
fn test_decode_string_not_utf8() {
    let err = decode::<String>(b"2:\xff\xfe").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.offset(), Some(0));
}

#[test]
fn test_decode_truncated_string() {
    let err = decode::<String>(b"5:ab").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    assert_eq!(err.offset(), Some(4));

    let err = decode::<String>(b"5").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
}

#[test]
fn test_decode_bad_string_length() {
    assert_eq!(
        decode::<String>(b"05:hello").unwrap_err().kind(),
        ErrorKind::Syntax
    );
    assert_eq!(
        decode::<String>(b"99999999999999999999999:x").unwrap_err().kind(),
        ErrorKind::Syntax
    );
    assert_eq!(
        decode::<String>(b"3x:abc").unwrap_err().kind(),
        ErrorKind::Syntax
    );
}

#[test]
fn test_decode_lists() {
    let nested: Vec<Vec<i64>> = decode(b"lli1ei2eeli3eelee").unwrap();
    assert_eq!(nested, vec![vec![1, 2], vec![3], vec![]]);

    let words: Vec<String> = decode(b"l4:spam4:eggse").unwrap();
    assert_eq!(words, ["spam", "eggs"]);
}

#[test]
fn test_decode_into_replaces_sequence() {
    let mut list = vec![9i64, 9, 9];
    decode_into(b"li1ee", &mut list).unwrap();
    assert_eq!(list, [1]);
}

#[test]
fn test_decode_arrays() {
    let hash: [u8; 4] = decode(b"4:abcd").unwrap();
    assert_eq!(&hash, b"abcd");
    assert_eq!(
        decode::<[u8; 4]>(b"3:abc").unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );

    let triple: [i64; 3] = decode(b"li1ei2ei3ee").unwrap();
    assert_eq!(triple, [1, 2, 3]);
    assert_eq!(
        decode::<[i64; 3]>(b"li1ei2ee").unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        decode::<[i64; 3]>(b"li1ei2ei3ei4ee").unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_decode_map_merges() {
    let mut map = BTreeMap::new();
    map.insert("keep".to_string(), 1i64);
    map.insert("swap".to_string(), 2i64);
    decode_into(b"d3:newi3e4:swapi4ee", &mut map).unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(map["keep"], 1);
    assert_eq!(map["swap"], 4);
    assert_eq!(map["new"], 3);
}

#[test]
fn test_decode_map_non_utf8_key() {
    let err = decode::<BTreeMap<String, i64>>(b"d1:\xffi1ee").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    let map: BTreeMap<Vec<u8>, i64> = decode(b"d1:\xffi1ee").unwrap();
    assert_eq!(map[&vec![0xffu8]], 1);
}

#[test]
fn test_decode_dict_missing_value() {
    let err = decode_value(b"d3:fooe").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.offset(), Some(6));
}

#[test]
fn test_decode_dict_key_not_string() {
    let err = decode_value(b"di1ei2ee").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.offset(), Some(1));
}

#[test]
fn test_decode_dynamic_keeps_input_order() {
    let value = decode_value(b"d1:bi1e1:ai2ee").unwrap();
    let keys: Vec<&[u8]> = value.as_dict().unwrap().keys().map(|k| &k[..]).collect();
    assert_eq!(keys, [&b"b"[..], &b"a"[..]]);
}

#[test]
fn test_decode_dynamic_duplicate_keys() {
    let value = decode_value(b"d1:ai1e1:bi2e1:ai3ee").unwrap();
    let dict = value.as_dict().unwrap();
    assert_eq!(dict.len(), 2);
    assert_eq!(value.get(b"a"), Some(&Value::Integer(3)));
    assert_eq!(dict.get_index(0).map(|(k, _)| &k[..]), Some(&b"a"[..]));
}

#[test]
fn test_decode_record_field_mismatch() {
    let err = decode::<File>(b"d4:namei5ee").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.offset(), Some(7));
    let context = err.context().unwrap();
    assert!(context.type_name.ends_with("File"));
    assert_eq!(context.field, "name");
}

#[test]
fn test_decode_record_innermost_field_context() {
    let err = decode::<Outer>(b"d4:filed6:lengthi99999999999999999999eee").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Overflow);
    let context = err.context().unwrap();
    assert!(context.type_name.ends_with("File"));
    assert_eq!(context.field, "length");
}

#[test]
fn test_decode_record_not_a_dict() {
    let err = decode::<File>(b"li1ee").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert!(err.context().is_none());
}

#[test]
fn test_decode_record_skips_unknown_keys() {
    let file: File = decode(b"d5:extrad1:xli1eee6:lengthi3e4:name1:ae").unwrap();
    assert_eq!(
        file,
        File {
            name: "a".into(),
            length: 3
        }
    );
}

#[test]
fn test_decode_record_strict_rejects_unknown_keys() {
    let config = DecoderConfig::default().with_strict(true);
    let err = decode_with_config::<File>(b"d5:extrai1e4:name1:ae", config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownField);
    assert!(err.to_string().contains("extra"));
}

#[test]
fn test_decode_into_record_merges() {
    let mut file = File {
        name: "old".into(),
        length: 7,
    };
    decode_into(b"d4:name3:newe", &mut file).unwrap();
    assert_eq!(file.name, "new");
    assert_eq!(file.length, 7);
}

#[test]
fn test_decode_option_and_box() {
    let value: Option<i64> = decode(b"i5e").unwrap();
    assert_eq!(value, Some(5));

    let boxed: Box<String> = decode(b"3:abc").unwrap();
    assert_eq!(*boxed, "abc");
}

#[test]
fn test_decode_into_shared_arc() {
    let mut shared = Arc::new(0i64);
    let _other = Arc::clone(&shared);
    let err = decode_into(b"i1e", &mut shared).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTarget);

    let mut unique = Arc::new(0i64);
    decode_into(b"i1e", &mut unique).unwrap();
    assert_eq!(*unique, 1);
}

#[test]
fn test_decode_trailing_data() {
    let err = decode::<i64>(b"i1ei2e").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.offset(), Some(3));
}

#[test]
fn test_decode_empty_input() {
    let err = decode::<i64>(b"").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    assert_eq!(err.offset(), Some(0));
}

#[test]
fn test_decode_unknown_lead_byte() {
    let err = decode_value(b"x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.offset(), Some(0));

    let err = decode_value(b"e").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn test_decode_unterminated_list() {
    let err = decode_value(b"li1e").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
}

#[test]
fn test_nesting_limit() {
    let config = DecoderConfig::default().with_max_depth(2);
    assert!(decode_with_config::<Value>(b"llee", config.clone()).is_ok());

    let err = decode_with_config::<Value>(b"llleee", config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NestingTooDeep);
    assert_eq!(err.offset(), Some(2));
}

#[test]
fn test_default_nesting_limit() {
    let deep = format!("{}{}", "l".repeat(MAX_DEPTH + 1), "e".repeat(MAX_DEPTH + 1));
    let err = decode_value(deep.as_bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NestingTooDeep);

    let ok = format!("{}{}", "l".repeat(MAX_DEPTH), "e".repeat(MAX_DEPTH));
    assert!(decode_value(ok.as_bytes()).is_ok());
}

#[test]
fn test_stream_decoder() {
    let mut decoder = Decoder::new(&b"i1e4:spamli2eed1:ai3ee"[..]);
    assert_eq!(decoder.decode_next::<i64>().unwrap(), Some(1));
    assert_eq!(decoder.offset(), 3);
    assert_eq!(decoder.decode_next::<String>().unwrap(), Some("spam".into()));
    assert_eq!(decoder.decode_next::<Vec<i64>>().unwrap(), Some(vec![2]));

    let mut map = BTreeMap::new();
    assert!(decoder.decode_next_into::<BTreeMap<String, i64>>(&mut map).unwrap());
    assert_eq!(map["a"], 3);

    assert_eq!(decoder.decode_next::<i64>().unwrap(), None);
    assert!(!decoder.decode_next_into(&mut 0i64).unwrap());
    assert_eq!(decoder.offset(), 22);
}

#[test]
fn test_stream_decoder_truncated_value() {
    let mut decoder = Decoder::new(&b"i1eli2e"[..]);
    assert_eq!(decoder.decode_next::<i64>().unwrap(), Some(1));
    let err = decoder.decode_next::<Vec<i64>>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
}

#[test]
fn test_stream_decoder_into_inner() {
    let mut decoder = Decoder::new(&b"i1erest"[..]);
    assert_eq!(decoder.decode_next::<i64>().unwrap(), Some(1));
    assert_eq!(decoder.into_inner(), b"rest");
}

#[test]
fn test_stream_decoder_with_registry() {
    let registry = Registry::new();
    let mut decoder = Decoder::with_registry(&b"i7e"[..], DecoderConfig::default(), &registry);
    assert_eq!(decoder.decode_next::<i64>().unwrap(), Some(7));
    assert!(!registry.is_empty());
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
    }
}

#[test]
fn test_stream_decoder_io_error() {
    let mut decoder = Decoder::new(BufReader::new(FailingReader));
    let err = decoder.decode_next::<i64>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_decode_with_registry() {
    let registry = Registry::new();
    let file: File = registry.decode(b"d6:lengthi1e4:name1:xe").unwrap();
    assert_eq!(file.name, "x");
    assert_eq!(file.length, 1);
}
