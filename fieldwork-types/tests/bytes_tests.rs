use fieldwork_types::{ByteString, Error};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ── Base64 ───────────────────────────────────────────────────────

#[test]
fn encodes_standard_base64() {
    let bytes = ByteString::new(b"hello".to_vec());
    assert_eq!(bytes.to_base64(), "aGVsbG8=");
}

#[test]
fn decodes_standard_base64() {
    let bytes = ByteString::from_base64("aGVsbG8=").unwrap();
    assert_eq!(bytes.as_bytes(), b"hello");
}

#[test]
fn decode_rejects_invalid_text() {
    let err = ByteString::from_base64("not base64!").unwrap_err();
    assert!(matches!(err, Error::InvalidBytes(_)));
}

#[test]
fn empty_round_trips() {
    let bytes = ByteString::from_base64("").unwrap();
    assert!(bytes.is_empty());
    assert_eq!(bytes.to_base64(), "");
}

// ── Conversions ──────────────────────────────────────────────────

#[test]
fn from_slice_and_vec_agree() {
    let a = ByteString::from(&[1u8, 2, 3][..]);
    let b = ByteString::from(vec![1u8, 2, 3]);
    assert_eq!(a, b);
    assert_eq!(a.len(), 3);
    assert_eq!(b.into_vec(), vec![1, 2, 3]);
}

#[test]
fn display_is_base64() {
    let bytes = ByteString::new(vec![0xff, 0x00]);
    assert_eq!(bytes.to_string(), "/wA=");
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn serializes_as_base64_string() {
    let bytes = ByteString::new(b"hi".to_vec());
    assert_eq!(serde_json::to_string(&bytes).unwrap(), "\"aGk=\"");
}

#[test]
fn deserialize_rejects_bad_base64() {
    let result: Result<ByteString, _> = serde_json::from_str("\"%%%\"");
    assert!(result.is_err());
}

proptest! {
    #[test]
    fn base64_round_trips(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let bytes = ByteString::new(data);
        prop_assert_eq!(ByteString::from_base64(&bytes.to_base64()).unwrap(), bytes);
    }
}
