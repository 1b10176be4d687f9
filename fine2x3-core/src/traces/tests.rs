//! Tests for trace vectors, their key codec, and identifiers.

use proptest::prelude::*;
use rstest::rstest;

use super::{Traces, TracesId, codec};
use crate::test_utils::suite_proptest_config;

#[rstest]
#[case::shorter_prefix(vec![4, 10], vec![4, 10, 28], true)]
#[case::empty_matches_all(vec![], vec![1, 2, 3], true)]
#[case::diverges(vec![4, 10], vec![4, 11], false)]
fn is_equal_compares_shorter_length(
    #[case] lhs: Vec<i64>,
    #[case] rhs: Vec<i64>,
    #[case] expected: bool,
) {
    assert_eq!(Traces::from(lhs).is_equal(&rhs), expected);
}

#[rstest]
fn subtract_truncates_to_shorter_input() {
    let target = Traces::from(vec![7, 19, 55]);
    let mut diff = Traces::from(vec![9; 8]);
    let is_zero = target.subtract(&[3, 9], &mut diff);
    assert!(!is_zero);
    assert_eq!(diff.as_slice(), &[4, 10]);
}

#[rstest]
#[case::boson(vec![0, 6, 0, 18], true)]
#[case::fermion(vec![2, 6, 0, 18], false)]
#[case::late_odd_trace(vec![0, 6, 4], false)]
fn classifies_bosons(#[case] values: Vec<i64>, #[case] expected: bool) {
    assert_eq!(Traces::from(values).is_boson(), expected);
}

#[rstest]
fn set_len_zero_fills_growth() {
    let mut traces = Traces::from(vec![5]);
    traces.set_len(3);
    assert_eq!(traces.as_slice(), &[5, 0, 0]);
    traces.set_len(1);
    assert_eq!(traces.as_slice(), &[5]);
}

#[rstest]
fn key_layout_frames_body() {
    let key = codec::encode_key(&[4, 10]);
    // len, zigzag(4), zigzag(10), sentinel
    assert_eq!(key, [2, 8, 20, 0, 0]);
}

#[rstest]
fn key_header_length_locates_suffix() {
    let mut key = codec::encode_key(&[-3, 0, 12, -700]);
    let header = key.len();
    key.extend_from_slice(&[9, 9, 9]);
    let (traces, header_len) = codec::decode_key(&key).expect("key should decode");
    assert_eq!(header_len, header);
    assert_eq!(traces.as_slice(), &[-3, 0, 12, -700]);
}

#[rstest]
#[case::empty(&[])]
#[case::truncated_body(&[3, 8, 20])]
#[case::missing_sentinel(&[1, 8, 1, 0])]
#[case::unterminated_varint(&[1, 0x80, 0x80])]
#[case::varint_past_bit_63(&[1, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02, 0, 0])]
#[case::varint_too_long(&[1, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x81, 0, 0])]
fn rejects_malformed_keys(#[case] key: &[u8]) {
    assert!(codec::decode_key(key).is_none());
}

#[rstest]
fn extreme_values_survive_a_full_length_varint() {
    let key = codec::encode_key(&[i64::MIN]);
    assert_eq!(key.len(), 1 + 10 + 2);
    assert_eq!(key[10], 0x01);
    let (traces, _) = codec::decode_key(&key).expect("ten-byte varint should decode");
    assert_eq!(traces.as_slice(), &[i64::MIN]);
}

#[rstest]
fn traces_id_orders_by_vertex_count_first() {
    let small = TracesId::new(3, 900);
    let large = TracesId::new(4, 1);
    assert!(small < large);
    assert!(small.marshal() < large.marshal());
}

#[rstest]
fn traces_id_rejects_short_input() {
    assert_eq!(TracesId::unmarshal(&[0, 1, 2]), None);
}

proptest! {
    #![proptest_config(suite_proptest_config(128))]

    #[test]
    fn key_round_trips(values in prop::collection::vec(any::<i64>(), 0..32)) {
        let key = codec::encode_key(&values);
        let (decoded, header_len) = codec::decode_key(&key).expect("key should decode");
        prop_assert_eq!(decoded.as_slice(), values.as_slice());
        prop_assert_eq!(header_len, key.len());
    }

    #[test]
    fn key_order_follows_vertex_count(
        short in prop::collection::vec(-50_i64..50, 1..6),
        long in prop::collection::vec(-50_i64..50, 6..10),
    ) {
        prop_assert!(codec::encode_key(&short) < codec::encode_key(&long));
    }
}
