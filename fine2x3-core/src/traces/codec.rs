//! Binary encodings of trace vectors.
//!
//! Values are written as zigzag LEB128 varints with the odd walk lengths
//! (even indices) first and the even walk lengths second. Catalog keys frame
//! that body with a leading vertex count and a trailing `[0, 0]` sentinel.

use super::Traces;

/// Terminator appended to every catalog traces key.
pub const KEY_SENTINEL: [u8; 2] = [0, 0];

/// Longest zigzag varint produced for an `i64`.
const MAX_VARINT_LEN: usize = 10;

/// Payload bits the final varint byte may carry; the rest lie past bit 63.
const LAST_BYTE_PAYLOAD: u8 = 0x01;

fn put_varint(value: i64, out: &mut Vec<u8>) {
    let mut zigzag = ((value << 1) ^ (value >> 63)) as u64;
    while zigzag >= 0x80 {
        out.push((zigzag as u8) | 0x80);
        zigzag >>= 7;
    }
    out.push(zigzag as u8);
}

fn read_varint(bytes: &[u8]) -> Option<(i64, usize)> {
    let mut raw = 0_u64;
    for (idx, &byte) in bytes.iter().take(MAX_VARINT_LEN).enumerate() {
        if idx == MAX_VARINT_LEN - 1 && byte & 0x7F > LAST_BYTE_PAYLOAD {
            return None;
        }
        raw |= u64::from(byte & 0x7F) << (7 * idx);
        if byte < 0x80 {
            let value = ((raw >> 1) as i64) ^ -((raw & 1) as i64);
            return Some((value, idx + 1));
        }
    }
    None
}

/// Appends the odd/even interleaved varint body of `traces` to `out`.
///
/// # Examples
/// ```
/// use fine2x3_core::{Traces, traces::codec};
///
/// let mut out = Vec::new();
/// codec::append_odd_even(&Traces::from(vec![1, -1, 2]), &mut out);
/// // zigzag(1) = 2, zigzag(2) = 4, then zigzag(-1) = 1
/// assert_eq!(out, [2, 4, 1]);
/// ```
pub fn append_odd_even(traces: &[i64], out: &mut Vec<u8>) {
    out.reserve(traces.len() * 2);
    for &value in traces.iter().step_by(2) {
        put_varint(value, out);
    }
    for &value in traces.iter().skip(1).step_by(2) {
        put_varint(value, out);
    }
}

/// Decodes `count` values written by [`append_odd_even`].
///
/// Returns the traces and the number of bytes consumed, or `None` when the
/// input ends early or holds a malformed varint.
#[must_use]
pub fn decode_odd_even(bytes: &[u8], count: usize) -> Option<(Traces, usize)> {
    let mut values = vec![0_i64; count];
    let mut offset = 0;
    let indices = (0..count).step_by(2).chain((1..count).step_by(2));
    for idx in indices {
        let (value, used) = read_varint(bytes.get(offset..)?)?;
        values[idx] = value;
        offset += used;
    }
    Some((Traces::from(values), offset))
}

/// Builds the catalog key `[len] + body + [0, 0]` for `traces`.
///
/// The leading byte doubles as the vertex count because catalog keys are
/// always formed from `Traces(0)`.
///
/// # Panics
/// Panics when `traces` holds more than 255 entries.
#[must_use]
pub fn encode_key(traces: &[i64]) -> Vec<u8> {
    let len = u8::try_from(traces.len())
        .unwrap_or_else(|_| panic!("traces key supports at most 255 entries, got {}", traces.len()));
    let mut key = Vec::with_capacity(traces.len() * 2 + 3);
    key.push(len);
    append_odd_even(traces, &mut key);
    key.extend_from_slice(&KEY_SENTINEL);
    key
}

/// Decodes a key produced by [`encode_key`].
///
/// Returns the traces and the byte length of the key header, so callers can
/// locate any suffix (such as a canonical graph encoding) that follows it.
#[must_use]
pub fn decode_key(key: &[u8]) -> Option<(Traces, usize)> {
    let (&len, body) = key.split_first()?;
    let (traces, used) = decode_odd_even(body, usize::from(len))?;
    let header_len = 1 + used + KEY_SENTINEL.len();
    (body.get(used..used + KEY_SENTINEL.len())? == KEY_SENTINEL).then_some((traces, header_len))
}
