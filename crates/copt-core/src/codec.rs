//! # Memcomparable Key Codec
//!
//! Index rows are multi-column, but a histogram bucket boundary is a single
//! value. The bridge is this codec: a datum vector is encoded into a byte
//! string whose `memcmp` order equals the ordering of the vectors themselves.
//! The index histogram then stores and compares plain byte strings, and range
//! endpoints are encoded the same way before being looked up.
//!
//! ## Encoding Scheme
//!
//! Each datum is a one-byte kind flag followed by a kind-specific payload.
//! Flag values are chosen so that NULL orders below every other kind and the
//! `MaxValue` sentinel above every other kind:
//!
//! - `0x00` NULL, no payload.
//! - `0x01` bytes/strings: 8-byte groups, each followed by a marker byte.
//!   A full group's marker is `0xFF`; the final group is zero-padded and its
//!   marker is `0xFF - pad_count`. Padding with the lowest byte value keeps
//!   prefixes ordering before their extensions.
//! - `0x03` signed 64-bit integers: the sign bit is flipped and the value is
//!   written big-endian, which maps the signed order onto unsigned byte order.
//! - `0x05` floats: for non-negative values the sign bit is set; negative
//!   values are bitwise complemented. IEEE-754 ordering then agrees with byte
//!   order.
//! - `0xFA` `MaxValue`, no payload.
//!
//! Decoding is only needed one datum at a time (converting a single-column
//! index histogram back into a column histogram), so the decoder returns the
//! first datum and the remaining bytes. Strings decode as `Bytes`: the codec
//! does not retain enough type information to tell them apart, and callers
//! that care consult the column type.

use crate::datum::Datum;
use crate::error::StatsError;

const NIL_FLAG: u8 = 0x00;
const BYTES_FLAG: u8 = 0x01;
const INT_FLAG: u8 = 0x03;
const FLOAT_FLAG: u8 = 0x05;
const MAX_FLAG: u8 = 0xFA;

const GROUP_SIZE: usize = 8;
const GROUP_MARKER: u8 = 0xFF;
const SIGN_MASK: u64 = 0x8000_0000_0000_0000;

/// Encode a datum vector into a single memcomparable key.
pub fn encode_key(values: &[Datum]) -> Result<Vec<u8>, StatsError> {
    let mut out = Vec::with_capacity(values.len() * (GROUP_SIZE + 2));
    for value in values {
        encode_one(&mut out, value)?;
    }
    Ok(out)
}

fn encode_one(out: &mut Vec<u8>, value: &Datum) -> Result<(), StatsError> {
    match value {
        Datum::Null => out.push(NIL_FLAG),
        Datum::MaxValue => out.push(MAX_FLAG),
        Datum::Int64(v) => {
            out.push(INT_FLAG);
            out.extend_from_slice(&((*v as u64) ^ SIGN_MASK).to_be_bytes());
        }
        Datum::Float64(v) => {
            out.push(FLOAT_FLAG);
            let mut bits = v.into_inner().to_bits();
            if bits & SIGN_MASK == 0 {
                bits |= SIGN_MASK;
            } else {
                bits = !bits;
            }
            out.extend_from_slice(&bits.to_be_bytes());
        }
        Datum::Bytes(b) => encode_bytes(out, b),
        Datum::Utf8(s) => encode_bytes(out, s.as_bytes()),
    }
    Ok(())
}

fn encode_bytes(out: &mut Vec<u8>, data: &[u8]) {
    out.push(BYTES_FLAG);
    let mut chunks = data.chunks_exact(GROUP_SIZE);
    for chunk in &mut chunks {
        out.extend_from_slice(chunk);
        out.push(GROUP_MARKER);
    }
    // The final group is always emitted, even when empty, so that the key of
    // a whole-group-aligned value still terminates before any extension.
    let tail = chunks.remainder();
    let pad = GROUP_SIZE - tail.len();
    out.extend_from_slice(tail);
    out.extend(std::iter::repeat(0u8).take(pad));
    out.push(GROUP_MARKER - pad as u8);
}

/// Decode the first datum of an encoded key, returning it together with the
/// unconsumed remainder.
pub fn decode_first(key: &[u8]) -> Result<(Datum, &[u8]), StatsError> {
    let (&flag, rest) = key
        .split_first()
        .ok_or_else(|| StatsError::Codec("empty key".into()))?;
    match flag {
        NIL_FLAG => Ok((Datum::Null, rest)),
        MAX_FLAG => Ok((Datum::MaxValue, rest)),
        INT_FLAG => {
            let (v, rest) = take_u64(rest)?;
            Ok((Datum::Int64((v ^ SIGN_MASK) as i64), rest))
        }
        FLOAT_FLAG => {
            let (mut bits, rest) = take_u64(rest)?;
            if bits & SIGN_MASK != 0 {
                bits &= !SIGN_MASK;
            } else {
                bits = !bits;
            }
            Ok((Datum::Float64(f64::from_bits(bits).into()), rest))
        }
        BYTES_FLAG => decode_bytes(rest),
        other => Err(StatsError::Codec(format!("unknown kind flag {other:#04x}"))),
    }
}

fn take_u64(data: &[u8]) -> Result<(u64, &[u8]), StatsError> {
    if data.len() < 8 {
        return Err(StatsError::Codec("truncated numeric payload".into()));
    }
    let (head, rest) = data.split_at(8);
    let mut buf = [0u8; 8];
    buf.copy_from_slice(head);
    Ok((u64::from_be_bytes(buf), rest))
}

fn decode_bytes(mut data: &[u8]) -> Result<(Datum, &[u8]), StatsError> {
    let mut out = Vec::new();
    loop {
        if data.len() < GROUP_SIZE + 1 {
            return Err(StatsError::Codec("truncated byte group".into()));
        }
        let (group, rest) = data.split_at(GROUP_SIZE + 1);
        data = rest;
        let marker = group[GROUP_SIZE];
        if marker == GROUP_MARKER {
            out.extend_from_slice(&group[..GROUP_SIZE]);
            continue;
        }
        let pad = (GROUP_MARKER - marker) as usize;
        if pad > GROUP_SIZE {
            return Err(StatsError::Codec(format!("bad group marker {marker:#04x}")));
        }
        let used = GROUP_SIZE - pad;
        if group[used..GROUP_SIZE].iter().any(|&b| b != 0) {
            return Err(StatsError::Codec("nonzero padding in byte group".into()));
        }
        out.extend_from_slice(&group[..used]);
        return Ok((Datum::Bytes(out), data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordered_float::OrderedFloat;

    fn key(values: &[Datum]) -> Vec<u8> {
        encode_key(values).unwrap()
    }

    #[test]
    fn encoded_order_matches_datum_order() {
        // Each adjacent pair must encode to strictly increasing keys; within
        // a kind this is the datum order, across kinds the flag order.
        let rows: Vec<Vec<Datum>> = vec![
            vec![Datum::Null],
            vec![Datum::Bytes(b"".to_vec())],
            vec![Datum::Bytes(b"ab".to_vec())],
            vec![Datum::Bytes(b"abcdefgh".to_vec())],
            vec![Datum::Bytes(b"abcdefgh\x00".to_vec())],
            vec![Datum::Int64(i64::MIN)],
            vec![Datum::Int64(-1)],
            vec![Datum::Int64(0)],
            vec![Datum::Int64(i64::MAX)],
            vec![Datum::Float64(OrderedFloat(f64::NEG_INFINITY))],
            vec![Datum::Float64(OrderedFloat(-2.5))],
            vec![Datum::Float64(OrderedFloat(0.0))],
            vec![Datum::Float64(OrderedFloat(3.25))],
            vec![Datum::MaxValue],
        ];
        for pair in rows.windows(2) {
            assert!(
                key(&pair[0]) < key(&pair[1]),
                "expected {:?} < {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn composite_keys_order_lexicographically() {
        let a = key(&[Datum::Int64(1), Datum::Utf8("b".into())]);
        let b = key(&[Datum::Int64(1), Datum::Utf8("c".into())]);
        let c = key(&[Datum::Int64(2), Datum::Utf8("a".into())]);
        assert!(a < b && b < c);
    }

    #[test]
    fn prefix_orders_before_extension() {
        let short = key(&[Datum::Utf8("abcdefgh".into())]);
        let long = key(&[Datum::Utf8("abcdefghi".into())]);
        assert!(short < long);
    }

    #[test]
    fn decode_reverses_encode() {
        let values = [
            Datum::Null,
            Datum::Int64(-42),
            Datum::Float64(OrderedFloat(1.5)),
            Datum::Bytes(b"hello, histogram".to_vec()),
            Datum::MaxValue,
        ];
        let mut rest: &[u8] = &key(&values);
        for expected in &values {
            let (got, tail) = decode_first(rest).unwrap();
            // Strings round-trip as bytes; everything else as itself.
            match expected {
                Datum::Utf8(s) => assert_eq!(got, Datum::Bytes(s.as_bytes().to_vec())),
                other => assert_eq!(&got, other),
            }
            rest = tail;
        }
        assert!(rest.is_empty());
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(decode_first(&[]).is_err());
        assert!(decode_first(&[INT_FLAG, 1, 2]).is_err());
        assert!(decode_first(&[BYTES_FLAG, 0, 0, 0]).is_err());
    }
}
