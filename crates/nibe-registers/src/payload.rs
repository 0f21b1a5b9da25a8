use std::iter::FusedIterator;

use crate::rules::decode;
use crate::value::{RawValue, RegisterId, RegisterValue};

/// Cursor position of the first entry. The register ID sits three bytes
/// behind the cursor, so the first entry's ID is `payload[1]`.
const FIRST_CURSOR: usize = 4;

/// Lazy walk over the packed register entries of a payload.
///
/// At cursor `i` the register ID is `payload[i - 3]`. The value is two bytes
/// (`payload[i - 2..i]`, big-endian) when `i` is before the end and either
/// `payload[i]` is `0x00` or `i` is the last index; otherwise it is the single
/// byte `payload[i - 2]`. Two-byte entries advance the cursor by 4, one-byte
/// entries by 3. The walk stops once the cursor passes the payload length.
#[derive(Debug, Clone)]
pub struct PayloadEntries<'a> {
    payload: &'a [u8],
    cursor: usize,
}

impl<'a> PayloadEntries<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            cursor: FIRST_CURSOR,
        }
    }
}

impl Iterator for PayloadEntries<'_> {
    type Item = (RegisterId, RawValue);

    fn next(&mut self) -> Option<Self::Item> {
        let payload = self.payload;
        let len = payload.len();
        let i = self.cursor;
        if i > len {
            return None;
        }

        let register = payload[i - 3];
        // The positional check and the value check are both part of the
        // protocol; `i == len` never looks ahead.
        let two_byte = i != len && (payload[i] == 0x00 || i == len - 1);
        let raw = if two_byte {
            self.cursor += 4;
            RawValue::Word([payload[i - 2], payload[i - 1]])
        } else {
            self.cursor += 3;
            RawValue::Byte(payload[i - 2])
        };
        Some((register, raw))
    }
}

impl FusedIterator for PayloadEntries<'_> {}

/// Decode every entry of a payload, without change tracking.
pub fn decode_payload(payload: &[u8]) -> impl Iterator<Item = (RegisterId, RegisterValue)> + '_ {
    PayloadEntries::new(payload).map(|(register, raw)| (register, decode(register, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(payload: &[u8]) -> Vec<(RegisterId, RawValue)> {
        PayloadEntries::new(payload).collect()
    }

    #[test]
    fn mixed_width_payload() {
        let payload = [
            0x00, 0x01, 0xFF, 0xF6, 0x00, 0x19, 0x64, 0x00, 0x28, 0x00, 0x32, 0x00,
        ];

        assert_eq!(
            entries(&payload),
            vec![
                (1, RawValue::Word([0xFF, 0xF6])),
                (25, RawValue::Byte(100)),
                (40, RawValue::Word([0x00, 0x32])),
            ]
        );

        let decoded: Vec<_> = decode_payload(&payload).collect();
        assert_eq!(
            decoded,
            vec![
                (1, RegisterValue::Float(-1.0)),
                (25, RegisterValue::Integer(10)),
                (40, RegisterValue::Float(25.0)),
            ]
        );
    }

    #[test]
    fn short_payloads_have_no_entries() {
        assert!(entries(&[]).is_empty());
        assert!(entries(&[0x00]).is_empty());
        assert!(entries(&[0x00, 0x01, 0x02]).is_empty());
    }

    #[test]
    fn cursor_at_length_reads_one_byte() {
        // i == len: no lookahead, single byte.
        assert_eq!(
            entries(&[0x00, 0x01, 0xAB, 0xCD]),
            vec![(1, RawValue::Byte(0xAB))]
        );
    }

    #[test]
    fn cursor_at_last_index_reads_two_bytes_whatever_the_marker() {
        for marker in [0x00, 0x05, 0xFF] {
            assert_eq!(
                entries(&[0x00, 0x01, 0xAB, 0xCD, marker]),
                vec![(1, RawValue::Word([0xAB, 0xCD]))],
                "marker {marker:#04x}"
            );
        }
    }

    #[test]
    fn cursor_before_last_index_follows_marker() {
        assert_eq!(
            entries(&[0x00, 0x01, 0xAB, 0xCD, 0x05, 0x07]),
            vec![(1, RawValue::Byte(0xAB))]
        );
        assert_eq!(
            entries(&[0x00, 0x01, 0xAB, 0xCD, 0x00, 0x07]),
            vec![(1, RawValue::Word([0xAB, 0xCD]))]
        );
    }

    #[test]
    fn one_byte_entries_chain_on_the_marker_byte() {
        // i=4: reg 0x01, marker 0x02 != 0 -> 1 byte; i=7: reg 0x02, i == len -> 1 byte.
        assert_eq!(
            entries(&[0x00, 0x01, 0x11, 0x00, 0x02, 0x22, 0x33]),
            vec![(1, RawValue::Byte(0x11)), (2, RawValue::Byte(0x22))]
        );
    }

    #[test]
    fn no_partial_trailing_entry() {
        // i=4 two bytes -> i=8 > len 7, walk ends.
        let payload = [0x00, 0x06, 0x01, 0x2C, 0x00, 0x07, 0x01];
        assert_eq!(entries(&payload), vec![(6, RawValue::Word([0x01, 0x2C]))]);
    }

    #[test]
    fn iterator_is_fused() {
        let payload = [0x00, 0x01, 0xAB, 0xCD];
        let mut walk = PayloadEntries::new(&payload);
        assert!(walk.next().is_some());
        assert!(walk.next().is_none());
        assert!(walk.next().is_none());
    }
}
