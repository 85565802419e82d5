//! Datagram encoding and decoding.

use crate::error::{DecodeError, EncodeError, LimitKind, WireResult};
use crate::header::{DatagramFlags, DatagramHeader, HEADER_SIZE, MAGIC, VERSION};
use crate::limits::Limits;
use crate::sequence::SequenceNumber;

/// A decoded datagram borrowing its payload from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Datagram<'a> {
    pub header: DatagramHeader,
    pub payload: &'a [u8],
}

/// Decodes and validates a datagram.
pub fn decode_datagram<'a>(buf: &'a [u8], limits: &Limits) -> WireResult<Datagram<'a>> {
    if buf.len() < HEADER_SIZE {
        return Err(DecodeError::DatagramTooSmall {
            actual: buf.len(),
            required: HEADER_SIZE,
        });
    }
    if buf.len() > limits.max_datagram_bytes {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::DatagramBytes,
            limit: limits.max_datagram_bytes,
            actual: buf.len(),
        });
    }

    let magic = u16::from_le_bytes([buf[0], buf[1]]);
    if magic != MAGIC {
        return Err(DecodeError::InvalidMagic { found: magic });
    }
    if buf[2] != VERSION {
        return Err(DecodeError::UnsupportedVersion { found: buf[2] });
    }

    let flags = DatagramFlags::from_raw(buf[3]);
    if !flags.is_valid() {
        return Err(DecodeError::InvalidFlags { flags: flags.raw() });
    }

    let sequence = SequenceNumber::new(u16::from_le_bytes([buf[4], buf[5]]));
    let ack_raw = u16::from_le_bytes([buf[6], buf[7]]);
    let ack = if flags.has_ack() {
        Some(SequenceNumber::new(ack_raw))
    } else if ack_raw != 0 {
        return Err(DecodeError::StrayAck { ack: ack_raw });
    } else {
        None
    };

    let payload_len = u16::from_le_bytes([buf[8], buf[9]]);
    let payload = &buf[HEADER_SIZE..];
    if payload_len as usize != payload.len() {
        return Err(DecodeError::PayloadLengthMismatch {
            header_len: payload_len,
            actual_len: payload.len(),
        });
    }

    Ok(Datagram {
        header: DatagramHeader {
            sequence,
            ack,
            payload_len,
        },
        payload,
    })
}

/// Encodes a header into the provided output buffer.
pub fn encode_header(header: &DatagramHeader, out: &mut [u8]) -> Result<usize, EncodeError> {
    if out.len() < HEADER_SIZE {
        return Err(EncodeError::BufferTooSmall {
            needed: HEADER_SIZE,
            available: out.len(),
        });
    }

    out[0..2].copy_from_slice(&MAGIC.to_le_bytes());
    out[2] = VERSION;
    out[3] = header.flags().raw();
    out[4..6].copy_from_slice(&header.sequence.raw().to_le_bytes());
    let ack = header.ack.map_or(0, SequenceNumber::raw);
    out[6..8].copy_from_slice(&ack.to_le_bytes());
    out[8..10].copy_from_slice(&header.payload_len.to_le_bytes());

    Ok(HEADER_SIZE)
}

/// Frames a payload into a complete datagram.
pub fn encode_datagram(
    sequence: SequenceNumber,
    ack: Option<SequenceNumber>,
    payload: &[u8],
    limits: &Limits,
) -> Result<Vec<u8>, EncodeError> {
    let limit = limits.max_payload_bytes();
    let payload_len = u16::try_from(payload.len())
        .ok()
        .filter(|len| usize::from(*len) <= limit)
        .ok_or(EncodeError::PayloadTooLarge {
            length: payload.len(),
            limit,
        })?;

    let header = DatagramHeader {
        sequence,
        ack,
        payload_len,
    };
    let mut out = vec![0u8; HEADER_SIZE + payload.len()];
    encode_header(&header, &mut out)?;
    out[HEADER_SIZE..].copy_from_slice(payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datagram(sequence: u16, ack: Option<u16>, payload: &[u8]) -> Vec<u8> {
        encode_datagram(
            SequenceNumber::new(sequence),
            ack.map(SequenceNumber::new),
            payload,
            &Limits::for_testing(),
        )
        .unwrap()
    }

    #[test]
    fn encode_decode_with_ack() {
        let bytes = datagram(7, Some(65535), b"hello");
        let decoded = decode_datagram(&bytes, &Limits::for_testing()).unwrap();
        assert_eq!(decoded.header.sequence.raw(), 7);
        assert_eq!(decoded.header.ack, Some(SequenceNumber::new(65535)));
        assert_eq!(decoded.payload, b"hello");
    }

    #[test]
    fn ack_zero_is_distinct_from_no_ack() {
        let with = datagram(1, Some(0), &[]);
        let without = datagram(1, None, &[]);
        let limits = Limits::for_testing();
        assert_eq!(
            decode_datagram(&with, &limits).unwrap().header.ack,
            Some(SequenceNumber::new(0))
        );
        assert_eq!(decode_datagram(&without, &limits).unwrap().header.ack, None);
    }

    #[test]
    fn rejects_short_datagram() {
        let err = decode_datagram(&[0u8; 4], &Limits::for_testing()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::DatagramTooSmall {
                actual: 4,
                required: HEADER_SIZE
            }
        ));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = datagram(1, None, b"x");
        bytes[0] ^= 0xFF;
        let err = decode_datagram(&bytes, &Limits::for_testing()).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidMagic { .. }));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = datagram(1, None, b"x");
        bytes[2] = 9;
        let err = decode_datagram(&bytes, &Limits::for_testing()).unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedVersion { found: 9 });
    }

    #[test]
    fn rejects_reserved_flags() {
        let mut bytes = datagram(1, None, b"x");
        bytes[3] = 0x40;
        let err = decode_datagram(&bytes, &Limits::for_testing()).unwrap_err();
        assert_eq!(err, DecodeError::InvalidFlags { flags: 0x40 });
    }

    #[test]
    fn rejects_stray_ack() {
        let mut bytes = datagram(1, None, b"x");
        bytes[6] = 3;
        let err = decode_datagram(&bytes, &Limits::for_testing()).unwrap_err();
        assert_eq!(err, DecodeError::StrayAck { ack: 3 });
    }

    #[test]
    fn rejects_truncated_payload() {
        let bytes = datagram(1, None, b"abcdef");
        let err = decode_datagram(&bytes[..bytes.len() - 2], &Limits::for_testing()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::PayloadLengthMismatch {
                header_len: 6,
                actual_len: 4
            }
        ));
    }

    #[test]
    fn rejects_oversized_datagram() {
        let bytes = datagram(1, None, &[0u8; 200]);
        let limits = Limits {
            max_datagram_bytes: 100,
        };
        let err = decode_datagram(&bytes, &limits).unwrap_err();
        assert!(matches!(err, DecodeError::LimitsExceeded { .. }));
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let limits = Limits::for_testing();
        let payload = vec![0u8; limits.max_payload_bytes() + 1];
        let err = encode_datagram(SequenceNumber::new(0), None, &payload, &limits).unwrap_err();
        assert!(matches!(err, EncodeError::PayloadTooLarge { .. }));
    }

    #[test]
    fn encode_header_needs_room() {
        let header = DatagramHeader {
            sequence: SequenceNumber::new(0),
            ack: None,
            payload_len: 0,
        };
        let mut out = [0u8; 4];
        let err = encode_header(&header, &mut out).unwrap_err();
        assert_eq!(
            err,
            EncodeError::BufferTooSmall {
                needed: HEADER_SIZE,
                available: 4
            }
        );
    }
}
