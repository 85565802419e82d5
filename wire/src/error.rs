//! Error types for wire format operations.

use thiserror::Error;

/// Result type for wire format operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// Decode errors for datagram framing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// Datagram is too small to contain the header.
    #[error("datagram too small: {actual} bytes, need at least {required}")]
    DatagramTooSmall { actual: usize, required: usize },

    /// Invalid magic number in the header.
    #[error("invalid magic number: 0x{found:04X}")]
    InvalidMagic { found: u16 },

    /// Unsupported wire version.
    #[error("unsupported wire version: {found}")]
    UnsupportedVersion { found: u8 },

    /// Reserved flag bits were set.
    #[error("invalid flags: 0x{flags:02X}")]
    InvalidFlags { flags: u8 },

    /// Ack field was non-zero without the ack flag.
    #[error("ack field {ack} present without HAS_ACK flag")]
    StrayAck { ack: u16 },

    /// Payload length in the header disagrees with the datagram.
    #[error("payload length mismatch: header {header_len} bytes but {actual_len} available")]
    PayloadLengthMismatch { header_len: u16, actual_len: usize },

    /// Limits exceeded.
    #[error("{kind} limit exceeded: {actual} > {limit}")]
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },
}

/// Specific wire limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LimitKind {
    #[error("datagram bytes")]
    DatagramBytes,
}

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("buffer too small: need {needed}, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("payload of {length} bytes exceeds datagram limit of {limit}")]
    PayloadTooLarge { length: usize, limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display_invalid_magic() {
        let err = DecodeError::InvalidMagic { found: 0xBEEF };
        assert!(err.to_string().contains("BEEF"));
    }

    #[test]
    fn decode_error_display_limits_exceeded() {
        let err = DecodeError::LimitsExceeded {
            kind: LimitKind::DatagramBytes,
            limit: 512,
            actual: 900,
        };
        let msg = err.to_string();
        assert!(msg.contains("datagram bytes"));
        assert!(msg.contains("900"));
    }

    #[test]
    fn encode_error_display() {
        let err = EncodeError::PayloadTooLarge {
            length: 2000,
            limit: 1390,
        };
        assert!(err.to_string().contains("2000"));
    }
}
