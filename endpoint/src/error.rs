//! Error types for endpoint operations.

use bitstream::BitError;
use metavoxel::MetavoxelError;
use thiserror::Error;
use wire::{DecodeError, EncodeError};

use crate::types::PacketNumber;

/// Result type for endpoint operations.
pub type EndpointResult<T> = Result<T, EndpointError>;

/// Errors that can occur while sending or receiving.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EndpointError {
    /// Datagram framing was invalid.
    #[error("wire decode error: {0}")]
    Wire(#[from] DecodeError),

    /// A datagram could not be framed.
    #[error("wire encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Message payload was truncated or malformed at the bit level.
    #[error("bitstream error: {0}")]
    Bitstream(#[from] BitError),

    /// Octree delta was invalid.
    #[error("metavoxel error: {0}")]
    Metavoxel(#[from] MetavoxelError),

    /// An outgoing message does not fit in one datagram.
    #[error("message of {size} bytes exceeds datagram payload limit of {limit}")]
    MessageTooLarge { size: usize, limit: usize },

    /// Unknown message tag.
    #[error("unknown message tag {tag}")]
    UnknownMessageTag { tag: u8 },

    /// Message envelope limits exceeded.
    #[error("message {kind} limit exceeded: {actual} > {limit}")]
    MessageLimits {
        kind: MessageLimitKind,
        limit: usize,
        actual: usize,
    },

    /// Bytes left over after every message was handled.
    #[error("{bits} bits of trailing data after message")]
    TrailingMessageData { bits: usize },

    /// Records must be appended in increasing packet order.
    #[error("record for packet {new} is not after newest record {newest}")]
    RecordOutOfOrder {
        newest: PacketNumber,
        new: PacketNumber,
    },
}

/// Message envelope limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MessageLimitKind {
    #[error("list length")]
    ListLength,
    #[error("nesting depth")]
    Depth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_from_lower_layers() {
        let err: EndpointError = DecodeError::InvalidMagic { found: 1 }.into();
        assert!(matches!(err, EndpointError::Wire(_)));

        let err: EndpointError = BitError::InvalidVarint.into();
        assert!(matches!(err, EndpointError::Bitstream(_)));

        let err: EndpointError = MetavoxelError::InvalidSize { size: -1.0 }.into();
        assert!(matches!(err, EndpointError::Metavoxel(_)));
    }

    #[test]
    fn display_mentions_values() {
        let err = EndpointError::MessageTooLarge {
            size: 5000,
            limit: 1390,
        };
        let msg = err.to_string();
        assert!(msg.contains("5000"));
        assert!(msg.contains("1390"));

        let err = EndpointError::RecordOutOfOrder {
            newest: PacketNumber::new(4),
            new: PacketNumber::new(3),
        };
        assert!(err.to_string().contains("#3"));
    }
}
