//! Datagram header types and constants.

use crate::sequence::SequenceNumber;

/// Magic number identifying mvsync datagrams.
pub const MAGIC: u16 = 0x4D56; // "MV" in ASCII

/// Current wire format version.
pub const VERSION: u8 = 1;

/// Header size in bytes (10 total).
pub const HEADER_SIZE: usize = 2 + 1 + 1 + 2 + 2 + 2;

/// Datagram flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DatagramFlags(u8);

impl DatagramFlags {
    /// Flag indicating the ack field is meaningful.
    pub const HAS_ACK: u8 = 1 << 0;

    /// Reserved bits mask (must be zero in version 1).
    const RESERVED_MASK: u8 = !Self::HAS_ACK;

    /// Creates flags from a raw value.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw flag bits.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns `true` if the datagram carries an acknowledgment.
    #[must_use]
    pub const fn has_ack(self) -> bool {
        self.0 & Self::HAS_ACK != 0
    }

    /// Returns `true` if no reserved bits are set.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 & Self::RESERVED_MASK == 0
    }
}

/// Datagram header.
///
/// Layout (little-endian): magic `u16`, version `u8`, flags `u8`,
/// sequence `u16`, ack `u16`, payload length `u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatagramHeader {
    /// Sender's sequence number for this datagram.
    pub sequence: SequenceNumber,
    /// Most recent peer sequence number the sender has received.
    pub ack: Option<SequenceNumber>,
    /// Payload length in bytes.
    pub payload_len: u16,
}

impl DatagramHeader {
    /// Returns the flags implied by this header.
    #[must_use]
    pub const fn flags(&self) -> DatagramFlags {
        if self.ack.is_some() {
            DatagramFlags(DatagramFlags::HAS_ACK)
        } else {
            DatagramFlags(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_is_mv() {
        assert_eq!(&MAGIC.to_be_bytes(), b"MV");
    }

    #[test]
    fn flags_validity() {
        assert!(DatagramFlags::from_raw(0).is_valid());
        assert!(DatagramFlags::from_raw(DatagramFlags::HAS_ACK).is_valid());
        assert!(!DatagramFlags::from_raw(0b10).is_valid());
        assert!(!DatagramFlags::from_raw(0x80).is_valid());
    }

    #[test]
    fn header_flags_follow_ack() {
        let mut header = DatagramHeader {
            sequence: SequenceNumber::new(1),
            ack: None,
            payload_len: 0,
        };
        assert!(!header.flags().has_ack());
        header.ack = Some(SequenceNumber::new(0));
        assert!(header.flags().has_ack());
    }
}
