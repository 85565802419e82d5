//! Configurable limits for bounded decoding.

/// Wire-level limits for datagram encoding and decoding.
///
/// Enforced before any payload is handed to higher layers, so a hostile
/// peer cannot make the receiver buffer arbitrarily large datagrams.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Limits {
    /// Maximum datagram size in bytes, header included.
    pub max_datagram_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // Stays under a typical 1500 byte MTU after IP/UDP headers.
            max_datagram_bytes: 1400,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_datagram_bytes: 512,
        }
    }

    /// Creates limits allowing the largest datagram the header can describe.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_datagram_bytes: crate::HEADER_SIZE + u16::MAX as usize,
        }
    }

    /// Largest payload that fits a datagram under these limits.
    #[must_use]
    pub fn max_payload_bytes(&self) -> usize {
        self.max_datagram_bytes
            .saturating_sub(crate::HEADER_SIZE)
            .min(u16::MAX as usize)
    }
}
