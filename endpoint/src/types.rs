//! Core types for endpoints.

use std::fmt;

use wire::SequenceNumber;

/// A logical packet number.
///
/// Packet numbers never wrap. Outgoing packets are numbered from 1; 0 is
/// reserved for the bootstrap record every retention window starts with.
/// The low 16 bits travel on the wire as a [`SequenceNumber`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PacketNumber(u64);

impl PacketNumber {
    /// Packet number of the bootstrap record.
    pub const BOOTSTRAP: Self = Self(0);

    /// Creates a packet number.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw packet number.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns the following packet number.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns `true` for the bootstrap packet number.
    #[must_use]
    pub const fn is_bootstrap(self) -> bool {
        self.0 == 0
    }

    /// Returns the wire sequence number (low 16 bits).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn sequence(self) -> SequenceNumber {
        SequenceNumber::new(self.0 as u16)
    }

    /// Recovers the packet number closest to `reference` whose low 16 bits
    /// equal `sequence`.
    ///
    /// Returns `None` if that would lie before packet 0.
    #[must_use]
    pub fn extend(sequence: SequenceNumber, reference: Self) -> Option<Self> {
        let diff = i64::from(reference.sequence().diff_to(sequence));
        reference.0.checked_add_signed(diff).map(Self)
    }
}

impl fmt::Display for PacketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for PacketNumber {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<PacketNumber> for u64 {
    fn from(packet: PacketNumber) -> Self {
        packet.0
    }
}

/// Handle to the remote peer an endpoint talks to.
///
/// The endpoint only keeps this id; the connection itself belongs to the
/// driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PeerId(u32);

impl PeerId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for PeerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<PeerId> for u32 {
    fn from(id: PeerId) -> Self {
        id.0
    }
}
