//! Packet records and the per-direction retention window.

use std::collections::VecDeque;

use metavoxel::{MetavoxelData, MetavoxelLod};

use crate::error::{EndpointError, EndpointResult};
use crate::types::PacketNumber;

/// Snapshot of the replicated state associated with one packet.
///
/// Records are immutable once built. The data is captured by value, so
/// later changes to live state never show through.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PacketRecord {
    lod: MetavoxelLod,
    data: MetavoxelData,
}

impl PacketRecord {
    #[must_use]
    pub const fn new(lod: MetavoxelLod, data: MetavoxelData) -> Self {
        Self { lod, data }
    }

    #[must_use]
    pub const fn lod(&self) -> &MetavoxelLod {
        &self.lod
    }

    #[must_use]
    pub const fn data(&self) -> &MetavoxelData {
        &self.data
    }
}

/// Records for one direction, oldest first.
///
/// The front record is the last acknowledged one and serves as the delta
/// baseline. The window is never empty and packet numbers strictly
/// increase from front to back.
#[derive(Debug, Clone)]
pub struct RecordWindow {
    records: VecDeque<(PacketNumber, PacketRecord)>,
}

impl Default for RecordWindow {
    fn default() -> Self {
        Self::new(PacketRecord::default())
    }
}

impl RecordWindow {
    /// Creates a window holding only `bootstrap` at packet 0.
    #[must_use]
    pub fn new(bootstrap: PacketRecord) -> Self {
        let mut records = VecDeque::new();
        records.push_back((PacketNumber::BOOTSTRAP, bootstrap));
        Self { records }
    }

    /// Returns the baseline (oldest retained) entry.
    #[must_use]
    pub fn front(&self) -> (PacketNumber, &PacketRecord) {
        let (packet, record) = &self.records[0];
        (*packet, record)
    }

    /// Returns the newest entry.
    #[must_use]
    pub fn newest(&self) -> (PacketNumber, &PacketRecord) {
        let (packet, record) = &self.records[self.records.len() - 1];
        (*packet, record)
    }

    /// Appends a record for `packet`, which must be newer than every
    /// retained record.
    pub fn push(&mut self, packet: PacketNumber, record: PacketRecord) -> EndpointResult<()> {
        let (newest, _) = self.newest();
        if packet <= newest {
            return Err(EndpointError::RecordOutOfOrder {
                newest,
                new: packet,
            });
        }
        self.records.push_back((packet, record));
        Ok(())
    }

    /// Drops front records while the second record is at or before `index`.
    ///
    /// Afterwards the front is the newest record at or before `index`, or
    /// the unchanged front if `index` precedes it. Returns how many records
    /// were dropped.
    pub fn clear_before(&mut self, index: PacketNumber) -> usize {
        let mut dropped = 0;
        while self.records.len() > 1 && self.records[1].0 <= index {
            self.records.pop_front();
            dropped += 1;
        }
        dropped
    }

    /// Returns the record that would become the front after
    /// `clear_before(index)`, without dropping anything.
    #[must_use]
    pub fn baseline_for(&self, index: PacketNumber) -> &PacketRecord {
        self.records
            .iter()
            .skip(1)
            .take_while(|(packet, _)| *packet <= index)
            .last()
            .map_or(&self.records[0].1, |(_, record)| record)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`; provided for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates entries oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (PacketNumber, &PacketRecord)> + '_ {
        self.records.iter().map(|(packet, record)| (*packet, record))
    }
}
