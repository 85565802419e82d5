//! Server role: one per connected client.

use bitstream::{BitReader, BitWriter};
use log::{trace, warn};
use metavoxel::{write_delta, DeltaLimits, MetavoxelData, MetavoxelLod};

use crate::error::EndpointResult;
use crate::message::Message;
use crate::record::PacketRecord;
use crate::role::EndpointRole;

/// Server side of a metavoxel connection.
///
/// The server driver feeds authoritative data with [`Self::set_data`]; the
/// session sends each client the part of it visible under the client's LOD.
#[derive(Debug, Clone, Default)]
pub struct MetavoxelSession {
    data: MetavoxelData,
    lod: MetavoxelLod,
    staged_lod: Option<MetavoxelLod>,
}

impl MetavoxelSession {
    #[must_use]
    pub fn new(data: MetavoxelData) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Replaces the data sent from the next update on.
    pub fn set_data(&mut self, data: MetavoxelData) {
        self.data = data;
    }

    #[must_use]
    pub const fn data(&self) -> &MetavoxelData {
        &self.data
    }

    /// Last LOD the client reported.
    #[must_use]
    pub const fn lod(&self) -> &MetavoxelLod {
        &self.lod
    }
}

impl EndpointRole for MetavoxelSession {
    fn send_state(&self) -> PacketRecord {
        PacketRecord::new(self.lod, self.data.clone())
    }

    fn receive_state(&self) -> PacketRecord {
        PacketRecord::new(self.lod, MetavoxelData::default())
    }

    fn write_update_message(
        &mut self,
        baseline: &PacketRecord,
        out: &mut BitWriter,
    ) -> EndpointResult<()> {
        Message::MetavoxelDelta { lod: self.lod }.encode(out)?;
        let start = out.bits_written();
        let summary = write_delta(&self.data, &self.lod, baseline.data(), baseline.lod(), out)?;
        trace!(
            "delta: {} sets, {} removals, {} bits",
            summary.sets,
            summary.removals,
            out.bits_written() - start
        );
        Ok(())
    }

    fn handle_message(
        &mut self,
        message: &Message,
        _input: &mut BitReader<'_>,
        _baseline: &PacketRecord,
        _limits: &DeltaLimits,
    ) -> EndpointResult<()> {
        match message {
            Message::ClientState { lod } => self.staged_lod = Some(*lod),
            other => warn!("session ignoring unexpected message {other:?}"),
        }
        Ok(())
    }

    fn commit_message(&mut self) {
        if let Some(lod) = self.staged_lod.take() {
            self.lod = lod;
        }
    }

    fn discard_message(&mut self) {
        self.staged_lod = None;
    }

    fn maybe_create_send_record(&self, newest: &PacketRecord) -> Option<PacketRecord> {
        let state = self.send_state();
        (&state != newest).then_some(state)
    }

    fn maybe_create_receive_record(&self, newest: &PacketRecord) -> Option<PacketRecord> {
        (newest.lod() != &self.lod).then(|| self.receive_state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metavoxel::{Voxel, VoxelKey};

    #[test]
    fn send_record_only_on_change() {
        let mut data = MetavoxelData::default();
        data.set(VoxelKey::ROOT, Voxel(1));
        let mut session = MetavoxelSession::new(data.clone());

        let first = session
            .maybe_create_send_record(&PacketRecord::default())
            .unwrap();
        assert!(session.maybe_create_send_record(&first).is_none());

        data.set(VoxelKey::ROOT, Voxel(2));
        session.set_data(data);
        assert!(session.maybe_create_send_record(&first).is_some());
    }

    #[test]
    fn client_state_updates_lod() {
        let mut session = MetavoxelSession::default();
        let lod = MetavoxelLod::new([5.0, 5.0, 5.0], 0.5);
        session
            .handle_message(
                &Message::ClientState { lod },
                &mut BitReader::new(&[]),
                &PacketRecord::default(),
                &DeltaLimits::default(),
            )
            .unwrap();
        assert_eq!(session.lod(), &MetavoxelLod::default());
        session.commit_message();
        assert_eq!(session.lod(), &lod);
        assert!(session
            .maybe_create_receive_record(&PacketRecord::default())
            .is_some());
    }
}
