//! Client role: reports its LOD and reconstructs data from deltas.

use bitstream::{BitReader, BitWriter};
use log::warn;
use metavoxel::{read_delta, DeltaLimits, MetavoxelData, MetavoxelLod};

use crate::error::EndpointResult;
use crate::message::Message;
use crate::record::PacketRecord;
use crate::role::EndpointRole;

/// Client side of a metavoxel connection.
#[derive(Debug, Clone, Default)]
pub struct MetavoxelClient {
    lod: MetavoxelLod,
    data: MetavoxelData,
    data_lod: MetavoxelLod,
    staged: Option<(MetavoxelLod, MetavoxelData)>,
}

impl MetavoxelClient {
    #[must_use]
    pub fn new(lod: MetavoxelLod) -> Self {
        Self {
            lod,
            ..Self::default()
        }
    }

    /// Moves the viewer; reported to the server on the next update.
    pub fn set_lod(&mut self, lod: MetavoxelLod) {
        self.lod = lod;
    }

    #[must_use]
    pub const fn lod(&self) -> &MetavoxelLod {
        &self.lod
    }

    /// The reconstructed data.
    #[must_use]
    pub const fn data(&self) -> &MetavoxelData {
        &self.data
    }

    /// LOD the server used for the current data.
    #[must_use]
    pub const fn data_lod(&self) -> &MetavoxelLod {
        &self.data_lod
    }
}

impl EndpointRole for MetavoxelClient {
    fn send_state(&self) -> PacketRecord {
        PacketRecord::new(self.lod, MetavoxelData::default())
    }

    fn receive_state(&self) -> PacketRecord {
        PacketRecord::new(self.data_lod, self.data.clone())
    }

    fn write_update_message(
        &mut self,
        _baseline: &PacketRecord,
        out: &mut BitWriter,
    ) -> EndpointResult<()> {
        Message::ClientState { lod: self.lod }.encode(out)
    }

    fn handle_message(
        &mut self,
        message: &Message,
        input: &mut BitReader<'_>,
        baseline: &PacketRecord,
        limits: &DeltaLimits,
    ) -> EndpointResult<()> {
        match message {
            Message::MetavoxelDelta { lod } => {
                let data = read_delta(baseline.data(), lod, input, limits)?;
                self.staged = Some((*lod, data));
            }
            other => warn!("client ignoring unexpected message {other:?}"),
        }
        Ok(())
    }

    fn commit_message(&mut self) {
        if let Some((lod, data)) = self.staged.take() {
            self.data_lod = lod;
            self.data = data;
        }
    }

    fn discard_message(&mut self) {
        self.staged = None;
    }

    fn maybe_create_send_record(&self, newest: &PacketRecord) -> Option<PacketRecord> {
        (newest.lod() != &self.lod).then(|| self.send_state())
    }

    fn maybe_create_receive_record(&self, newest: &PacketRecord) -> Option<PacketRecord> {
        let state = self.receive_state();
        (&state != newest).then_some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_record_only_on_lod_change() {
        let mut client = MetavoxelClient::new(MetavoxelLod::default());
        assert!(client
            .maybe_create_send_record(&PacketRecord::default())
            .is_none());

        client.set_lod(MetavoxelLod::new([1.0, 0.0, 0.0], 1.0));
        let record = client
            .maybe_create_send_record(&PacketRecord::default())
            .unwrap();
        assert_eq!(record.lod(), client.lod());
        assert!(client.maybe_create_send_record(&record).is_none());
    }

    #[test]
    fn writes_client_state() {
        let lod = MetavoxelLod::new([2.0, 3.0, 4.0], 0.25);
        let mut client = MetavoxelClient::new(lod);
        let mut writer = BitWriter::new();
        client
            .write_update_message(&PacketRecord::default(), &mut writer)
            .unwrap();
        let bytes = writer.finish();
        let message = Message::decode(&mut BitReader::new(&bytes), &Default::default()).unwrap();
        assert_eq!(message, Message::ClientState { lod });
    }

    fn delta_from_root(value: u32) -> Vec<u8> {
        let mut world = MetavoxelData::default();
        world.set(metavoxel::VoxelKey::ROOT, metavoxel::Voxel(value));
        let lod = MetavoxelLod::default();
        let mut writer = BitWriter::new();
        metavoxel::write_delta(&world, &lod, &MetavoxelData::default(), &lod, &mut writer).unwrap();
        writer.finish()
    }

    fn handle_delta(client: &mut MetavoxelClient, bytes: &[u8]) {
        client
            .handle_message(
                &Message::MetavoxelDelta {
                    lod: MetavoxelLod::default(),
                },
                &mut BitReader::new(bytes),
                &PacketRecord::default(),
                &DeltaLimits::default(),
            )
            .unwrap();
    }

    #[test]
    fn delta_applies_on_commit() {
        let mut client = MetavoxelClient::default();
        handle_delta(&mut client, &delta_from_root(4));
        assert!(client.data().is_empty());

        client.commit_message();
        assert_eq!(client.data().get(&metavoxel::VoxelKey::ROOT), Some(metavoxel::Voxel(4)));
    }

    #[test]
    fn discarded_delta_leaves_data() {
        let mut client = MetavoxelClient::default();
        handle_delta(&mut client, &delta_from_root(4));
        client.discard_message();
        client.commit_message();
        assert!(client.data().is_empty());
        assert!(client
            .maybe_create_receive_record(&PacketRecord::default())
            .is_none());
    }

    #[test]
    fn unchanged_receive_state_creates_no_record() {
        let client = MetavoxelClient::default();
        assert!(client
            .maybe_create_receive_record(&PacketRecord::default())
            .is_none());
    }
}
