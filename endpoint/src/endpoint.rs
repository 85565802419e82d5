//! The endpoint: retention windows, acknowledgment-driven pruning and the
//! sent-datagram history around a role.

use std::time::Instant;

use bitstream::{BitReader, BitWriter};
use log::{debug, trace, warn};
use metavoxel::DeltaLimits;
use wire::SequenceNumber;

use crate::config::EndpointConfig;
use crate::error::{EndpointError, EndpointResult};
use crate::history::SentPacketHistory;
use crate::message::Message;
use crate::policy::CadenceState;
use crate::record::{PacketRecord, RecordWindow};
use crate::role::EndpointRole;
use crate::sequencer::DatagramSequencer;
use crate::sink::DatagramSink;
use crate::types::{PacketNumber, PeerId};

/// One side of a metavoxel connection.
///
/// Keeps a window of send records (what we told the peer) and a window of
/// receive records (what the peer told us). The front of each window is the
/// last acknowledged record and is the baseline deltas are computed
/// against. Acks arriving in incoming datagrams move both fronts forward.
#[derive(Debug)]
pub struct Endpoint<R, S> {
    peer: PeerId,
    config: EndpointConfig,
    role: R,
    sink: S,
    sequencer: DatagramSequencer,
    cadence: CadenceState,
    send_records: RecordWindow,
    receive_records: RecordWindow,
    history: Option<SentPacketHistory>,
}

impl<R: EndpointRole, S: DatagramSink> Endpoint<R, S> {
    /// Creates an endpoint whose windows start from the default record.
    pub fn new(peer: PeerId, role: R, sink: S, config: EndpointConfig) -> Self {
        Self::with_baselines(
            peer,
            role,
            sink,
            config,
            PacketRecord::default(),
            PacketRecord::default(),
        )
    }

    /// Creates an endpoint with explicit bootstrap records.
    ///
    /// Both peers must agree on the bootstrap records, since they are the
    /// baseline for the first deltas in each direction.
    pub fn with_baselines(
        peer: PeerId,
        role: R,
        sink: S,
        config: EndpointConfig,
        send_bootstrap: PacketRecord,
        receive_bootstrap: PacketRecord,
    ) -> Self {
        let sequencer = DatagramSequencer::new(config.wire_limits.clone(), config.in_flight_warning);
        let cadence = CadenceState::new(config.cadence);
        let history = config.sent_history_capacity.map(SentPacketHistory::new);
        Self {
            peer,
            config,
            role,
            sink,
            sequencer,
            cadence,
            send_records: RecordWindow::new(send_bootstrap),
            receive_records: RecordWindow::new(receive_bootstrap),
            history,
        }
    }

    /// Runs one tick at the current time.
    pub fn update(&mut self) -> EndpointResult<Option<PacketNumber>> {
        self.update_at(Instant::now())
    }

    /// Runs one tick at `now`.
    ///
    /// Returns the packet sent, or `None` when the cadence held the send
    /// back. On error nothing is sent and no record is created.
    pub fn update_at(&mut self, now: Instant) -> EndpointResult<Option<PacketNumber>> {
        if !self.cadence.should_send(now) {
            trace!("peer {}: cadence skipped update", self.peer.raw());
            return Ok(None);
        }

        let mut writer = BitWriter::new();
        let (_, baseline) = self.send_records.front();
        self.role.write_update_message(baseline, &mut writer)?;
        let payload = writer.finish();

        let outgoing = self.sequencer.write_datagram(&payload)?;
        let packet = outgoing.packet;
        let size = outgoing.bytes.len();
        debug!(
            "peer {}: sent packet {packet} ({size} bytes, baseline {})",
            self.peer.raw(),
            self.send_records.front().0
        );
        self.send_datagram(outgoing.bytes);
        self.cadence.on_sent(now, size);

        let (_, newest) = self.send_records.newest();
        if let Some(record) = self.role.maybe_create_send_record(newest) {
            self.send_records.push(packet, record)?;
            trace!(
                "peer {}: send record at {packet} ({} retained)",
                self.peer.raw(),
                self.send_records.len()
            );
        }
        Ok(Some(packet))
    }

    /// Processes one incoming datagram.
    ///
    /// Returns the number of bytes consumed, which is the whole datagram,
    /// including for stale datagrams that are dropped. On error the
    /// retention windows and acknowledgment state are left unchanged.
    pub fn parse_data(&mut self, packet: &[u8]) -> EndpointResult<usize> {
        let Some(incoming) = self.sequencer.read_datagram(packet)? else {
            return Ok(packet.len());
        };
        debug!(
            "peer {}: received packet {} ({} bytes, ack {:?})",
            self.peer.raw(),
            incoming.packet,
            packet.len(),
            incoming.ack.map(PacketNumber::raw)
        );

        let acks = self.sequencer.acknowledgments(&incoming);
        let baseline = match acks.receive {
            Some(index) => self.receive_records.baseline_for(index),
            None => self.receive_records.front().1,
        }
        .clone();

        let mut input = BitReader::new(incoming.payload);
        self.read_message_against(&mut input, &baseline)?;

        self.sequencer.acknowledge(&incoming);
        if let Some(index) = acks.send {
            self.clear_send_records_before(index);
        }
        if let Some(index) = acks.receive {
            self.clear_receive_records_before(index);
        }

        let (_, newest) = self.receive_records.newest();
        if let Some(record) = self.role.maybe_create_receive_record(newest) {
            self.receive_records.push(incoming.packet, record)?;
            trace!(
                "peer {}: receive record at {} ({} retained)",
                self.peer.raw(),
                incoming.packet,
                self.receive_records.len()
            );
        }
        self.sequencer.mark_received(incoming.packet);
        Ok(packet.len())
    }

    /// Hands a datagram to the sink, keeping a copy in the sent history
    /// when one is configured.
    pub fn send_datagram(&mut self, datagram: Vec<u8>) {
        if let Some(history) = &mut self.history {
            match wire::decode_datagram(&datagram, &self.config.wire_limits) {
                Ok(framed) => history.record_sent(framed.header.sequence, datagram.clone()),
                Err(err) => warn!(
                    "peer {}: not keeping unframed datagram in history: {err}",
                    self.peer.raw()
                ),
            }
        }
        self.sink.send_datagram(datagram);
    }

    /// Reads and handles one message from `input` against the last
    /// acknowledged receive record.
    pub fn read_message(&mut self, input: &mut BitReader<'_>) -> EndpointResult<()> {
        let baseline = self.receive_records.front().1.clone();
        self.read_message_against(input, &baseline)
    }

    fn read_message_against(
        &mut self,
        input: &mut BitReader<'_>,
        baseline: &PacketRecord,
    ) -> EndpointResult<()> {
        match read_envelope(&mut self.role, input, baseline, &self.config) {
            Ok(()) => {
                self.role.commit_message();
                Ok(())
            }
            Err(err) => {
                self.role.discard_message();
                Err(err)
            }
        }
    }

    /// Drops send records superseded by the record at or before `index`.
    pub fn clear_send_records_before(&mut self, index: PacketNumber) {
        clear_window(self.peer, "send", &mut self.send_records, index);
    }

    /// Drops receive records superseded by the record at or before `index`.
    pub fn clear_receive_records_before(&mut self, index: PacketNumber) {
        clear_window(self.peer, "receive", &mut self.receive_records, index);
    }

    /// The baseline for outgoing deltas.
    #[must_use]
    pub fn last_acknowledged_send_record(&self) -> &PacketRecord {
        self.send_records.front().1
    }

    /// The baseline the peer encodes incoming deltas against.
    #[must_use]
    pub fn last_acknowledged_receive_record(&self) -> &PacketRecord {
        self.receive_records.front().1
    }

    /// Returns the bytes of a recently sent datagram.
    #[must_use]
    pub fn sent_packet(&self, sequence: SequenceNumber) -> Option<&[u8]> {
        self.history.as_ref()?.lookup(sequence)
    }

    #[must_use]
    pub const fn peer(&self) -> PeerId {
        self.peer
    }

    #[must_use]
    pub const fn config(&self) -> &EndpointConfig {
        &self.config
    }

    #[must_use]
    pub const fn role(&self) -> &R {
        &self.role
    }

    pub fn role_mut(&mut self) -> &mut R {
        &mut self.role
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    #[must_use]
    pub const fn sequencer(&self) -> &DatagramSequencer {
        &self.sequencer
    }

    #[must_use]
    pub const fn send_records(&self) -> &RecordWindow {
        &self.send_records
    }

    #[must_use]
    pub const fn receive_records(&self) -> &RecordWindow {
        &self.receive_records
    }

    #[must_use]
    pub const fn history(&self) -> Option<&SentPacketHistory> {
        self.history.as_ref()
    }
}

fn read_envelope<R: EndpointRole>(
    role: &mut R,
    input: &mut BitReader<'_>,
    baseline: &PacketRecord,
    config: &EndpointConfig,
) -> EndpointResult<()> {
    let message = Message::decode(input, &config.message_limits)?;
    dispatch(role, &message, input, baseline, &config.delta_limits)?;
    let bits = input.bits_remaining();
    if bits >= 8 {
        return Err(EndpointError::TrailingMessageData { bits });
    }
    Ok(())
}

fn dispatch<R: EndpointRole>(
    role: &mut R,
    message: &Message,
    input: &mut BitReader<'_>,
    baseline: &PacketRecord,
    limits: &DeltaLimits,
) -> EndpointResult<()> {
    match message {
        Message::Empty => Ok(()),
        Message::List(items) => {
            for item in items {
                dispatch(role, item, input, baseline, limits)?;
            }
            Ok(())
        }
        other => role.handle_message(other, input, baseline, limits),
    }
}

fn clear_window(peer: PeerId, direction: &str, window: &mut RecordWindow, index: PacketNumber) {
    let (front, _) = window.front();
    if index < front {
        warn!(
            "peer {}: {direction} prune to {index} is before baseline {front}",
            peer.raw()
        );
        return;
    }
    let dropped = window.clear_before(index);
    if dropped > 0 {
        trace!(
            "peer {}: pruned {dropped} {direction} records, baseline now {}",
            peer.raw(),
            window.front().0
        );
    }
}
