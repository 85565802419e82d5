//! Role hooks an endpoint delegates to.

use bitstream::{BitReader, BitWriter};
use metavoxel::DeltaLimits;

use crate::error::EndpointResult;
use crate::message::Message;
use crate::record::PacketRecord;

/// Behaviour that differs between the two ends of a connection.
///
/// The endpoint owns retention, sequencing and pruning; a role decides what
/// goes into each datagram, what incoming messages mean, and when a state
/// change is worth a new record.
pub trait EndpointRole {
    /// Current outgoing state, captured into send records.
    fn send_state(&self) -> PacketRecord;

    /// Current reconstructed incoming state, captured into receive records.
    fn receive_state(&self) -> PacketRecord;

    /// Writes the message for the next update. `baseline` is the last
    /// acknowledged send record.
    fn write_update_message(
        &mut self,
        baseline: &PacketRecord,
        out: &mut BitWriter,
    ) -> EndpointResult<()> {
        let _ = baseline;
        Message::Empty.encode(out)
    }

    /// Handles one non-list message. Any payload belonging to `message` is
    /// read from `input`. `baseline` is the receive record the peer encoded
    /// against.
    ///
    /// Effects should be staged: the endpoint follows up with
    /// [`Self::commit_message`] once the whole message has been read, or
    /// [`Self::discard_message`] if any part of it was rejected.
    fn handle_message(
        &mut self,
        message: &Message,
        input: &mut BitReader<'_>,
        baseline: &PacketRecord,
        limits: &DeltaLimits,
    ) -> EndpointResult<()> {
        let _ = (message, input, baseline, limits);
        Ok(())
    }

    /// Applies what the handled message staged.
    fn commit_message(&mut self) {}

    /// Drops what the rejected message staged.
    fn discard_message(&mut self) {}

    /// Called after each send; returning a record appends it to the send
    /// window. `newest` is the newest send record.
    fn maybe_create_send_record(&self, newest: &PacketRecord) -> Option<PacketRecord> {
        let _ = newest;
        Some(self.send_state())
    }

    /// Called after each accepted datagram; returning a record appends it to
    /// the receive window. `newest` is the newest receive record.
    fn maybe_create_receive_record(&self, newest: &PacketRecord) -> Option<PacketRecord> {
        let _ = newest;
        Some(self.receive_state())
    }
}
