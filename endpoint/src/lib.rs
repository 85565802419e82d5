//! Metavoxel endpoints for mvsync.
//!
//! An [`Endpoint`] sits between a datagram transport and a role
//! ([`MetavoxelClient`] or [`MetavoxelSession`]). It keeps:
//! - a window of send records and a window of receive records, whose fronts
//!   are the last acknowledged states and serve as delta baselines
//! - a [`SentPacketHistory`] of recently sent datagrams
//! - a [`DatagramSequencer`] that numbers packets and turns piggybacked acks
//!   into pruning boundaries for both windows
//!
//! # Design Principles
//!
//! - **Baseline always defined** - Windows start with a bootstrap record and never empty.
//! - **Bounded memory** - History is a fixed ring; windows shrink as acks arrive.
//! - **Wraparound-safe** - 16-bit wire sequences are extended to 64-bit packet numbers.
//! - **Failures are atomic** - A rejected datagram changes no window.

mod client;
mod config;
mod endpoint;
mod error;
mod history;
mod message;
mod policy;
mod record;
mod role;
mod sequencer;
mod session;
mod sink;
mod types;

pub use client::MetavoxelClient;
pub use config::EndpointConfig;
pub use endpoint::Endpoint;
pub use error::{EndpointError, EndpointResult, MessageLimitKind};
pub use history::{SentPacketHistory, DEFAULT_CAPACITY};
pub use message::{Message, MessageLimits};
pub use policy::UpdateCadence;
pub use record::{PacketRecord, RecordWindow};
pub use role::EndpointRole;
pub use sequencer::{Acknowledgments, DatagramSequencer, Incoming, OutgoingDatagram};
pub use session::MetavoxelSession;
pub use sink::DatagramSink;
pub use types::{PacketNumber, PeerId};
pub use wire::{Limits as WireLimits, SequenceNumber};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = PacketNumber::BOOTSTRAP;
        let _ = PeerId::new(0);
        let _ = EndpointConfig::default();
        let _ = PacketRecord::default();
        let _ = RecordWindow::default();
        let _ = SentPacketHistory::default();
        let _ = WireLimits::default();
        let _: EndpointResult<()> = Ok(());
    }

    #[test]
    fn endpoint_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Endpoint<MetavoxelClient, Vec<Vec<u8>>>>();
        assert_send::<Endpoint<MetavoxelSession, std::collections::VecDeque<Vec<u8>>>>();
    }
}
