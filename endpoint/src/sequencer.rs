//! Packet numbering and acknowledgment tracking.
//!
//! Every outgoing datagram carries the sequence number of the last datagram
//! received from the peer. When an ack arrives for one of our packets, two
//! things become known at once: the peer holds our packet (send side), and
//! the peer knows which of its packets we held when we sent it (receive
//! side). [`Acknowledgments`] reports both.

use std::collections::VecDeque;

use log::{debug, warn};
use wire::Limits;

use crate::error::{EndpointError, EndpointResult};
use crate::types::PacketNumber;

/// A framed datagram ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingDatagram {
    pub packet: PacketNumber,
    pub bytes: Vec<u8>,
}

/// A datagram accepted by [`DatagramSequencer::read_datagram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incoming<'a> {
    /// Peer packet number of this datagram.
    pub packet: PacketNumber,
    /// Our packet the peer acknowledged, if any.
    pub ack: Option<PacketNumber>,
    pub payload: &'a [u8],
}

/// Acknowledgment boundaries learned from one incoming datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Acknowledgments {
    /// Newest of our packets the peer has received.
    pub send: Option<PacketNumber>,
    /// Newest peer packet the peer knows we received.
    pub receive: Option<PacketNumber>,
}

/// Consecutive unacknowledged packets sent while `acked_incoming` was the
/// newest peer packet received. A link that is down in both directions
/// grows the newest run instead of the queue.
#[derive(Debug, Clone, Copy)]
struct InFlightRun {
    first: PacketNumber,
    last: PacketNumber,
    acked_incoming: PacketNumber,
}

impl InFlightRun {
    fn contains(&self, packet: PacketNumber) -> bool {
        self.first <= packet && packet <= self.last
    }
}

/// Assigns packet numbers, frames payloads and tracks acknowledgments.
///
/// Every sent packet stays tracked until acked, however long the peer is
/// silent: dropping an entry would lose the receive boundary its ack
/// reports.
#[derive(Debug)]
pub struct DatagramSequencer {
    limits: Limits,
    in_flight_warning: usize,
    next_outgoing: PacketNumber,
    last_incoming: PacketNumber,
    last_acked: PacketNumber,
    in_flight: VecDeque<InFlightRun>,
}

impl DatagramSequencer {
    /// Creates a sequencer. Outgoing packets are numbered from 1.
    ///
    /// A warning is logged when `in_flight_warning` packets are
    /// unacknowledged; sending continues regardless.
    #[must_use]
    pub fn new(limits: Limits, in_flight_warning: usize) -> Self {
        Self {
            limits,
            in_flight_warning,
            next_outgoing: PacketNumber::BOOTSTRAP.next(),
            last_incoming: PacketNumber::BOOTSTRAP,
            last_acked: PacketNumber::BOOTSTRAP,
            in_flight: VecDeque::new(),
        }
    }

    /// Frames `payload` as the next outgoing packet.
    ///
    /// Fails without consuming a packet number if the payload does not fit.
    pub fn write_datagram(&mut self, payload: &[u8]) -> EndpointResult<OutgoingDatagram> {
        let limit = self.limits.max_payload_bytes();
        if payload.len() > limit {
            return Err(EndpointError::MessageTooLarge {
                size: payload.len(),
                limit,
            });
        }

        let packet = self.next_outgoing;
        let ack = (!self.last_incoming.is_bootstrap()).then(|| self.last_incoming.sequence());
        let bytes = wire::encode_datagram(packet.sequence(), ack, payload, &self.limits)?;

        match self.in_flight.back_mut() {
            Some(run) if run.acked_incoming == self.last_incoming => run.last = packet,
            _ => self.in_flight.push_back(InFlightRun {
                first: packet,
                last: packet,
                acked_incoming: self.last_incoming,
            }),
        }
        self.next_outgoing = packet.next();

        if self.in_flight() == self.in_flight_warning {
            warn!(
                "{} packets unacknowledged (newest {packet}, last acked {})",
                self.in_flight_warning, self.last_acked
            );
        }
        Ok(OutgoingDatagram { packet, bytes })
    }

    /// Decodes a datagram.
    ///
    /// Returns `Ok(None)` for datagrams older than or equal to the last one
    /// received. Nothing is updated until [`Self::acknowledge`] and
    /// [`Self::mark_received`] are called.
    pub fn read_datagram<'a>(&self, bytes: &'a [u8]) -> EndpointResult<Option<Incoming<'a>>> {
        let datagram = wire::decode_datagram(bytes, &self.limits)?;
        let sequence = datagram.header.sequence;

        let packet = match PacketNumber::extend(sequence, self.last_incoming) {
            Some(packet) if packet > self.last_incoming => packet,
            _ => {
                debug!(
                    "dropping stale datagram {} (last received {})",
                    sequence.raw(),
                    self.last_incoming
                );
                return Ok(None);
            }
        };

        let newest_sent = self.last_sent();
        let ack = datagram.header.ack.and_then(|sequence| {
            match PacketNumber::extend(sequence, newest_sent) {
                Some(ack) if ack <= newest_sent && !ack.is_bootstrap() => Some(ack),
                _ => {
                    warn!(
                        "ignoring ack {} for unsent packet (newest sent {newest_sent})",
                        sequence.raw()
                    );
                    None
                }
            }
        });

        Ok(Some(Incoming {
            packet,
            ack,
            payload: datagram.payload,
        }))
    }

    /// Returns what acknowledging `incoming` would report, without applying it.
    #[must_use]
    pub fn acknowledgments(&self, incoming: &Incoming<'_>) -> Acknowledgments {
        let Some(ack) = incoming.ack.filter(|ack| *ack > self.last_acked) else {
            return Acknowledgments::default();
        };
        let receive = self
            .in_flight
            .iter()
            .find(|run| run.contains(ack))
            .map(|run| run.acked_incoming);
        Acknowledgments {
            send: Some(ack),
            receive,
        }
    }

    /// Applies the ack carried by `incoming`.
    pub fn acknowledge(&mut self, incoming: &Incoming<'_>) -> Acknowledgments {
        let acks = self.acknowledgments(incoming);
        if let Some(acked) = acks.send {
            while self.in_flight.front().is_some_and(|run| run.last <= acked) {
                self.in_flight.pop_front();
            }
            if let Some(run) = self.in_flight.front_mut() {
                if run.first <= acked {
                    run.first = acked.next();
                }
            }
            self.last_acked = acked;
        }
        acks
    }

    /// Records that `packet` was fully processed; it will be acked next.
    pub fn mark_received(&mut self, packet: PacketNumber) {
        if packet > self.last_incoming {
            self.last_incoming = packet;
        }
    }

    /// Newest packet number sent, or the bootstrap number before any send.
    #[must_use]
    pub fn last_sent(&self) -> PacketNumber {
        PacketNumber::new(self.next_outgoing.raw() - 1)
    }

    /// Newest peer packet marked received.
    #[must_use]
    pub fn last_received(&self) -> PacketNumber {
        self.last_incoming
    }

    /// Newest of our packets the peer acknowledged.
    #[must_use]
    pub fn last_acked(&self) -> PacketNumber {
        self.last_acked
    }

    /// Number of sent packets not yet acknowledged.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .iter()
            .map(|run| run.last.raw() - run.first.raw() + 1)
            .sum::<u64>()
            .try_into()
            .unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }
}
