//! Outbound datagram transport.

use std::collections::VecDeque;

/// Where an endpoint hands framed datagrams.
///
/// Delivery is best effort; the sequencer tolerates loss.
pub trait DatagramSink {
    fn send_datagram(&mut self, datagram: Vec<u8>);
}

impl DatagramSink for Vec<Vec<u8>> {
    fn send_datagram(&mut self, datagram: Vec<u8>) {
        self.push(datagram);
    }
}

impl DatagramSink for VecDeque<Vec<u8>> {
    fn send_datagram(&mut self, datagram: Vec<u8>) {
        self.push_back(datagram);
    }
}

impl<S: DatagramSink + ?Sized> DatagramSink for &mut S {
    fn send_datagram(&mut self, datagram: Vec<u8>) {
        (**self).send_datagram(datagram);
    }
}
