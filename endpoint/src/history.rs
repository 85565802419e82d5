//! Ring buffer of recently sent datagrams.

use std::num::NonZeroUsize;

use log::debug;
use wire::SequenceNumber;

/// Default number of sent datagrams remembered.
pub const DEFAULT_CAPACITY: usize = 1000;

/// A fixed-capacity ring of sent datagrams keyed by sequence number.
///
/// Every write advances the cursor by one slot and overwrites the oldest
/// entry once full. Lookups walk back from the newest sequence number, so
/// they assume one write per sequence number; each slot also keeps its own
/// sequence number and a mismatch reads as absent.
#[derive(Debug)]
pub struct SentPacketHistory {
    slots: Vec<Option<Slot>>,
    newest_at: usize,
    len: usize,
    newest: Option<SequenceNumber>,
}

#[derive(Debug)]
struct Slot {
    sequence: SequenceNumber,
    bytes: Vec<u8>,
}

impl Default for SentPacketHistory {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl SentPacketHistory {
    /// Creates an empty history with the given capacity.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        let cap = capacity.get();
        let mut slots = Vec::with_capacity(cap);
        slots.resize_with(cap, || None);
        Self {
            slots,
            newest_at: cap - 1,
            len: 0,
            newest: None,
        }
    }

    /// Stores a copy of a sent datagram.
    pub fn record_sent(&mut self, sequence: SequenceNumber, bytes: Vec<u8>) {
        if let Some(newest) = self.newest {
            if sequence != newest.next() {
                debug!(
                    "non-contiguous history write: {} after {}",
                    sequence.raw(),
                    newest.raw()
                );
            }
        }

        let cap = self.slots.len();
        self.newest_at = (self.newest_at + 1) % cap;
        self.slots[self.newest_at] = Some(Slot { sequence, bytes });
        if self.len < cap {
            self.len += 1;
        }
        self.newest = Some(sequence);
    }

    /// Returns the bytes sent under `sequence`, if still retained.
    #[must_use]
    pub fn lookup(&self, sequence: SequenceNumber) -> Option<&[u8]> {
        let newest = self.newest?;
        let back = usize::from(newest.raw().wrapping_sub(sequence.raw()));
        if back >= self.len {
            return None;
        }
        let cap = self.slots.len();
        let idx = (self.newest_at + cap - back) % cap;
        self.slots[idx]
            .as_ref()
            .filter(|slot| slot.sequence == sequence)
            .map(|slot| slot.bytes.as_slice())
    }

    /// Returns the capacity of the history.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of retained datagrams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the most recently recorded sequence number.
    #[must_use]
    pub fn newest(&self) -> Option<SequenceNumber> {
        self.newest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(cap: usize) -> SentPacketHistory {
        SentPacketHistory::new(NonZeroUsize::new(cap).unwrap())
    }

    fn seq(raw: u16) -> SequenceNumber {
        SequenceNumber::new(raw)
    }

    #[test]
    fn empty_lookup_is_none() {
        let history = history(4);
        assert!(history.is_empty());
        assert_eq!(history.lookup(seq(0)), None);
        assert_eq!(history.newest(), None);
    }

    #[test]
    fn default_capacity() {
        assert_eq!(SentPacketHistory::default().capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn record_and_lookup() {
        let mut history = history(4);
        history.record_sent(seq(1), vec![1]);
        history.record_sent(seq(2), vec![2]);
        assert_eq!(history.lookup(seq(1)), Some(&[1u8][..]));
        assert_eq!(history.lookup(seq(2)), Some(&[2u8][..]));
        assert_eq!(history.lookup(seq(3)), None);
        assert_eq!(history.len(), 2);
        assert_eq!(history.newest(), Some(seq(2)));
    }

    #[test]
    fn capacity_three_evicts_oldest() {
        let mut history = history(3);
        for raw in 1..=4 {
            history.record_sent(seq(raw), vec![raw as u8]);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.lookup(seq(1)), None);
        assert_eq!(history.lookup(seq(2)), Some(&[2u8][..]));
        assert_eq!(history.lookup(seq(4)), Some(&[4u8][..]));
    }

    #[test]
    fn future_sequence_is_none() {
        let mut history = history(8);
        history.record_sent(seq(10), vec![10]);
        // 11 wraps to a distance of 65535 behind the newest.
        assert_eq!(history.lookup(seq(11)), None);
    }

    #[test]
    fn gap_is_not_aliased() {
        let mut history = history(8);
        history.record_sent(seq(1), vec![1]);
        history.record_sent(seq(5), vec![5]);
        assert_eq!(history.lookup(seq(5)), Some(&[5u8][..]));
        // Slot one back holds sequence 1, not 4.
        assert_eq!(history.lookup(seq(4)), None);
        assert_eq!(history.lookup(seq(3)), None);
    }
}
