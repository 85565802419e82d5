//! Wrapping 16-bit sequence numbers.

/// Half of the 16-bit sequence space.
const HALF_RANGE: u16 = 1 << 15;

/// A 16-bit packet sequence number as carried on the wire.
///
/// Sequence numbers wrap modulo 65536. Two numbers are only comparable when
/// they lie within half the sequence space of each other; raw numeric
/// ordering is meaningless across a wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SequenceNumber(u16);

impl SequenceNumber {
    /// Creates a sequence number from its raw value.
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns the following sequence number, wrapping at 65535.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Signed distance from `self` forward to `later`.
    ///
    /// `SequenceNumber::new(65535).diff_to(SequenceNumber::new(1)) == 2`.
    #[must_use]
    pub const fn diff_to(self, later: Self) -> i16 {
        later.0.wrapping_sub(self.0) as i16
    }

    /// Returns `true` if `self` is more recent than `other`.
    #[must_use]
    pub const fn is_newer_than(self, other: Self) -> bool {
        let forward = self.0.wrapping_sub(other.0);
        forward != 0 && forward < HALF_RANGE
    }
}

impl From<u16> for SequenceNumber {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<SequenceNumber> for u16 {
    fn from(sequence: SequenceNumber) -> Self {
        sequence.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_wraps() {
        assert_eq!(SequenceNumber::new(65535).next(), SequenceNumber::new(0));
        assert_eq!(SequenceNumber::new(7).next().raw(), 8);
    }

    #[test]
    fn diff_simple() {
        let a = SequenceNumber::new(10);
        let b = SequenceNumber::new(12);
        assert_eq!(a.diff_to(b), 2);
        assert_eq!(b.diff_to(a), -2);
    }

    #[test]
    fn diff_across_wrap() {
        let a = SequenceNumber::new(65535);
        let b = SequenceNumber::new(1);
        assert_eq!(a.diff_to(b), 2);
        assert_eq!(b.diff_to(a), -2);
    }

    #[test]
    fn newer_than() {
        assert!(SequenceNumber::new(2).is_newer_than(SequenceNumber::new(1)));
        assert!(!SequenceNumber::new(1).is_newer_than(SequenceNumber::new(2)));
        assert!(!SequenceNumber::new(2).is_newer_than(SequenceNumber::new(2)));
        assert!(SequenceNumber::new(3).is_newer_than(SequenceNumber::new(65530)));
        assert!(!SequenceNumber::new(65530).is_newer_than(SequenceNumber::new(3)));
    }

    #[test]
    fn conversions() {
        let sequence: SequenceNumber = 42u16.into();
        let raw: u16 = sequence.into();
        assert_eq!(raw, 42);
    }
}
