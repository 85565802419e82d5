//! Endpoint configuration.

use std::num::NonZeroUsize;

use metavoxel::DeltaLimits;
use wire::Limits;

use crate::history::DEFAULT_CAPACITY;
use crate::message::MessageLimits;
use crate::policy::UpdateCadence;

/// Configuration for an [`crate::Endpoint`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EndpointConfig {
    /// When updates send.
    pub cadence: UpdateCadence,
    /// Sent datagrams remembered for recall; `None` disables the history.
    pub sent_history_capacity: Option<NonZeroUsize>,
    /// Unacknowledged packets at which a warning is logged. Sends never
    /// stop for lack of acks.
    pub in_flight_warning: usize,
    pub wire_limits: Limits,
    pub delta_limits: DeltaLimits,
    pub message_limits: MessageLimits,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            cadence: UpdateCadence::EveryTick,
            sent_history_capacity: NonZeroUsize::new(DEFAULT_CAPACITY),
            in_flight_warning: 1024,
            wire_limits: Limits::default(),
            delta_limits: DeltaLimits::default(),
            message_limits: MessageLimits::default(),
        }
    }
}

impl EndpointConfig {
    /// Creates a configuration with smaller limits for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            cadence: UpdateCadence::EveryTick,
            sent_history_capacity: NonZeroUsize::new(16),
            in_flight_warning: 64,
            wire_limits: Limits::for_testing(),
            delta_limits: DeltaLimits::for_testing(),
            message_limits: MessageLimits::for_testing(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_reasonable() {
        let config = EndpointConfig::default();
        assert_eq!(config.cadence, UpdateCadence::EveryTick);
        assert_eq!(
            config.sent_history_capacity.map(NonZeroUsize::get),
            Some(DEFAULT_CAPACITY)
        );
        assert!(config.in_flight_warning > 0);
    }

    #[test]
    fn testing_config_smaller() {
        let test = EndpointConfig::for_testing();
        let default = EndpointConfig::default();
        assert!(test.in_flight_warning < default.in_flight_warning);
        assert!(test.wire_limits.max_datagram_bytes < default.wire_limits.max_datagram_bytes);
        assert!(test.sent_history_capacity < default.sent_history_capacity);
    }
}
