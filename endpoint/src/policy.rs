//! Send cadence policies.

use std::time::{Duration, Instant};

/// When [`crate::Endpoint::update`] actually sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UpdateCadence {
    /// Send on every update.
    #[default]
    EveryTick,
    /// Send at most once per interval.
    Interval { millis: u64 },
    /// Token bucket over datagram bytes. Sends while the bucket is
    /// positive; the sent size is debited afterwards and may overdraw it.
    ByteBudget {
        bytes_per_second: u32,
        burst_bytes: u32,
    },
}

/// Runtime state for an [`UpdateCadence`].
#[derive(Debug, Clone)]
pub(crate) struct CadenceState {
    cadence: UpdateCadence,
    last_sent: Option<Instant>,
    tokens: f64,
    last_refill: Option<Instant>,
}

impl CadenceState {
    pub(crate) fn new(cadence: UpdateCadence) -> Self {
        let tokens = match cadence {
            UpdateCadence::ByteBudget { burst_bytes, .. } => f64::from(burst_bytes),
            _ => 0.0,
        };
        Self {
            cadence,
            last_sent: None,
            tokens,
            last_refill: None,
        }
    }

    pub(crate) fn should_send(&mut self, now: Instant) -> bool {
        match self.cadence {
            UpdateCadence::EveryTick => true,
            UpdateCadence::Interval { millis } => self
                .last_sent
                .map_or(true, |last| {
                    now.saturating_duration_since(last) >= Duration::from_millis(millis)
                }),
            UpdateCadence::ByteBudget {
                bytes_per_second,
                burst_bytes,
            } => {
                if let Some(last) = self.last_refill {
                    let elapsed = now.saturating_duration_since(last).as_secs_f64();
                    self.tokens = (self.tokens + elapsed * f64::from(bytes_per_second))
                        .min(f64::from(burst_bytes));
                }
                self.last_refill = Some(now);
                self.tokens > 0.0
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn on_sent(&mut self, now: Instant, bytes: usize) {
        self.last_sent = Some(now);
        if matches!(self.cadence, UpdateCadence::ByteBudget { .. }) {
            self.tokens -= bytes as f64;
        }
    }
}
