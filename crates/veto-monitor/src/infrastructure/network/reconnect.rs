//! Reconnect policy hook.
//!
//! The connection does not reconnect on its own.  After every transition to
//! `Disconnected` it asks its [`ReconnectPolicy`] whether to try again and
//! after how long; the service pump then calls `connect()` once the delay has
//! passed.  An explicit `disconnect()` never schedules a reconnect.

use std::time::Duration;

use crate::domain::DisconnectReason;

/// Decides whether a dropped connection should be retried.
pub trait ReconnectPolicy: Send {
    /// Returns the delay before the next attempt, or `None` to stay
    /// disconnected.
    fn on_disconnected(&mut self, reason: DisconnectReason) -> Option<Duration>;
}

/// Never reconnects.  The operator reconnects by hand.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverReconnect;

impl ReconnectPolicy for NeverReconnect {
    fn on_disconnected(&mut self, _reason: DisconnectReason) -> Option<Duration> {
        None
    }
}

/// Retries after a fixed delay, for as long as the process runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    pub delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl ReconnectPolicy for FixedDelay {
    fn on_disconnected(&mut self, reason: DisconnectReason) -> Option<Duration> {
        match reason {
            DisconnectReason::Requested => None,
            DisconnectReason::Closed | DisconnectReason::ConnectFailed => Some(self.delay),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
