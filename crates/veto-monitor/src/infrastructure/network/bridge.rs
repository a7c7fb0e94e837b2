//! Event bridge: the only code that handles transport callbacks.
//!
//! [`Connection::service`] is called once per frame from the main loop.  It:
//!
//! 1. Adopts (or discards) handshakes reported by bootstrap threads.
//! 2. Polls the transport and routes each callback reason:
//!    - `Established`       → `Connecting → Connected`
//!    - `Received(line)`    → [`decode_line`] → `MonitorEvent::Game`
//!    - `Writable`          → flush the send buffer
//!    - `Closed` / `Error`  → `→ Disconnected`
//! 3. Fires a reconnect scheduled by the reconnect policy.
//!
//! Nothing here blocks: bootstrap outcomes and transport events are both read
//! with `try_recv`-style polls.

use std::time::Instant;

use tracing::{debug, warn};
use veto_core::decode_line;

use crate::domain::ConnectionState;
use crate::infrastructure::network::bootstrap::BootstrapOutcome;
use crate::infrastructure::network::connection::Connection;
use crate::infrastructure::network::transport::TransportEvent;

/// What the transport should do after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Keep the connection open.
    Continue,
    /// The application no longer wants this connection; tear it down.
    Disconnect,
}

impl Connection {
    /// Runs one non-blocking service pass.
    ///
    /// Returns the number of transport callbacks handled.
    pub fn service(&mut self) -> usize {
        self.adopt_bootstraps();

        // Closing takes the transport, so the loop stops at the first
        // `Closed` or `Error` and later buffered events are never polled.
        let mut handled = 0;
        while let Some(event) = self.transport.as_mut().and_then(|t| t.poll_event()) {
            handled += 1;
            self.on_transport_event(event);
        }

        self.fire_scheduled_reconnect(Instant::now());
        handled
    }

    /// Handles one transport callback.
    ///
    /// Callbacks that arrive after the application marked the connection
    /// closed are not processed; the caller is told to disconnect instead.
    /// [`Connection::service`] never sees that outcome, since it only polls
    /// a held transport and a disconnected connection holds none.  It is
    /// for code that delivers callbacks from a transport of its own.
    pub fn on_transport_event(&mut self, event: TransportEvent) -> CallbackOutcome {
        if self.state == ConnectionState::Disconnected {
            debug!("stale transport callback {event:?}; disconnecting");
            return CallbackOutcome::Disconnect;
        }

        match event {
            TransportEvent::Established => self.on_established(),
            TransportEvent::Writable => self.flush_outbound(),
            TransportEvent::Received(line) => {
                debug!("incoming message ({} bytes): {line}", line.len());
                if let Some(game_event) = decode_line(&line) {
                    self.emit(game_event);
                }
            }
            TransportEvent::Closed => self.on_closed_or_failed(),
            TransportEvent::Error(reason) => {
                warn!("transport error: {reason}");
                self.on_closed_or_failed();
            }
        }
        CallbackOutcome::Continue
    }

    /// Sends the buffered message, if any.
    fn flush_outbound(&mut self) {
        let Some(message) = self.outbound.take() else {
            debug!("writable with nothing to send");
            return;
        };
        let Some(transport) = self.transport.as_mut() else {
            debug!("writable without transport; dropping {message:?}");
            return;
        };
        match transport.send_text(&message) {
            Ok(()) => debug!("sent {message:?}"),
            Err(e) => warn!("failed to send {message:?}: {e}"),
        }
    }

    /// Drains finished handshakes from the bootstrap channel.
    fn adopt_bootstraps(&mut self) {
        while let Ok(outcome) = self.bootstrap_rx.try_recv() {
            self.adopt(outcome);
        }
    }

    fn adopt(&mut self, outcome: BootstrapOutcome) {
        let current = outcome.generation == self.generation
            && self.state != ConnectionState::Disconnected
            && self.transport.is_none();

        match outcome.result {
            Ok(mut transport) if !current => {
                debug!("discarding stale handshake {}", outcome.generation);
                transport.close();
            }
            Ok(transport) => {
                debug!("handshake {} completed", outcome.generation);
                self.transport = Some(transport);
            }
            Err(e) if !current => {
                debug!("ignoring stale handshake failure {}: {e}", outcome.generation);
            }
            Err(e) => {
                warn!("{e}");
                self.on_closed_or_failed();
            }
        }
    }

    fn fire_scheduled_reconnect(&mut self, now: Instant) {
        match self.reconnect_at {
            Some(at) if at <= now && self.state == ConnectionState::Disconnected => {
                self.reconnect_at = None;
                self.connect();
            }
            _ => {}
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
