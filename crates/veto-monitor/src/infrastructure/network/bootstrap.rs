//! Bootstrap thread: performs the blocking handshake off the main loop.
//!
//! The handshake can take seconds (DNS, TCP, HTTP upgrade).  The main loop
//! renders every frame, so `connect()` spawns a short-lived thread that calls
//! [`Connector::connect`] and returns immediately.
//!
//! # Handing the transport back
//!
//! The thread never writes into the connection.  It sends a
//! [`BootstrapOutcome`] over a channel and exits; the main thread picks it up
//! on its next [`Connection::service`](super::Connection::service).  Each
//! outcome carries the *generation* of the connect cycle that spawned it, so
//! a handshake that finishes after `disconnect()` (or after a newer
//! `connect()`) is recognised as stale and closed instead of adopted.

use std::sync::Arc;
use std::thread;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::Endpoint;
use crate::infrastructure::network::transport::{Connector, Transport, TransportError};

/// Errors raised while starting a bootstrap thread.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The OS refused to create the thread.
    #[error("failed to spawn bootstrap thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// The result of one handshake, tagged with its connect cycle.
pub struct BootstrapOutcome {
    pub generation: u64,
    pub result: Result<Box<dyn Transport>, TransportError>,
}

impl std::fmt::Debug for BootstrapOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapOutcome")
            .field("generation", &self.generation)
            .field("ok", &self.result.is_ok())
            .finish()
    }
}

/// Spawns a detached thread that connects to `endpoint` and reports back on
/// `outcomes`.
///
/// If the receiving side is gone by the time the handshake finishes, the
/// fresh transport is closed on the bootstrap thread.
///
/// # Errors
///
/// Returns [`BootstrapError::Spawn`] if the thread cannot be created.
pub fn spawn_bootstrap(
    connector: Arc<dyn Connector>,
    endpoint: Endpoint,
    generation: u64,
    outcomes: mpsc::UnboundedSender<BootstrapOutcome>,
) -> Result<(), BootstrapError> {
    thread::Builder::new()
        .name(format!("veto-bootstrap-{generation}"))
        .spawn(move || {
            debug!("bootstrap {generation}: connecting to {}", endpoint.url());
            let result = connector.connect(&endpoint);

            if let Err(mpsc::error::SendError(outcome)) =
                outcomes.send(BootstrapOutcome { generation, result })
            {
                debug!("bootstrap {generation}: connection dropped; closing transport");
                if let Ok(mut transport) = outcome.result {
                    transport.close();
                }
            }
        })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
