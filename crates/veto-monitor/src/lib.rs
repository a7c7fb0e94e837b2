//! veto-monitor library crate.
//!
//! The monitor is the big-screen display of a Veto game.  It holds a single
//! WebSocket connection to the game server, decodes the server's broadcasts
//! and folds them into the state shown on screen.
//!
//! # Architecture
//!
//! ```text
//! Game server (tagged text lines over WebSocket)
//!         ↕
//! [veto-monitor]
//!   ├── domain/           Pure types: MonitorEvent, LifecycleEvent, Endpoint
//!   ├── application/      MonitorBoard: what the display shows
//!   └── infrastructure/
//!         ├── network/    Connection state machine, bootstrap worker,
//!         │               send buffer, event bridge, WebSocket transport
//!         ├── storage/    TOML configuration store
//!         └── console     Operator commands from stdin
//! ```
//!
//! # Threading
//!
//! Everything except the connection handshake runs on the caller's thread.
//! The caller pumps [`Connection::service`](infrastructure::network::Connection::service)
//! once per frame; the pump never blocks.  The handshake runs on a short-lived
//! bootstrap thread that hands its result back over a channel.

/// Domain layer: event and configuration types (no I/O).
pub mod domain;

/// Application layer: presentation state.
pub mod application;

/// Infrastructure layer: network, configuration and console adapters.
pub mod infrastructure;
