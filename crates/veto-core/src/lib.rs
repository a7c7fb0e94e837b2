//! # veto-core
//!
//! Shared protocol library for the Veto parliament monitor.
//!
//! The game server broadcasts its state as short text lines over a
//! WebSocket connection.  Every line starts with a one-character *tag* that
//! selects the message kind, followed by an optional payload:
//!
//! ```text
//! S          session (re)started
//! C7         voting counter, 7 seconds left
//! Jalice     player "alice" joined
//! W2bob      winner slot 2 is "bob"
//! ```
//!
//! This crate contains no I/O.  It defines:
//!
//! - **`protocol::messages`** – the typed inbound [`VetoEvent`] and the
//!   outbound [`MonitorCommand`] sent by the monitor.
//! - **`protocol::codec`** – [`decode_line`], which turns one complete text
//!   frame into at most one [`VetoEvent`].

pub mod protocol;

pub use protocol::codec::{decode_line, parse_leading_int};
pub use protocol::messages::{MonitorCommand, VetoEvent};
pub use protocol::ProtocolError;
