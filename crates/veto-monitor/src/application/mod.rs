//! Application layer for the monitor.
//!
//! The application layer sits between the domain types and the
//! infrastructure adapters.  It contains no network I/O: it consumes the
//! events the connection queued and decides what to show and what to send
//! back.
//!
//! # Sub-modules
//!
//! - **`board`** – Folds queued [`MonitorEvent`](crate::domain::MonitorEvent)s
//!   into the state the big screen displays, and asks for the `monitor`
//!   role handshake once connected.

pub mod board;

pub use board::{MonitorBoard, Reaction, STATUS_DURATION};
