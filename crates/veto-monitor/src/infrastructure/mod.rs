//! Infrastructure layer for the monitor.
//!
//! Contains everything that touches the outside world:
//!
//! - **`network`** – the server connection: state machine, bootstrap thread,
//!   single-slot send buffer, event bridge and the tokio-tungstenite transport.
//! - **`storage`** – the TOML configuration store.
//! - **`console`** – operator commands typed on stdin.

pub mod console;
pub mod network;
pub mod storage;
