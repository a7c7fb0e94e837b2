//! Domain layer for veto-monitor.
//!
//! Pure types shared by the network layer and the presentation code.  Nothing
//! here touches a socket, a thread or the file system.

pub mod endpoint;
pub mod events;

pub use endpoint::Endpoint;
pub use events::{ConnectionState, DisconnectReason, LifecycleEvent, MonitorEvent};
