//! Protocol module containing message types and the line codec.

pub mod codec;
pub mod messages;

use thiserror::Error;

pub use codec::{decode_line, parse_leading_int};
pub use messages::*;

/// Errors that can occur while producing outbound protocol text.
///
/// Inbound decoding never fails: anomalies are dropped or read as zero
/// (see [`codec::decode_line`]).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The outbound command could not be serialized to JSON.
    #[error("failed to encode monitor command: {0}")]
    Encode(#[from] serde_json::Error),
}
