//! Persistent session with a game host.
//!
//! - `protocol`: frame grammar (control directives, game payloads, outbound frames)
//! - `client`: connection lifecycle, greeting, fixed-interval reconnect

mod client;
mod protocol;

pub use client::*;
pub use protocol::*;
