//! Handshake-based framing.
//!
//! A frame crosses the wire in four steps, each blocking until the peer
//! answers:
//!
//! 1. the sender writes the payload length as decimal ASCII,
//! 2. the receiver answers with the acknowledgement token,
//! 3. the sender writes the raw payload,
//! 4. the receiver answers with the token again.
//!
//! [`FramedChannel`] runs this exchange over any [`RawTransport`](crate::core::RawTransport).
//! The [`wire`] helpers hold the pieces shared with the async channel.

mod config;
mod framed;
mod state;
pub mod wire;

pub use config::ChannelConfig;
pub use framed::FramedChannel;
pub use state::{ChannelPhase, FrameStats};
