//! # ackframe
//!
//! Length-prefixed, acknowledgement-driven message framing over byte
//! transports that have no framing of their own.
//!
//! Each message crosses the wire as:
//!
//! ```text
//! [length as decimal ASCII] -> [ACKNOWLEDGE] -> [payload] -> [ACKNOWLEDGE]
//! ```
//!
//! The transport is pluggable: anything that can open, close, write some
//! bytes and read some bytes implements [`RawTransport`] and gets framing
//! from [`FramedChannel`].
//!
//! ## Feature Flags
//!
//! - `transport` (default): bundled in-memory and TCP transports
//! - `tokio` (default): async channel and tokio stream transports
//!
//! ## Modules
//!
//! - [`core`]: constants, error types and the transport trait
//! - [`channel`]: the blocking channel, its configuration and wire helpers
//! - [`transport`]: bundled transports (requires `transport` feature)
//! - [`asynchronous`]: async channel (requires `tokio` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! # #[cfg(feature = "transport")]
//! # fn main() -> Result<(), ackframe::ChannelError> {
//! use std::thread;
//!
//! use ackframe::prelude::*;
//!
//! let (left, right) = MemoryTransport::pair();
//!
//! let peer = thread::spawn(move || -> Result<Vec<u8>, ChannelError> {
//!     let mut channel = FramedChannel::new(right);
//!     channel.open()?;
//!     let frame = channel.receive()?;
//!     channel.send(b"")?;
//!     channel.close()?;
//!     Ok(frame)
//! });
//!
//! let mut channel = FramedChannel::new(left);
//! channel.open()?;
//! channel.send(b"hello")?;
//! assert!(channel.receive()?.is_empty());
//! channel.close()?;
//!
//! assert_eq!(peer.join().unwrap()?, b"hello");
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "transport"))]
//! # fn main() {}
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Framing (always included)
pub mod channel;

// Bundled transports (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

// Async channel (feature-gated)
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod asynchronous;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::channel::{ChannelConfig, ChannelPhase, FrameStats, FramedChannel};
    pub use crate::core::*;

    #[cfg(feature = "transport")]
    pub use crate::transport::{MemoryOptions, MemoryTransport, TcpTransport};

    #[cfg(feature = "tokio")]
    pub use crate::asynchronous::{
        AsyncFramedChannel, AsyncRawTransport, StreamTransport, TokioTcpTransport,
    };
}

// Re-export commonly used items at crate root
pub use crate::channel::{ChannelConfig, ChannelPhase, FramedChannel};
pub use crate::core::{ChannelError, ChannelResult, ProtocolError, RawTransport, TransportError};

#[cfg(feature = "tokio")]
pub use crate::asynchronous::{AsyncFramedChannel, AsyncRawTransport};
