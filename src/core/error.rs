//! Error types for the framing protocol.

use std::io;

use thiserror::Error;

/// Failures of the underlying medium.
///
/// Always propagated unmodified; the channel never retries them.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error from the medium (socket, device, ...).
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Peer closed the connection, or a read returned no bytes.
    #[error("connection closed")]
    ConnectionClosed,

    /// The medium accepted zero bytes of a non-empty write.
    #[error("transport accepted zero bytes")]
    WriteZero,

    /// The transport's own receive timeout elapsed.
    #[error("receive timed out")]
    Timeout,

    /// A raw operation was attempted before `raw_open` succeeded.
    #[error("transport not open")]
    NotOpen,

    /// The peer end of a paired transport has been dropped.
    #[error("peer disconnected")]
    Disconnected,
}

impl TransportError {
    /// Check if the medium can no longer carry data.
    ///
    /// A timeout leaves the medium usable; the channel itself is still
    /// poisoned by any mid-handshake failure.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TransportError::Timeout)
    }
}

/// Violations of the framing discipline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Peer did not acknowledge the length header.
    #[error("length not acknowledged")]
    LengthNotAcknowledged {
        /// Bytes received in place of the token.
        received: Vec<u8>,
    },

    /// Peer did not acknowledge the payload.
    #[error("payload not acknowledged")]
    PayloadNotAcknowledged {
        /// Bytes received in place of the token.
        received: Vec<u8>,
    },

    /// Length header is not a non-negative decimal integer.
    #[error("invalid length")]
    InvalidLength {
        /// Raw header bytes.
        header: Vec<u8>,
    },

    /// A single read returned more bytes than the frame still needed.
    #[error("frame overrun: expected {expected} bytes, got {received}")]
    Overrun {
        /// Declared frame length.
        expected: usize,
        /// Bytes accumulated including the over-read.
        received: usize,
    },

    /// Frame exceeds the configured maximum.
    #[error("frame of {len} bytes exceeds maximum of {max}")]
    FrameTooLarge {
        /// Frame length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Operation requires an open channel.
    #[error("channel not open")]
    NotOpen,

    /// `open()` called on an open channel.
    #[error("channel already open")]
    AlreadyOpen,

    /// A previous handshake failed; close and reopen before reuse.
    #[error("channel poisoned by a failed handshake")]
    Poisoned,
}

/// Invalid [`ChannelConfig`](crate::channel::ChannelConfig) values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Buffer size must be non-zero.
    #[error("buffer size must be non-zero")]
    ZeroBufferSize,

    /// Acknowledgement token must be non-empty.
    #[error("acknowledgement token must be non-empty")]
    EmptyAckToken,

    /// Receive timeout must be non-zero.
    #[error("receive timeout must be non-zero")]
    ZeroTimeout,
}

/// Top-level channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ChannelError {
    /// Check if this is a framing-level failure.
    pub fn is_protocol(&self) -> bool {
        matches!(self, ChannelError::Protocol(_))
    }

    /// Check if this is a failure of the medium.
    pub fn is_transport(&self) -> bool {
        matches!(self, ChannelError::Transport(_))
    }

    /// The protocol error, if any.
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            ChannelError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ChannelError {
    fn from(err: io::Error) -> Self {
        ChannelError::Transport(TransportError::Io(err))
    }
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Result type for raw transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
