//! Channel lifecycle and counters.

use crate::core::ProtocolError;

/// Channel lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelPhase {
    /// Transport not acquired. Initial state.
    #[default]
    Closed,
    /// Transport acquired, frames may be exchanged.
    Open,
    /// A handshake failed mid-way. The transport is still held but the
    /// byte stream position is unknown; only `close()` is allowed.
    Failed,
}

impl ChannelPhase {
    /// Whether the transport is currently acquired.
    pub fn holds_transport(self) -> bool {
        matches!(self, ChannelPhase::Open | ChannelPhase::Failed)
    }

    /// Check that a frame may be sent or received.
    pub fn ensure_ready(self) -> Result<(), ProtocolError> {
        match self {
            ChannelPhase::Open => Ok(()),
            ChannelPhase::Closed => Err(ProtocolError::NotOpen),
            ChannelPhase::Failed => Err(ProtocolError::Poisoned),
        }
    }

    /// Check that `open()` may acquire the transport.
    pub fn ensure_openable(self) -> Result<(), ProtocolError> {
        if self.holds_transport() {
            Err(ProtocolError::AlreadyOpen)
        } else {
            Ok(())
        }
    }
}

/// Frame counters, payload bytes only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames sent and acknowledged.
    pub frames_sent: u64,
    /// Frames received and acknowledged.
    pub frames_received: u64,
    /// Payload bytes sent.
    pub bytes_sent: u64,
    /// Payload bytes received.
    pub bytes_received: u64,
}

impl FrameStats {
    pub(crate) fn record_sent(&mut self, len: usize) {
        self.frames_sent += 1;
        self.bytes_sent += len as u64;
    }

    pub(crate) fn record_received(&mut self, len: usize) {
        self.frames_received += 1;
        self.bytes_received += len as u64;
    }
}
