//! Channel configuration.

use std::time::Duration;

use crate::core::{ACKNOWLEDGE, BUFFER_SIZE, ConfigError, RECV_TIMEOUT};

/// Tunables for a framed channel.
///
/// Both peers must use the same acknowledgement token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    buffer_size: usize,
    recv_timeout: Duration,
    ack_token: Vec<u8>,
    max_frame_size: Option<usize>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelConfig {
    /// Create a configuration with the protocol defaults.
    pub fn new() -> Self {
        Self {
            buffer_size: BUFFER_SIZE,
            recv_timeout: RECV_TIMEOUT,
            ack_token: ACKNOWLEDGE.to_vec(),
            max_frame_size: None,
        }
    }

    /// Set the maximum bytes requested per raw-receive call.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the receive timeout handed to transports.
    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Set the acknowledgement token.
    pub fn with_ack_token(mut self, token: impl Into<Vec<u8>>) -> Self {
        self.ack_token = token.into();
        self
    }

    /// Reject frames larger than `max` bytes in both directions.
    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = Some(max);
        self
    }

    /// Maximum bytes requested per raw-receive call.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Receive timeout for transports to honor.
    ///
    /// The channel never waits on a clock itself: every blocking read
    /// goes through the transport. Bundled transports pick this value up
    /// through `MemoryOptions::from_config` and their `configure`
    /// builders.
    pub fn recv_timeout(&self) -> Duration {
        self.recv_timeout
    }

    /// Acknowledgement token.
    pub fn ack_token(&self) -> &[u8] {
        &self.ack_token
    }

    /// Maximum frame size, if limited.
    pub fn max_frame_size(&self) -> Option<usize> {
        self.max_frame_size
    }

    /// Check the configuration for unusable values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize);
        }
        if self.ack_token.is_empty() {
            return Err(ConfigError::EmptyAckToken);
        }
        if self.recv_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}
