//! Protocol constants.
//!
//! Both peers must agree on the acknowledgement token out-of-band. The
//! other values are defaults for [`ChannelConfig`](crate::channel::ChannelConfig).

use std::time::Duration;

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// Acknowledgement token exchanged after the length and payload phases.
pub const ACKNOWLEDGE: &[u8] = b"ACKNOWLEDGE";

/// Radix of the ASCII length header.
pub const LENGTH_RADIX: u32 = 10;

// =============================================================================
// I/O SIZING
// =============================================================================

/// Maximum bytes requested per raw-receive call.
pub const BUFFER_SIZE: usize = 4096;

// =============================================================================
// TIMING
// =============================================================================

/// Advisory receive timeout for transports to honor.
///
/// The channel itself never enforces it.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(30);
