//! Transport interface the framing channel is layered on.

use super::error::TransportResult;

/// Low-level byte transport supplying the four framing primitives.
///
/// Implementations provide no message boundaries of their own; the
/// channel adds them. Any primitive that cannot perform its operation
/// must return a [`TransportError`](super::error::TransportError).
///
/// # Example
///
/// ```
/// use ackframe::core::{RawTransport, TransportResult};
///
/// /// Swallows writes, never produces data.
/// struct Sink;
///
/// impl RawTransport for Sink {
///     fn raw_open(&mut self) -> TransportResult<()> {
///         Ok(())
///     }
///
///     fn raw_close(&mut self) -> TransportResult<()> {
///         Ok(())
///     }
///
///     fn raw_send(&mut self, data: &[u8]) -> TransportResult<usize> {
///         Ok(data.len())
///     }
///
///     fn raw_receive(&mut self, _max_bytes: usize) -> TransportResult<Vec<u8>> {
///         Ok(Vec::new())
///     }
/// }
/// ```
pub trait RawTransport {
    /// Acquire the medium (open a socket, a device, ...).
    fn raw_open(&mut self) -> TransportResult<()>;

    /// Release the medium.
    fn raw_close(&mut self) -> TransportResult<()>;

    /// Write as much of `data` as possible.
    ///
    /// Returns the number of bytes written, which may be less than
    /// `data.len()`.
    fn raw_send(&mut self, data: &[u8]) -> TransportResult<usize>;

    /// Block until at least one byte is available or the transport's own
    /// timeout elapses, then return at most `max_bytes`.
    ///
    /// An empty vector signals that the peer closed the medium.
    fn raw_receive(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>>;
}

impl<T: RawTransport + ?Sized> RawTransport for &mut T {
    fn raw_open(&mut self) -> TransportResult<()> {
        (**self).raw_open()
    }

    fn raw_close(&mut self) -> TransportResult<()> {
        (**self).raw_close()
    }

    fn raw_send(&mut self, data: &[u8]) -> TransportResult<usize> {
        (**self).raw_send(data)
    }

    fn raw_receive(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>> {
        (**self).raw_receive(max_bytes)
    }
}

impl<T: RawTransport + ?Sized> RawTransport for Box<T> {
    fn raw_open(&mut self) -> TransportResult<()> {
        (**self).raw_open()
    }

    fn raw_close(&mut self) -> TransportResult<()> {
        (**self).raw_close()
    }

    fn raw_send(&mut self, data: &[u8]) -> TransportResult<usize> {
        (**self).raw_send(data)
    }

    fn raw_receive(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>> {
        (**self).raw_receive(max_bytes)
    }
}
