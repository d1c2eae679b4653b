//! Async counterpart of [`RawTransport`](crate::core::RawTransport).

use async_trait::async_trait;

use crate::core::TransportResult;

/// Async low-level byte transport.
///
/// Same contract as [`RawTransport`](crate::core::RawTransport); every
/// primitive is a suspension point.
#[async_trait]
pub trait AsyncRawTransport: Send {
    /// Acquire the medium.
    async fn raw_open(&mut self) -> TransportResult<()>;

    /// Release the medium.
    async fn raw_close(&mut self) -> TransportResult<()>;

    /// Write as much of `data` as possible, returning the count written.
    async fn raw_send(&mut self, data: &[u8]) -> TransportResult<usize>;

    /// Wait for at least one byte, then return at most `max_bytes`.
    ///
    /// An empty vector signals that the peer closed the medium.
    async fn raw_receive(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>>;
}

#[async_trait]
impl<T: AsyncRawTransport + ?Sized> AsyncRawTransport for &mut T {
    async fn raw_open(&mut self) -> TransportResult<()> {
        (**self).raw_open().await
    }

    async fn raw_close(&mut self) -> TransportResult<()> {
        (**self).raw_close().await
    }

    async fn raw_send(&mut self, data: &[u8]) -> TransportResult<usize> {
        (**self).raw_send(data).await
    }

    async fn raw_receive(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>> {
        (**self).raw_receive(max_bytes).await
    }
}
