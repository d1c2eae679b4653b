//! Tokio stream transports.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::traits::AsyncRawTransport;
use crate::channel::ChannelConfig;
use crate::core::{RECV_TIMEOUT, TransportError, TransportResult};

/// Any tokio byte stream as a transport.
///
/// Works with `TcpStream`, `UnixStream`, `tokio::io::duplex` ends, and
/// so on. The stream is assumed connected; `raw_open` only arms the
/// transport and `raw_close` shuts down the write half.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
    open: bool,
    shut_down: bool,
    recv_timeout: Duration,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            open: false,
            shut_down: false,
            recv_timeout: RECV_TIMEOUT,
        }
    }

    /// Set how long `raw_receive` waits before reporting a timeout.
    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Take the receive timeout from `config`.
    pub fn configure(self, config: &ChannelConfig) -> Self {
        self.recv_timeout(config.recv_timeout())
    }

    /// Borrow the stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Unwrap the stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait]
impl<S> AsyncRawTransport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn raw_open(&mut self) -> TransportResult<()> {
        if self.shut_down {
            return Err(TransportError::Disconnected);
        }
        self.open = true;
        Ok(())
    }

    async fn raw_close(&mut self) -> TransportResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.shut_down = true;
        match self.stream.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn raw_send(&mut self, data: &[u8]) -> TransportResult<usize> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        let n = self.stream.write(data).await?;
        self.stream.flush().await?;
        Ok(n)
    }

    async fn raw_receive(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        let mut buf = vec![0u8; max_bytes];
        let n = tokio::time::timeout(self.recv_timeout, self.stream.read(&mut buf))
            .await
            .map_err(|_| TransportError::Timeout)??;
        buf.truncate(n);
        Ok(buf)
    }
}

/// Tokio TCP transport that dials on open.
#[derive(Debug)]
pub struct TokioTcpTransport {
    addr: SocketAddr,
    recv_timeout: Duration,
    inner: Option<StreamTransport<TcpStream>>,
}

impl TokioTcpTransport {
    /// Create a transport that connects to `addr` when opened.
    pub fn connect(addr: SocketAddr) -> Self {
        Self {
            addr,
            recv_timeout: RECV_TIMEOUT,
            inner: None,
        }
    }

    /// Set how long `raw_receive` waits before reporting a timeout.
    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Take the receive timeout from `config`.
    pub fn configure(self, config: &ChannelConfig) -> Self {
        self.recv_timeout(config.recv_timeout())
    }

    /// Remote address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn inner_mut(&mut self) -> TransportResult<&mut StreamTransport<TcpStream>> {
        self.inner.as_mut().ok_or(TransportError::NotOpen)
    }
}

#[async_trait]
impl AsyncRawTransport for TokioTcpTransport {
    async fn raw_open(&mut self) -> TransportResult<()> {
        let stream = TcpStream::connect(self.addr).await?;
        stream.set_nodelay(true)?;
        let mut inner = StreamTransport::new(stream).recv_timeout(self.recv_timeout);
        inner.raw_open().await?;
        self.inner = Some(inner);
        Ok(())
    }

    async fn raw_close(&mut self) -> TransportResult<()> {
        match self.inner.take() {
            Some(mut inner) => inner.raw_close().await,
            None => Ok(()),
        }
    }

    async fn raw_send(&mut self, data: &[u8]) -> TransportResult<usize> {
        self.inner_mut()?.raw_send(data).await
    }

    async fn raw_receive(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>> {
        self.inner_mut()?.raw_receive(max_bytes).await
    }
}
