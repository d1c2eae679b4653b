//! Blocking TCP transport.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::channel::ChannelConfig;
use crate::core::{RECV_TIMEOUT, RawTransport, TransportError, TransportResult};

/// TCP stream carrying framed traffic.
///
/// Either dials `addr` on `raw_open` ([`TcpTransport::connect`]) or wraps
/// a stream that is already connected, such as one returned by
/// `TcpListener::accept` ([`TcpTransport::from_stream`]).
#[derive(Debug)]
pub struct TcpTransport {
    /// Address dialed by `raw_open` when no stream is held.
    target: Option<SocketAddr>,
    /// The connected stream, present while open.
    stream: Option<TcpStream>,
    /// Read timeout applied on open.
    recv_timeout: Duration,
}

impl TcpTransport {
    /// Create a transport that connects to `addr` when opened.
    pub fn connect(addr: SocketAddr) -> Self {
        Self {
            target: Some(addr),
            stream: None,
            recv_timeout: RECV_TIMEOUT,
        }
    }

    /// Wrap an already-connected stream.
    ///
    /// Once closed it cannot be reopened.
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            target: None,
            stream: Some(stream),
            recv_timeout: RECV_TIMEOUT,
        }
    }

    /// Set the read timeout applied on open.
    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Take the read timeout from `config`.
    pub fn configure(self, config: &ChannelConfig) -> Self {
        self.recv_timeout(config.recv_timeout())
    }

    /// Get the local address of the open stream.
    pub fn local_addr(&self) -> TransportResult<SocketAddr> {
        Ok(self.stream()?.local_addr()?)
    }

    /// Get the peer address of the open stream.
    pub fn peer_addr(&self) -> TransportResult<SocketAddr> {
        Ok(self.stream()?.peer_addr()?)
    }

    fn stream(&self) -> TransportResult<&TcpStream> {
        self.stream.as_ref().ok_or(TransportError::NotOpen)
    }

    fn stream_mut(&mut self) -> TransportResult<&mut TcpStream> {
        self.stream.as_mut().ok_or(TransportError::NotOpen)
    }
}

impl RawTransport for TcpTransport {
    fn raw_open(&mut self) -> TransportResult<()> {
        if self.stream.is_none() {
            let addr = self.target.ok_or(TransportError::Disconnected)?;
            self.stream = Some(TcpStream::connect(addr)?);
        }
        let timeout = self.recv_timeout;
        let stream = self.stream_mut()?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Ok(())
    }

    fn raw_close(&mut self) -> TransportResult<()> {
        if let Some(stream) = self.stream.take() {
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => {}
                // Peer already hung up.
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn raw_send(&mut self, data: &[u8]) -> TransportResult<usize> {
        let stream = self.stream_mut()?;
        loop {
            match stream.write(data) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn raw_receive(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>> {
        let stream = self.stream_mut()?;
        let mut buf = vec![0u8; max_bytes];
        loop {
            match stream.read(&mut buf) {
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(buf);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(TransportError::Timeout);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    fn loopback() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    #[test]
    fn test_connect_send_recv() {
        let (listener, addr) = loopback();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut transport = TcpTransport::from_stream(stream);
            transport.raw_open().unwrap();
            let got = transport.raw_receive(4096).unwrap();
            transport.raw_send(&got).unwrap();
            got
        });

        let mut client = TcpTransport::connect(addr);
        client.raw_open().unwrap();
        assert_eq!(client.peer_addr().unwrap(), addr);

        assert_eq!(client.raw_send(b"ping").unwrap(), 4);
        assert_eq!(client.raw_receive(4096).unwrap(), b"ping");
        assert_eq!(server.join().unwrap(), b"ping");

        client.raw_close().unwrap();
        client.raw_close().unwrap();
    }

    #[test]
    fn test_requires_open() {
        let (_listener, addr) = loopback();
        let mut client = TcpTransport::connect(addr);

        assert!(matches!(client.raw_send(b"x"), Err(TransportError::NotOpen)));
        assert!(matches!(client.local_addr(), Err(TransportError::NotOpen)));
    }

    #[test]
    fn test_receive_timeout() {
        let (listener, addr) = loopback();
        let mut client = TcpTransport::connect(addr).recv_timeout(Duration::from_millis(20));
        client.raw_open().unwrap();
        let _held = listener.accept().unwrap();

        assert!(matches!(client.raw_receive(16), Err(TransportError::Timeout)));
    }

    #[test]
    fn test_configured_timeout() {
        let (listener, addr) = loopback();
        let config = ChannelConfig::new().with_recv_timeout(Duration::from_millis(20));
        let mut client = TcpTransport::connect(addr).configure(&config);
        client.raw_open().unwrap();
        let _held = listener.accept().unwrap();

        assert!(matches!(client.raw_receive(16), Err(TransportError::Timeout)));
    }

    #[test]
    fn test_peer_close_reads_empty() {
        let (listener, addr) = loopback();
        let mut client = TcpTransport::connect(addr);
        client.raw_open().unwrap();
        drop(listener.accept().unwrap());

        assert!(client.raw_receive(16).unwrap().is_empty());
    }

    #[test]
    fn test_accepted_stream_not_reopenable() {
        let (listener, addr) = loopback();
        let _client = TcpStream::connect(addr).unwrap();
        let (stream, _) = listener.accept().unwrap();

        let mut transport = TcpTransport::from_stream(stream);
        transport.raw_open().unwrap();
        transport.raw_close().unwrap();

        assert!(matches!(
            transport.raw_open(),
            Err(TransportError::Disconnected)
        ));
    }
}
