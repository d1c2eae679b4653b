//! In-memory duplex transport.
//!
//! Two connected ends exchange chunks over `std::sync::mpsc`. Optional
//! caps on writes and reads make partial I/O reproducible in tests.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::channel::ChannelConfig;
use crate::core::{RECV_TIMEOUT, RawTransport, TransportError, TransportResult};

/// Behavior knobs for [`MemoryTransport`].
///
/// The length header has no terminator, so a receiver takes whatever one
/// raw read returns as the whole header. Both caps must be at least as
/// wide as the longest header the pair carries (the digit count of the
/// largest payload length); narrower caps split the header and the
/// receiver misreads the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryOptions {
    /// Accept at most this many bytes per `raw_send`.
    ///
    /// A cap below the header's digit count splits the header across
    /// two writes, and so across two reads.
    pub max_write: Option<usize>,
    /// Return at most this many bytes per `raw_receive`.
    ///
    /// A cap below the header's digit count truncates the header read;
    /// the leftover digits are then taken as payload.
    pub max_read: Option<usize>,
    /// How long `raw_receive` waits before reporting a timeout.
    pub recv_timeout: Duration,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            max_write: None,
            max_read: None,
            recv_timeout: RECV_TIMEOUT,
        }
    }
}

impl MemoryOptions {
    /// Options taking their receive timeout from `config`, with no caps.
    pub fn from_config(config: &ChannelConfig) -> Self {
        Self {
            recv_timeout: config.recv_timeout(),
            ..Self::default()
        }
    }
}

/// One end of an in-memory duplex pipe.
///
/// Reads never span two writes of the peer, so a chunk boundary falls
/// after every `raw_send`. Closing an end hangs up its half of the pipe:
/// the peer reads end-of-stream, and the closed end cannot be reopened.
#[derive(Debug)]
pub struct MemoryTransport {
    /// Dropped on close so the peer sees end-of-stream.
    tx: Option<Sender<Vec<u8>>>,
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    open: bool,
    options: MemoryOptions,
}

impl MemoryTransport {
    /// Create two connected ends with default options.
    pub fn pair() -> (Self, Self) {
        Self::pair_with(MemoryOptions::default())
    }

    /// Create two connected ends sharing `options`.
    pub fn pair_with(options: MemoryOptions) -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel();
        let (b_tx, a_rx) = mpsc::channel();
        (
            Self::new(a_tx, a_rx, options),
            Self::new(b_tx, b_rx, options),
        )
    }

    fn new(tx: Sender<Vec<u8>>, rx: Receiver<Vec<u8>>, options: MemoryOptions) -> Self {
        Self {
            tx: Some(tx),
            rx,
            pending: Vec::new(),
            open: false,
            options,
        }
    }

    /// Options this end was created with.
    pub fn options(&self) -> MemoryOptions {
        self.options
    }

    /// Whether `raw_open` has been called without a matching `raw_close`.
    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl RawTransport for MemoryTransport {
    fn raw_open(&mut self) -> TransportResult<()> {
        if self.tx.is_none() {
            return Err(TransportError::Disconnected);
        }
        self.open = true;
        Ok(())
    }

    fn raw_close(&mut self) -> TransportResult<()> {
        self.open = false;
        self.tx = None;
        self.pending.clear();
        Ok(())
    }

    fn raw_send(&mut self, data: &[u8]) -> TransportResult<usize> {
        let tx = match &self.tx {
            Some(tx) if self.open => tx,
            _ => return Err(TransportError::NotOpen),
        };
        let n = self
            .options
            .max_write
            .map_or(data.len(), |max| max.min(data.len()));
        if n == 0 {
            return Ok(0);
        }
        tx.send(data[..n].to_vec())
            .map_err(|_| TransportError::Disconnected)?;
        Ok(n)
    }

    fn raw_receive(&mut self, max_bytes: usize) -> TransportResult<Vec<u8>> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        if self.pending.is_empty() {
            match self.rx.recv_timeout(self.options.recv_timeout) {
                Ok(chunk) => self.pending = chunk,
                Err(RecvTimeoutError::Timeout) => return Err(TransportError::Timeout),
                // Peer gone and everything it wrote has been read.
                Err(RecvTimeoutError::Disconnected) => return Ok(Vec::new()),
            }
        }

        let cap = self.options.max_read.map_or(max_bytes, |m| m.min(max_bytes));
        let n = cap.min(self.pending.len());
        Ok(self.pending.drain(..n).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_pair(options: MemoryOptions) -> (MemoryTransport, MemoryTransport) {
        let (mut a, mut b) = MemoryTransport::pair_with(options);
        a.raw_open().unwrap();
        b.raw_open().unwrap();
        (a, b)
    }

    #[test]
    fn test_send_receive() {
        let (mut a, mut b) = open_pair(MemoryOptions::default());

        assert_eq!(a.raw_send(b"hello").unwrap(), 5);
        assert_eq!(b.raw_receive(4096).unwrap(), b"hello");

        assert_eq!(b.raw_send(b"back").unwrap(), 4);
        assert_eq!(a.raw_receive(4096).unwrap(), b"back");
    }

    #[test]
    fn test_chunks_not_coalesced() {
        let (mut a, mut b) = open_pair(MemoryOptions::default());

        a.raw_send(b"12").unwrap();
        a.raw_send(b"34").unwrap();

        assert_eq!(b.raw_receive(4096).unwrap(), b"12");
        assert_eq!(b.raw_receive(4096).unwrap(), b"34");
    }

    #[test]
    fn test_read_respects_max_bytes() {
        let (mut a, mut b) = open_pair(MemoryOptions::default());

        a.raw_send(b"abcdef").unwrap();

        assert_eq!(b.raw_receive(4).unwrap(), b"abcd");
        assert_eq!(b.raw_receive(4).unwrap(), b"ef");
    }

    #[test]
    fn test_caps() {
        let options = MemoryOptions {
            max_write: Some(3),
            max_read: Some(2),
            ..MemoryOptions::default()
        };
        let (mut a, mut b) = open_pair(options);

        assert_eq!(a.raw_send(b"0123456789").unwrap(), 3);
        assert_eq!(b.raw_receive(4096).unwrap(), b"01");
        assert_eq!(b.raw_receive(4096).unwrap(), b"2");
    }

    #[test]
    fn test_requires_open() {
        let (mut a, _b) = MemoryTransport::pair();

        assert!(matches!(a.raw_send(b"x"), Err(TransportError::NotOpen)));
        assert!(matches!(a.raw_receive(1), Err(TransportError::NotOpen)));
    }

    #[test]
    fn test_timeout() {
        let options = MemoryOptions {
            recv_timeout: Duration::from_millis(10),
            ..MemoryOptions::default()
        };
        let (_a, mut b) = open_pair(options);

        assert!(matches!(b.raw_receive(1), Err(TransportError::Timeout)));
    }

    #[test]
    fn test_close_signals_eof() {
        let (mut a, mut b) = open_pair(MemoryOptions::default());
        a.raw_send(b"last").unwrap();
        a.raw_close().unwrap();

        assert_eq!(b.raw_receive(4096).unwrap(), b"last");
        assert!(b.raw_receive(4096).unwrap().is_empty());
        assert!(matches!(a.raw_open(), Err(TransportError::Disconnected)));
        assert!(matches!(a.raw_send(b"x"), Err(TransportError::NotOpen)));
    }

    #[test]
    fn test_from_config() {
        let config = ChannelConfig::new().with_recv_timeout(Duration::from_millis(10));
        let options = MemoryOptions::from_config(&config);
        assert_eq!(options.recv_timeout, Duration::from_millis(10));
        assert_eq!(options.max_write, None);

        let (_a, mut b) = open_pair(options);
        assert!(matches!(b.raw_receive(1), Err(TransportError::Timeout)));
    }

    #[test]
    fn test_peer_dropped() {
        let (mut a, mut b) = open_pair(MemoryOptions::default());
        a.raw_send(b"last").unwrap();
        drop(a);

        assert_eq!(b.raw_receive(4096).unwrap(), b"last");
        assert!(b.raw_receive(4096).unwrap().is_empty());
        assert!(matches!(b.raw_send(b"x"), Err(TransportError::Disconnected)));
    }
}
