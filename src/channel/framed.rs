//! Blocking framed channel.

use tracing::{debug, trace, warn};

use super::config::ChannelConfig;
use super::state::{ChannelPhase, FrameStats};
use super::wire::{
    AckMatcher, AckPhase, FrameAssembler, advance_written, check_frame_size, decode_header,
    encode_length, require_data,
};
use crate::core::{ChannelResult, RawTransport};

/// Handshake-framed message channel over a [`RawTransport`].
///
/// Every message runs the full exchange before the call returns:
/// length header, acknowledgement, payload, acknowledgement. One channel
/// carries one frame at a time; `&mut self` on every operation keeps
/// callers from interleaving handshakes.
#[derive(Debug)]
pub struct FramedChannel<T> {
    transport: T,
    config: ChannelConfig,
    phase: ChannelPhase,
    stats: FrameStats,
}

impl<T: RawTransport> FramedChannel<T> {
    /// Create a closed channel with the default configuration.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: ChannelConfig::default(),
            phase: ChannelPhase::Closed,
            stats: FrameStats::default(),
        }
    }

    /// Create a closed channel with a custom configuration.
    pub fn with_config(transport: T, config: ChannelConfig) -> ChannelResult<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            config,
            phase: ChannelPhase::Closed,
            stats: FrameStats::default(),
        })
    }

    /// Acquire the underlying transport.
    pub fn open(&mut self) -> ChannelResult<()> {
        self.phase.ensure_openable()?;
        self.transport.raw_open()?;
        self.phase = ChannelPhase::Open;
        debug!("channel opened");
        Ok(())
    }

    /// Release the underlying transport.
    ///
    /// Closing a closed channel does nothing. The channel ends up closed
    /// even if the transport fails to release.
    pub fn close(&mut self) -> ChannelResult<()> {
        if !self.phase.holds_transport() {
            return Ok(());
        }
        self.phase = ChannelPhase::Closed;
        self.transport.raw_close()?;
        debug!("channel closed");
        Ok(())
    }

    /// Send one frame and wait for both acknowledgements.
    ///
    /// Only byte slices are accepted; text must be encoded by the caller.
    ///
    /// ```
    /// use ackframe::FramedChannel;
    /// use ackframe::core::{RawTransport, TransportResult};
    ///
    /// struct Sink;
    ///
    /// impl RawTransport for Sink {
    ///     fn raw_open(&mut self) -> TransportResult<()> { Ok(()) }
    ///     fn raw_close(&mut self) -> TransportResult<()> { Ok(()) }
    ///     fn raw_send(&mut self, data: &[u8]) -> TransportResult<usize> { Ok(data.len()) }
    ///     fn raw_receive(&mut self, _max: usize) -> TransportResult<Vec<u8>> { Ok(Vec::new()) }
    /// }
    ///
    /// let mut channel = FramedChannel::new(Sink);
    /// channel.open().unwrap();
    /// // The sink never acknowledges.
    /// assert!(channel.send(b"bytes").is_err());
    /// ```
    ///
    /// ```compile_fail
    /// use ackframe::FramedChannel;
    /// use ackframe::core::{RawTransport, TransportResult};
    ///
    /// struct Sink;
    ///
    /// impl RawTransport for Sink {
    ///     fn raw_open(&mut self) -> TransportResult<()> { Ok(()) }
    ///     fn raw_close(&mut self) -> TransportResult<()> { Ok(()) }
    ///     fn raw_send(&mut self, data: &[u8]) -> TransportResult<usize> { Ok(data.len()) }
    ///     fn raw_receive(&mut self, _max: usize) -> TransportResult<Vec<u8>> { Ok(Vec::new()) }
    /// }
    ///
    /// let mut channel = FramedChannel::new(Sink);
    /// channel.send(42u32);
    /// ```
    pub fn send(&mut self, data: &[u8]) -> ChannelResult<()> {
        self.phase.ensure_ready()?;
        check_frame_size(data.len(), self.config.max_frame_size())?;

        let result = self.send_frame(data);
        self.settle(result)
    }

    /// Receive one frame, acknowledging its length and its payload.
    pub fn receive(&mut self) -> ChannelResult<Vec<u8>> {
        self.phase.ensure_ready()?;
        let result = self.receive_frame();
        self.settle(result)
    }

    /// Current lifecycle state.
    pub fn phase(&self) -> ChannelPhase {
        self.phase
    }

    /// Whether frames may be exchanged.
    pub fn is_open(&self) -> bool {
        self.phase == ChannelPhase::Open
    }

    /// Channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Frame counters.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport.
    ///
    /// Raw I/O through this handle desynchronizes the handshake.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport without closing it.
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn send_frame(&mut self, data: &[u8]) -> ChannelResult<()> {
        let token = self.config.ack_token();

        trace!(len = data.len(), "sending length header");
        write_all(&mut self.transport, &encode_length(data.len()))?;
        expect_ack(&mut self.transport, token, AckPhase::Length)?;

        trace!(len = data.len(), "sending payload");
        write_all(&mut self.transport, data)?;
        expect_ack(&mut self.transport, token, AckPhase::Payload)?;

        self.stats.record_sent(data.len());
        debug!(len = data.len(), "frame sent");
        Ok(())
    }

    fn receive_frame(&mut self) -> ChannelResult<Vec<u8>> {
        let buffer_size = self.config.buffer_size();
        let token = self.config.ack_token();

        let header = read_some(&mut self.transport, buffer_size)?;
        let len = decode_header(&header, self.config.max_frame_size())?;
        trace!(len, "length header received");
        write_all(&mut self.transport, token)?;

        let mut frame = FrameAssembler::new(len);
        while !frame.is_complete() {
            let chunk = read_some(&mut self.transport, frame.next_read_size(buffer_size))?;
            frame.push(&chunk).inspect_err(|e| warn!(%e, "frame overrun"))?;
            trace!(got = chunk.len(), remaining = frame.remaining(), "payload chunk");
        }
        write_all(&mut self.transport, token)?;

        let payload = frame.into_inner();
        self.stats.record_received(payload.len());
        debug!(len = payload.len(), "frame received");
        Ok(payload)
    }

    fn settle<R>(&mut self, result: ChannelResult<R>) -> ChannelResult<R> {
        if let Err(e) = &result {
            debug!(%e, "handshake failed, channel poisoned");
            self.phase = ChannelPhase::Failed;
        }
        result
    }
}

fn write_all<T: RawTransport>(transport: &mut T, mut buf: &[u8]) -> ChannelResult<()> {
    while !buf.is_empty() {
        let written = transport.raw_send(buf)?;
        buf = advance_written(buf, written)?;
    }
    Ok(())
}

fn read_some<T: RawTransport>(transport: &mut T, max_bytes: usize) -> ChannelResult<Vec<u8>> {
    Ok(require_data(transport.raw_receive(max_bytes)?)?)
}

fn expect_ack<T: RawTransport>(transport: &mut T, token: &[u8], phase: AckPhase) -> ChannelResult<()> {
    let mut ack = AckMatcher::new(token, phase);
    while !ack.is_complete() {
        let chunk = read_some(transport, ack.next_read_size())?;
        ack.push(&chunk)?;
    }
    Ok(())
}
