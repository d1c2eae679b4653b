//! Async framed channel.

use tracing::{debug, trace, warn};

use super::traits::AsyncRawTransport;
use crate::channel::wire::{
    AckMatcher, AckPhase, FrameAssembler, advance_written, check_frame_size, decode_header,
    encode_length, require_data,
};
use crate::channel::{ChannelConfig, ChannelPhase, FrameStats};
use crate::core::ChannelResult;

/// Handshake-framed message channel over an [`AsyncRawTransport`].
///
/// Async twin of [`FramedChannel`](crate::channel::FramedChannel): same
/// wire format, lifecycle and errors. The handshake suspends at every
/// transport call; dropping a `send` or `receive` future mid-way leaves
/// the peer out of step, so treat cancellation like any other failure
/// and reopen.
#[derive(Debug)]
pub struct AsyncFramedChannel<T> {
    transport: T,
    config: ChannelConfig,
    phase: ChannelPhase,
    stats: FrameStats,
}

impl<T: AsyncRawTransport> AsyncFramedChannel<T> {
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
    pub async fn open(&mut self) -> ChannelResult<()> {
        self.phase.ensure_openable()?;
        self.transport.raw_open().await?;
        self.phase = ChannelPhase::Open;
        debug!("channel opened");
        Ok(())
    }

    /// Release the underlying transport. Closing a closed channel does nothing.
    pub async fn close(&mut self) -> ChannelResult<()> {
        if !self.phase.holds_transport() {
            return Ok(());
        }
        self.phase = ChannelPhase::Closed;
        self.transport.raw_close().await?;
        debug!("channel closed");
        Ok(())
    }

    /// Send one frame and wait for both acknowledgements.
    pub async fn send(&mut self, data: &[u8]) -> ChannelResult<()> {
        self.phase.ensure_ready()?;
        check_frame_size(data.len(), self.config.max_frame_size())?;

        // Poison first so a cancelled future leaves the channel failed.
        self.phase = ChannelPhase::Failed;
        self.send_frame(data).await?;
        self.phase = ChannelPhase::Open;
        Ok(())
    }

    /// Receive one frame, acknowledging its length and its payload.
    pub async fn receive(&mut self) -> ChannelResult<Vec<u8>> {
        self.phase.ensure_ready()?;

        self.phase = ChannelPhase::Failed;
        let payload = self.receive_frame().await?;
        self.phase = ChannelPhase::Open;
        Ok(payload)
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
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport without closing it.
    pub fn into_inner(self) -> T {
        self.transport
    }

    async fn send_frame(&mut self, data: &[u8]) -> ChannelResult<()> {
        let token = self.config.ack_token();

        trace!(len = data.len(), "sending length header");
        write_all(&mut self.transport, &encode_length(data.len())).await?;
        expect_ack(&mut self.transport, token, AckPhase::Length).await?;

        trace!(len = data.len(), "sending payload");
        write_all(&mut self.transport, data).await?;
        expect_ack(&mut self.transport, token, AckPhase::Payload).await?;

        self.stats.record_sent(data.len());
        debug!(len = data.len(), "frame sent");
        Ok(())
    }

    async fn receive_frame(&mut self) -> ChannelResult<Vec<u8>> {
        let buffer_size = self.config.buffer_size();
        let token = self.config.ack_token();

        let header = read_some(&mut self.transport, buffer_size).await?;
        let len = decode_header(&header, self.config.max_frame_size())?;
        trace!(len, "length header received");
        write_all(&mut self.transport, token).await?;

        let mut frame = FrameAssembler::new(len);
        while !frame.is_complete() {
            let chunk = read_some(&mut self.transport, frame.next_read_size(buffer_size)).await?;
            frame.push(&chunk).inspect_err(|e| warn!(%e, "frame overrun"))?;
            trace!(got = chunk.len(), remaining = frame.remaining(), "payload chunk");
        }
        write_all(&mut self.transport, token).await?;

        let payload = frame.into_inner();
        self.stats.record_received(payload.len());
        debug!(len = payload.len(), "frame received");
        Ok(payload)
    }
}

async fn write_all<T: AsyncRawTransport>(transport: &mut T, mut buf: &[u8]) -> ChannelResult<()> {
    while !buf.is_empty() {
        let written = transport.raw_send(buf).await?;
        buf = advance_written(buf, written)?;
    }
    Ok(())
}

async fn read_some<T: AsyncRawTransport>(transport: &mut T, max_bytes: usize) -> ChannelResult<Vec<u8>> {
    Ok(require_data(transport.raw_receive(max_bytes).await?)?)
}

async fn expect_ack<T: AsyncRawTransport>(
    transport: &mut T,
    token: &[u8],
    phase: AckPhase,
) -> ChannelResult<()> {
    let mut ack = AckMatcher::new(token, phase);
    while !ack.is_complete() {
        let chunk = read_some(transport, ack.next_read_size()).await?;
        ack.push(&chunk)?;
    }
    Ok(())
}
