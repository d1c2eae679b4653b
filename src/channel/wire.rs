//! Wire helpers shared by the blocking and async channels.
//!
//! ```text
//! sender                         receiver
//!   | -- "5" -------------------->  |   length header (decimal ASCII)
//!   | <------------- ACKNOWLEDGE -- |
//!   | -- b"hello" --------------->  |   payload (raw bytes)
//!   | <------------- ACKNOWLEDGE -- |
//! ```

use tracing::{trace, warn};

use crate::core::{LENGTH_RADIX, ProtocolError, TransportError};

/// Upper bound on the capacity reserved up front for an incoming frame.
///
/// Larger frames grow the buffer as bytes arrive, so a bogus header cannot
/// force a huge allocation by itself.
const PREALLOC_LIMIT: usize = 64 * 1024;

/// Encode a payload length as a decimal ASCII header.
pub fn encode_length(len: usize) -> Vec<u8> {
    len.to_string().into_bytes()
}

/// Parse a decimal ASCII length header.
///
/// Surrounding ASCII whitespace is tolerated. Signs, separators and
/// values that overflow `usize` are rejected.
pub fn parse_length(header: &[u8]) -> Result<usize, ProtocolError> {
    let invalid = || ProtocolError::InvalidLength {
        header: header.to_vec(),
    };

    let digits = header.trim_ascii();
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }

    // All bytes are ASCII digits, so this is valid UTF-8.
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| usize::from_str_radix(s, LENGTH_RADIX).ok())
        .ok_or_else(invalid)
}

/// Parse a received length header and check it against `max`.
pub fn decode_header(header: &[u8], max: Option<usize>) -> Result<usize, ProtocolError> {
    let len = parse_length(header).inspect_err(|_| {
        warn!(header = %String::from_utf8_lossy(header), "invalid length header");
    })?;
    check_frame_size(len, max).inspect_err(|_| warn!(len, ?max, "declared frame too large"))?;
    Ok(len)
}

/// Reject a frame of `len` bytes when it exceeds `max`.
pub fn check_frame_size(len: usize, max: Option<usize>) -> Result<(), ProtocolError> {
    match max {
        Some(max) if len > max => Err(ProtocolError::FrameTooLarge { len, max }),
        _ => Ok(()),
    }
}

/// Bytes of `buf` still unwritten after a raw send reported `written`.
///
/// A send that accepts nothing is [`TransportError::WriteZero`]; a count
/// above `buf.len()` is clamped.
pub fn advance_written(buf: &[u8], written: usize) -> Result<&[u8], TransportError> {
    if written == 0 && !buf.is_empty() {
        return Err(TransportError::WriteZero);
    }
    let written = written.min(buf.len());
    if written < buf.len() {
        trace!(written, left = buf.len() - written, "partial write");
    }
    Ok(&buf[written..])
}

/// Treat an empty raw read as a closed peer.
pub fn require_data(chunk: Vec<u8>) -> Result<Vec<u8>, TransportError> {
    if chunk.is_empty() {
        return Err(TransportError::ConnectionClosed);
    }
    Ok(chunk)
}

/// Which acknowledgement a side is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckPhase {
    /// After the length header.
    Length,
    /// After the payload.
    Payload,
}

impl AckPhase {
    /// Error for a token mismatch in this phase.
    pub fn mismatch(self, received: Vec<u8>) -> ProtocolError {
        match self {
            AckPhase::Length => ProtocolError::LengthNotAcknowledged { received },
            AckPhase::Payload => ProtocolError::PayloadNotAcknowledged { received },
        }
    }
}

/// Matches incoming bytes against the acknowledgement token.
///
/// Fails as soon as the bytes read so far stop being a prefix of the
/// token, so a peer answering with a shorter reply cannot stall the
/// caller.
#[derive(Debug)]
pub struct AckMatcher<'a> {
    token: &'a [u8],
    phase: AckPhase,
    ack: FrameAssembler,
}

impl<'a> AckMatcher<'a> {
    /// Start waiting for `token` in `phase`.
    pub fn new(token: &'a [u8], phase: AckPhase) -> Self {
        Self {
            token,
            phase,
            ack: FrameAssembler::new(token.len()),
        }
    }

    /// Whether the whole token has arrived.
    pub fn is_complete(&self) -> bool {
        self.ack.is_complete()
    }

    /// Size of the next read: never more than the missing token bytes.
    pub fn next_read_size(&self) -> usize {
        self.ack.remaining()
    }

    /// Check a chunk returned by a raw read.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), ProtocolError> {
        let received = self.ack.expected() - self.ack.remaining();
        if self.token[received..].starts_with(chunk) && self.ack.push(chunk).is_ok() {
            if self.is_complete() {
                trace!(phase = ?self.phase, "acknowledged");
            }
            return Ok(());
        }

        let mut got = self.token[..received].to_vec();
        got.extend_from_slice(chunk);
        warn!(phase = ?self.phase, received = %String::from_utf8_lossy(&got), "acknowledgement mismatch");
        Err(self.phase.mismatch(got))
    }
}

/// Accumulates exactly `expected` bytes from successive reads.
///
/// Used for payloads and for acknowledgement tokens. A read that would
/// push the total past `expected` is a framing error: the channel never
/// pipelines, so surplus bytes cannot belong to anything.
#[derive(Debug)]
pub struct FrameAssembler {
    expected: usize,
    buf: Vec<u8>,
}

impl FrameAssembler {
    /// Start assembling a frame of `expected` bytes.
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            buf: Vec::with_capacity(expected.min(PREALLOC_LIMIT)),
        }
    }

    /// Declared frame length.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Bytes still missing.
    pub fn remaining(&self) -> usize {
        self.expected - self.buf.len()
    }

    /// Whether all bytes have arrived.
    pub fn is_complete(&self) -> bool {
        self.buf.len() == self.expected
    }

    /// Size of the next read: the missing byte count capped at `buffer_size`.
    pub fn next_read_size(&self, buffer_size: usize) -> usize {
        self.remaining().min(buffer_size)
    }

    /// Append a chunk returned by a raw read.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), ProtocolError> {
        if chunk.len() > self.remaining() {
            return Err(ProtocolError::Overrun {
                expected: self.expected,
                received: self.buf.len() + chunk.len(),
            });
        }
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    /// Take the accumulated bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_length() {
        assert_eq!(encode_length(0), b"0");
        assert_eq!(encode_length(5), b"5");
        assert_eq!(encode_length(4096), b"4096");
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length(b"0"), Ok(0));
        assert_eq!(parse_length(b"10"), Ok(10));
        assert_eq!(parse_length(b"007"), Ok(7));
        assert_eq!(parse_length(b" 42\r\n"), Ok(42));
    }

    #[test]
    fn test_parse_length_rejects() {
        for header in [
            &b"abc"[..],
            b"",
            b"   ",
            b"-1",
            b"+1",
            b"1_0",
            b"1 0",
            b"12a",
            b"99999999999999999999999999",
        ] {
            assert_eq!(
                parse_length(header),
                Err(ProtocolError::InvalidLength {
                    header: header.to_vec()
                }),
                "header {:?}",
                String::from_utf8_lossy(header)
            );
        }
    }

    #[test]
    fn test_ack_phase_mismatch() {
        assert_eq!(
            AckPhase::Length.mismatch(b"x".to_vec()).to_string(),
            "length not acknowledged"
        );
        assert_eq!(
            AckPhase::Payload.mismatch(b"x".to_vec()).to_string(),
            "payload not acknowledged"
        );
    }

    #[test]
    fn test_decode_header() {
        assert_eq!(decode_header(b"10", None), Ok(10));
        assert_eq!(decode_header(b"10", Some(10)), Ok(10));
        assert_eq!(
            decode_header(b"11", Some(10)),
            Err(ProtocolError::FrameTooLarge { len: 11, max: 10 })
        );
        assert_eq!(
            decode_header(b"x", Some(10)),
            Err(ProtocolError::InvalidLength {
                header: b"x".to_vec()
            })
        );
    }

    #[test]
    fn test_check_frame_size() {
        assert_eq!(check_frame_size(usize::MAX, None), Ok(()));
        assert_eq!(check_frame_size(0, Some(0)), Ok(()));
        assert_eq!(
            check_frame_size(5, Some(4)),
            Err(ProtocolError::FrameTooLarge { len: 5, max: 4 })
        );
    }

    #[test]
    fn test_advance_written() {
        let buf = b"0123456789";
        assert_eq!(advance_written(buf, 3).unwrap(), b"3456789");
        assert!(advance_written(buf, 10).unwrap().is_empty());
        // Over-reporting transports are clamped.
        assert!(advance_written(buf, 99).unwrap().is_empty());
        assert!(matches!(
            advance_written(buf, 0),
            Err(TransportError::WriteZero)
        ));
        assert!(advance_written(b"", 0).unwrap().is_empty());
    }

    #[test]
    fn test_require_data() {
        assert_eq!(require_data(b"x".to_vec()).unwrap(), b"x");
        assert!(matches!(
            require_data(Vec::new()),
            Err(TransportError::ConnectionClosed)
        ));
    }

    #[test]
    fn test_ack_matcher_split_token() {
        let mut ack = AckMatcher::new(b"ACKNOWLEDGE", AckPhase::Length);
        assert_eq!(ack.next_read_size(), 11);

        ack.push(b"ACK").unwrap();
        assert_eq!(ack.next_read_size(), 8);
        ack.push(b"NOWLEDGE").unwrap();
        assert!(ack.is_complete());
    }

    #[test]
    fn test_ack_matcher_fails_on_first_wrong_byte() {
        let mut ack = AckMatcher::new(b"ACKNOWLEDGE", AckPhase::Payload);
        ack.push(b"ACK").unwrap();

        assert_eq!(
            ack.push(b"X"),
            Err(ProtocolError::PayloadNotAcknowledged {
                received: b"ACKX".to_vec()
            })
        );
    }

    #[test]
    fn test_ack_matcher_rejects_surplus() {
        let mut ack = AckMatcher::new(b"OK", AckPhase::Length);

        assert_eq!(
            ack.push(b"OKAY"),
            Err(ProtocolError::LengthNotAcknowledged {
                received: b"OKAY".to_vec()
            })
        );
    }

    #[test]
    fn test_assembler_accumulates() {
        let mut asm = FrameAssembler::new(5);
        assert_eq!(asm.next_read_size(2), 2);

        asm.push(b"he").unwrap();
        asm.push(b"ll").unwrap();
        assert!(!asm.is_complete());
        assert_eq!(asm.remaining(), 1);
        assert_eq!(asm.next_read_size(4096), 1);

        asm.push(b"o").unwrap();
        assert!(asm.is_complete());
        assert_eq!(asm.into_inner(), b"hello");
    }

    #[test]
    fn test_assembler_empty_frame() {
        let asm = FrameAssembler::new(0);
        assert!(asm.is_complete());
        assert_eq!(asm.next_read_size(4096), 0);
        assert!(asm.into_inner().is_empty());
    }

    #[test]
    fn test_assembler_overrun() {
        let mut asm = FrameAssembler::new(3);
        asm.push(b"ab").unwrap();
        assert_eq!(
            asm.push(b"cd"),
            Err(ProtocolError::Overrun {
                expected: 3,
                received: 4
            })
        );
    }
}
