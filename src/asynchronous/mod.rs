//! Async framing on tokio.
//!
//! [`AsyncFramedChannel`] speaks the same wire format as the blocking
//! [`FramedChannel`](crate::channel::FramedChannel), so the two
//! interoperate across a connection.

mod channel;
mod stream;
mod traits;

pub use channel::AsyncFramedChannel;
pub use stream::{StreamTransport, TokioTcpTransport};
pub use traits::AsyncRawTransport;
