//! Bundled blocking transports.
//!
//! - [`MemoryTransport`]: connected in-memory ends, with partial-I/O knobs
//! - [`TcpTransport`]: `std::net::TcpStream`, honoring the receive timeout
//!
//! Anything else (serial lines, pipes, ...) plugs in by implementing
//! [`RawTransport`](crate::core::RawTransport).

mod memory;
mod tcp;

pub use memory::{MemoryOptions, MemoryTransport};
pub use tcp::TcpTransport;
