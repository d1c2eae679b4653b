//! Core constants, error types and the transport trait.

pub mod constants;
mod error;
mod traits;

pub use constants::*;
pub use error::*;
pub use traits::RawTransport;
