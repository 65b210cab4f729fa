//! NCP Serial Link Protocol
//!
//! This crate implements the outer framing used on the serial (UART or SPI)
//! link between a host and its network co-processor. Every message travels
//! in a frame with a four-byte header:
//!
//! ```text
//! +------+------+--------+--------+-------------------+
//! | '['  | type | len_hi | len_lo | payload[0..len]   |
//! +------+------+--------+--------+-------------------+
//! ```
//!
//! where `type` distinguishes management traffic (command/response exchanges
//! with the NCP) from data traffic, and the big-endian `len` must be
//! nonzero.
//!
//! The receive side ([`FrameCodec`]) reassembles frames from arbitrarily
//! split input chunks. A malformed header is deliberately fatal to the
//! stream: no resynchronization is attempted, and the codec keeps reporting
//! the error until it is explicitly reset. The transmit side
//! ([`FrameSender`]) queues whole frames and drains them through a
//! [`TxSink`] as transmit space becomes available, interleaving header and
//! payload bytes across calls.

mod constants;
mod error;
mod frame;
mod sender;

pub use constants::*;
pub use error::*;
pub use frame::*;
pub use sender::*;
