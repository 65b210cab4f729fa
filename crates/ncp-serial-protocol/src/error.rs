//! Framing error types.

use thiserror::Error;

/// A malformed frame header. These are fatal to the receive stream: the
/// offending bytes stay in place, every further decode attempt reports the
/// same error, and only an explicit reset lets the stream make progress
/// again. No resynchronization is attempted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The first header byte was not `[`.
    #[error("bad frame magic: expected '[', got 0x{0:02X}")]
    BadMagic(u8),

    /// The type byte named no known message type.
    #[error("unknown frame message type 0x{0:02X}")]
    BadMessageType(u8),

    /// The header declared a zero-length payload.
    #[error("frame declares a zero-length payload")]
    ZeroLength,
}
