//! NCP Host Link
//!
//! This crate wires the serial-link framing layer to the binary command
//! interpreter, giving a host application one object to drive for its
//! management connection to the NCP:
//!
//! - Bytes read from the transport go into [`NcpLink::receive`], which
//!   reassembles frames, checks the management sub-type, and dispatches
//!   each management command into the application's callback command table.
//! - Outgoing management commands are built with the packed binary encoding
//!   and queued on the link's [`FrameSender`], which drains to the
//!   transport as it reports space.
//!
//! The framing layer treats header corruption as fatal: [`NcpLink::receive`]
//! keeps returning the same [`LinkError`] until [`NcpLink::reset`] discards
//! the connection state, mirroring how the surrounding application treats a
//! framing error as fatal to the connection.
//!
//! [`FrameSender`]: ncp_serial_protocol::FrameSender

mod commands;
mod link;

pub use commands::*;
pub use link::*;
