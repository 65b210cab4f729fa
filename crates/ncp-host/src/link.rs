//! The host end of the NCP serial link.

use thiserror::Error;

use ncp_command_interpreter::{
    BinaryArg, CommandEntry, CommandInterpreter, ErrorHandler, COMMAND_BUFFER_LENGTH,
};
use ncp_serial_protocol::{
    Frame, FrameCodec, FrameError, FrameSender, ManagementType, MessageType, TxSink,
};

use crate::commands::management_command_payload;

/// Errors surfaced by [`NcpLink::receive`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Header-level framing violation; fatal to the stream until
    /// [`NcpLink::reset`].
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    /// A management frame whose first payload byte was not the command
    /// sub-type. The frame is dropped; the stream continues.
    #[error("management frame does not carry a command (sub-type 0x{0:02X})")]
    UnexpectedManagementType(u8),

    /// A management command larger than the interpreter's buffer. The frame
    /// is dropped; the stream continues.
    #[error("management command of {0} bytes exceeds the command buffer")]
    ManagementTooLong(usize),
}

/// Handler for non-management (data-plane) payloads.
pub type DataHandler = Box<dyn FnMut(&[u8])>;

/// One host/NCP connection: receive reassembly, the binary management
/// interpreter it dispatches into, and the outgoing frame queue.
pub struct NcpLink {
    codec: FrameCodec,
    sender: FrameSender,
    interpreter: CommandInterpreter,
    data_handler: Option<DataHandler>,
}

impl NcpLink {
    /// Create a link dispatching management commands into `table`.
    pub fn new(table: &'static [CommandEntry]) -> Self {
        NcpLink {
            codec: FrameCodec::new(),
            sender: FrameSender::new(),
            interpreter: CommandInterpreter::new(table),
            data_handler: None,
        }
    }

    /// Install a handler for non-management payloads. Without one they are
    /// logged and dropped.
    pub fn set_data_handler(&mut self, handler: DataHandler) {
        self.data_handler = Some(handler);
    }

    /// Replace the interpreter's command error handler.
    pub fn set_command_error_handler(&mut self, handler: ErrorHandler) {
        self.interpreter.set_error_handler(handler);
    }

    /// Feed bytes read from the transport. Complete frames are dispatched
    /// as they form; the return value is how many were dispatched from this
    /// chunk (a chunk may complete zero, one, or several frames).
    pub fn receive(&mut self, data: &[u8]) -> Result<usize, LinkError> {
        self.codec.push(data);

        let mut dispatched = 0;
        loop {
            match self.codec.decode() {
                Ok(Some(frame)) => {
                    self.handle_frame(frame)?;
                    dispatched += 1;
                }
                Ok(None) => return Ok(dispatched),
                Err(error) => {
                    log::warn!("serial link framing error: {error}");
                    return Err(error.into());
                }
            }
        }
    }

    fn handle_frame(&mut self, frame: Frame) -> Result<(), LinkError> {
        match frame.message_type {
            MessageType::Management => {
                let sub_type = frame.payload[0];
                if ManagementType::from_byte(sub_type) != Some(ManagementType::Command) {
                    return Err(LinkError::UnexpectedManagementType(sub_type));
                }
                let command = &frame.payload[1..];
                if command.len() > COMMAND_BUFFER_LENGTH {
                    return Err(LinkError::ManagementTooLong(command.len()));
                }
                self.interpreter.process_binary_command(command);
                Ok(())
            }
            MessageType::NonManagement => {
                match self.data_handler.as_mut() {
                    Some(handler) => handler(&frame.payload),
                    None => log::debug!("dropping {} data bytes", frame.payload.len()),
                }
                Ok(())
            }
        }
    }

    /// Queue a management command for the NCP.
    pub fn send_management_command(&mut self, identifier: u16, arguments: &[BinaryArg<'_>]) {
        let payload = management_command_payload(identifier, arguments);
        self.sender.send(MessageType::Management, payload);
    }

    /// Queue a data-plane payload.
    pub fn send_data(&mut self, payload: Vec<u8>) {
        self.sender.send(MessageType::NonManagement, payload);
    }

    /// Drain queued frames into the transport while it has space.
    pub fn load_tx(&mut self, sink: &mut dyn TxSink) {
        self.sender.load_tx(sink);
    }

    /// Number of frames waiting to be transmitted.
    pub fn queued_tx(&self) -> usize {
        self.sender.queued()
    }

    /// Discard all connection state: receive reassembly (including a jammed
    /// header), the transmit queue, and the interpreter's parse state.
    pub fn reset(&mut self) {
        self.codec.reset();
        self.sender.reset();
        self.interpreter.reset();
    }
}
