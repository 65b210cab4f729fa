//! Building outgoing management commands.

use ncp_command_interpreter::{format_binary_command, BinaryArg, COMMAND_BUFFER_LENGTH};
use ncp_serial_protocol::{FrameCodec, ManagementType, MessageType};

/// Build the management payload for a command: the [`ManagementType::Command`]
/// sub-type byte followed by the packed identifier and arguments.
pub fn management_command_payload(identifier: u16, arguments: &[BinaryArg<'_>]) -> Vec<u8> {
    let mut body = [0u8; COMMAND_BUFFER_LENGTH];
    let length = format_binary_command(&mut body, identifier, arguments);

    let mut payload = Vec::with_capacity(1 + length);
    payload.push(ManagementType::Command as u8);
    payload.extend_from_slice(&body[..length]);
    payload
}

/// Build the complete on-the-wire frame for a management command.
pub fn management_command_frame(identifier: u16, arguments: &[BinaryArg<'_>]) -> Vec<u8> {
    FrameCodec::encode(
        MessageType::Management,
        &management_command_payload(identifier, arguments),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let frame = management_command_frame(
            0x0102,
            &[BinaryArg::U8(0xAA), BinaryArg::U16(0xBBCC)],
        );
        assert_eq!(
            frame,
            vec![
                b'[', // magic
                1,    // MessageType::Management
                0, 6, // payload length: subtype + identifier + u8 + u16
                1,    // ManagementType::Command
                0x01, 0x02, // identifier
                0xAA, // u8
                0xBB, 0xCC, // u16
            ]
        );
    }
}
