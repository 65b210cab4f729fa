//! The binary command codec.
//!
//! Over the host/NCP link, commands are not typed text but a 2-byte
//! big-endian identifier followed by packed arguments:
//!
//! ```text
//! +--------+--------+----------------------+
//! | id_hi  | id_lo  | arguments...         |
//! +--------+--------+----------------------+
//! ```
//!
//! Arguments use the same `u`/`s`/`v`/`w`/`b` vocabulary as the text path:
//! integers are fixed-width big-endian fields, and `b` is a one-byte length
//! followed by that many raw bytes. The decoder reuses the interpreter's
//! token machinery, so actions read binary arguments through the same
//! accessors they use for text.

use crate::error::CommandError;
use crate::parser::CommandInterpreter;
use crate::state::{BINARY_BASE, COMMAND_BUFFER_LENGTH};
use crate::table::{self, CommandKind, MAX_TOKEN_COUNT};

/// One packed argument for [`format_binary_command`]. The variant carries
/// the type information the text path's specifier characters carry.
#[derive(Debug, Clone, Copy)]
pub enum BinaryArg<'a> {
    /// One unsigned byte (`u`).
    U8(u8),
    /// One signed byte (`s`).
    I8(i8),
    /// Two bytes, big-endian (`v`).
    U16(u16),
    /// Four bytes, big-endian (`w`).
    U32(u32),
    /// Length-prefixed blob (`b`). With `data: None` the payload is `len`
    /// zero bytes, which saves every caller a null check.
    Blob {
        /// Blob contents; at least `len` bytes when present.
        data: Option<&'a [u8]>,
        /// Number of payload bytes to send.
        len: u8,
    },
}

impl CommandInterpreter {
    /// Decode and dispatch one binary command. The payload must fit the
    /// command buffer; that is the caller's contract, not a wire condition.
    ///
    /// Returns true if the command dispatched without error. On any failure
    /// the sticky error is reported through the error handler before
    /// returning.
    pub fn process_binary_command(&mut self, input: &[u8]) -> bool {
        assert!(
            input.len() <= COMMAND_BUFFER_LENGTH,
            "binary command exceeds the command buffer"
        );

        self.state.reinit();
        self.state.default_base = BINARY_BASE;
        self.state.buffer[..input.len()].copy_from_slice(input);

        if input.len() < 2 {
            self.state.record_error(CommandError::ArgumentSyntaxError);
            return self.finish_binary_command();
        }

        let identifier = u16::from_be_bytes([input[0], input[1]]);
        let entry = match table::lookup_identifier(self.table, identifier) {
            Some(entry) => entry,
            None => {
                log::debug!("unknown binary command 0x{identifier:04X}");
                self.state.record_error(CommandError::NoSuchCommand);
                return self.finish_binary_command();
            }
        };

        self.state.current_command = Some(entry);
        let (argument_types, action) = match entry.kind {
            CommandKind::Action {
                argument_types,
                action,
            } => (argument_types.as_bytes(), action),
            CommandKind::Group { .. } => unreachable!("binary tables are flat"),
        };

        // Walk the declared argument types, recording a token per field.
        let mut finger = 2;
        for &spec in argument_types {
            if self.state.token_count == MAX_TOKEN_COUNT {
                self.state.record_error(CommandError::WrongNumberOfArguments);
                break;
            }
            if finger >= input.len() {
                // Ran out of payload with arguments still expected.
                self.state.record_error(CommandError::ArgumentSyntaxError);
                break;
            }

            self.state.token_indices[self.state.token_count] = finger;

            match spec {
                b'u' | b's' => finger += 1,
                b'v' => finger += 2,
                b'w' => finger += 4,
                b'b' => finger += 1 + usize::from(input[finger]),
                _ => {
                    self.state.record_error(CommandError::ArgumentSyntaxError);
                    break;
                }
            }

            if finger > input.len() {
                // The declared field runs past the end of the payload.
                self.state.record_error(CommandError::ArgumentSyntaxError);
                break;
            }

            self.state.token_count += 1;
            self.state.token_indices[self.state.token_count] = finger;
        }

        if self.state.error.is_none() {
            action(self);
        }

        self.finish_binary_command()
    }

    /// Surface any sticky error through the handler, once, at end of frame.
    fn finish_binary_command(&mut self) -> bool {
        match self.state.error {
            Some(error) => {
                let entry = self.state.current_command;
                (self.error_handler)(error, entry);
                false
            }
            None => true,
        }
    }
}

/// Serialize `identifier` plus `arguments` into `buffer`, returning the
/// encoded length. Overflowing the buffer is a programmer error and panics;
/// size the buffer for the command being built.
pub fn format_binary_command(buffer: &mut [u8], identifier: u16, arguments: &[BinaryArg<'_>]) -> usize {
    buffer.fill(0);

    let mut finger = 0;
    put(buffer, &mut finger, &identifier.to_be_bytes());

    for argument in arguments {
        match *argument {
            BinaryArg::U8(value) => put(buffer, &mut finger, &[value]),
            BinaryArg::I8(value) => put(buffer, &mut finger, &[value as u8]),
            BinaryArg::U16(value) => put(buffer, &mut finger, &value.to_be_bytes()),
            BinaryArg::U32(value) => put(buffer, &mut finger, &value.to_be_bytes()),
            BinaryArg::Blob { data, len } => {
                put(buffer, &mut finger, &[len]);
                match data {
                    Some(data) => {
                        assert!(
                            data.len() >= usize::from(len),
                            "blob data shorter than its declared length"
                        );
                        put(buffer, &mut finger, &data[..usize::from(len)]);
                    }
                    None => {
                        // Zero fill; the buffer is already cleared.
                        finger += usize::from(len);
                        assert!(finger <= buffer.len(), "binary command overflows the buffer");
                    }
                }
            }
        }
    }

    finger
}

fn put(buffer: &mut [u8], finger: &mut usize, bytes: &[u8]) {
    assert!(
        *finger + bytes.len() <= buffer.len(),
        "binary command overflows the buffer"
    );
    buffer[*finger..*finger + bytes.len()].copy_from_slice(bytes);
    *finger += bytes.len();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CommandEntry;
    use std::cell::RefCell;

    thread_local! {
        static CALLS: RefCell<Vec<String>> = RefCell::new(Vec::new());
        static ERRORS: RefCell<Vec<CommandError>> = RefCell::new(Vec::new());
    }

    fn record(call: String) {
        CALLS.with(|calls| calls.borrow_mut().push(call));
    }

    fn take_calls() -> Vec<String> {
        CALLS.with(|calls| calls.borrow_mut().drain(..).collect())
    }

    fn take_errors() -> Vec<CommandError> {
        ERRORS.with(|errors| errors.borrow_mut().drain(..).collect())
    }

    fn mixed_action(interp: &mut CommandInterpreter) {
        let a = interp.unsigned_argument(0);
        let b = interp.unsigned_argument(1);
        let c = interp.unsigned_argument(2);
        let d = hex::encode(interp.string_argument(3));
        record(format!("mixed {a} {b} {c} [{d}]"));
    }

    fn signed_action(interp: &mut CommandInterpreter) {
        record(format!(
            "signed {} {}",
            interp.signed_argument(0),
            interp.signed_argument(1)
        ));
    }

    fn empty_action(interp: &mut CommandInterpreter) {
        record(format!("empty n={}", interp.argument_count()));
    }

    const MIXED_ID: u16 = 0x0110;
    const SIGNED_ID: u16 = 0x0111;
    const EMPTY_ID: u16 = 0x0112;

    static TABLE: &[CommandEntry] = &[
        CommandEntry::binary(MIXED_ID, "uvwb", mixed_action, "u, v, w, blob"),
        CommandEntry::binary(SIGNED_ID, "sv", signed_action, "signed pair"),
        CommandEntry::binary(EMPTY_ID, "", empty_action, "no arguments"),
    ];

    fn interpreter() -> CommandInterpreter {
        take_calls();
        take_errors();
        let mut interp = CommandInterpreter::new(TABLE);
        interp.set_error_handler(Box::new(|error, _entry| {
            ERRORS.with(|errors| errors.borrow_mut().push(error));
        }));
        interp
    }

    #[test]
    fn test_encode_then_decode() {
        let mut buffer = [0u8; 64];
        let length = format_binary_command(
            &mut buffer,
            MIXED_ID,
            &[
                BinaryArg::U8(0xAB),
                BinaryArg::U16(0x1234),
                BinaryArg::U32(0xDEADBEEF),
                BinaryArg::Blob {
                    data: Some(&[1, 2, 3]),
                    len: 3,
                },
            ],
        );
        assert_eq!(length, 2 + 1 + 2 + 4 + 1 + 3);
        assert_eq!(&buffer[..4], &[0x01, 0x10, 0xAB, 0x12]);

        let mut interp = interpreter();
        assert!(interp.process_binary_command(&buffer[..length]));
        assert_eq!(
            take_calls(),
            vec![format!("mixed {} {} {} [010203]", 0xAB, 0x1234, 0xDEADBEEFu32)]
        );
        assert!(take_errors().is_empty());
    }

    #[test]
    fn test_signed_fields_sign_extend() {
        let mut buffer = [0u8; 16];
        let length = format_binary_command(
            &mut buffer,
            SIGNED_ID,
            &[BinaryArg::I8(-3), BinaryArg::U16(0xFFFE)],
        );

        let mut interp = interpreter();
        assert!(interp.process_binary_command(&buffer[..length]));
        assert_eq!(take_calls(), vec!["signed -3 -2"]);
    }

    #[test]
    fn test_no_argument_command() {
        let mut interp = interpreter();
        assert!(interp.process_binary_command(&EMPTY_ID.to_be_bytes()));
        assert_eq!(take_calls(), vec!["empty n=0"]);
    }

    #[test]
    fn test_unknown_identifier() {
        let mut interp = interpreter();
        assert!(!interp.process_binary_command(&[0x7F, 0x7F, 1, 2, 3]));
        assert_eq!(take_errors(), vec![CommandError::NoSuchCommand]);
        assert!(take_calls().is_empty());
    }

    #[test]
    fn test_truncated_payload() {
        // The u16 field is cut short.
        let mut interp = interpreter();
        assert!(!interp.process_binary_command(&[0x01, 0x11, 0x05, 0x00]));
        assert_eq!(take_errors(), vec![CommandError::ArgumentSyntaxError]);
        assert!(take_calls().is_empty());
    }

    #[test]
    fn test_blob_length_overruns_payload() {
        let mut buffer = [0u8; 32];
        let length = format_binary_command(
            &mut buffer,
            MIXED_ID,
            &[
                BinaryArg::U8(1),
                BinaryArg::U16(2),
                BinaryArg::U32(3),
                BinaryArg::Blob {
                    data: Some(&[9, 9]),
                    len: 2,
                },
            ],
        );
        // Corrupt the blob length prefix to point past the end.
        buffer[length - 3] = 200;

        let mut interp = interpreter();
        assert!(!interp.process_binary_command(&buffer[..length]));
        assert_eq!(take_errors(), vec![CommandError::ArgumentSyntaxError]);
    }

    #[test]
    fn test_short_frame() {
        let mut interp = interpreter();
        assert!(!interp.process_binary_command(&[0x01]));
        assert_eq!(take_errors(), vec![CommandError::ArgumentSyntaxError]);
    }

    #[test]
    fn test_null_blob_is_zero_filled() {
        let mut buffer = [0u8; 16];
        let length =
            format_binary_command(&mut buffer, 0x0001, &[BinaryArg::Blob { data: None, len: 4 }]);
        assert_eq!(length, 2 + 1 + 4);
        assert_eq!(&buffer[..length], &[0x00, 0x01, 4, 0, 0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "overflows the buffer")]
    fn test_encode_overflow_panics() {
        let mut buffer = [0u8; 4];
        format_binary_command(&mut buffer, 0x0001, &[BinaryArg::U32(1)]);
    }
}
