//! The text-mode command parser and dispatcher.
//!
//! Input arrives either as a ready-made byte slice or pulled byte-by-byte
//! from a [`ByteSource`]. The parser splits a line into tokens in a fixed
//! working buffer, then matches the leading token(s) against the command
//! table, validates the remaining tokens against the matched entry's
//! argument-type specifier, and invokes the action. Errors are recorded on
//! the state (first one wins) and reported through the error handler exactly
//! once, when the end of the line is reached.

use thiserror::Error;

use crate::error::{default_error_handler, CommandError, ErrorHandler};
use crate::state::{CommandState, ParseState, COMMAND_BUFFER_LENGTH, DEFAULT_BASE};
use crate::table::{self, CommandEntry, CommandKind, MAX_TOKEN_COUNT};

/// The byte source failed in a way that is not just "nothing queued yet".
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("serial port read failed")]
pub struct PortError;

/// Non-blocking byte source driving [`CommandInterpreter::process_port`].
///
/// `Ok(Some(byte))` delivers a byte, `Ok(None)` means nothing is queued
/// right now (the caller re-invokes later), and `Err` abandons the current
/// line with a [`CommandError::PortProblem`].
pub trait ByteSource {
    fn read_byte(&mut self) -> Result<Option<u8>, PortError>;
}

/// A command interpreter instance: one table, one parser state, one error
/// handler. Independent input streams (say, an interactive CLI and a binary
/// management channel) each get their own instance; the tables may be
/// shared.
pub struct CommandInterpreter {
    pub(crate) table: &'static [CommandEntry],
    pub(crate) state: CommandState,
    pub(crate) error_handler: ErrorHandler,
}

impl CommandInterpreter {
    /// Create an interpreter over `table` with the default (logging) error
    /// handler.
    pub fn new(table: &'static [CommandEntry]) -> Self {
        CommandInterpreter {
            table,
            state: CommandState::new(),
            error_handler: Box::new(default_error_handler),
        }
    }

    /// Replace the error handler.
    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.error_handler = handler;
    }

    /// Reset all parser state, including the fields that normally survive
    /// from line to line.
    pub fn reset(&mut self) {
        self.state.default_base = DEFAULT_BASE;
        self.state.previous_character = 0;
        self.state.reinit();
    }

    /// Zero the working buffer. Useful for applications that hand argument
    /// pointers to code expecting NUL-terminated data.
    pub fn clear_buffer(&mut self) {
        self.state.buffer.fill(0);
    }

    /// Override the default base used for text integer arguments.
    /// Compatibility hook; new code should leave this alone.
    pub fn set_default_base(&mut self, base: u8) {
        self.state.default_base = base;
    }

    /// Process a chunk of text input. Returns true if the chunk ended with
    /// an end-of-line character, which is the caller's cue to print a
    /// prompt.
    pub fn process_input(&mut self, input: &[u8]) -> bool {
        let mut saw_eol = false;
        for &byte in input {
            if let Some(is_eol) = self.process_byte(byte) {
                saw_eol = is_eol;
            }
        }
        saw_eol
    }

    /// Pull bytes from `port` until it runs dry. Returns true if the last
    /// byte consumed was an end-of-line character.
    pub fn process_port(&mut self, port: &mut dyn ByteSource) -> bool {
        let mut saw_eol = false;
        loop {
            let byte = match port.read_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => return saw_eol,
                Err(_) => {
                    self.state.record_error(CommandError::PortProblem);
                    self.state.state = ParseState::ReadingToEol;
                    return saw_eol;
                }
            };
            if let Some(is_eol) = self.process_byte(byte) {
                saw_eol = is_eol;
            }
        }
    }

    /// Feed one byte through the state machine. Returns `None` when the
    /// byte was an LF swallowed as the tail of a CRLF pair, otherwise
    /// `Some(is_eol)` for the byte just consumed.
    fn process_byte(&mut self, byte: u8) -> Option<bool> {
        if self.state.previous_character == b'\r' && byte == b'\n' {
            self.state.previous_character = byte;
            return None;
        }
        self.state.previous_character = byte;

        let is_eol = byte == b'\r' || byte == b'\n';
        let is_space = byte == b' ';

        match self.state.state {
            ParseState::AwaitingArgument => {
                if is_eol {
                    self.end_of_line(byte, true);
                } else if !is_space {
                    self.state.state = match byte {
                        b'"' => ParseState::ReadingString,
                        b'{' => ParseState::ReadingHexString,
                        _ => ParseState::ReadingArgument,
                    };
                    self.write_to_buffer(byte, is_eol);
                }
            }

            ParseState::ReadingArgument => {
                if is_eol || is_space {
                    self.end_argument(byte, is_eol);
                } else {
                    self.write_to_buffer(byte, is_eol);
                }
            }

            ParseState::ReadingString => {
                if byte == b'"' {
                    // The closing quote becomes the NUL terminator.
                    self.write_to_buffer(0, is_eol);
                } else if is_eol {
                    self.fail_line(CommandError::ArgumentSyntaxError, byte, true);
                } else {
                    self.write_to_buffer(byte, is_eol);
                }
            }

            ParseState::ReadingHexString => {
                if byte == b'}' {
                    if self.state.hex_high_nibble.is_some() {
                        // Odd number of hex digits.
                        self.fail_line(CommandError::ArgumentSyntaxError, byte, is_eol);
                    } else {
                        self.end_argument(byte, is_eol);
                    }
                } else if let Some(value) = hex_digit_value(byte) {
                    match self.state.hex_high_nibble.take() {
                        Some(high) => self.write_to_buffer((high << 4) | value, is_eol),
                        None => self.state.hex_high_nibble = Some(value),
                    }
                } else if !is_space {
                    self.fail_line(CommandError::ArgumentSyntaxError, byte, is_eol);
                }
            }

            ParseState::ReadingToEol => self.discard_to_eol(byte, is_eol),
        }

        Some(is_eol)
    }

    /// An end-of-line arrived between tokens: dispatch the line, then run
    /// the shared error-check-and-reinit step with the same byte.
    fn end_of_line(&mut self, byte: u8, is_eol: bool) {
        self.call_command_action();
        self.state.state = ParseState::ReadingToEol;
        self.discard_to_eol(byte, is_eol);
    }

    /// A parse error: record it and discard the rest of the line.
    fn fail_line(&mut self, error: CommandError, byte: u8, is_eol: bool) {
        self.state.record_error(error);
        self.state.state = ParseState::ReadingToEol;
        self.discard_to_eol(byte, is_eol);
    }

    /// Swallow bytes until end-of-line; at the EOL, surface any pending
    /// error through the handler and reinitialize for the next line.
    fn discard_to_eol(&mut self, byte: u8, is_eol: bool) {
        if is_eol {
            if let Some(error) = self.state.error {
                let entry = self.state.current_command;
                (self.error_handler)(error, entry);
            }
            self.state.reinit();
            self.state.previous_character = byte;
        }
    }

    /// Close out the token under construction.
    fn end_argument(&mut self, byte: u8, is_eol: bool) {
        if self.state.token_count == MAX_TOKEN_COUNT {
            self.fail_line(CommandError::WrongNumberOfArguments, byte, is_eol);
            return;
        }
        self.state.token_count += 1;
        self.state.token_indices[self.state.token_count] = self.state.index;
        self.state.state = ParseState::AwaitingArgument;
        if is_eol {
            self.end_of_line(byte, true);
        }
    }

    /// Append one byte to the token under construction, lower-casing it in
    /// bare arguments.
    fn write_to_buffer(&mut self, mut byte: u8, is_eol: bool) {
        if self.state.index == COMMAND_BUFFER_LENGTH {
            self.fail_line(CommandError::StringTooLong, byte, is_eol);
            return;
        }
        if self.state.state == ParseState::ReadingArgument {
            byte = byte.to_ascii_lowercase();
        }
        self.state.buffer[self.state.index] = byte;
        self.state.index += 1;
        if self.state.state == ParseState::ReadingString && byte == 0 {
            self.end_argument(byte, is_eol);
        }
    }

    /// Dispatch a completed line: resolve the (possibly nested) command
    /// name, validate the argument tokens against the entry's specifier,
    /// and invoke the action. Errors are recorded, not reported; the caller
    /// surfaces them at end-of-line.
    fn call_command_action(&mut self) {
        if self.state.token_count == 0 {
            return; // Blank lines are ignored.
        }

        let mut finger = self.table;
        let mut token_num = 0;
        let command;

        loop {
            match table::lookup(finger, self.state.token_bytes(token_num)) {
                None => {
                    self.state.record_error(CommandError::NoSuchCommand);
                    return;
                }
                Some(entry) => {
                    self.state.current_command = Some(entry);
                    token_num += 1;
                    self.state.arg_offset += 1;
                    match entry.kind {
                        CommandKind::Group { table: nested } => {
                            finger = nested;
                            if token_num >= self.state.token_count {
                                self.state.record_error(CommandError::WrongNumberOfArguments);
                                return;
                            }
                        }
                        CommandKind::Action { .. } => {
                            command = entry;
                            break;
                        }
                    }
                }
            }
        }

        let (argument_types, action) = match command.kind {
            CommandKind::Action {
                argument_types,
                action,
            } => (argument_types.as_bytes(), action),
            CommandKind::Group { .. } => unreachable!(),
        };

        // A '?' specifier turns off validation entirely; the action deals
        // with whatever arguments it got.
        if argument_types.first() == Some(&b'?') {
            action(self);
            return;
        }

        // Validate the arguments. The type index is tracked separately from
        // the argument index so a trailing '*' can pin it in place.
        let mut arg_type_num = 0;
        let mut arg_num = 0;
        while token_num < self.state.token_count {
            match argument_types.get(arg_type_num).copied() {
                Some(spec @ (b'u' | b'v' | b'w' | b's')) => {
                    let limit: u32 = match spec {
                        b'u' => 0xFF,
                        b'v' => 0xFFFF,
                        b's' => 0x7F,
                        _ => u32::MAX,
                    };
                    if self.string_to_unsigned(arg_num, true) > limit {
                        self.state.record_error(CommandError::ArgumentOutOfRange);
                    }
                }
                Some(b'b') => {
                    let first = self.first_byte_of_argument(arg_num);
                    if first != b'"' && first != b'{' {
                        self.state.record_error(CommandError::ArgumentSyntaxError);
                    }
                }
                None => self.state.record_error(CommandError::WrongNumberOfArguments),
                Some(_) => self.state.record_error(CommandError::InvalidArgumentType),
            }

            if argument_types.get(arg_type_num + 1).copied() != Some(b'*') {
                arg_type_num += 1;
            }

            if self.state.error.is_some() {
                return;
            }

            token_num += 1;
            arg_num += 1;
        }

        let exhausted = argument_types.get(arg_type_num).is_none();
        let repeating = argument_types.get(arg_type_num + 1).copied() == Some(b'*');
        if !(exhausted || repeating) {
            self.state.record_error(CommandError::WrongNumberOfArguments);
            return;
        }

        action(self);
    }
}

/// The value of an ASCII hex digit, or `None` for anything else.
pub fn hex_digit_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
