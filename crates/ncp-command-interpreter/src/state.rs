//! Per-interpreter mutable parser state.

use crate::error::CommandError;
use crate::table::{CommandEntry, MAX_TOKEN_COUNT};

/// Capacity of the working buffer one command line is assembled into.
/// Whitespace, quotes, and hex braces are stripped on the way in, and hex
/// digits are converted to raw bytes, so this bounds the *payload* size of a
/// line, not its typed length.
pub const COMMAND_BUFFER_LENGTH: usize = 125;

/// Default base for text-mode integer arguments.
pub(crate) const DEFAULT_BASE: u8 = 10;

/// Sentinel base marking the state as holding a binary-encoded command, in
/// which integer tokens are fixed-width big-endian fields rather than ASCII.
pub const BINARY_BASE: u8 = 0xFF;

/// Finite-state machine states for the text parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseState {
    /// Between tokens, skipping whitespace.
    AwaitingArgument,
    /// Inside a bare token.
    ReadingArgument,
    /// Inside a quoted string.
    ReadingString,
    /// Inside a `{ ... }` hex blob.
    ReadingHexString,
    /// Discarding the remainder of a malformed line.
    ReadingToEol,
}

/// The mutable state behind one interpreter instance: the reconstructed
/// command line, the token boundaries into it, and the sticky error.
pub(crate) struct CommandState {
    /// Current state-machine state.
    pub state: ParseState,

    /// The command line is assembled here. Quoted strings keep their leading
    /// quote and gain a NUL terminator; hex blobs keep their leading brace
    /// and hold converted bytes.
    pub buffer: [u8; COMMAND_BUFFER_LENGTH],

    /// Offsets of token boundaries in `buffer`; one more entry than
    /// `token_count` so every token has both a start and an end.
    pub token_indices: [usize; MAX_TOKEN_COUNT + 1],

    /// Number of tokens read in, including the command name(s).
    pub token_count: usize,

    /// Next write position in `buffer`.
    pub index: usize,

    /// First error found on this line; cleared by `reinit`.
    pub error: Option<CommandError>,

    /// Pending high nibble while decoding a hex blob.
    pub hex_high_nibble: Option<u8>,

    /// Token number of the first true argument, after any nested command
    /// names.
    pub arg_offset: usize,

    /// Previous character seen, so an LF immediately following a CR is
    /// ignored.
    pub previous_character: u8,

    /// `DEFAULT_BASE` for text input, or `BINARY_BASE` while decoding a
    /// binary command. Unlike the fields above this survives `reinit`.
    pub default_base: u8,

    /// The entry matched by the current dispatch, valid while its action
    /// runs and when the error handler fires.
    pub current_command: Option<&'static CommandEntry>,
}

impl CommandState {
    pub fn new() -> Self {
        CommandState {
            state: ParseState::AwaitingArgument,
            buffer: [0; COMMAND_BUFFER_LENGTH],
            token_indices: [0; MAX_TOKEN_COUNT + 1],
            token_count: 0,
            index: 0,
            error: None,
            hex_high_nibble: None,
            arg_offset: 0,
            previous_character: 0,
            default_base: DEFAULT_BASE,
            current_command: None,
        }
    }

    /// Reinitialize for the next command line. `previous_character` and
    /// `default_base` deliberately survive from one line to the next.
    pub fn reinit(&mut self) {
        self.state = ParseState::AwaitingArgument;
        self.index = 0;
        self.token_indices[0] = 0;
        self.token_count = 0;
        self.error = None;
        self.hex_high_nibble = None;
        self.arg_offset = 0;
        self.current_command = None;
    }

    /// Record `error` unless one is already pending; the first error on a
    /// line wins.
    pub fn record_error(&mut self, error: CommandError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// The bytes of token `num`.
    pub fn token_bytes(&self, num: usize) -> &[u8] {
        &self.buffer[self.token_indices[num]..self.token_indices[num + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reinit_preserves_base_and_previous_character() {
        let mut state = CommandState::new();
        state.default_base = BINARY_BASE;
        state.previous_character = b'\r';
        state.token_count = 3;
        state.index = 17;
        state.error = Some(CommandError::NoSuchCommand);
        state.hex_high_nibble = Some(0xA);

        state.reinit();

        assert_eq!(state.token_count, 0);
        assert_eq!(state.index, 0);
        assert_eq!(state.error, None);
        assert_eq!(state.hex_high_nibble, None);
        assert_eq!(state.default_base, BINARY_BASE);
        assert_eq!(state.previous_character, b'\r');

        // Reinit is idempotent.
        state.reinit();
        assert_eq!(state.token_count, 0);
        assert_eq!(state.previous_character, b'\r');
    }

    #[test]
    fn test_first_error_wins() {
        let mut state = CommandState::new();
        state.record_error(CommandError::ArgumentSyntaxError);
        state.record_error(CommandError::NoSuchCommand);
        assert_eq!(state.error, Some(CommandError::ArgumentSyntaxError));
    }
}
