//! Typed argument accessors.
//!
//! Command actions read their parameters through these methods, which work
//! over both encodings: in text mode the tokens are the (stripped,
//! hex-decoded) pieces of the typed line, in binary mode they are fixed-width
//! fields of the raw management payload.
//!
//! Malformed values record the sticky [`CommandError`] on the interpreter
//! state rather than returning a result; the error surfaces through the
//! error handler when the line or frame completes. Reading an argument index
//! past the declared count is a caller bug and fails an assertion.

use crate::error::CommandError;
use crate::parser::{hex_digit_value, CommandInterpreter};
use crate::state::BINARY_BASE;

/// Size of an encryption-key argument in bytes.
pub const ENCRYPTION_KEY_SIZE: usize = 16;

/// Size of an EUI64 argument in bytes.
pub const EUI64_SIZE: usize = 8;

impl CommandInterpreter {
    /// The number of arguments to the current command, not counting the
    /// command name(s).
    pub fn argument_count(&self) -> usize {
        self.state.token_count - self.state.arg_offset
    }

    pub(crate) fn is_binary(&self) -> bool {
        self.state.default_base == BINARY_BASE
    }

    /// The token bytes of argument `argument`, bounds-checked.
    fn argument_token(&self, argument: usize) -> &[u8] {
        assert!(
            argument < self.argument_count(),
            "argument index {argument} out of range"
        );
        self.state.token_bytes(argument + self.state.arg_offset)
    }

    /// The first byte of argument `argument`, used for shape checks.
    pub(crate) fn first_byte_of_argument(&self, argument: usize) -> u8 {
        self.argument_token(argument)[0]
    }

    /// Parse a text token as an unsigned integer: the default base unless a
    /// `0x`/`0X` prefix switches it to 16. The prefix is only recognized at
    /// the start of the token, so one hex argument cannot leak its base into
    /// the next. Overflow wraps, as it always has.
    pub(crate) fn string_to_unsigned(&mut self, argument: usize, swallow_leading_sign: bool) -> u32 {
        assert!(
            argument < self.argument_count(),
            "argument index {argument} out of range"
        );
        let token_num = argument + self.state.arg_offset;
        let start = self.state.token_indices[token_num];
        let end = self.state.token_indices[token_num + 1];

        let mut result: u32 = 0;
        let mut base = u32::from(self.state.default_base);

        for i in start..end {
            let next = self.state.buffer[i];
            let position = i - start;
            if swallow_leading_sign && position == 0 && next == b'-' {
                // The caller deals with the sign.
            } else if (next == b'x' || next == b'X')
                && result == 0
                && (position == 1 || position == 2)
            {
                base = 16;
            } else {
                match hex_digit_value(next) {
                    Some(value) if u32::from(value) < base => {
                        result = result.wrapping_mul(base).wrapping_add(u32::from(value));
                    }
                    _ => {
                        self.state.record_error(CommandError::ArgumentSyntaxError);
                        return 0;
                    }
                }
            }
        }
        result
    }

    fn binary_unsigned_argument(&self, argument: usize) -> u32 {
        let token = self.argument_token(argument);
        match token.len() {
            1 => u32::from(token[0]),
            2 => u32::from(u16::from_be_bytes([token[0], token[1]])),
            4 => u32::from_be_bytes([token[0], token[1], token[2], token[3]]),
            other => panic!("binary integer argument of width {other}"),
        }
    }

    fn binary_signed_argument(&self, argument: usize) -> i32 {
        let token = self.argument_token(argument);
        match token.len() {
            1 => i32::from(token[0] as i8),
            2 => i32::from(i16::from_be_bytes([token[0], token[1]])),
            4 => u32::from_be_bytes([token[0], token[1], token[2], token[3]]) as i32,
            other => panic!("binary integer argument of width {other}"),
        }
    }

    /// Argument `argument` as an unsigned integer.
    pub fn unsigned_argument(&mut self, argument: usize) -> u32 {
        if self.is_binary() {
            self.binary_unsigned_argument(argument)
        } else {
            self.string_to_unsigned(argument, false)
        }
    }

    /// Argument `argument` as a signed integer; a leading `-` is honored in
    /// text mode, sign extension in binary mode.
    pub fn signed_argument(&mut self, argument: usize) -> i32 {
        if self.is_binary() {
            self.binary_signed_argument(argument)
        } else {
            let negative = self.first_byte_of_argument(argument) == b'-';
            let result = self.string_to_unsigned(argument, negative) as i32;
            if negative {
                result.wrapping_neg()
            } else {
                result
            }
        }
    }

    /// Argument `argument` as a byte string. Quoted strings come back
    /// without the quote or the NUL terminator; hex blobs come back as their
    /// decoded bytes; binary blobs come back without the length prefix.
    ///
    /// A negative index reads the command-name tokens instead: -1 is the
    /// name as typed (possibly abbreviated), -2 the parent group name, and
    /// so on. Use [`CommandInterpreter::command_name`] for the canonical
    /// table spelling.
    pub fn string_argument(&self, argument: i8) -> &[u8] {
        if self.is_binary() {
            assert!(argument >= 0, "binary commands have no name tokens");
            let token = self.argument_token(argument as usize);
            &token[1..1 + usize::from(token[0])]
        } else {
            let token_num = argument as isize + self.state.arg_offset as isize;
            assert!(
                token_num >= 0 && (token_num as usize) < self.state.token_count,
                "argument index {argument} out of range"
            );
            let token = self.state.token_bytes(token_num as usize);
            let leading_quote = usize::from(argument >= 0);
            let trailing_null = usize::from(token[0] == b'"');
            &token[leading_quote..token.len() - trailing_null]
        }
    }

    /// The canonical (table) name of the command whose action is running.
    pub fn command_name(&self) -> &'static str {
        self.state
            .current_command
            .expect("no command is executing")
            .name
    }

    /// Copy a string argument into `destination`, truncating to its length.
    /// With `left_pad`, shorter arguments are right-aligned behind leading
    /// zeroes. Returns the number of payload bytes copied.
    pub fn copy_string_argument(
        &self,
        argument: i8,
        destination: &mut [u8],
        left_pad: bool,
    ) -> usize {
        let trailing_null =
            usize::from(argument >= 0 && self.first_byte_of_argument(argument as usize) == b'"');
        let contents = self.string_argument(argument);

        // The NUL terminator travels with quoted strings, within capacity.
        let mut length = contents.len() + trailing_null;
        if length > destination.len() {
            length = destination.len();
        }

        let pad = if left_pad { destination.len() - length } else { 0 };
        destination[..pad].fill(0);
        for i in 0..length {
            destination[pad + i] = if i < contents.len() { contents[i] } else { 0 };
        }
        length.saturating_sub(trailing_null)
    }

    /// An encryption-key argument; must be exactly 16 bytes.
    pub fn key_argument(&self, argument: i8) -> [u8; ENCRYPTION_KEY_SIZE] {
        let mut key = [0; ENCRYPTION_KEY_SIZE];
        let copied = self.copy_string_argument(argument, &mut key, false);
        assert_eq!(copied, ENCRYPTION_KEY_SIZE, "key argument must be 16 bytes");
        key
    }

    /// An EUI64 argument. EUI64s are stored little-endian, so the big-endian
    /// text form is byte-reversed on the way in; short values are
    /// zero-extended first.
    pub fn eui64_argument(&self, argument: i8) -> [u8; EUI64_SIZE] {
        let mut eui64 = [0; EUI64_SIZE];
        self.copy_string_argument(argument, &mut eui64, true);
        eui64.reverse();
        eui64
    }

    /// An IPv6 address argument; records a syntax error on malformed text.
    pub fn ip_argument(&mut self, argument: i8) -> Option<[u8; 16]> {
        let text = self.string_argument(argument).to_vec();
        match parse_ip_address(&text) {
            Some(address) => Some(address),
            None => {
                self.state.record_error(CommandError::ArgumentSyntaxError);
                None
            }
        }
    }

    /// An IPv6 prefix argument; records a syntax error on malformed text.
    pub fn ip_prefix_argument(&mut self, argument: i8) -> Option<[u8; 8]> {
        let text = self.string_argument(argument).to_vec();
        match parse_ip_prefix(&text) {
            Some(prefix) => Some(prefix),
            None => {
                self.state.record_error(CommandError::ArgumentSyntaxError);
                None
            }
        }
    }
}

/// Parse the textual form of an IPv6 address (RFC 4291): colon-delimited
/// groups of up to four hex digits, with at most one `::` elision.
pub fn parse_ip_address(text: &[u8]) -> Option<[u8; 16]> {
    let mut address = [0; 16];
    string_to_ip(text, &mut address).then_some(address)
}

/// Parse the textual form of a 64-bit IPv6 prefix.
pub fn parse_ip_prefix(text: &[u8]) -> Option<[u8; 8]> {
    let mut prefix = [0; 8];
    string_to_ip(text, &mut prefix).then_some(prefix)
}

enum IpParseState {
    ExpectingWord,
    ExpectingPadding,
    ExpectingDelimiter,
}

fn string_to_ip(text: &[u8], target: &mut [u8]) -> bool {
    use IpParseState::*;

    if text.is_empty() {
        return false;
    }

    let ip_length = target.len();
    let mut index = 0;
    let mut padded = false;
    let mut pad_index = 0;
    let mut word: u16 = 0;
    let mut word_chars = 0;
    let mut state = if text[0] == b':' {
        ExpectingPadding
    } else {
        ExpectingWord
    };

    let mut i = 0;
    while i < text.len() {
        let ch = text[i];
        let is_colon = ch == b':';
        let value = hex_digit_value(ch);
        let is_last = i + 1 == text.len();
        let next_is_colon = text.get(i + 1) == Some(&b':');

        if (!is_colon && value.is_none()) || index == ip_length {
            return false;
        }

        match state {
            ExpectingWord => {
                if is_colon || word_chars == 4 {
                    return false;
                }
                word = (word << 4) | u16::from(value.unwrap());
                word_chars += 1;
                if is_last || next_is_colon {
                    target[index..index + 2].copy_from_slice(&word.to_be_bytes());
                    index += 2;
                    state = ExpectingDelimiter;
                }
            }

            ExpectingPadding | ExpectingDelimiter => {
                if !is_colon
                    || is_last // Trailing colon not allowed.
                    || (padded && next_is_colon) // Only one elision allowed.
                    || (matches!(state, ExpectingPadding) && !next_is_colon)
                {
                    return false;
                }
                if next_is_colon {
                    i += 1;
                    padded = true;
                    pad_index = index;
                }
                word = 0;
                word_chars = 0;
                state = ExpectingWord;
            }
        }
        i += 1;
    }

    if padded {
        let pad_bytes = ip_length - index;
        if pad_bytes == 0 {
            return false; // Nothing to pad.
        }
        target.copy_within(pad_index..index, pad_index + pad_bytes);
        target[pad_index..pad_index + pad_bytes].fill(0);
    } else if index != ip_length {
        return false;
    }
    true
}
