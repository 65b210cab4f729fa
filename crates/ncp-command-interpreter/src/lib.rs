//! NCP Command Interpreter
//!
//! This crate implements the command interpreter shared by the interactive
//! serial CLI and the binary host/NCP management channel. Both paths feed the
//! same table-driven dispatcher:
//!
//! - **Text mode**: a byte-at-a-time parser splits an input line into tokens
//!   (bare words, `"quoted strings"`, `{ hex blobs }`), matches the leading
//!   token(s) against a command table (abbreviations allowed when
//!   unambiguous), validates the remaining tokens against the entry's
//!   argument-type specifier, and invokes the bound action.
//! - **Binary mode**: a management payload carries a 2-byte command
//!   identifier followed by packed fixed-width arguments; the decoder looks
//!   the identifier up in the same kind of table and invokes the action with
//!   the argument tokens pointing into the raw payload.
//!
//! Actions read their parameters back through typed accessors
//! ([`CommandInterpreter::unsigned_argument`] and friends), which work
//! identically over both encodings.
//!
//! # Example
//!
//! ```rust,ignore
//! use ncp_command_interpreter::{CommandEntry, CommandInterpreter};
//!
//! fn form_action(interp: &mut CommandInterpreter) {
//!     let channel = interp.unsigned_argument(0) as u8;
//!     let pan_id = interp.unsigned_argument(1) as u16;
//!     let power = interp.signed_argument(2) as i8;
//!     // ...
//! }
//!
//! static COMMANDS: &[CommandEntry] = &[
//!     CommandEntry::action("form", "uvs", form_action, "form a network"),
//! ];
//!
//! let mut interp = CommandInterpreter::new(COMMANDS);
//! interp.process_input(b"form 11 0xAB12 -3\n");
//! ```
//!
//! Argument-type specifier characters:
//!
//! | char | meaning                                              |
//! |------|------------------------------------------------------|
//! | `u`  | one-byte unsigned integer                            |
//! | `s`  | one-byte signed integer                              |
//! | `v`  | two-byte unsigned integer                            |
//! | `w`  | four-byte unsigned integer                           |
//! | `b`  | string (`"ascii"`) or blob (`{ 0A 1B }`)             |
//! | `*`  | zero or more of the previous type (must be last)     |
//! | `?`  | skip all validation (must be the only character)     |

mod args;
mod binary;
mod error;
mod parser;
mod state;
mod table;

pub use args::*;
pub use binary::*;
pub use error::*;
pub use parser::*;
pub use state::*;
pub use table::*;
