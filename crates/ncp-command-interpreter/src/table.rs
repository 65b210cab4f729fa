//! Command tables and name lookup.
//!
//! Applications declare their command surface as static tables of
//! [`CommandEntry`] values. An entry either binds a name (and, for the
//! binary protocol, a two-byte identifier) to an action function together
//! with an argument-type specifier, or nests a whole sub-table under a
//! group name. Tables are read-only after program start and may be shared
//! by any number of interpreter instances.

use crate::parser::CommandInterpreter;

/// The maximum number of arguments a command can have. A nested command
/// name counts as an argument.
pub const MAX_COMMAND_ARGUMENTS: usize = 14;

/// The maximum number of tokens on one line; the extra slot is the leading
/// command name.
pub const MAX_TOKEN_COUNT: usize = MAX_COMMAND_ARGUMENTS + 1;

/// Action bound to a leaf command. The interpreter validates the arguments
/// before invoking it; the action reads them back through the typed
/// accessors on the interpreter.
pub type CommandAction = fn(&mut CommandInterpreter);

/// What a table entry resolves to.
#[derive(Debug, Clone, Copy)]
pub enum CommandKind {
    /// A leaf command: the argument-type specifier plus the action to run.
    Action {
        /// One character per expected argument; see the crate docs for the
        /// `u`/`s`/`v`/`w`/`b`/`*`/`?` vocabulary.
        argument_types: &'static str,
        /// Function invoked once the arguments validate.
        action: CommandAction,
    },
    /// A nested sub-table; the entry name becomes a command prefix.
    Group {
        /// The nested table.
        table: &'static [CommandEntry],
    },
}

/// One entry in a command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandEntry {
    /// Command name. Matching is case-insensitive; entries used only by the
    /// binary protocol leave this empty.
    pub name: &'static str,

    /// Two-byte identifier for the binary management protocol; unused (zero)
    /// for text-only entries.
    pub identifier: u16,

    /// Leaf action or nested sub-table.
    pub kind: CommandKind,

    /// One-line description used when rendering usage.
    pub description: &'static str,
}

impl CommandEntry {
    /// A leaf command addressed by name over the text CLI.
    pub const fn action(
        name: &'static str,
        argument_types: &'static str,
        action: CommandAction,
        description: &'static str,
    ) -> Self {
        CommandEntry {
            name,
            identifier: 0,
            kind: CommandKind::Action {
                argument_types,
                action,
            },
            description,
        }
    }

    /// A leaf command addressed by identifier over the binary protocol.
    pub const fn binary(
        identifier: u16,
        argument_types: &'static str,
        action: CommandAction,
        description: &'static str,
    ) -> Self {
        CommandEntry {
            name: "",
            identifier,
            kind: CommandKind::Action {
                argument_types,
                action,
            },
            description,
        }
    }

    /// A named group of nested commands.
    pub const fn group(
        name: &'static str,
        table: &'static [CommandEntry],
        description: &'static str,
    ) -> Self {
        CommandEntry {
            name,
            identifier: 0,
            kind: CommandKind::Group { table },
            description,
        }
    }
}

/// When set, abbreviated command names are rejected; only exact (still
/// case-insensitive) matches are accepted.
const REQUIRE_EXACT_NAME: bool = cfg!(feature = "require-exact-name");

/// Find the best match for `token` in `table`.
///
/// An exact match (both strings end together, case-insensitive) always wins.
/// Otherwise a single entry where one of (token, entry name) is a strict
/// prefix of the other is accepted as an inexact match; zero or multiple
/// inexact matches resolve to `None`.
pub(crate) fn lookup<'t>(table: &'t [CommandEntry], token: &[u8]) -> Option<&'t CommandEntry> {
    let mut inexact_match: Option<&CommandEntry> = None;
    let mut multiple_matches = false;

    for entry in table {
        let name = entry.name.as_bytes();
        let mut i = 0;
        loop {
            let end_input = i == token.len();
            let end_entry = i == name.len();
            if end_input && end_entry {
                return Some(entry); // Exact match.
            } else if end_input || end_entry {
                if inexact_match.is_some() {
                    multiple_matches = true;
                } else {
                    inexact_match = Some(entry);
                }
                break;
            } else if !token[i].eq_ignore_ascii_case(&name[i]) {
                break;
            }
            i += 1;
        }
    }

    if multiple_matches || REQUIRE_EXACT_NAME {
        None
    } else {
        inexact_match
    }
}

/// Find the (flat-table) entry carrying `identifier`. Group entries are
/// never addressable by identifier.
pub(crate) fn lookup_identifier(
    table: &'static [CommandEntry],
    identifier: u16,
) -> Option<&'static CommandEntry> {
    table
        .iter()
        .find(|entry| entry.identifier == identifier && matches!(entry.kind, CommandKind::Action { .. }))
}
