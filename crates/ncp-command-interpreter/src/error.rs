//! Interpreter error taxonomy and usage rendering.

use thiserror::Error;

use crate::table::{CommandEntry, CommandKind};

/// Errors detected while parsing or dispatching a command.
///
/// At most one error is recorded per line (or per binary frame); the first
/// one detected wins and is reported through the interpreter's error handler
/// when the line completes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// The underlying byte source signaled a read failure.
    #[error("serial port error")]
    PortProblem,

    /// No entry matched the command name, the abbreviation was ambiguous,
    /// or a binary identifier was unknown.
    #[error("no such command")]
    NoSuchCommand,

    /// Too many or too few tokens for the matched entry, or the line ran out
    /// of tokens while still resolving nested command names.
    #[error("wrong number of arguments")]
    WrongNumberOfArguments,

    /// A numeric argument's magnitude exceeds its declared width.
    #[error("argument out of range")]
    ArgumentOutOfRange,

    /// Malformed quoted string, hex blob, integer, or binary payload.
    #[error("argument syntax error")]
    ArgumentSyntaxError,

    /// The command buffer's fixed capacity was exceeded.
    #[error("command line too long")]
    StringTooLong,

    /// The entry's argument-type specifier contains an unknown character.
    #[error("bad argument type")]
    InvalidArgumentType,
}

/// Handler invoked once per failed line or frame, with the matched table
/// entry when one was resolved (for usage printing).
pub type ErrorHandler = Box<dyn FnMut(CommandError, Option<&'static CommandEntry>)>;

/// Render a one-line usage string for a table entry.
pub fn usage(entry: &CommandEntry) -> String {
    let mut out = String::from(entry.name);

    match &entry.kind {
        CommandKind::Group { .. } => out.push_str("..."),
        CommandKind::Action { argument_types, .. } => {
            for spec in argument_types.bytes() {
                out.push_str(match spec {
                    b'u' => " <u8>",
                    b'v' => " <u16>",
                    b'w' => " <u32>",
                    b's' => " <i8>",
                    b'b' => " <string>",
                    b'*' => " *",
                    _ => " ?",
                });
            }
        }
    }

    if !entry.description.is_empty() {
        out.push_str(" - ");
        out.push_str(entry.description);
    }

    out
}

/// Render usage for an entry and, for a group, its immediate children.
pub fn usage_tree(entry: &CommandEntry) -> String {
    let mut out = usage(entry);

    if let CommandKind::Group { table } = &entry.kind {
        for child in *table {
            out.push_str("\n  ");
            out.push_str(&usage(child));
        }
    }

    out
}

/// Render usage for every entry of a table, one line each.
pub fn usage_table(table: &[CommandEntry]) -> String {
    let mut out = String::new();

    for entry in table {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&usage(entry));
    }

    out
}

/// The default error handler: logs the error and, when the failing entry is
/// known, its usage. The interpreter itself never writes to any device.
pub fn default_error_handler(error: CommandError, entry: Option<&'static CommandEntry>) {
    match entry {
        Some(entry) => log::warn!("command error: {} (usage: {})", error, usage(entry)),
        None => log::warn!("command error: {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CommandInterpreter;

    fn noop(_interp: &mut CommandInterpreter) {}

    static SUB: &[CommandEntry] = &[CommandEntry::action("form", "uvs", noop, "form a network")];

    #[test]
    fn test_usage_action() {
        let entry = CommandEntry::action("join", "uvswb", noop, "join a network");
        assert_eq!(
            usage(&entry),
            "join <u8> <u16> <i8> <u32> <string> - join a network"
        );
    }

    #[test]
    fn test_usage_varargs() {
        let entry = CommandEntry::action("data", "u*", noop, "");
        assert_eq!(usage(&entry), "data <u8> *");
    }

    #[test]
    fn test_usage_group() {
        let entry = CommandEntry::group("network", SUB, "network commands");
        assert_eq!(usage(&entry), "network... - network commands");
        assert_eq!(
            usage_tree(&entry),
            "network... - network commands\n  form <u8> <u16> <i8> - form a network"
        );
    }
}
