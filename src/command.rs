/// Outgoing command lines.
///
/// A line is a verb, optionally followed by a separator and a parameter:
/// `AT+RESET`, `AT+NAME=ClickBoard`, `AT+NAME?`, `AT+BAUD=?`. The line
/// terminator is not part of the line; the send step appends it.

use heapless::String;

use crate::error::FormatError;

/// Largest command line the send buffer accepts, terminator excluded.
pub const MAX_COMMAND_LEN: usize = 128;

/// A formatted command line, ready for the transport.
pub type CommandLine = String<MAX_COMMAND_LEN>;

/// How a parameter is attached to the verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `VERB=param`
    Set,
    /// `VERB?param`
    Query,
    /// `VERB=?param`
    QueryRange,
}

impl CommandKind {
    pub const fn separator(&self) -> &'static str {
        match self {
            CommandKind::Set => "=",
            CommandKind::Query => "?",
            CommandKind::QueryRange => "=?",
        }
    }
}

/// Compose `verb` alone, or `verb=param` when a parameter is given.
pub fn format(verb: &str, param: Option<&str>) -> Result<CommandLine, FormatError> {
    format_with(CommandKind::Set, verb, param)
}

/// Compose a command with an explicit separator kind.
///
/// Without a parameter the line is the verb alone, whatever the kind; use
/// [`query`] for a bare `VERB?`.
pub fn format_with(
    kind: CommandKind,
    verb: &str,
    param: Option<&str>,
) -> Result<CommandLine, FormatError> {
    match param {
        Some(param) => compose(&[verb, kind.separator(), param]),
        None => compose(&[verb]),
    }
}

/// Bare query form, `VERB?` or `VERB=?`.
pub fn query(kind: CommandKind, verb: &str) -> Result<CommandLine, FormatError> {
    compose(&[verb, kind.separator()])
}

fn compose(parts: &[&str]) -> Result<CommandLine, FormatError> {
    let len: usize = parts.iter().map(|p| p.len()).sum();
    if len > MAX_COMMAND_LEN {
        return Err(FormatError {
            len,
            max: MAX_COMMAND_LEN,
        });
    }

    let mut line = CommandLine::new();
    for part in parts {
        line.push_str(part).map_err(|_| FormatError {
            len,
            max: MAX_COMMAND_LEN,
        })?;
    }
    Ok(line)
}
