//! Terminal commands typed by the operator.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("type a command, or 'help'")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Opens the item behind table row `n` (1-based).
    Show(usize),
    Back,
    Set { field: String, value: String },
    Submit,
    Delete,
    Reload,
    View,
    Help,
    Quit,
}

pub const HELP: &str = "commands: show <row> | back | set <field> <value> | submit | delete | reload | view | help | quit";

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "" => return Err(CommandError::Empty),
        "show" | "open" => {
            let row = rest
                .parse::<usize>()
                .ok()
                .filter(|row| *row > 0)
                .ok_or(CommandError::Usage("show <row>"))?;
            Command::Show(row)
        }
        "back" => Command::Back,
        "set" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .map(|(field, value)| (field, value.trim()))
                .unwrap_or((rest, ""));
            if field.is_empty() {
                return Err(CommandError::Usage("set <field> <value>"));
            }
            Command::Set {
                field: field.to_string(),
                value: value.to_string(),
            }
        }
        "submit" => Command::Submit,
        "delete" => Command::Delete,
        "reload" => Command::Reload,
        "view" | "ls" => Command::View,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(command)
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
