//! Command definitions
//!
//! The closed set of commands and their dispatch table.

use std::fmt;

use crate::engine::Engine;
use crate::error::{KvError, Result};
use super::Response;

/// Grammar text returned by `help`
pub const GRAMMAR: &str = "query = set_command | get_command | del_command | help_command | exit_command\n\
 set_command  = \"SET\" argument argument\n\
 get_command  = \"GET\" argument\n\
 del_command  = \"DEL\" argument\n\
 help_command = \"help\"\n\
 exit_command = \"exit\"\n\
 argument     = punctuation | letter | digit { punctuation | letter | digit }\n\
 punctuation  = \"*\" | \"/\" | \"_\" | ...\n\
 letter       = \"a\" | ... | \"z\" | \"A\" | ... | \"Z\"\n\
 digit        = \"0\" | ... | \"9\"";

/// Handler run against the engine once arguments are validated
pub type Handler = fn(&Engine, &[&str]) -> Response;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Set,
    Get,
    Del,
    Help,
    Exit,
}

/// Dispatch table entry
#[derive(Clone, Copy)]
pub struct CommandSpec {
    /// Minimum number of arguments; extra arguments are ignored
    pub min_args: usize,

    pub handler: Handler,

    /// Whether the command must be recorded in the WAL
    pub durable: bool,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("min_args", &self.min_args)
            .field("durable", &self.durable)
            .finish_non_exhaustive()
    }
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Set,
        Command::Get,
        Command::Del,
        Command::Help,
        Command::Exit,
    ];

    /// Look up a command by its wire name (case-sensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.name() == name)
    }

    /// Wire name of the command
    pub fn name(self) -> &'static str {
        match self {
            Command::Set => "SET",
            Command::Get => "GET",
            Command::Del => "DEL",
            Command::Help => "help",
            Command::Exit => "exit",
        }
    }

    /// Dispatch table entry for this command
    pub fn spec(self) -> CommandSpec {
        match self {
            Command::Set => CommandSpec { min_args: 2, handler: handle_set, durable: true },
            Command::Get => CommandSpec { min_args: 1, handler: handle_get, durable: false },
            Command::Del => CommandSpec { min_args: 1, handler: handle_del, durable: true },
            Command::Help => CommandSpec { min_args: 0, handler: handle_help, durable: false },
            Command::Exit => CommandSpec { min_args: 0, handler: handle_exit, durable: false },
        }
    }

    /// Resolve a command token and check its argument count
    ///
    /// Unknown names are reported before argument counts.
    pub fn resolve(name: &str, args: &[&str]) -> Result<(Self, CommandSpec)> {
        let command =
            Self::from_name(name).ok_or_else(|| KvError::UnknownCommand(name.to_string()))?;
        let spec = command.spec();

        if args.len() < spec.min_args {
            return Err(KvError::ArgumentCount {
                command: command.name(),
                required: spec.min_args,
                got: args.len(),
            });
        }

        Ok((command, spec))
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn handle_set(engine: &Engine, args: &[&str]) -> Response {
    engine.set(args[0], args[1]);
    Response::Ok
}

fn handle_get(engine: &Engine, args: &[&str]) -> Response {
    match engine.get(args[0]) {
        Some(value) => Response::Value(value),
        None => Response::NotFound,
    }
}

fn handle_del(engine: &Engine, args: &[&str]) -> Response {
    engine.delete(args[0]);
    Response::Ok
}

fn handle_help(_engine: &Engine, _args: &[&str]) -> Response {
    Response::Help
}

fn handle_exit(_engine: &Engine, _args: &[&str]) -> Response {
    Response::Goodbye
}
