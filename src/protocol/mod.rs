//! Protocol Module
//!
//! Defines the text protocol spoken between clients and the server.
//!
//! ## Request Grammar
//! ```text
//! query = SET arg arg | GET arg | DEL arg | "help" | "exit"
//! arg   = 1*( letter | digit | punctuation )
//! ```
//!
//! One request per message, fields separated by whitespace, no quoting.
//!
//! ## Responses
//! Newline-terminated text:
//! - `ok`            - mutation accepted
//! - `<value>`       - GET hit
//! - `" "`           - GET miss (single space)
//! - grammar text    - help
//! - `bye`           - exit, connection closes afterwards
//! - `error: <msg>`  - bad input

mod command;
mod parser;
mod response;

pub use command::{Command, CommandSpec, Handler, GRAMMAR};
pub use parser::{parse, ParsedLine};
pub use response::{Response, MISSING_SENTINEL};
