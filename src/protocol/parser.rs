//! Line parser
//!
//! Splits one request line into a command token and its arguments.

/// One parsed request line, borrowing from the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    /// First field, empty when the line holds no fields
    pub command: &'a str,

    /// Remaining fields in their original order
    pub args: Vec<&'a str>,
}

impl ParsedLine<'_> {
    /// A blank line. Callers treat it as a no-op.
    pub fn is_empty(&self) -> bool {
        self.command.is_empty()
    }
}

/// Parse a request line. Never fails; a blank line yields an empty command.
pub fn parse(line: &str) -> ParsedLine<'_> {
    let mut fields = line.split_whitespace();
    let command = fields.next().unwrap_or("");

    ParsedLine {
        command,
        args: fields.collect(),
    }
}
