//! Response definitions
//!
//! Represents responses to clients.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::KvError;
use super::command::GRAMMAR;

/// Body sent for a GET on a missing key
pub const MISSING_SENTINEL: &str = " ";

/// A response to send to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Mutation accepted
    Ok,

    /// Value of a GET hit
    Value(String),

    /// GET miss
    NotFound,

    /// Protocol grammar
    Help,

    /// Reply to `exit`; the connection closes after it is written
    Goodbye,

    /// Human readable error for bad input
    Error(String),

    /// Blank input; nothing is written back
    Empty,
}

impl Response {
    /// Create an ERROR response from an error
    pub fn error(err: &KvError) -> Self {
        Response::Error(err.to_string())
    }

    /// Whether the connection should close once this response is written
    pub fn closes_connection(&self) -> bool {
        matches!(self, Response::Goodbye)
    }

    /// Encode as newline-terminated bytes. `None` for [`Response::Empty`].
    pub fn encode(&self) -> Option<Bytes> {
        let body: &str = match self {
            Response::Ok => "ok",
            Response::Value(value) => value.as_str(),
            Response::NotFound => MISSING_SENTINEL,
            Response::Help => GRAMMAR,
            Response::Goodbye => "bye",
            Response::Error(message) => {
                let mut buf = BytesMut::with_capacity(message.len() + 8);
                buf.put_slice(b"error: ");
                buf.put_slice(message.as_bytes());
                buf.put_u8(b'\n');
                return Some(buf.freeze());
            }
            Response::Empty => return None,
        };

        let mut buf = BytesMut::with_capacity(body.len() + 1);
        buf.put_slice(body.as_bytes());
        buf.put_u8(b'\n');
        Some(buf.freeze())
    }
}
