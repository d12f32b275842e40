//! WAL record
//!
//! The bytes of one durable command as they appear on disk.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

/// One serialized operation: `NAME arg1 arg2\n`
#[derive(Clone, PartialEq, Eq)]
pub struct Record(Bytes);

impl Record {
    /// Serialize a command name and its arguments
    pub fn encode(command: &str, args: &[&str]) -> Self {
        let len = command.len() + args.iter().map(|a| a.len() + 1).sum::<usize>() + 1;
        let mut buf = BytesMut::with_capacity(len);

        buf.put_slice(command.as_bytes());
        for arg in args {
            buf.put_u8(b' ');
            buf.put_slice(arg.as_bytes());
        }
        buf.put_u8(b'\n');

        Self(buf.freeze())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Record")
            .field(&String::from_utf8_lossy(&self.0))
            .finish()
    }
}
