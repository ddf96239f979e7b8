//! Command and reply types carried over the wire.

use std::fmt;

/// Largest payload a one-byte length prefix can describe.
pub const MAX_COMMAND_LEN: usize = u8::MAX as usize;

/// Capacity of the buffer used for the one-shot reply read.
pub const REPLY_CAPACITY: usize = 1024;

/// Errors raised while building a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FrameError {
    /// The payload does not fit behind a one-byte length prefix.
    #[error("command is {len} bytes; the length prefix holds at most {max}", max = MAX_COMMAND_LEN)]
    TooLong {
        /// Length of the rejected payload.
        len: usize,
    },
}

/// A command payload whose length fits in a single byte.
#[derive(Clone, PartialEq, Eq)]
pub struct Command(Vec<u8>);

impl Command {
    /// Wraps `payload`, rejecting anything longer than [`MAX_COMMAND_LEN`].
    pub fn new(payload: impl Into<Vec<u8>>) -> Result<Self, FrameError> {
        let payload = payload.into();
        if payload.len() > MAX_COMMAND_LEN {
            return Err(FrameError::TooLong { len: payload.len() });
        }
        Ok(Self(payload))
    }

    /// Raw payload bytes, without the length prefix.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The length prefix that precedes the payload on the wire.
    pub fn len_prefix(&self) -> u8 {
        // Checked in `new`.
        u8::try_from(self.0.len()).unwrap_or(u8::MAX)
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<&str> for Command {
    type Error = FrameError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s.as_bytes())
    }
}

impl TryFrom<String> for Command {
    type Error = FrameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s.into_bytes())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Command")
            .field(&String::from_utf8_lossy(&self.0))
            .finish()
    }
}

/// Bytes returned by a single receive; possibly empty.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Reply(Vec<u8>);

impl Reply {
    /// Wraps bytes that were read from the peer.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The received bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes received.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the peer sent nothing before closing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reply")
            .field(&String::from_utf8_lossy(&self.0))
            .finish()
    }
}
