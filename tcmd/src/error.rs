//! Error types for tcmd operations.

use std::io;

use tcmd_proto::FrameError;

use crate::Endpoint;

/// Alias for `Result<T, tcmd::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned while resolving, connecting or exchanging a command.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The text is neither an IPv4 nor an IPv6 literal.
    #[error("{0} is not an IPv4 or IPv6 address")]
    InvalidAddress(String),

    /// The command could not be framed.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The socket could not be created.
    #[error("socket creation failed")]
    SocketCreate(#[source] io::Error),

    /// The connection attempt failed.
    #[error("connect to {endpoint}")]
    Connect {
        /// Endpoint that refused or could not be reached.
        endpoint: Endpoint,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// Sending the framed command failed.
    #[error("write failed")]
    Write(#[source] io::Error),

    /// Receiving the reply failed.
    #[error("read failed")]
    Read(#[source] io::Error),
}
