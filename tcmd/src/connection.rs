//! An established connection and the framed exchange over it.

use std::net::TcpStream;

use tcmd_proto::{Command, REPLY_CAPACITY, Reply};

use crate::{Endpoint, Error, Result};

/// A connected stream bound to one [`Endpoint`] for its whole lifetime.
///
/// The socket is closed when the connection is dropped or [`closed`].
///
/// [`closed`]: Connection::close
#[derive(Debug)]
pub struct Connection {
    /// The underlying TCP stream.
    stream: TcpStream,
    /// Destination this stream is connected to.
    endpoint: Endpoint,
}

impl Connection {
    /// Wraps a stream the connector has just established.
    pub(crate) const fn new(stream: TcpStream, endpoint: Endpoint) -> Self {
        Self { stream, endpoint }
    }

    /// The endpoint this connection is bound to.
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Sends `command` as a length byte followed by its payload.
    pub fn send(&mut self, command: &Command) -> Result<()> {
        tcmd_proto::encode(&mut self.stream, command).map_err(Error::Write)?;
        tracing::debug!(len = command.len(), "command sent");
        Ok(())
    }

    /// Performs the single read that makes up the reply.
    ///
    /// An empty reply means the peer closed without sending anything.
    pub fn receive(&mut self) -> Result<Reply> {
        let reply = tcmd_proto::read_reply(&mut self.stream, REPLY_CAPACITY).map_err(Error::Read)?;
        tracing::debug!(bytes = reply.len(), "read reply");
        Ok(reply)
    }

    /// Closes the socket.
    pub fn close(self) {
        let Self { stream, endpoint } = self;
        tracing::debug!(%endpoint, "closing");
        drop(stream);
    }
}
