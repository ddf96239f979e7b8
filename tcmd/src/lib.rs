//! One-shot framed TCP command client.
//!
//! `tcmd` resolves a literal IPv4 or IPv6 address, connects, sends a single
//! length-prefixed command and performs one read for the reply.
//!
//! ```no_run
//! use tcmd::{Command, Connector, resolve};
//!
//! let endpoint = resolve("127.0.0.1", 9000)?;
//! let command = Command::try_from("PING")?;
//! let reply = tcmd::exchange(&Connector::new(), &endpoint, &command)?;
//! println!("{}", String::from_utf8_lossy(reply.as_bytes()));
//! # Ok::<(), tcmd::Error>(())
//! ```

mod connect;
mod connection;
mod endpoint;
mod error;

pub use connect::Connector;
pub use connection::Connection;
pub use endpoint::{Endpoint, Family, resolve};
pub use error::{Error, Result};
pub use tcmd_proto::{Command, FrameError, MAX_COMMAND_LEN, REPLY_CAPACITY, Reply};

/// Runs one exchange: connect, send `command`, read the reply, close.
///
/// Every call opens its own connection.
pub fn exchange(connector: &Connector, endpoint: &Endpoint, command: &Command) -> Result<Reply> {
    let mut conn = connector.connect(endpoint)?;
    conn.send(command)?;
    let reply = conn.receive()?;
    conn.close();
    Ok(reply)
}
