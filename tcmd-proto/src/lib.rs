//! Wire framing for tcmd commands.
//!
//! A command travels as a single unsigned length byte followed by that many
//! raw payload bytes. The reply side is unframed: the client performs one
//! read of at most [`REPLY_CAPACITY`] bytes and takes whatever arrived.

mod codec;
mod frame;

pub use codec::{decode, encode, read_reply};
pub use frame::{Command, FrameError, MAX_COMMAND_LEN, REPLY_CAPACITY, Reply};
