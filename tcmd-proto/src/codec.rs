//! Frame codec over any `Read`/`Write` stream.
//!
//! Each command frame is: `[u8 length][payload]`. Replies are not framed.

use std::io::{self, Read, Write};

use crate::frame::{Command, Reply};

/// Writes `cmd` to `w` as a length byte followed by the payload.
///
/// The prefix and the payload are issued as two separate writes; a stream
/// transport may deliver them in one or more segments.
pub fn encode<W: Write>(w: &mut W, cmd: &Command) -> io::Result<()> {
    w.write_all(&[cmd.len_prefix()])?;
    w.write_all(cmd.as_bytes())?;
    w.flush()
}

/// Reads one command frame from `r`.
pub fn decode(r: &mut impl Read) -> io::Result<Command> {
    let mut len = [0u8; 1];
    r.read_exact(&mut len)?;
    let mut payload = vec![0u8; usize::from(len[0])];
    r.read_exact(&mut payload)?;
    Command::new(payload).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Performs exactly one read of at most `capacity` bytes.
///
/// Whatever arrives is the reply, including nothing at all when the peer
/// has closed. Only a read interrupted before any data is retried.
pub fn read_reply(r: &mut impl Read, capacity: usize) -> io::Result<Reply> {
    let mut buf = vec![0u8; capacity];
    let n = loop {
        match r.read(&mut buf) {
            Ok(n) => break n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    };
    buf.truncate(n);
    Ok(Reply::new(buf))
}
