//! Socket creation and connection.
//!
//! On Unix the socket is created for the endpoint's family with `socket(2)`
//! and connected through a family-tagged `sockaddr`, with the port written
//! in network byte order. The descriptor is owned from the moment it exists,
//! so every failure path closes it.

use std::time::Duration;

use crate::{Connection, Endpoint, Error, Result};

/// Opens connections to an [`Endpoint`].
///
/// By default connect, send and receive block indefinitely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Connector {
    /// Bound on connect, and on each read and write afterwards.
    timeout: Option<Duration>,
}

impl Connector {
    /// A connector without timeouts.
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Bounds the connect and every subsequent read and write by `timeout`.
    ///
    /// A zero duration disables the timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() {
            None
        } else {
            Some(timeout)
        };
        self
    }

    /// Creates a socket matching the endpoint's family and connects it.
    ///
    /// There is no retry: a refused, unreachable or timed-out attempt is
    /// returned as [`Error::Connect`].
    pub fn connect(&self, endpoint: &Endpoint) -> Result<Connection> {
        let stream = sys::connect(endpoint, self.timeout)?;
        if let Some(timeout) = self.timeout {
            stream
                .set_read_timeout(Some(timeout))
                .and_then(|()| stream.set_write_timeout(Some(timeout)))
                .map_err(|source| Error::Connect {
                    endpoint: *endpoint,
                    source,
                })?;
        }
        tracing::debug!(address = %endpoint.ip(), port = endpoint.port(), "connected");
        Ok(Connection::new(stream, *endpoint))
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
mod sys {
    use std::io;
    use std::net::{IpAddr, TcpStream};
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
    use std::time::{Duration, Instant};

    use crate::{Endpoint, Error, Result};

    /// Connection target tagged with its address family.
    enum SockAddr {
        /// `AF_INET` target.
        V4(libc::sockaddr_in),
        /// `AF_INET6` target.
        V6(libc::sockaddr_in6),
    }

    impl SockAddr {
        /// Builds the target; the port goes in network byte order.
        fn new(endpoint: &Endpoint) -> Self {
            let port = endpoint.port().to_be();
            match endpoint.ip() {
                IpAddr::V4(ip) => {
                    // SAFETY: sockaddr_in is plain old data; all-zero is a valid value.
                    let mut addr: libc::sockaddr_in = unsafe { std::mem::zeroed() };
                    addr.sin_family = libc::AF_INET as libc::sa_family_t;
                    addr.sin_port = port;
                    // in_addr holds the address bytes in network order.
                    addr.sin_addr.s_addr = u32::from_ne_bytes(ip.octets());
                    #[cfg(any(
                        target_os = "macos",
                        target_os = "ios",
                        target_os = "freebsd",
                        target_os = "openbsd",
                        target_os = "netbsd"
                    ))]
                    {
                        addr.sin_len = size_of::<libc::sockaddr_in>() as u8;
                    }
                    Self::V4(addr)
                }
                IpAddr::V6(ip) => {
                    // SAFETY: sockaddr_in6 is plain old data; all-zero is a valid value.
                    let mut addr: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
                    addr.sin6_family = libc::AF_INET6 as libc::sa_family_t;
                    addr.sin6_port = port;
                    addr.sin6_addr.s6_addr = ip.octets();
                    #[cfg(any(
                        target_os = "macos",
                        target_os = "ios",
                        target_os = "freebsd",
                        target_os = "openbsd",
                        target_os = "netbsd"
                    ))]
                    {
                        addr.sin6_len = size_of::<libc::sockaddr_in6>() as u8;
                    }
                    Self::V6(addr)
                }
            }
        }

        /// Socket domain matching the target.
        const fn domain(&self) -> libc::c_int {
            match self {
                Self::V4(_) => libc::AF_INET,
                Self::V6(_) => libc::AF_INET6,
            }
        }

        /// Pointer and length for `connect(2)`.
        fn as_raw(&self) -> (*const libc::sockaddr, libc::socklen_t) {
            match self {
                Self::V4(addr) => (
                    std::ptr::from_ref(addr).cast(),
                    size_of::<libc::sockaddr_in>() as libc::socklen_t,
                ),
                Self::V6(addr) => (
                    std::ptr::from_ref(addr).cast(),
                    size_of::<libc::sockaddr_in6>() as libc::socklen_t,
                ),
            }
        }
    }

    /// Creates, connects and hands over a stream socket for `endpoint`.
    pub(super) fn connect(endpoint: &Endpoint, timeout: Option<Duration>) -> Result<TcpStream> {
        let target = SockAddr::new(endpoint);
        let sock = socket(target.domain()).map_err(Error::SocketCreate)?;

        tracing::debug!(
            fd = sock.as_raw_fd(),
            address = %endpoint.ip(),
            port = endpoint.port(),
            "connecting"
        );

        let res = match timeout {
            None => connect_blocking(&sock, &target),
            Some(timeout) => connect_timeout(&sock, &target, timeout),
        };
        res.map_err(|source| Error::Connect {
            endpoint: *endpoint,
            source,
        })?;

        Ok(TcpStream::from(sock))
    }

    /// Creates a close-on-exec stream socket in `domain`.
    fn socket(domain: libc::c_int) -> io::Result<OwnedFd> {
        #[cfg(any(
            target_os = "linux",
            target_os = "android",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd"
        ))]
        let ty = libc::SOCK_STREAM | libc::SOCK_CLOEXEC;
        #[cfg(not(any(
            target_os = "linux",
            target_os = "android",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd"
        )))]
        let ty = libc::SOCK_STREAM;

        // SAFETY: socket() takes no pointers; the result is checked below.
        let fd = unsafe { libc::socket(domain, ty, 0) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: fd is a freshly created descriptor owned by nobody else.
        let sock = unsafe { OwnedFd::from_raw_fd(fd) };

        #[cfg(not(any(
            target_os = "linux",
            target_os = "android",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd"
        )))]
        set_cloexec(&sock)?;

        Ok(sock)
    }

    /// Sets `FD_CLOEXEC` where `SOCK_CLOEXEC` is unavailable.
    #[cfg(not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd"
    )))]
    fn set_cloexec(fd: &OwnedFd) -> io::Result<()> {
        // SAFETY: fcntl(F_SETFD) on a valid descriptor.
        let ret = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFD, libc::FD_CLOEXEC) };
        if ret == -1 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    /// Plain blocking `connect(2)`.
    fn connect_blocking(sock: &OwnedFd, target: &SockAddr) -> io::Result<()> {
        let (addr, len) = target.as_raw();
        // SAFETY: addr points to a live sockaddr of `len` bytes.
        if unsafe { libc::connect(sock.as_raw_fd(), addr, len) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Non-blocking `connect(2)` bounded by `timeout`, then back to blocking.
    fn connect_timeout(sock: &OwnedFd, target: &SockAddr, timeout: Duration) -> io::Result<()> {
        set_nonblocking(sock, true)?;

        let (addr, len) = target.as_raw();
        // SAFETY: addr points to a live sockaddr of `len` bytes.
        if unsafe { libc::connect(sock.as_raw_fd(), addr, len) } < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINPROGRESS) {
                return Err(err);
            }
            wait_writable(sock, timeout)?;
            take_error(sock)?;
        }

        set_nonblocking(sock, false)
    }

    /// Polls for writability until `timeout` elapses.
    fn wait_writable(sock: &OwnedFd, timeout: Duration) -> io::Result<()> {
        // A deadline past what `Instant` can represent never expires.
        let deadline = Instant::now().checked_add(timeout);
        let mut pfd = libc::pollfd {
            fd: sock.as_raw_fd(),
            events: libc::POLLOUT,
            revents: 0,
        };
        loop {
            let ms = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "connection timed out",
                        ));
                    }
                    libc::c_int::try_from(remaining.as_millis())
                        .unwrap_or(libc::c_int::MAX)
                        .max(1)
                }
                None => -1,
            };
            // SAFETY: pfd is a valid pollfd struct.
            let ret = unsafe { libc::poll(&raw mut pfd, 1, ms) };
            if ret > 0 {
                return Ok(());
            }
            if ret < 0 {
                let err = io::Error::last_os_error();
                if err.kind() != io::ErrorKind::Interrupted {
                    return Err(err);
                }
            }
        }
    }

    /// Reads and clears `SO_ERROR` after a non-blocking connect.
    fn take_error(sock: &OwnedFd) -> io::Result<()> {
        let mut err: libc::c_int = 0;
        let mut len = size_of::<libc::c_int>() as libc::socklen_t;
        // SAFETY: err and len are valid for writes of the advertised size.
        let ret = unsafe {
            libc::getsockopt(
                sock.as_raw_fd(),
                libc::SOL_SOCKET,
                libc::SO_ERROR,
                (&raw mut err).cast(),
                &raw mut len,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        if err != 0 {
            return Err(io::Error::from_raw_os_error(err));
        }
        Ok(())
    }

    /// Toggles `O_NONBLOCK`.
    fn set_nonblocking(sock: &OwnedFd, on: bool) -> io::Result<()> {
        let fd = sock.as_raw_fd();
        // SAFETY: fcntl(F_GETFL/F_SETFL) on a valid descriptor.
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        let flags = if on {
            flags | libc::O_NONBLOCK
        } else {
            flags & !libc::O_NONBLOCK
        };
        // SAFETY: as above.
        if unsafe { libc::fcntl(fd, libc::F_SETFL, flags) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

}

#[cfg(not(unix))]
mod sys {
    use std::net::TcpStream;
    use std::time::Duration;

    use crate::{Endpoint, Error, Result};

    /// Socket creation and connect happen in one step here.
    pub(super) fn connect(endpoint: &Endpoint, timeout: Option<Duration>) -> Result<TcpStream> {
        let addr = endpoint.socket_addr();
        tracing::debug!(address = %endpoint.ip(), port = endpoint.port(), "connecting");
        match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        }
        .map_err(|source| Error::Connect {
            endpoint: *endpoint,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_means_none() {
        assert_eq!(Connector::new().timeout(Duration::ZERO).timeout, None);
        assert_eq!(
            Connector::new()
                .timeout(Duration::from_secs(3))
                .timeout,
            Some(Duration::from_secs(3))
        );
    }
}
