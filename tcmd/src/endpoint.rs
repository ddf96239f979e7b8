//! Literal address resolution.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::{Error, Result};

/// Address family of an [`Endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Family {
    /// IPv4, 4-byte addresses.
    V4,
    /// IPv6, 16-byte addresses.
    V6,
}

/// A resolved destination: literal address plus host-order port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Binary address, tagged by family.
    ip: IpAddr,
    /// Port in host byte order.
    port: u16,
}

impl Endpoint {
    /// Builds an endpoint from an already typed address.
    pub const fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    /// Address family.
    pub const fn family(&self) -> Family {
        match self.ip {
            IpAddr::V4(_) => Family::V4,
            IpAddr::V6(_) => Family::V6,
        }
    }

    /// The typed address.
    pub const fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Port in host byte order.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Raw address bytes: 4 for IPv4, 16 for IPv6.
    pub fn octets(&self) -> Vec<u8> {
        match self.ip {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        }
    }

    /// Standard socket address for the same destination.
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.socket_addr().fmt(f)
    }
}

/// Parses `text` as an IPv4 literal, then as an IPv6 literal.
///
/// No name lookup is performed.
pub fn resolve(text: &str, port: u16) -> Result<Endpoint> {
    if let Ok(v4) = text.parse::<Ipv4Addr>() {
        tracing::debug!(address = text, "IPv4 found");
        return Ok(Endpoint::new(IpAddr::V4(v4), port));
    }
    if let Ok(v6) = text.parse::<Ipv6Addr>() {
        tracing::debug!(address = text, "IPv6 found");
        return Ok(Endpoint::new(IpAddr::V6(v6), port));
    }
    Err(Error::InvalidAddress(text.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_literals() {
        for text in ["127.0.0.1", "0.0.0.0", "255.255.255.255", "10.1.2.3"] {
            let ep = resolve(text, 9000).unwrap();
            assert_eq!(ep.family(), Family::V4, "{text}");
            assert_eq!(ep.octets().len(), 4);
            assert_eq!(ep.port(), 9000);
        }
    }

    #[test]
    fn ipv6_literals() {
        for text in ["::1", "::", "fe80::1", "2001:db8::ff00:42:8329", "::ffff:1.2.3.4"] {
            let ep = resolve(text, 1).unwrap();
            assert_eq!(ep.family(), Family::V6, "{text}");
            assert_eq!(ep.octets().len(), 16);
        }
    }

    #[test]
    fn rejects_non_literals() {
        for text in ["not-an-ip", "localhost", "", "1.2.3", "256.0.0.1", "::g", "[::1]"] {
            match resolve(text, 9000) {
                Err(Error::InvalidAddress(s)) => assert_eq!(s, text),
                other => panic!("{text}: expected InvalidAddress, got {other:?}"),
            }
        }
    }

    #[test]
    fn invalid_address_message_names_input() {
        let err = resolve("not-an-ip", 9000).unwrap_err();
        assert_eq!(err.to_string(), "not-an-ip is not an IPv4 or IPv6 address");
    }

    #[test]
    fn octets_preserve_binary_form() {
        let ep = resolve("192.168.0.1", 80).unwrap();
        assert_eq!(ep.octets(), vec![192, 168, 0, 1]);
        let ep = resolve("::1", 80).unwrap();
        let mut expected = vec![0u8; 16];
        expected[15] = 1;
        assert_eq!(ep.octets(), expected);
    }

    #[test]
    fn display_brackets_ipv6() {
        assert_eq!(resolve("::1", 9000).unwrap().to_string(), "[::1]:9000");
        assert_eq!(resolve("127.0.0.1", 9000).unwrap().to_string(), "127.0.0.1:9000");
    }
}
