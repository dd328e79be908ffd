//! SOCKS5 Protocol Types

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

/// A destination as requested by the client: textual host plus port.
///
/// The host is either a hostname, an IPv4 literal in dotted-decimal, or
/// an IPv6 literal rendered as eight colon-separated lower-case
/// 4-hex-digit groups with no zero-compression. Endpoints compare by
/// exact value equality; no case-folding, no DNS equivalence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Render an IP address the same way request parsing does, so remap
    /// lookups on literals are byte-for-byte comparable.
    pub fn from_ip(ip: IpAddr, port: u16) -> Self {
        let host = match ip {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => ipv6_full(&v6),
        };
        Self { host, port }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Full uncompressed lower-case rendering of an IPv6 address.
pub fn ipv6_full(ip: &Ipv6Addr) -> String {
    let groups: Vec<String> = ip
        .segments()
        .iter()
        .map(|group| format!("{:04x}", group))
        .collect();
    groups.join(":")
}
