//! Server Configuration
//!
//! The launcher (CLI or test harness) assembles a [`Config`] and hands
//! it to [`crate::server::Socks5Server::bind`]. Nothing here is read
//! from or written to disk.

use std::net::SocketAddr;

/// Startup configuration for one server instance.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the proxy listens on.
    pub bind_addr: SocketAddr,
    /// When present, clients must authenticate with username/password.
    pub credentials: Option<Credentials>,
    /// Remap rules in `host:port to host:port` textual form.
    pub remap_rules: Vec<String>,
}

/// The single fixed credential pair, kept in its raw `username:password`
/// textual form.
///
/// The handshake compares the client's `username + ":" + password`
/// against this string byte-for-byte, so the stored form is never split
/// into fields.
#[derive(Debug, Clone)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(auth: impl Into<String>) -> Self {
        Self(auth.into())
    }

    /// Exact byte comparison of the submitted pair against the
    /// configured string.
    pub fn accepts(&self, username: &[u8], password: &[u8]) -> bool {
        let mut submitted = Vec::with_capacity(username.len() + 1 + password.len());
        submitted.extend_from_slice(username);
        submitted.push(b':');
        submitted.extend_from_slice(password);
        submitted == self.0.as_bytes()
    }
}
