//! Error Types
//!
//! Errors are classified by how the server recovers from them: a
//! malformed remap rule aborts startup, everything else is confined to
//! the one connection that produced it.

use thiserror::Error;

/// Errors produced by the proxy core.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Remap rule text did not match the `host:port to host:port`
    /// grammar. Raised while building the remap table; fatal at startup.
    #[error("malformed remap rule: {0:?}")]
    RuleFormat(String),

    /// The client sent malformed, truncated, or unsupported handshake
    /// bytes. The connection is closed with no reply.
    #[error("protocol error: {0}")]
    Protocol(&'static str),

    /// Every candidate address for the destination failed to connect.
    /// The client gets the SOCKS5 general-failure reply.
    #[error("unable to connect to {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    /// Socket-level failure outside the handshake grammar.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Common result type for the proxy core.
pub type Result<T> = std::result::Result<T, ProxyError>;
