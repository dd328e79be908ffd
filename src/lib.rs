//! remapsocks
//!
//! A minimal SOCKS5 proxy server for test environments. Clients complete
//! the SOCKS5 handshake (no-auth or username/password), request a TCP
//! CONNECT, and the proxy relays bytes to the destination — optionally
//! redirected through a static address remap table so that test clients
//! dialing one address are silently connected to another.

pub mod config;
pub mod connect;
pub mod error;
pub mod protocol;
pub mod relay;
pub mod remap;
pub mod server;

pub use config::{Config, Credentials};
pub use error::{ProxyError, Result};
pub use server::Socks5Server;
