//! SOCKS5 Protocol Implementation
//!
//! This module contains the server-side SOCKS5 handshake logic.

pub mod constants;
pub mod handler;
pub mod types;

pub use constants::*;
pub use handler::Socks5Handler;
pub use types::Endpoint;
