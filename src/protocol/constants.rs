//! SOCKS5 Protocol Constants

// SOCKS5 Protocol Version
pub const SOCKS5_VERSION: u8 = 0x05;

// Commands (only CONNECT is supported)
pub const SOCKS5_CMD_CONNECT: u8 = 0x01;

// Address Types
pub const SOCKS5_ADDR_IPV4: u8 = 0x01;
pub const SOCKS5_ADDR_DOMAIN: u8 = 0x03;
pub const SOCKS5_ADDR_IPV6: u8 = 0x04;

// Authentication Methods
pub const SOCKS5_AUTH_NONE: u8 = 0x00;
pub const SOCKS5_AUTH_USERPASS: u8 = 0x02;
pub const SOCKS5_AUTH_NO_ACCEPTABLE: u8 = 0xFF;

// Reply Codes
pub const SOCKS5_REPLY_SUCCESS: u8 = 0x00;
pub const SOCKS5_REPLY_GENERAL_FAILURE: u8 = 0x01;

// Reserved field value
pub const SOCKS5_RESERVED: u8 = 0x00;

// Username/Password sub-negotiation (RFC 1929)
pub const SOCKS5_USERPASS_VERSION: u8 = 0x01;
pub const SOCKS5_USERPASS_SUCCESS: u8 = 0x00;

// Fixed bound address reported in every success reply. The real local
// endpoint of the outgoing socket is never needed by this proxy's
// clients.
pub const REPLY_BIND_ADDR: [u8; 4] = [127, 0, 0, 1];
pub const REPLY_BIND_PORT: u16 = 4096;
