//! SOCKS5 Protocol Handler
//!
//! Per-connection handshake state machine: greeting, method selection,
//! optional username/password sub-negotiation, then the CONNECT request.
//! Every violation aborts the connection; only the method-selection and
//! credential-success replies and the final ten-byte CONNECT reply are
//! ever written.

use super::constants::*;
use super::types::{ipv6_full, Endpoint};
use crate::config::Credentials;
use crate::error::{ProxyError, Result};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// SOCKS5 handshake handler for one accepted client connection.
pub struct Socks5Handler {
    stream: TcpStream,
}

impl Socks5Handler {
    /// Create a new handler for the given client stream.
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Run the full handshake: greeting, method selection, optional
    /// username/password exchange, and the CONNECT request. Returns the
    /// destination the client asked for.
    ///
    /// A `Some` credential pair makes username/password the required
    /// method; `None` requires no-auth.
    pub async fn negotiate(&mut self, credentials: Option<&Credentials>) -> Result<Endpoint> {
        let methods = self.read_greeting().await?;

        let required = match credentials {
            Some(_) => SOCKS5_AUTH_USERPASS,
            None => SOCKS5_AUTH_NONE,
        };
        if !methods.contains(&required) {
            debug!("client offered no acceptable auth method");
            self.stream
                .write_all(&[SOCKS5_VERSION, SOCKS5_AUTH_NO_ACCEPTABLE])
                .await?;
            return Err(ProxyError::Protocol("no acceptable auth method"));
        }
        self.stream.write_all(&[SOCKS5_VERSION, required]).await?;

        if let Some(credentials) = credentials {
            self.authenticate(credentials).await?;
        }

        self.read_request().await
    }

    /// Read the greeting and return the client's offered auth methods.
    async fn read_greeting(&mut self) -> Result<Vec<u8>> {
        let mut header = [0u8; 2];
        self.read_handshake_bytes(&mut header).await?;
        if header[0] != SOCKS5_VERSION {
            return Err(ProxyError::Protocol("bad greeting version"));
        }
        self.read_prefixed(header[1] as usize).await
    }

    /// Username/password sub-negotiation (RFC 1929). A credential
    /// mismatch closes the connection with no status byte.
    async fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        let mut header = [0u8; 2];
        self.read_handshake_bytes(&mut header).await?;
        if header[0] != SOCKS5_USERPASS_VERSION {
            return Err(ProxyError::Protocol("bad userpass sub-negotiation version"));
        }
        let username = self.read_prefixed(header[1] as usize).await?;

        let mut password_len = [0u8; 1];
        self.read_handshake_bytes(&mut password_len).await?;
        let password = self.read_prefixed(password_len[0] as usize).await?;

        if !credentials.accepts(&username, &password) {
            return Err(ProxyError::Protocol("credential mismatch"));
        }
        self.stream
            .write_all(&[SOCKS5_USERPASS_VERSION, SOCKS5_USERPASS_SUCCESS])
            .await?;
        Ok(())
    }

    /// Read the connection request. Only CONNECT is supported; BIND and
    /// UDP ASSOCIATE abort the connection.
    async fn read_request(&mut self) -> Result<Endpoint> {
        let mut header = [0u8; 4];
        self.read_handshake_bytes(&mut header).await?;
        if header[0] != SOCKS5_VERSION {
            return Err(ProxyError::Protocol("bad request version"));
        }
        if header[1] != SOCKS5_CMD_CONNECT {
            return Err(ProxyError::Protocol("unsupported command"));
        }
        if header[2] != SOCKS5_RESERVED {
            return Err(ProxyError::Protocol("nonzero reserved byte"));
        }

        let host = match header[3] {
            SOCKS5_ADDR_IPV4 => {
                let mut octets = [0u8; 4];
                self.read_handshake_bytes(&mut octets).await?;
                Ipv4Addr::from(octets).to_string()
            }
            SOCKS5_ADDR_DOMAIN => {
                let mut len = [0u8; 1];
                self.read_handshake_bytes(&mut len).await?;
                let raw = self.read_prefixed(len[0] as usize).await?;
                String::from_utf8(raw).map_err(|_| ProxyError::Protocol("non-utf8 domain name"))?
            }
            SOCKS5_ADDR_IPV6 => {
                let mut octets = [0u8; 16];
                self.read_handshake_bytes(&mut octets).await?;
                ipv6_full(&Ipv6Addr::from(octets))
            }
            _ => return Err(ProxyError::Protocol("unsupported address type")),
        };

        let mut port = [0u8; 2];
        self.read_handshake_bytes(&mut port).await?;

        Ok(Endpoint::new(host, u16::from_be_bytes(port)))
    }

    /// Send the fixed ten-byte CONNECT reply. Success always reports the
    /// bound address as 127.0.0.1:4096; failure reports the zeroed
    /// general-failure form.
    pub async fn send_connect_reply(&mut self, success: bool) -> Result<()> {
        let mut reply = [0u8; 10];
        reply[0] = SOCKS5_VERSION;
        reply[2] = SOCKS5_RESERVED;
        reply[3] = SOCKS5_ADDR_IPV4;
        if success {
            reply[1] = SOCKS5_REPLY_SUCCESS;
            reply[4..8].copy_from_slice(&REPLY_BIND_ADDR);
            reply[8..10].copy_from_slice(&REPLY_BIND_PORT.to_be_bytes());
        } else {
            reply[1] = SOCKS5_REPLY_GENERAL_FAILURE;
        }
        self.stream.write_all(&reply).await?;
        Ok(())
    }

    /// Read exactly `buf.len()` bytes. EOF partway through a protocol
    /// field is a protocol violation, not a clean close. Every handshake
    /// phase reads through this primitive.
    async fn read_handshake_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream.read_exact(buf).await.map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                ProxyError::Protocol("truncated handshake")
            } else {
                ProxyError::Io(e)
            }
        })?;
        Ok(())
    }

    /// Read a length-prefixed field whose length byte was already read.
    async fn read_prefixed(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_handshake_bytes(&mut buf).await?;
        Ok(buf)
    }

    /// Hand the underlying stream to the relay once the handshake is
    /// complete.
    pub fn into_stream(self) -> TcpStream {
        self.stream
    }
}
