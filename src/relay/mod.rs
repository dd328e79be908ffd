//! Bidirectional Relay
//!
//! After a successful handshake, shuttles bytes between the client and
//! the outgoing connection until either side closes. There is no
//! half-close support: either peer's clean close (or any socket error)
//! ends the whole session, and both sockets are closed unconditionally.
//! This is documented behavior, not an oversight; test vectors rely on
//! it.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

const CHUNK_SIZE: usize = 4096;

/// Forward bytes in both directions until termination. Both sockets are
/// closed (by drop) on every exit path. Termination is never reported
/// upstream.
pub async fn run(mut client: TcpStream, mut outgoing: TcpStream) {
    let mut client_buf = [0u8; CHUNK_SIZE];
    let mut outgoing_buf = [0u8; CHUNK_SIZE];
    let mut bytes_to_outgoing: u64 = 0;
    let mut bytes_to_client: u64 = 0;

    loop {
        tokio::select! {
            read = client.read(&mut client_buf) => match read {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if outgoing.write_all(&client_buf[..n]).await.is_err() {
                        break;
                    }
                    bytes_to_outgoing += n as u64;
                }
            },
            read = outgoing.read(&mut outgoing_buf) => match read {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if client.write_all(&outgoing_buf[..n]).await.is_err() {
                        break;
                    }
                    bytes_to_client += n as u64;
                }
            },
        }
    }

    debug!(
        "relay finished: {} bytes to destination, {} bytes to client",
        bytes_to_outgoing, bytes_to_client
    );
}
