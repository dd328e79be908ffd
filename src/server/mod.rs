//! SOCKS5 Server
//!
//! Accepts inbound connections and spawns one task per client. Workers
//! share only the read-only remap table and the startup auth policy, so
//! no locking is needed; each worker owns its two sockets exclusively.

use crate::config::{Config, Credentials};
use crate::connect;
use crate::error::Result;
use crate::protocol::Socks5Handler;
use crate::relay;
use crate::remap::RemapTable;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// One proxy server instance.
pub struct Socks5Server {
    listener: TcpListener,
    credentials: Option<Arc<Credentials>>,
    remap: Arc<RemapTable>,
}

impl Socks5Server {
    /// Build the remap table and bind the listen socket. A malformed
    /// remap rule aborts startup; a hostname rule that fails to resolve
    /// does not.
    pub async fn bind(config: Config) -> Result<Self> {
        let remap = Arc::new(RemapTable::build(&config.remap_rules).await?);
        if !remap.is_empty() {
            info!("remap table loaded with {} rules", remap.len());
        }

        let listener = TcpListener::bind(config.bind_addr).await?;
        info!("listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            credentials: config.credentials.map(Arc::new),
            remap,
        })
    }

    /// Address the listener actually bound to. Useful when binding to
    /// port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the process exits. Per-connection
    /// failures are logged and never stop the accept loop.
    pub async fn run(self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    debug!("accepted connection from {}", peer);
                    let credentials = self.credentials.clone();
                    let remap = Arc::clone(&self.remap);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, credentials, remap).await {
                            debug!("connection from {} closed: {}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    warn!("accept failed: {}", e);
                }
            }
        }
    }
}

/// Drive one client through handshake, remap, connect, and relay. Abort
/// paths simply drop the sockets; no other cleanup is held across
/// states.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    credentials: Option<Arc<Credentials>>,
    remap: Arc<RemapTable>,
) -> Result<()> {
    let mut handler = Socks5Handler::new(stream);
    let requested = handler.negotiate(credentials.as_deref()).await?;

    let destination = remap.remap(&requested);
    if destination != requested {
        info!("{} requested {}, remapping to {}", peer, requested, destination);
    } else {
        debug!("{} requested {}", peer, requested);
    }

    let outgoing = match connect::connect(&destination.host, destination.port).await {
        Ok(outgoing) => outgoing,
        Err(e) => {
            warn!("{}: {}", peer, e);
            handler.send_connect_reply(false).await?;
            return Ok(());
        }
    };
    handler.send_connect_reply(true).await?;

    relay::run(handler.into_stream(), outgoing).await;
    Ok(())
}
