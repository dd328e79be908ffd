//! Outgoing Connector
//!
//! Resolves a destination host/port to an ordered list of candidate
//! socket addresses and tries each in order, returning the first TCP
//! connection that succeeds.

use crate::error::{ProxyError, Result};
use std::net::{IpAddr, SocketAddr};
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, warn};

/// Connect to `host:port`. Candidates are tried in resolver order with
/// no retries and no timeout beyond the platform connect timeout; if
/// every candidate fails (or resolution itself fails), the caller gets
/// a [`ProxyError::Connect`].
pub async fn connect(host: &str, port: u16) -> Result<TcpStream> {
    let candidates = resolve(host, port).await?;

    let mut last_error: Option<std::io::Error> = None;
    for addr in candidates {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                debug!("connected to {}", addr);
                return Ok(stream);
            }
            Err(e) => {
                warn!("connect to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(ProxyError::Connect {
        host: host.to_string(),
        port,
        reason: last_error.map_or_else(|| "no addresses resolved".to_string(), |e| e.to_string()),
    })
}

/// Resolve the host to candidate addresses covering both address
/// families. IP literals become a single candidate without a lookup.
async fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let addrs = lookup_host((host, port))
        .await
        .map_err(|e| ProxyError::Connect {
            host: host.to_string(),
            port,
            reason: e.to_string(),
        })?
        .collect();
    Ok(addrs)
}
