//! remapsocks - SOCKS5 proxy server with destination remapping
//!
//! Thin launcher around the library: parses the CLI, initializes
//! tracing, assembles a [`Config`] and runs the server.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use remapsocks::{Config, Credentials, Socks5Server};

/// CLI arguments for remapsocks
#[derive(Parser, Debug)]
#[command(name = "remapsocks")]
#[command(about = "Minimal SOCKS5 proxy server with destination remapping")]
#[command(version)]
struct CliArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 1080)]
    port: u16,

    /// Address to bind to
    #[arg(short, long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    bind: IpAddr,

    /// Require username/password authentication with this user:pass pair
    #[arg(long)]
    auth: Option<String>,

    /// Remap rule of the form "host:port to host:port"; may be repeated
    #[arg(long = "map", value_name = "RULE")]
    map: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    init_tracing(&args.log_level);

    let auth_required = args.auth.is_some();
    let config = Config {
        bind_addr: SocketAddr::new(args.bind, args.port),
        credentials: args.auth.map(Credentials::new),
        remap_rules: args.map,
    };

    let server = Socks5Server::bind(config)
        .await
        .context("failed to start proxy")?;

    info!(
        "remapsocks v{} ready, auth {}",
        env!("CARGO_PKG_VERSION"),
        if auth_required {
            "required"
        } else {
            "disabled"
        }
    );

    server.run().await?;
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(env_filter)
        .init();
}
