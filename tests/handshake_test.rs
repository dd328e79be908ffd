//! Integration tests for the SOCKS5 handshake over real sockets

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};

use remapsocks::{Config, Credentials, Socks5Server};

/// Start a proxy on an ephemeral port and return its address.
async fn start_proxy(credentials: Option<Credentials>, remap_rules: Vec<String>) -> SocketAddr {
    let config = Config {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        credentials,
        remap_rules,
    };
    let server = Socks5Server::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

/// Bind and immediately release a port so connecting to it is refused.
async fn unreachable_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Read until EOF, asserting no further bytes arrive.
async fn assert_closed_without_bytes(stream: &mut TcpStream) {
    let mut buf = [0u8; 16];
    let n = timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("peer did not close")
        .unwrap_or(0);
    assert_eq!(n, 0, "unexpected bytes after expected close: {:?}", &buf[..n]);
}

#[tokio::test]
async fn test_rejects_client_with_no_acceptable_method() {
    let proxy = start_proxy(None, Vec::new()).await;
    let mut client = TcpStream::connect(proxy).await.unwrap();

    // Offer only GSSAPI (0x01) against a no-auth server.
    client.write_all(&[0x05, 0x01, 0x01]).await.unwrap();

    let mut reply = [0u8; 2];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0xFF]);
    assert_closed_without_bytes(&mut client).await;
}

#[tokio::test]
async fn test_rejects_noauth_client_when_auth_required() {
    let proxy = start_proxy(Some(Credentials::new("user:pencil")), Vec::new()).await;
    let mut client = TcpStream::connect(proxy).await.unwrap();

    client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();

    let mut reply = [0u8; 2];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0xFF]);
    assert_closed_without_bytes(&mut client).await;
}

#[tokio::test]
async fn test_userpass_success_then_request_proceeds() {
    let proxy = start_proxy(Some(Credentials::new("user:pencil")), Vec::new()).await;
    let mut client = TcpStream::connect(proxy).await.unwrap();

    client.write_all(&[0x05, 0x02, 0x00, 0x02]).await.unwrap();
    let mut reply = [0u8; 2];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0x02]);

    client.write_all(&[0x01, 0x04]).await.unwrap();
    client.write_all(b"user").await.unwrap();
    client.write_all(&[0x06]).await.unwrap();
    client.write_all(b"pencil").await.unwrap();

    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x01, 0x00]);

    // The request phase now proceeds normally; an unreachable
    // destination draws the general-failure reply rather than a close.
    let port = unreachable_port().await;
    let mut request = vec![0x05, 0x01, 0x00, 0x01, 127, 0, 0, 1];
    request.extend_from_slice(&port.to_be_bytes());
    client.write_all(&request).await.unwrap();

    let mut connect_reply = [0u8; 10];
    client.read_exact(&mut connect_reply).await.unwrap();
    assert_eq!(connect_reply[0], 0x05);
    assert_eq!(connect_reply[1], 0x01);
}

#[tokio::test]
async fn test_wrong_credentials_close_without_status_byte() {
    let proxy = start_proxy(Some(Credentials::new("user:pencil")), Vec::new()).await;
    let mut client = TcpStream::connect(proxy).await.unwrap();

    client.write_all(&[0x05, 0x01, 0x02]).await.unwrap();
    let mut reply = [0u8; 2];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0x02]);

    client.write_all(&[0x01, 0x04]).await.unwrap();
    client.write_all(b"user").await.unwrap();
    client.write_all(&[0x05]).await.unwrap();
    client.write_all(b"wrong").await.unwrap();

    // No success or failure byte after the method-selection reply.
    assert_closed_without_bytes(&mut client).await;
}

#[tokio::test]
async fn test_bad_userpass_subnegotiation_version_aborts() {
    let proxy = start_proxy(Some(Credentials::new("user:pencil")), Vec::new()).await;
    let mut client = TcpStream::connect(proxy).await.unwrap();

    client.write_all(&[0x05, 0x01, 0x02]).await.unwrap();
    let mut reply = [0u8; 2];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0x02]);

    client.write_all(&[0x02, 0x04]).await.unwrap();
    client.write_all(b"user").await.unwrap();
    client.write_all(&[0x06]).await.unwrap();
    client.write_all(b"pencil").await.unwrap();

    assert_closed_without_bytes(&mut client).await;
}

#[tokio::test]
async fn test_truncated_greeting_closes_without_reply() {
    let proxy = start_proxy(None, Vec::new()).await;
    let mut client = TcpStream::connect(proxy).await.unwrap();

    // Claim two methods, send only one, then close the write side.
    client.write_all(&[0x05, 0x02, 0x00]).await.unwrap();
    client.shutdown().await.unwrap();

    assert_closed_without_bytes(&mut client).await;
}

#[tokio::test]
async fn test_wrong_greeting_version_closes_without_reply() {
    let proxy = start_proxy(None, Vec::new()).await;
    let mut client = TcpStream::connect(proxy).await.unwrap();

    client.write_all(&[0x04, 0x01, 0x00]).await.unwrap();

    assert_closed_without_bytes(&mut client).await;
}

#[tokio::test]
async fn test_bind_command_is_rejected() {
    let proxy = start_proxy(None, Vec::new()).await;
    let mut client = TcpStream::connect(proxy).await.unwrap();

    client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
    let mut reply = [0u8; 2];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0x00]);

    // BIND (0x02) aborts with no reply at all.
    client
        .write_all(&[0x05, 0x02, 0x00, 0x01, 127, 0, 0, 1, 0x00, 0x50])
        .await
        .unwrap();

    assert_closed_without_bytes(&mut client).await;
}

#[tokio::test]
async fn test_unknown_address_type_is_rejected() {
    let proxy = start_proxy(None, Vec::new()).await;
    let mut client = TcpStream::connect(proxy).await.unwrap();

    client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
    let mut reply = [0u8; 2];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0x00]);

    client
        .write_all(&[0x05, 0x01, 0x00, 0x05, 1, 2, 3, 4, 0x00, 0x50])
        .await
        .unwrap();

    assert_closed_without_bytes(&mut client).await;
}

#[tokio::test]
async fn test_unreachable_destination_draws_exact_failure_reply() {
    let proxy = start_proxy(None, Vec::new()).await;
    let mut client = TcpStream::connect(proxy).await.unwrap();

    client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
    let mut reply = [0u8; 2];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0x00]);

    let port = unreachable_port().await;
    let mut request = vec![0x05, 0x01, 0x00, 0x01, 127, 0, 0, 1];
    request.extend_from_slice(&port.to_be_bytes());
    client.write_all(&request).await.unwrap();

    // Exactly ten bytes: general failure with a zeroed bound address.
    let mut connect_reply = [0u8; 10];
    client.read_exact(&mut connect_reply).await.unwrap();
    assert_eq!(
        connect_reply,
        [0x05, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
    );
    assert_closed_without_bytes(&mut client).await;
}
