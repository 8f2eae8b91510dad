//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use locale_gateway::config::GatewayConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Start a mock site renderer on an ephemeral port.
///
/// Every response is `200 OK` with the request target as the body. The
/// headers the gateway adds are echoed back as `x-seen-*` response headers.
pub async fn start_echo_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        let target = head
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("")
                            .to_string();
                        let locale = header_value(&head, "x-gateway-locale").unwrap_or("none");
                        let forwarded_for = header_value(&head, "x-forwarded-for").unwrap_or("none");
                        let forwarded_proto = header_value(&head, "x-forwarded-proto").unwrap_or("none");

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nx-seen-locale: {}\r\n\
                             x-seen-forwarded-for: {}\r\nx-seen-forwarded-proto: {}\r\n\
                             Connection: close\r\n\r\n{}",
                            target.len(),
                            locale,
                            forwarded_for,
                            forwarded_proto,
                            target
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Gateway config pointed at `upstream`.
pub fn gateway_config(upstream: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.url = format!("http://{}", upstream);
    config.upstream.connect_timeout_secs = 1;
    config
}

/// Build a GET request.
pub fn get(uri: &str, accept_language: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).header("host", "8px.app");
    if let Some(value) = accept_language {
        builder = builder.header("accept-language", value);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
    })
}
