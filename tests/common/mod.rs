//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Request bodies received by a mock webhook, in arrival order.
pub type Captured = Arc<Mutex<Vec<String>>>;

/// Start a mock webhook that records every POST body and answers `status`.
pub async fn start_mock_webhook(status: u16) -> (SocketAddr, Captured) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));

    let sink = captured.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let sink = sink.clone();
                    tokio::spawn(async move {
                        handle(socket, status, sink).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, captured)
}

async fn handle(mut socket: TcpStream, status: u16, sink: Captured) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    // Headers first, then exactly Content-Length bytes of body.
    let header_end = loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let end = buf.len().min(header_end + length);
    let body = String::from_utf8_lossy(&buf[header_end..end]).to_string();
    sink.lock().unwrap().push(body);

    let status_text = match status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let reply = "ok";
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        reply.len(),
        reply
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// One JSON access log line in the proxy's format.
pub fn log_line(status: u16, upstream_status: &str, pool: &str) -> String {
    log_line_at("2025-10-30T12:00:00+00:00", status, upstream_status, pool)
}

/// Like [`log_line`], with an explicit ISO-8601 timestamp.
pub fn log_line_at(timestamp: &str, status: u16, upstream_status: &str, pool: &str) -> String {
    serde_json::json!({
        "timestamp": timestamp,
        "remote_addr": "172.18.0.1",
        "request": "GET /version HTTP/1.1",
        "status": status,
        "body_bytes_sent": 57,
        "request_time": 0.004,
        "upstream_addr": "172.18.0.3:3000",
        "upstream_status": upstream_status,
        "upstream_response_time": "0.004",
        "pool": pool,
        "release": format!("{pool}-v1"),
    })
    .to_string()
}

/// Append raw text to a file, creating it if needed.
pub async fn append(path: &Path, text: &str) {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .unwrap();
    file.write_all(text.as_bytes()).await.unwrap();
    file.flush().await.unwrap();
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn wait_until<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
