//! Mock SOCKS5 server for probe testing
//! 用于探测测试的 Mock SOCKS5 服务器
//!
//! Accepts a no-auth CONNECT to any target, then plays the target itself: each
//! HTTP request on the tunnelled stream gets the next status from a script,
//! after a fixed delay. The last status repeats once the script runs out.
//! 接受任意目标的无认证 CONNECT，随后自身充当目标：
//! 隧道内每个 HTTP 请求按脚本返回下一个状态码，并带有固定延迟。
//! 脚本用尽后重复最后一个状态码。
//!
//! `204` responses carry no body; other statuses carry a short body with
//! `Content-Length`, so clients must drain it to reuse the connection. With
//! [`MockOptions::truncate_body`] set, non-204 bodies are cut short and the
//! connection is closed.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Behaviour of a mock server.
#[derive(Debug, Clone, Default)]
pub struct MockOptions {
    /// Status per request, in order; the last one repeats.
    pub statuses: Vec<u16>,
    /// Wait before each response.
    pub delay: Duration,
    /// Announce a longer body than is sent for non-204 responses, then close.
    pub truncate_body: bool,
}

#[derive(Debug, Default)]
struct Shared {
    opts: MockOptions,
    requests: AtomicUsize,
    connects: AtomicUsize,
    targets: Mutex<Vec<String>>,
}

/// Handle to a running mock server. The accept loop lives as long as the
/// runtime that started it.
#[derive(Debug, Clone)]
pub struct MockProbeServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl MockProbeServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `socks5://127.0.0.1:<port>`
    pub fn uri(&self) -> String {
        format!("socks5://{}", self.addr)
    }

    /// HTTP requests answered so far.
    pub fn requests(&self) -> usize {
        self.shared.requests.load(Ordering::SeqCst)
    }

    /// SOCKS CONNECT commands accepted so far.
    pub fn connects(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    /// CONNECT targets in `host:port` form, in arrival order.
    pub fn targets(&self) -> Vec<String> {
        self.shared
            .targets
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }
}

/// Start the mock on an ephemeral loopback port.
///
/// # Errors
///
/// Returns an error if binding the TCP listener fails.
pub async fn start_mock_socks5_http(
    statuses: Vec<u16>,
    delay: Duration,
) -> anyhow::Result<MockProbeServer> {
    start_mock_socks5_with(MockOptions {
        statuses,
        delay,
        truncate_body: false,
    })
    .await
}

/// [`start_mock_socks5_http`] with full control over the replies.
pub async fn start_mock_socks5_with(opts: MockOptions) -> anyhow::Result<MockProbeServer> {
    anyhow::ensure!(!opts.statuses.is_empty(), "status script must not be empty");

    let tcp = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = tcp.local_addr()?;
    let shared = Arc::new(Shared {
        opts,
        ..Default::default()
    });

    let accept_shared = shared.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _peer)) = tcp.accept().await else {
                continue;
            };
            let shared = accept_shared.clone();
            tokio::spawn(async move {
                if let Err(e) = serve(&mut stream, &shared).await {
                    tracing::debug!(error = %e, "mock socks5 session ended");
                }
            });
        }
    });

    Ok(MockProbeServer { addr, shared })
}

async fn serve(stream: &mut TcpStream, shared: &Shared) -> anyhow::Result<()> {
    let target = handshake(stream).await?;
    shared.connects.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut targets) = shared.targets.lock() {
        targets.push(target);
    }

    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        // One request per header block; probes are GETs without a body.
        let end = loop {
            if let Some(pos) = find_header_end(&buf) {
                break pos;
            }
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Ok(());
            }
            buf.extend_from_slice(&chunk[..n]);
        };
        buf.drain(..end);

        let opts = &shared.opts;
        let index = shared.requests.fetch_add(1, Ordering::SeqCst);
        let status = opts.statuses[index.min(opts.statuses.len() - 1)];
        if !opts.delay.is_zero() {
            tokio::time::sleep(opts.delay).await;
        }
        let truncated = opts.truncate_body && status != 204;
        stream.write_all(response(status, truncated).as_bytes()).await?;
        if truncated {
            stream.shutdown().await?;
            return Ok(());
        }
    }
}

/// Handle SOCKS5 greeting and CONNECT; returns the requested target.
async fn handshake(stream: &mut TcpStream) -> anyhow::Result<String> {
    // Read greeting: VER(1) + NMETHODS(1)
    let mut greeting = [0u8; 2];
    stream.read_exact(&mut greeting).await?;
    if greeting[0] != 0x05 {
        anyhow::bail!("Invalid SOCKS version: {}", greeting[0]);
    }

    let mut methods = vec![0u8; greeting[1] as usize];
    stream.read_exact(&mut methods).await?;
    if !methods.contains(&0x00) {
        stream.write_all(&[0x05, 0xFF]).await?;
        anyhow::bail!("No supported authentication method");
    }
    stream.write_all(&[0x05, 0x00]).await?;

    // Read request: VER(1) + CMD(1) + RSV(1) + ATYP(1)
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;
    if header[1] != 0x01 {
        // Only CONNECT
        stream.write_all(&[0x05, 0x07, 0x00, 0x01, 0, 0, 0, 0, 0, 0]).await?;
        anyhow::bail!("Command not supported: {}", header[1]);
    }

    let host = match header[3] {
        0x01 => {
            let mut ip = [0u8; 4];
            stream.read_exact(&mut ip).await?;
            Ipv4Addr::from(ip).to_string()
        }
        0x04 => {
            let mut ip = [0u8; 16];
            stream.read_exact(&mut ip).await?;
            format!("[{}]", std::net::Ipv6Addr::from(ip))
        }
        0x03 => {
            let mut len = [0u8; 1];
            stream.read_exact(&mut len).await?;
            let mut name = vec![0u8; len[0] as usize];
            stream.read_exact(&mut name).await?;
            String::from_utf8_lossy(&name).into_owned()
        }
        other => anyhow::bail!("Unsupported ATYP: {other}"),
    };
    let mut port = [0u8; 2];
    stream.read_exact(&mut port).await?;

    // Success, bound to 0.0.0.0:0
    stream.write_all(&[0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0]).await?;
    Ok(format!("{host}:{}", u16::from_be_bytes(port)))
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn response(status: u16, truncated: bool) -> String {
    let reason = match status {
        200 => "OK",
        204 => "No Content",
        403 => "Forbidden",
        404 => "Not Found",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    };
    if status == 204 {
        format!("HTTP/1.1 {status} {reason}\r\n\r\n")
    } else {
        let body = "blocked";
        // A truncated reply promises more bytes than it sends.
        let length = if truncated { 100 } else { body.len() };
        format!(
            "HTTP/1.1 {status} {reason}\r\n\
             Content-Type: text/plain\r\n\
             Content-Length: {length}\r\n\r\n{body}"
        )
    }
}
