//! Reqwest-based implementation of the `HttpClient` port, routed through a
//! SOCKS5 proxy.
//!
//! Target names are resolved by the proxy, never locally: a `socks5://` URI is
//! handed to reqwest as `socks5h://`.

use std::borrow::Cow;
use std::error::Error as _;
use std::time::Duration;
use tb_types::ports::http::{HttpClient, HttpFuture, HttpRequest, HttpResponse};
use tb_types::{ErrorClass, IssueCode, TunnelError};

const SOCKS5_LOCAL_DNS: &str = "socks5://";
const SOCKS5_REMOTE_DNS: &str = "socks5h://";

pub struct ReqwestProbeClient {
    client: reqwest::Client,
}

impl ReqwestProbeClient {
    /// Client that sends every request through `proxy_uri` (e.g.
    /// `socks5://127.0.0.1:8899`) and gives up after `timeout`.
    pub fn new(proxy_uri: &str, timeout: Duration) -> Result<Self, TunnelError> {
        let invalid = |e: reqwest::Error| {
            TunnelError::construction(
                IssueCode::InvalidUri,
                "/proxy",
                format!("{proxy_uri}: {}", chain(&e)),
            )
        };
        let proxy = reqwest::Proxy::all(remote_dns_uri(proxy_uri).as_ref()).map_err(invalid)?;
        let client = reqwest::Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .build()
            .map_err(invalid)?;
        Ok(Self { client })
    }
}

/// `socks5://` → `socks5h://` (scheme is case-insensitive); other URIs pass through.
fn remote_dns_uri(proxy_uri: &str) -> Cow<'_, str> {
    let uri = proxy_uri.trim();
    match uri.get(..SOCKS5_LOCAL_DNS.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(SOCKS5_LOCAL_DNS) => {
            Cow::Owned(format!("{SOCKS5_REMOTE_DNS}{}", &uri[SOCKS5_LOCAL_DNS.len()..]))
        }
        _ => Cow::Borrowed(uri),
    }
}

// reqwest hides the interesting part (refused, reset, handshake) in the source chain.
fn chain(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    msg
}

fn classify(e: &reqwest::Error) -> TunnelError {
    let class = if e.is_timeout() {
        ErrorClass::Timeout
    } else if e.is_connect() || e.is_request() {
        ErrorClass::Io
    } else {
        ErrorClass::Protocol
    };
    TunnelError::transport(class, chain(e))
}

impl HttpClient for ReqwestProbeClient {
    fn execute(&self, req: HttpRequest) -> HttpFuture<'_> {
        Box::pin(async move {
            let response = self
                .client
                .get(&req.url)
                .send()
                .await
                .map_err(|e| classify(&e))?;

            let status = response.status();
            let resp = HttpResponse::new(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            );

            // Always drained; a broken body only matters when the status said success.
            if let Err(e) = response.bytes().await {
                if resp.is_no_content() {
                    return Err(classify(&e));
                }
                tracing::debug!(
                    status = resp.status,
                    error = %chain(&e),
                    "discarding unreadable body"
                );
            }
            Ok(resp)
        })
    }
}
