//! HTTP client port used by the latency prober.
//!
//! Allows tb-core to issue probe requests without depending on a specific
//! HTTP client library at the call site. The reqwest implementation lives in
//! tb-core; tests inject scripted clients.

use crate::errors::TunnelError;
use std::future::Future;
use std::pin::Pin;

/// A probe request: always a GET, the client owns proxy and timeout settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Full URL
    pub url: String,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// What the prober needs from a response. The body has already been released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Canonical reason phrase, empty when unknown
    pub reason: String,
}

impl HttpResponse {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// Status line in the `"403 Forbidden"` form.
    pub fn status_line(&self) -> String {
        if self.reason.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {}", self.status, self.reason)
        }
    }

    pub fn is_no_content(&self) -> bool {
        self.status == 204
    }
}

/// Boxed future returned by [`HttpClient::execute`].
pub type HttpFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, TunnelError>> + Send + 'a>>;

/// Port trait for performing probe requests.
///
/// Implementations must release the response body before resolving, on every
/// path, and report transport failures as [`TunnelError::ProbeTransport`].
pub trait HttpClient: Send + Sync {
    fn execute(&self, req: HttpRequest) -> HttpFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_formats() {
        assert_eq!(HttpResponse::new(403, "Forbidden").status_line(), "403 Forbidden");
        assert_eq!(HttpResponse::new(599, "").status_line(), "599");
        assert!(HttpResponse::new(204, "No Content").is_no_content());
    }
}
