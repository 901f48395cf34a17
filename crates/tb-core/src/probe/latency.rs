//! Two-shot latency probe.
//!
//! Probe #1 warms the path (SOCKS handshake, TLS, connection pool) and is not
//! timed. Probe #2 is only issued after probe #1 answered 204, and only its
//! wall time is reported.

use super::reqwest_client::ReqwestProbeClient;
use std::sync::Arc;
use std::time::Duration;
use tb_config::defaults::{PROBE_TIMEOUT, PROBE_URL};
use tb_types::ports::http::{HttpClient, HttpRequest, HttpResponse};
use tb_types::TunnelError;
use tokio::time::Instant;

/// Environment override for the probe URL.
pub const ENV_PROBE_URL: &str = "TB_PROBE_URL";
/// Environment override for the per-request timeout, in milliseconds.
pub const ENV_PROBE_TIMEOUT_MS: &str = "TB_PROBE_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub url: String,
    pub timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            url: PROBE_URL.to_string(),
            timeout: PROBE_TIMEOUT,
        }
    }
}

impl ProbeOptions {
    /// Defaults, overridden by `TB_PROBE_URL` / `TB_PROBE_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut opts = Self::default();
        if let Some(url) = lookup(ENV_PROBE_URL).filter(|u| !u.trim().is_empty()) {
            opts.url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_PROBE_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => opts.timeout = Duration::from_millis(ms),
                _ => tracing::warn!(value = %raw, "ignoring invalid {}", ENV_PROBE_TIMEOUT_MS),
            }
        }
        opts
    }
}

/// Runs the two-shot probe through an [`HttpClient`].
#[derive(Clone)]
pub struct LatencyProber {
    client: Arc<dyn HttpClient>,
    url: String,
}

impl std::fmt::Debug for LatencyProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatencyProber").field("url", &self.url).finish()
    }
}

impl LatencyProber {
    pub fn new(client: Arc<dyn HttpClient>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn probe(&self, attempt: u8) -> Result<HttpResponse, TunnelError> {
        let resp = self.client.execute(HttpRequest::get(&self.url)).await?;
        if resp.is_no_content() {
            Ok(resp)
        } else {
            tracing::debug!(attempt, status = resp.status, url = %self.url, "probe rejected");
            Err(TunnelError::status(attempt, resp.status, resp.status_line()))
        }
    }

    /// Latency of the second probe in whole milliseconds.
    pub async fn measure(&self) -> Result<u64, TunnelError> {
        self.probe(1).await?;

        let start = Instant::now();
        self.probe(2).await?;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(url = %self.url, elapsed_ms, "latency measured");
        Ok(elapsed_ms)
    }
}

/// Measure latency through the SOCKS endpoint at `proxy_uri` with the default
/// probe URL and timeout.
pub async fn measure_latency(proxy_uri: &str) -> Result<u64, TunnelError> {
    measure_latency_with(proxy_uri, &ProbeOptions::default()).await
}

pub async fn measure_latency_with(
    proxy_uri: &str,
    opts: &ProbeOptions,
) -> Result<u64, TunnelError> {
    let client = ReqwestProbeClient::new(proxy_uri, opts.timeout)?;
    LatencyProber::new(Arc::new(client), opts.url.clone())
        .measure()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tb_types::ports::http::HttpFuture;
    use tb_types::{ErrorClass, IssueCode};

    /// Replays a fixed list of outcomes, each after a simulated delay.
    struct ScriptedClient {
        script: Mutex<VecDeque<(Duration, Result<HttpResponse, TunnelError>)>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<(u64, Result<HttpResponse, TunnelError>)>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(
                    script
                        .into_iter()
                        .map(|(ms, r)| (Duration::from_millis(ms), r))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl HttpClient for ScriptedClient {
        fn execute(&self, req: HttpRequest) -> HttpFuture<'_> {
            self.calls.lock().unwrap().push(req.url);
            let (delay, outcome) = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra probe");
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                outcome
            })
        }
    }

    fn ok204() -> Result<HttpResponse, TunnelError> {
        Ok(HttpResponse::new(204, "No Content"))
    }

    #[tokio::test(start_paused = true)]
    async fn second_probe_is_timed() {
        let client = ScriptedClient::new(vec![(450, ok204()), (120, ok204())]);
        let prober = LatencyProber::new(client.clone(), PROBE_URL);

        assert_eq!(prober.measure().await.unwrap(), 120);
        assert_eq!(client.calls(), 2);
        assert_eq!(
            client.calls.lock().unwrap().as_slice(),
            [PROBE_URL, PROBE_URL]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn first_probe_status_is_reported() {
        let client = ScriptedClient::new(vec![(10, Ok(HttpResponse::new(403, "Forbidden")))]);
        let prober = LatencyProber::new(client.clone(), PROBE_URL);

        let err = prober.measure().await.unwrap_err();
        assert!(err.to_string().contains("403"));
        assert_eq!(
            err,
            TunnelError::ProbeStatus {
                attempt: 1,
                status: 403,
                status_line: "403 Forbidden".into()
            }
        );
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_probe_status_is_reported() {
        let client = ScriptedClient::new(vec![
            (10, ok204()),
            (10, Ok(HttpResponse::new(200, "OK"))),
        ]);
        let err = LatencyProber::new(client, PROBE_URL)
            .measure()
            .await
            .unwrap_err();
        assert!(matches!(err, TunnelError::ProbeStatus { attempt: 2, status: 200, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_propagates_and_stops() {
        let client = ScriptedClient::new(vec![(
            3000,
            Err(TunnelError::transport(ErrorClass::Timeout, "operation timed out")),
        )]);
        let err = LatencyProber::new(client.clone(), PROBE_URL)
            .measure()
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Timeout);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_on_second_probe_propagates() {
        let client = ScriptedClient::new(vec![
            (5, ok204()),
            (5, Err(TunnelError::transport(ErrorClass::Io, "connection reset"))),
        ]);
        let err = LatencyProber::new(client, PROBE_URL)
            .measure()
            .await
            .unwrap_err();
        assert!(matches!(err, TunnelError::ProbeTransport { class: ErrorClass::Io, .. }));
    }

    #[test]
    fn options_from_lookup() {
        let opts = ProbeOptions::from_lookup(|_| None);
        assert_eq!(opts, ProbeOptions::default());
        assert_eq!(opts.timeout, Duration::from_secs(3));

        let opts = ProbeOptions::from_lookup(|k| match k {
            ENV_PROBE_URL => Some("http://127.0.0.1:9/generate_204".into()),
            ENV_PROBE_TIMEOUT_MS => Some("750".into()),
            _ => None,
        });
        assert_eq!(opts.url, "http://127.0.0.1:9/generate_204");
        assert_eq!(opts.timeout, Duration::from_millis(750));

        let opts =
            ProbeOptions::from_lookup(|k| (k == ENV_PROBE_TIMEOUT_MS).then(|| "soon".into()));
        assert_eq!(opts.timeout, PROBE_TIMEOUT);
    }

    #[tokio::test]
    async fn invalid_proxy_uri_is_a_construction_error() {
        let err = measure_latency("::not a uri::").await.unwrap_err();
        assert!(matches!(
            err,
            TunnelError::Construction { code: IssueCode::InvalidUri, .. }
        ));
    }
}
