//! Probe command - measure latency through a running SOCKS5 endpoint
//!
//! Issues the warm-up and timed probes against the no-content URL and prints
//! the second probe's round-trip time.

use crate::cli::output::emit;
use crate::cli::Format;
use anyhow::Result;
use clap::Args as ClapArgs;
use serde::Serialize;
use std::time::Duration;
use tb_config::build_socks_inbound;
use tb_config::defaults::{INBOUND_TAG, TEST_PROXY_PORT};
use tb_core::{measure_latency_with, ProbeOptions};

fn default_proxy_uri() -> String {
    build_socks_inbound(INBOUND_TAG, TEST_PROXY_PORT).endpoint_uri()
}

#[derive(ClapArgs, Debug)]
pub struct ProbeArgs {
    /// SOCKS5 endpoint to probe through
    #[arg(long, default_value_t = default_proxy_uri())]
    pub proxy: String,
    /// URL expected to answer 204 No Content [default: $TB_PROBE_URL or generate_204]
    #[arg(long)]
    pub url: Option<String>,
    /// Per-request timeout in milliseconds [default: $TB_PROBE_TIMEOUT_MS or 3000]
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,
    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub format: Format,
}

impl ProbeArgs {
    /// Environment first, then explicit flags.
    fn options(&self) -> ProbeOptions {
        let mut opts = ProbeOptions::from_env();
        if let Some(url) = &self.url {
            opts.url = url.clone();
        }
        if let Some(ms) = self.timeout_ms {
            opts.timeout = Duration::from_millis(ms);
        }
        opts
    }
}

#[derive(Serialize, Debug)]
struct ProbeReport {
    ok: bool,
    proxy: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class: Option<String>,
}

pub async fn main(args: ProbeArgs) -> Result<()> {
    let opts = args.options();
    let outcome = measure_latency_with(&args.proxy, &opts).await;

    let mut report = ProbeReport {
        ok: outcome.is_ok(),
        proxy: args.proxy.clone(),
        url: opts.url.clone(),
        latency_ms: None,
        error: None,
        class: None,
    };
    match &outcome {
        Ok(ms) => report.latency_ms = Some(*ms),
        Err(e) => {
            report.error = Some(e.to_string());
            report.class = Some(e.class().to_string());
        }
    }

    emit(
        args.format,
        || match &outcome {
            Ok(ms) => format!("{} via {}: {ms} ms", opts.url, args.proxy),
            Err(e) => format!("{} via {}: FAILED ({e})", opts.url, args.proxy),
        },
        &report,
    );

    outcome.map(|_| ()).map_err(anyhow::Error::from)
}
