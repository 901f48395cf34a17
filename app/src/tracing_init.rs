use std::sync::OnceLock;

/// Ensure tracing is initialized only once across the application
static TRACING: OnceLock<()> = OnceLock::new();

/// Initialize tracing once, safe to call multiple times.
///
/// Level comes from `RUST_LOG`, then `TB_LOG_LEVEL`, default `info`.
/// `TB_LOG_FORMAT=json` switches to JSON lines. Logs go to stderr so command
/// output on stdout stays machine-readable.
pub fn init_tracing_once() {
    TRACING.get_or_init(|| {
        let filter = std::env::var("RUST_LOG")
            .or_else(|_| std::env::var("TB_LOG_LEVEL"))
            .unwrap_or_else(|_| "info".into());
        let fmt_json = std::env::var("TB_LOG_FORMAT")
            .ok()
            .is_some_and(|v| v.eq_ignore_ascii_case("json"));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
            .with_writer(std::io::stderr)
            .with_target(true);
        let _ = if fmt_json {
            builder.json().try_init()
        } else {
            builder.compact().try_init()
        };
        tracing::debug!("tracing initialized (json={})", fmt_json);
    });
}
