use std::io::{self, IsTerminal};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Crate target prefixes whose events are rendered by [`layer`].
pub const TARGET_PREFIXES: [&str; 3] = ["salary_etl", "salary_pipeline", "embedding_service"];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Returns `true` if an event target belongs to the ETL crates.
pub fn is_etl_target(target: &str) -> bool {
    TARGET_PREFIXES.iter().any(|p| target.starts_with(p))
}

/// Build a formatting layer that renders only events emitted by the ETL crates.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format, written to stdout
/// - Span close events (duration of instrumented HTTP calls)
/// - ANSI colors only when stdout is a terminal
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();

    let only_etl = filter::filter_fn(|meta| is_etl_target(meta.target()));

    fmt::layer()
        .compact()
        .with_writer(io::stdout)
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(false)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_filter(only_etl)
}

/// EnvFilter from `RUST_LOG`, or `default` when unset/invalid.
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_etl_targets_pass() {
        assert!(is_etl_target("salary_pipeline::sink"));
        assert!(is_etl_target("embedding_service::services::vertex_service"));
        assert!(is_etl_target("salary_etl"));
        assert!(!is_etl_target("hyper::proto"));
        assert!(!is_etl_target("mongodb::cmap"));
    }
}
