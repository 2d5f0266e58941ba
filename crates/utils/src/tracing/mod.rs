use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

const DEFAULT_FILTER: &str = "info";

/// Initialize the tracing system
///
/// `level` wins over `RUST_LOG`; with neither set everything at `info` and
/// above is logged. Output goes to stderr so stdout stays machine readable.
pub fn init(level: Option<&str>) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = build_filter(level)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn build_filter(level: Option<&str>) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    match level {
        Some(level) => EnvFilter::try_new(level),
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER)),
    }
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span for one orchestrator operation
pub fn operation_span(operation: &str, node: Option<&str>, task: Option<&str>) -> Span {
    span!(
        Level::INFO,
        "bolt",
        operation = %operation,
        node = node.unwrap_or(""),
        task = task.unwrap_or("")
    )
}

/// Emit a structured event for cache lookups
pub fn cache_event(cache: &str, key: &str, hit: bool) {
    if hit {
        debug!(cache = %cache, key = %key, "cache_hit");
    } else {
        debug!(cache = %cache, key = %key, "cache_miss");
    }
}

/// Emit a structured event once an execution has finished
pub fn execution_completed(execution_id: &str, status: &str, duration_ms: u64) {
    if status == "failed" {
        warn!(
            execution_id = %execution_id,
            status = %status,
            duration_ms = %duration_ms,
            "execution_failed"
        );
    } else {
        info!(
            execution_id = %execution_id,
            status = %status,
            duration_ms = %duration_ms,
            "execution_completed"
        );
    }
}
