//! Tracing initialization and subscriber setup.

use super::exporter;
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::resource::Resource;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Service name attached to every exported span.
pub const SERVICE_NAME: &str = "reelsearch";

/// Span file name inside the data directory.
pub const SPAN_FILE_NAME: &str = "reelsearch-spans.jsonl";

/// Installs the global tracing subscriber with file span export.
///
/// Spans are filtered by `config.trace_level` (default `"info"`; an invalid
/// directive also falls back to `"info"`) and written to
/// `<data_dir>/reelsearch-spans.jsonl`.
///
/// Observability is optional: if the data directory cannot be created this
/// returns without installing anything, and only the first call in a process
/// takes effect.
///
/// # Example
///
/// ```rust
/// use reelsearch::observability::init_tracing;
/// use reelsearch::Config;
///
/// let dir = std::env::temp_dir().join("reelsearch-doc");
/// let config = Config {
///     trace_level: Some("debug".to_string()),
///     data_dir: Some(dir.to_string_lossy().into_owned()),
///     ..Default::default()
/// };
///
/// init_tracing(&config);
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) {
    let level = config.trace_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let data_dir = crate::infrastructure::data_dir(config);
    if std::fs::create_dir_all(&data_dir).is_err() {
        return;
    }

    let resource = Resource::new(vec![opentelemetry::KeyValue::new(
        "service.name",
        SERVICE_NAME,
    )]);
    let provider =
        exporter::create_tracer_provider(SERVICE_NAME, data_dir.join(SPAN_FILE_NAME), resource);

    let otel_layer = OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(otel_layer)
        .try_init();
}
