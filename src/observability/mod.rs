//! OpenTelemetry-based observability with file-based span export.
//!
//! ```text
//! tracing spans → tracing-opentelemetry → OpenTelemetry SDK → FileSpanExporter → JSON lines
//! ```
//!
//! Spans from the orchestrator, the HTTP client and the persister end up in
//! `<data_dir>/reelsearch-spans.jsonl`, one JSON object per line. The file is
//! rotated to a single `.1` backup once it passes 5 MB.
//!
//! # Modules
//!
//! - [`init`]: Subscriber setup
//! - [`exporter`]: `SpanExporter` implementation and tracer provider
//! - [`record`]: Span to JSON conversion
//! - [`writer`]: Rotating line writer

pub mod exporter;
pub mod init;
pub mod record;
pub mod writer;

pub use init::{init_tracing, SERVICE_NAME, SPAN_FILE_NAME};
