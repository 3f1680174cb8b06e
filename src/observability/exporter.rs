//! OpenTelemetry span exporter writing JSON lines to a local file.

use super::record::SpanRecord;
use super::writer::RotatingWriter;
use futures_util::future::BoxFuture;
use opentelemetry::trace::TraceError;
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::trace::TracerProvider;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Writes every exported span as one [`SpanRecord`] line.
#[derive(Debug)]
pub struct FileSpanExporter {
    service: String,
    writer: RotatingWriter,
    is_shutdown: AtomicBool,
}

impl FileSpanExporter {
    #[must_use]
    pub fn new(service: impl Into<String>, writer: RotatingWriter) -> Self {
        Self {
            service: service.into(),
            writer,
            is_shutdown: AtomicBool::new(false),
        }
    }

    fn write_batch(&self, batch: &[SpanData]) -> ExportResult {
        for span in batch {
            let line = SpanRecord::from_span(&self.service, span)
                .to_line()
                .map_err(|e| TraceError::from(e.to_string()))?;
            self.writer
                .append_line(&line)
                .map_err(|e| TraceError::from(e.to_string()))?;
        }
        Ok(())
    }
}

impl SpanExporter for FileSpanExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        if self.is_shutdown.load(Ordering::SeqCst) {
            return Box::pin(std::future::ready(Err(TraceError::from(
                "exporter is shut down",
            ))));
        }
        Box::pin(std::future::ready(self.write_batch(&batch)))
    }

    fn shutdown(&mut self) {
        self.is_shutdown.store(true, Ordering::SeqCst);
    }
}

/// Builds a tracer provider exporting each span to `file_path` as it ends.
#[must_use]
pub fn create_tracer_provider(service: &str, file_path: PathBuf, resource: Resource) -> TracerProvider {
    let exporter = FileSpanExporter::new(service, RotatingWriter::new(file_path));

    TracerProvider::builder()
        .with_config(opentelemetry_sdk::trace::Config::default().with_resource(resource))
        .with_simple_exporter(exporter)
        .build()
}
