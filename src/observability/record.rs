//! Flat JSON rendering of finished spans.
//!
//! Each span becomes one self-contained JSON object, so the span file can be
//! read with line-oriented tools:
//!
//! ```json
//! {"service":"reelsearch","trace_id":"4bf92f3577b34da6a3ce929d0e0e4736","span_id":"00f067aa0ba902b7",
//!  "name":"fetch","start_unix_nanos":1700000000000000000,"duration_us":1520,
//!  "attributes":{"query":"dune","page":1,"seq":3},"status":"unset"}
//! ```

use opentelemetry::trace::{SpanId, Status};
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::export::trace::SpanData;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanRecord {
    pub service: String,
    pub trace_id: String,
    pub span_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    pub name: String,
    pub start_unix_nanos: u64,
    pub duration_us: u64,
    pub attributes: BTreeMap<String, JsonValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventRecord>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

/// A log event recorded inside a span, timed relative to the span start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub name: String,
    pub offset_us: u64,
    pub attributes: BTreeMap<String, JsonValue>,
}

impl SpanRecord {
    #[must_use]
    pub fn from_span(service: &str, span: &SpanData) -> Self {
        let (status, status_message) = match &span.status {
            Status::Unset => ("unset", None),
            Status::Ok => ("ok", None),
            Status::Error { description } => ("error", Some(description.to_string())),
        };

        Self {
            service: service.to_string(),
            trace_id: format!("{:032x}", span.span_context.trace_id()),
            span_id: format!("{:016x}", span.span_context.span_id()),
            parent_span_id: (span.parent_span_id != SpanId::INVALID)
                .then(|| format!("{:016x}", span.parent_span_id)),
            name: span.name.to_string(),
            start_unix_nanos: unix_nanos(span.start_time),
            duration_us: micros_between(span.start_time, span.end_time),
            attributes: attribute_map(&span.attributes),
            events: span
                .events
                .iter()
                .map(|event| EventRecord {
                    name: event.name.to_string(),
                    offset_us: micros_between(span.start_time, event.timestamp),
                    attributes: attribute_map(&event.attributes),
                })
                .collect(),
            status,
            status_message,
        }
    }

    /// Serializes the record as a single line of JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn attribute_map(attributes: &[KeyValue]) -> BTreeMap<String, JsonValue> {
    attributes
        .iter()
        .map(|kv| (kv.key.to_string(), attribute_value(&kv.value)))
        .collect()
}

/// Maps an attribute onto the closest JSON type. Arrays are rendered as text.
pub fn attribute_value(value: &Value) -> JsonValue {
    match value {
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::I64(i) => JsonValue::from(*i),
        Value::F64(f) => JsonValue::from(*f),
        Value::String(s) => JsonValue::String(s.to_string()),
        Value::Array(_) => JsonValue::String(value.to_string()),
    }
}

/// Nanoseconds since the Unix epoch; 0 for earlier times.
pub fn unix_nanos(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
}

fn micros_between(start: SystemTime, end: SystemTime) -> u64 {
    end.duration_since(start)
        .map_or(0, |d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn attribute_values_keep_their_json_type() {
        assert_eq!(attribute_value(&Value::Bool(true)), JsonValue::Bool(true));
        assert_eq!(attribute_value(&Value::I64(3)), JsonValue::from(3));
        assert_eq!(attribute_value(&Value::F64(1.5)), JsonValue::from(1.5));
        assert_eq!(attribute_value(&Value::from("dune")), JsonValue::from("dune"));
    }

    #[test]
    fn times_before_epoch_or_reversed_clamp_to_zero() {
        let start = UNIX_EPOCH + Duration::from_secs(10);
        assert_eq!(unix_nanos(UNIX_EPOCH), 0);
        assert_eq!(unix_nanos(start), 10_000_000_000);
        assert_eq!(micros_between(start, start + Duration::from_millis(2)), 2_000);
        assert_eq!(micros_between(start + Duration::from_millis(2), start), 0);
    }

    #[test]
    fn attribute_map_uses_keys_as_object_fields() {
        let map = attribute_map(&[KeyValue::new("query", "dune"), KeyValue::new("page", 2_i64)]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"page":2,"query":"dune"}"#);
    }
}
