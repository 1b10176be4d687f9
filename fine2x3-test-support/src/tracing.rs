//! A recording layer for asserting on spans and events in tests.

use std::{
    collections::HashMap,
    fmt::{self, Write as _},
    sync::{Arc, Mutex, PoisonError},
};

use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    span::{Attributes, Id, Record},
};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

/// Captures closed spans and emitted events for later assertions.
///
/// Clones share the same buffers, so a test keeps one clone while another is
/// installed in the subscriber.
///
/// # Examples
/// ```
/// use fine2x3_test_support::tracing::RecordingLayer;
/// use tracing::Level;
///
/// let (value, layer) = RecordingLayer::capture(|| {
///     let _span = tracing::info_span!("catalog.open", trace_count = 4).entered();
///     tracing::info!(graphs = 3, "catalog opened");
///     7
/// });
/// assert_eq!(value, 7);
/// let span = layer.span("catalog.open").expect("span closed");
/// assert_eq!(span.field("trace_count"), Some("4"));
/// assert!(layer.has_event(Level::INFO, "catalog opened"));
/// ```
#[derive(Clone, Default)]
pub struct RecordingLayer {
    recorded: Arc<Mutex<Recorded>>,
}

#[derive(Default)]
struct Recorded {
    spans: Vec<SpanRecord>,
    events: Vec<EventRecord>,
}

impl RecordingLayer {
    /// Runs `f` under a fresh registry with a recording layer installed and
    /// returns its result together with the layer.
    pub fn capture<T>(f: impl FnOnce() -> T) -> (T, Self) {
        use tracing_subscriber::layer::SubscriberExt as _;

        let layer = Self::default();
        let subscriber = tracing_subscriber::registry().with(layer.clone());
        let value = tracing::subscriber::with_default(subscriber, f);
        (value, layer)
    }

    /// Closed spans in completion order.
    #[must_use]
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.with_recorded(|recorded| recorded.spans.clone())
    }

    /// Emitted events in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<EventRecord> {
        self.with_recorded(|recorded| recorded.events.clone())
    }

    /// The first closed span called `name`.
    #[must_use]
    pub fn span(&self, name: &str) -> Option<SpanRecord> {
        self.with_recorded(|recorded| {
            recorded
                .spans
                .iter()
                .find(|span| span.name == name)
                .cloned()
        })
    }

    /// Returns `true` when an event at `level` carried `message`.
    #[must_use]
    pub fn has_event(&self, level: Level, message: &str) -> bool {
        self.with_recorded(|recorded| {
            recorded
                .events
                .iter()
                .any(|event| event.level == level && event.message() == Some(message))
        })
    }

    fn with_recorded<T>(&self, read: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut recorded = self.recorded.lock().unwrap_or_else(PoisonError::into_inner);
        read(&mut recorded)
    }
}

/// A closed span's name and the fields recorded against it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpanRecord {
    /// Span name from the callsite metadata.
    pub name: String,
    /// Fields recorded at creation or later through `Span::record`.
    pub fields: HashMap<String, String>,
}

impl SpanRecord {
    /// The rendered value of `name`, if it was recorded.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// An emitted event's level, target, and fields.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EventRecord {
    /// Event level.
    pub level: Level,
    /// Module path or explicit target of the callsite.
    pub target: String,
    /// Structured fields, including `message`.
    pub fields: HashMap<String, String>,
}

impl EventRecord {
    /// The event's message, if it had one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.fields.get("message").map(String::as_str)
    }
}

/// Fields of a span that is still open.
struct OpenSpan(SpanRecord);

impl<S> Layer<S> for RecordingLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut record = SpanRecord {
            name: attrs.metadata().name().to_owned(),
            fields: HashMap::new(),
        };
        attrs.record(&mut FieldRecorder(&mut record.fields));
        span.extensions_mut().insert(OpenSpan(record));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        if let Some(OpenSpan(record)) = span.extensions_mut().get_mut::<OpenSpan>() {
            values.record(&mut FieldRecorder(&mut record.fields));
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else {
            return;
        };
        if let Some(OpenSpan(record)) = span.extensions_mut().remove::<OpenSpan>() {
            self.with_recorded(|recorded| recorded.spans.push(record));
        }
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        event.record(&mut FieldRecorder(&mut fields));
        let record = EventRecord {
            level: *event.metadata().level(),
            target: event.metadata().target().to_owned(),
            fields,
        };
        self.with_recorded(|recorded| recorded.events.push(record));
    }
}

/// Renders every visited field to a string.
struct FieldRecorder<'a>(&'a mut HashMap<String, String>);

impl FieldRecorder<'_> {
    fn put(&mut self, field: &Field, value: String) {
        self.0.insert(field.name().to_owned(), value);
    }
}

impl Visit for FieldRecorder<'_> {
    fn record_bytes(&mut self, field: &Field, value: &[u8]) {
        let mut hex = String::with_capacity(value.len() * 2);
        for byte in value {
            let _ = write!(hex, "{byte:02x}");
        }
        self.put(field, hex);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_owned());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tracing::field;

    use super::*;

    #[rstest]
    fn late_recorded_fields_reach_the_closed_span() {
        let ((), layer) = RecordingLayer::capture(|| {
            let span = tracing::info_span!("factor.search", found = field::Empty);
            span.record("found", 3_u64);
        });
        let span = layer.span("factor.search").expect("span should close");
        assert_eq!(span.field("found"), Some("3"));
    }

    #[rstest]
    fn events_keep_level_and_message() {
        let ((), layer) = RecordingLayer::capture(|| {
            tracing::warn!(key = "ab", "stored key looks odd");
            tracing::debug!(ok = true, "recorded new traces");
        });
        assert!(layer.has_event(Level::WARN, "stored key looks odd"));
        assert!(layer.has_event(Level::DEBUG, "recorded new traces"));
        assert!(!layer.has_event(Level::INFO, "recorded new traces"));
        let events = layer.events();
        assert_eq!(events[1].fields.get("ok"), Some(&"true".to_owned()));
    }

    #[rstest]
    fn clones_share_recordings() {
        let layer = RecordingLayer::default();
        let other = layer.clone();
        other.with_recorded(|recorded| {
            recorded.spans.push(SpanRecord {
                name: "walker.run".to_owned(),
                fields: HashMap::new(),
            });
        });
        assert_eq!(layer.spans().len(), 1);
        assert!(layer.events().is_empty());
    }
}
