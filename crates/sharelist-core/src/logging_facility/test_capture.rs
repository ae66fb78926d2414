//! In-memory capture of log events for test assertions
//!
//! One capture subscriber is installed per test process. Tests share it, so
//! every assertion keys on an operation name.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use sharelist_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_EVENT, FIELD_OP,
};

/// A captured log event, every field rendered as a string
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub op: Option<String>,
    pub event: Option<String>,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn is(&self, event: &str) -> bool {
        self.event.as_deref() == Some(event)
    }
}

/// The lifecycle events one operation emitted, split by event name
#[derive(Clone, Debug, Default)]
pub struct OpLifecycle {
    pub starts: Vec<CapturedEvent>,
    pub ends: Vec<CapturedEvent>,
    pub errors: Vec<CapturedEvent>,
}

impl OpLifecycle {
    /// Exactly one start followed by exactly one terminal event
    pub fn is_balanced(&self) -> bool {
        self.starts.len() == 1 && self.ends.len() + self.errors.len() == 1
    }
}

#[derive(Default)]
struct FieldVisitor(HashMap<String, String>);

impl FieldVisitor {
    fn put(&mut self, field: &Field, value: String) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }
}

type Sink = Arc<Mutex<Vec<CapturedEvent>>>;

struct CaptureLayer(Sink);

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let fields = visitor.0;

        let captured = CapturedEvent {
            level: *event.metadata().level(),
            op: fields.get(FIELD_OP).cloned(),
            event: fields.get(FIELD_EVENT).cloned(),
            fields,
        };
        if let Ok(mut sink) = self.0.lock() {
            sink.push(captured);
        }
    }
}

/// Handle onto the process-wide capture
#[derive(Clone)]
pub struct TestCapture(Sink);

impl TestCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.0.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events emitted for `op`, in emission order
    pub fn events_for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.op.as_deref() == Some(op))
            .collect()
    }

    /// Start, end and error events of `op`
    pub fn lifecycle(&self, op: &str) -> OpLifecycle {
        let mut lifecycle = OpLifecycle::default();
        for event in self.events_for_op(op) {
            if event.is(EVENT_START) {
                lifecycle.starts.push(event);
            } else if event.is(EVENT_END) {
                lifecycle.ends.push(event);
            } else if event.is(EVENT_END_ERROR) {
                lifecycle.errors.push(event);
            }
        }
        lifecycle
    }

    /// # Panics
    ///
    /// Panics if no event named `event` was captured for `op`
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let events = self.events();
        assert!(
            events
                .iter()
                .any(|e| e.op.as_deref() == Some(op) && e.is(event)),
            "Expected event op={op} event={event} not found in {} captured events",
            events.len()
        );
    }

    /// # Panics
    ///
    /// Panics if any captured field value contains `needle`
    pub fn assert_no_field_contains(&self, needle: &str) {
        if let Some(event) = self
            .events()
            .into_iter()
            .find(|e| e.fields.values().any(|v| v.contains(needle)))
        {
            panic!("Captured event op={:?} leaks {needle:?}", event.op);
        }
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture subscriber on first use and return its handle
///
/// ```
/// use sharelist_core::logging_facility::test_capture::init_test_capture;
/// use sharelist_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_example_op");
/// capture.assert_event_exists("doc_example_op", "start");
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let sink = Sink::default();
            tracing_subscriber::registry()
                .with(CaptureLayer(sink.clone()))
                .init();
            TestCapture(sink)
        })
        .clone()
}
