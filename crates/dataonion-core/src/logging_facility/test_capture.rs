//! In-memory capture of lifecycle events for tests
//!
//! Only events carrying an `op` field are kept; `tracing::debug!` detail
//! lines are dropped. Every test binary shares one buffer, so tests query
//! by op and context key rather than reading everything.
//!
//! ```
//! use dataonion_core::log_op_start;
//! use dataonion_core::logging_facility::test_capture::init_test_capture;
//!
//! let capture = init_test_capture();
//! log_op_start!("doc_capture_op", context_key = "orders");
//! capture.assert_logged("doc_capture_op", Some("orders"), "start");
//! ```

use dataonion_core_types::schema::{
    FIELD_COMPONENT, FIELD_CONTEXT_ID, FIELD_CONTEXT_KEY, FIELD_DURATION_MS, FIELD_ERR_CODE,
    FIELD_ERR_KIND, FIELD_EVENT, FIELD_OP,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One captured lifecycle event
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub op: String,
    pub event: Option<String>,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn is(&self, event: &str) -> bool {
        self.event.as_deref() == Some(event)
    }

    /// Module path of the code that logged the event
    pub fn component(&self) -> Option<&str> {
        self.field(FIELD_COMPONENT)
    }

    pub fn context_key(&self) -> Option<&str> {
        self.field(FIELD_CONTEXT_KEY)
    }

    pub fn context_id(&self) -> Option<&str> {
        self.field(FIELD_CONTEXT_ID)
    }

    pub fn err_code(&self) -> Option<&str> {
        self.field(FIELD_ERR_CODE)
    }

    pub fn err_kind(&self) -> Option<&str> {
        self.field(FIELD_ERR_KIND)
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.field(FIELD_DURATION_MS).and_then(|v| v.parse().ok())
    }
}

#[derive(Default)]
struct FieldVisitor {
    fields: HashMap<String, String>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: String) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.to_string());
    }
}

struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let Some(op) = visitor.fields.get(FIELD_OP).cloned() else {
            return;
        };
        let captured = CapturedEvent {
            level: *event.metadata().level(),
            op,
            event: visitor.fields.get(FIELD_EVENT).cloned(),
            fields: visitor.fields,
        };

        if let Ok(mut events) = self.events.lock() {
            events.push(captured);
        }
    }
}

/// Handle to the shared capture buffer
#[derive(Clone)]
pub struct TestCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    /// Events for `op`, narrowed to one context key when given
    pub fn events_for(&self, op: &str, context_key: Option<&str>) -> Vec<CapturedEvent> {
        let Ok(events) = self.events.lock() else {
            return Vec::new();
        };
        events
            .iter()
            .filter(|e| e.op == op)
            .filter(|e| context_key.map_or(true, |key| e.context_key() == Some(key)))
            .cloned()
            .collect()
    }

    /// Events for `op` (and key) that are of kind `event`
    pub fn lifecycle(
        &self,
        op: &str,
        context_key: Option<&str>,
        event: &str,
    ) -> Vec<CapturedEvent> {
        self.events_for(op, context_key)
            .into_iter()
            .filter(|e| e.is(event))
            .collect()
    }

    /// # Panics
    ///
    /// Panics when no matching event was captured
    pub fn assert_logged(&self, op: &str, context_key: Option<&str>, event: &str) {
        let seen = self.events_for(op, context_key);
        assert!(
            seen.iter().any(|e| e.is(event)),
            "Expected event op={} event={} context_key={:?}; captured for op: {:?}",
            op,
            event,
            context_key,
            seen.iter().map(|e| e.event.as_deref()).collect::<Vec<_>>()
        );
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture subscriber (once per process) and return its handle
///
/// If another global subscriber was installed first, the handle stays empty.
pub fn init_test_capture() -> TestCapture {
    install().0
}

/// The shared handle, and whether this call installed the subscriber
pub(crate) fn install() -> (TestCapture, bool) {
    let mut installed = false;
    let capture = GLOBAL_CAPTURE.get_or_init(|| {
        let events = Arc::new(Mutex::new(Vec::new()));
        let layer = CaptureLayer {
            events: events.clone(),
        };
        installed = tracing_subscriber::registry().with(layer).try_init().is_ok();
        TestCapture { events }
    });
    (capture.clone(), installed)
}
