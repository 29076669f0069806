//! In-memory event capture for logging assertions
//!
//! A `tracing` layer that stores every event with its fields, so tests can
//! check which boundary events an operation on the store produced.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use statetree_core_types::schema::{FIELD_ACTION, FIELD_COMPONENT, FIELD_EVENT, FIELD_OP};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One captured event
///
/// The canonical keys are lifted out of `fields` for convenience; `fields`
/// still holds every recorded value, rendered as a string.
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub component: Option<String>,
    pub op: Option<String>,
    pub event: Option<String>,
    pub action: Option<String>,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn from_fields(level: Level, fields: HashMap<String, String>) -> Self {
        let lift = |key: &str| fields.get(key).cloned();
        Self {
            level,
            component: lift(FIELD_COMPONENT),
            op: lift(FIELD_OP),
            event: lift(FIELD_EVENT),
            action: lift(FIELD_ACTION),
            fields,
        }
    }

    /// Value of an arbitrary field
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// True for an event of boundary `op` with lifecycle `event`
    pub fn is(&self, op: &str, event: &str) -> bool {
        self.op.as_deref() == Some(op) && self.event.as_deref() == Some(event)
    }
}

#[derive(Default)]
struct FieldCollector(HashMap<String, String>);

impl Visit for FieldCollector {
    // Numbers and booleans arrive here too and render without quotes.
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        let captured = CapturedEvent::from_fields(*event.metadata().level(), collector.0);
        if let Ok(mut events) = self.events.lock() {
            events.push(captured);
        }
    }
}

/// Shared handle onto the captured events
#[derive(Clone, Default)]
pub struct TestCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    fn layer(&self) -> CaptureLayer {
        CaptureLayer {
            events: self.events.clone(),
        }
    }

    /// Snapshot of every event captured so far
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events of boundary `op` with lifecycle `event`
    pub fn boundary(&self, op: &str, event: &str) -> Vec<CapturedEvent> {
        self.events().into_iter().filter(|e| e.is(op, event)).collect()
    }

    /// Events emitted by `invoke` for the action `name`
    pub fn action_events(&self, name: &str, event: &str) -> Vec<CapturedEvent> {
        self.boundary("invoke_action", event)
            .into_iter()
            .filter(|e| e.action.as_deref() == Some(name))
            .collect()
    }

    /// # Panics
    ///
    /// Panics if no event of boundary `op` with lifecycle `event` was captured.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let total = self.events().len();
        assert!(
            !self.boundary(op, event).is_empty(),
            "no {} event for op {} among {} captured events",
            event,
            op,
            total
        );
    }

    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer as the global subscriber and return its handle
///
/// Every call returns the same handle. Tests in one binary run in parallel
/// and share the buffer, so filter on an op or action name unique to the
/// test.
///
/// # Example
///
/// ```
/// use statetree_core::logging_facility::test_capture::init_test_capture;
/// use statetree_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_example_op");
/// capture.assert_event_exists("doc_example_op", "start");
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let capture = TestCapture::default();
            if tracing_subscriber::registry()
                .with(capture.layer())
                .try_init()
                .is_err()
            {
                tracing::warn!("test capture installed after another global subscriber");
            }
            capture
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(op: &str, lifecycle: &str, action: Option<&str>) -> CapturedEvent {
        let mut fields = HashMap::new();
        fields.insert(FIELD_OP.to_string(), op.to_string());
        fields.insert(FIELD_EVENT.to_string(), lifecycle.to_string());
        if let Some(action) = action {
            fields.insert(FIELD_ACTION.to_string(), action.to_string());
        }
        CapturedEvent::from_fields(Level::INFO, fields)
    }

    #[test]
    fn test_canonical_fields_are_lifted() {
        let captured = event("invoke_action", "start", Some("setCustomer"));

        assert_eq!(captured.op.as_deref(), Some("invoke_action"));
        assert_eq!(captured.action.as_deref(), Some("setCustomer"));
        assert_eq!(captured.field(FIELD_EVENT), Some("start"));
        assert!(captured.is("invoke_action", "start"));
        assert!(captured.component.is_none());
    }

    #[test]
    fn test_boundary_and_action_filters() {
        let capture = TestCapture::default();
        if let Ok(mut events) = capture.events.lock() {
            events.push(event("invoke_action", "start", Some("addRow")));
            events.push(event("invoke_action", "end", Some("addRow")));
            events.push(event("clone_node", "end", None));
        }

        assert_eq!(capture.boundary("clone_node", "end").len(), 1);
        assert_eq!(capture.action_events("addRow", "end").len(), 1);
        assert!(capture.action_events("setCustomer", "end").is_empty());

        capture.clear();
        assert!(capture.events().is_empty());
    }
}
