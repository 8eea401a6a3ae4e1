use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CustomizationError, Result};

pub const DASHBOARD_INITIALIZED: &str = "GDC.DASH/EVT.INITIALIZED";
pub const FILTER_CONTEXT_CHANGED: &str = "GDC.DASH/EVT.FILTER_CONTEXT.CHANGED";
pub const RENDER_RESOLVED: &str = "GDC.DASH/EVT.RENDER.RESOLVED";

/// Raw event payload delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl DashboardEvent {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = std::result::Result<(), HandlerError>;

type HandlerFn = dyn Fn(&DashboardEvent) -> HandlerResult + Send + Sync;

#[derive(Clone)]
pub struct EventHandler {
    call: Arc<HandlerFn>,
}

impl EventHandler {
    pub fn new<F>(call: F) -> Self
    where
        F: Fn(&DashboardEvent) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            call: Arc::new(call),
        }
    }

    /// Handler that cannot fail.
    pub fn infallible<F>(call: F) -> Self
    where
        F: Fn(&DashboardEvent) + Send + Sync + 'static,
    {
        Self::new(move |event| {
            call(event);
            Ok(())
        })
    }

    /// Run the handler, converting both returned errors and panics into a
    /// failure record.
    fn invoke(&self, event: &DashboardEvent, index: usize) -> Option<HandlerFailure> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.call)(event))) {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(HandlerFailure {
                event_type: event.event_type.clone(),
                handler_index: index,
                message: err.to_string(),
                panicked: false,
            }),
            Err(payload) => {
                let message = if let Some(message) = payload.downcast_ref::<&str>() {
                    (*message).to_string()
                } else if let Some(message) = payload.downcast_ref::<String>() {
                    message.clone()
                } else {
                    "unknown panic payload".to_string()
                };
                Some(HandlerFailure {
                    event_type: event.event_type.clone(),
                    handler_index: index,
                    message,
                    panicked: true,
                })
            }
        }
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventHandler(..)")
    }
}

/// A handler that failed during dispatch. Never aborts the dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerFailure {
    pub event_type: String,
    pub handler_index: usize,
    pub message: String,
    pub panicked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub event_type: String,
    pub invoked: usize,
    pub failures: Vec<HandlerFailure>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.invoked - self.failures.len()
    }

    pub(crate) fn absorb(&mut self, other: DispatchReport) {
        self.invoked += other.invoked;
        self.failures.extend(other.failures);
    }
}

/// Ordered handlers per event type.
#[derive(Debug, Clone, Default)]
pub struct EventHandlers {
    handlers: HashMap<String, Vec<EventHandler>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event_type: impl Into<String>, handler: EventHandler) {
        self.handlers
            .entry(event_type.into())
            .or_default()
            .push(handler);
    }

    pub fn handlers_for(&self, event_type: &str) -> Result<&[EventHandler]> {
        self.handlers
            .get(event_type)
            .map(Vec::as_slice)
            .ok_or_else(|| CustomizationError::event_not_found(event_type))
    }

    pub fn declares(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    pub fn total_handlers(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Invoke every handler for the event type in registration order.
    pub fn dispatch(&self, event: &DashboardEvent) -> Result<DispatchReport> {
        let handlers = self.handlers_for(&event.event_type)?;
        Ok(Self::run(handlers, event))
    }

    pub(crate) fn run(handlers: &[EventHandler], event: &DashboardEvent) -> DispatchReport {
        let failures = handlers
            .iter()
            .enumerate()
            .filter_map(|(index, handler)| handler.invoke(event, index))
            .collect();
        DispatchReport {
            event_type: event.event_type.clone(),
            invoked: handlers.len(),
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> EventHandler {
        let log = log.clone();
        EventHandler::infallible(move |_| log.lock().unwrap().push(label))
    }

    #[test]
    fn failing_handler_does_not_stop_dispatch() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut handlers = EventHandlers::new();
        handlers.add(DASHBOARD_INITIALIZED, recorder(&log, "first"));
        let failing_log = log.clone();
        handlers.add(
            DASHBOARD_INITIALIZED,
            EventHandler::new(move |_| {
                failing_log.lock().unwrap().push("second");
                Err("boom".into())
            }),
        );
        handlers.add(DASHBOARD_INITIALIZED, recorder(&log, "third"));

        let report = handlers
            .dispatch(&DashboardEvent::new(DASHBOARD_INITIALIZED, json!({})))
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
        assert_eq!(report.invoked, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].handler_index, 1);
        assert_eq!(report.failures[0].message, "boom");
        assert!(!report.failures[0].panicked);
        assert_eq!(report.succeeded(), 2);
    }

    #[test]
    fn panicking_handler_is_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut handlers = EventHandlers::new();
        handlers.add(DASHBOARD_INITIALIZED, recorder(&log, "first"));
        handlers.add(
            DASHBOARD_INITIALIZED,
            EventHandler::infallible(|_| panic!("handler exploded")),
        );
        handlers.add(DASHBOARD_INITIALIZED, recorder(&log, "third"));

        let report = handlers
            .dispatch(&DashboardEvent::new(DASHBOARD_INITIALIZED, Value::Null))
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "third"]);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].panicked);
        assert_eq!(report.failures[0].message, "handler exploded");
    }

    #[test]
    fn undeclared_event_type_is_not_found() {
        let handlers = EventHandlers::new();
        let err = handlers
            .dispatch(&DashboardEvent::new(FILTER_CONTEXT_CHANGED, Value::Null))
            .unwrap_err();
        assert!(matches!(
            err,
            CustomizationError::NotFound {
                kind: "event type",
                ..
            }
        ));
    }

    #[test]
    fn event_deserializes_from_host_payload() {
        let event: DashboardEvent = serde_json::from_value(json!({
            "type": "GDC.DASH/EVT.INITIALIZED",
            "payload": {"dashboard": "d1"},
            "correlationId": "c-1"
        }))
        .unwrap();
        assert_eq!(event.event_type, DASHBOARD_INITIALIZED);
        assert_eq!(event.correlation_id.as_deref(), Some("c-1"));
    }
}
