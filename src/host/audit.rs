//! Host lifecycle audit trail.
//!
//! Records capture a stage plus structured details so callers can log,
//! buffer or assert on the loading sequence without touching the host.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use serde_json::Value;

/// Checkpoints emitted by `PluginHost`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAuditStage {
    HostConstructed,
    /// Engine range check passed and `on_load` is about to run.
    PluginLoadStarted,
    /// Descriptor engine range excludes the host engine.
    PluginRejected,
    /// A lifecycle hook returned an error; the plugin is not kept.
    PluginLoadFailed,
    /// `register` returned successfully.
    PluginRegistered,
    SessionSealed,
    EventDispatched,
    PluginUnloaded,
}

#[derive(Debug, Clone)]
pub struct HostAuditEvent {
    pub timestamp: SystemTime,
    pub stage: HostAuditStage,
    pub details: Vec<(String, Value)>,
}

impl HostAuditEvent {
    fn new(stage: HostAuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

pub struct HostAuditEventBuilder {
    event: HostAuditEvent,
}

impl HostAuditEventBuilder {
    pub fn new(stage: HostAuditStage) -> Self {
        Self {
            event: HostAuditEvent::new(stage),
        }
    }

    pub fn detail(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.event.details.push((key.into(), value));
        self
    }

    pub fn finish(self) -> HostAuditEvent {
        self.event
    }
}

pub trait HostAudit: Send + Sync {
    fn record(&self, event: HostAuditEvent);
}

#[derive(Debug, Default)]
pub struct NullHostAudit;

impl HostAudit for NullHostAudit {
    fn record(&self, _event: HostAuditEvent) {}
}

/// Keeps every record; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingHostAudit {
    events: Arc<Mutex<Vec<HostAuditEvent>>>,
}

impl RecordingHostAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostAuditEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<HostAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }
}

impl HostAudit for RecordingHostAudit {
    fn record(&self, event: HostAuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
