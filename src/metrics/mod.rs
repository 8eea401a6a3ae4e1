use crate::logging::{LogEvent, LogFields, LogLevel};
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters for one customization session.
///
/// Registration counters are bumped while the session is open and need
/// `&mut`. Dispatch counters are atomic so a sealed snapshot can be
/// queried from many threads at once.
#[derive(Debug, Default)]
pub struct SessionMetrics {
    rules: u64,
    decorators: u64,
    widgets: u64,
    widget_overwrites: u64,
    layout_mutations: u64,
    handlers: u64,
    resolutions: AtomicU64,
    dispatches: AtomicU64,
    handler_failures: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rule(&mut self) {
        self.rules = self.rules.saturating_add(1);
    }

    pub fn record_decorator(&mut self) {
        self.decorators = self.decorators.saturating_add(1);
    }

    pub fn record_widget(&mut self, overwrote: bool) {
        self.widgets = self.widgets.saturating_add(1);
        if overwrote {
            self.widget_overwrites = self.widget_overwrites.saturating_add(1);
        }
    }

    pub fn record_layout_mutations(&mut self, count: usize) {
        self.layout_mutations = self.layout_mutations.saturating_add(count as u64);
    }

    pub fn record_handler(&mut self) {
        self.handlers = self.handlers.saturating_add(1);
    }

    pub fn record_resolution(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch(&self, failures: usize) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        if failures > 0 {
            self.handler_failures
                .fetch_add(failures as u64, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            rules: self.rules,
            decorators: self.decorators,
            widgets: self.widgets,
            widget_overwrites: self.widget_overwrites,
            layout_mutations: self.layout_mutations,
            handlers: self.handlers,
            resolutions: self.resolutions.load(Ordering::Relaxed),
            dispatches: self.dispatches.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub rules: u64,
    pub decorators: u64,
    pub widgets: u64,
    pub widget_overwrites: u64,
    pub layout_mutations: u64,
    pub handlers: u64,
    pub resolutions: u64,
    pub dispatches: u64,
    pub handler_failures: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "session_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("rules".to_string(), json!(self.rules));
        map.insert("decorators".to_string(), json!(self.decorators));
        map.insert("widgets".to_string(), json!(self.widgets));
        map.insert("widget_overwrites".to_string(), json!(self.widget_overwrites));
        map.insert("layout_mutations".to_string(), json!(self.layout_mutations));
        map.insert("handlers".to_string(), json!(self.handlers));
        map.insert("resolutions".to_string(), json!(self.resolutions));
        map.insert("dispatches".to_string(), json!(self.dispatches));
        map.insert("handler_failures".to_string(), json!(self.handler_failures));
        map
    }

    /// Sum counters across sessions; uptime keeps the largest value.
    pub fn merge(&mut self, other: &MetricSnapshot) {
        self.uptime_ms = self.uptime_ms.max(other.uptime_ms);
        self.rules += other.rules;
        self.decorators += other.decorators;
        self.widgets += other.widgets;
        self.widget_overwrites += other.widget_overwrites;
        self.layout_mutations += other.layout_mutations;
        self.handlers += other.handlers;
        self.resolutions += other.resolutions;
        self.dispatches += other.dispatches;
        self.handler_failures += other.handler_failures;
    }
}
