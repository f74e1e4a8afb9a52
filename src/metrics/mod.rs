use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters accumulated by [`crate::PageRuntime`] while it dispatches events.
#[derive(Debug, Default, Clone)]
pub struct PageMetrics {
    events: u64,
    timers_fired: u64,
    timers_cancelled: u64,
    mutations: u64,
    effects: u64,
}

impl PageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    pub fn record_timer_fired(&mut self) {
        self.timers_fired = self.timers_fired.saturating_add(1);
    }

    pub fn record_timer_cancelled(&mut self) {
        self.timers_cancelled = self.timers_cancelled.saturating_add(1);
    }

    pub fn record_mutations(&mut self, count: usize) {
        self.mutations = self.mutations.saturating_add(count as u64);
    }

    pub fn record_effects(&mut self, count: usize) {
        self.effects = self.effects.saturating_add(count as u64);
    }

    pub fn snapshot(&self, page_time: Duration) -> MetricSnapshot {
        MetricSnapshot {
            page_time_ms: page_time.as_millis() as u64,
            events: self.events,
            timers_fired: self.timers_fired,
            timers_cancelled: self.timers_cancelled,
            mutations: self.mutations,
            effects: self.effects,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub page_time_ms: u64,
    pub events: u64,
    pub timers_fired: u64,
    pub timers_cancelled: u64,
    pub mutations: u64,
    pub effects: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("page_time_ms".to_string(), json!(self.page_time_ms));
        map.insert("events".to_string(), json!(self.events));
        map.insert("timers_fired".to_string(), json!(self.timers_fired));
        map.insert("timers_cancelled".to_string(), json!(self.timers_cancelled));
        map.insert("mutations".to_string(), json!(self.mutations));
        map.insert("effects".to_string(), json!(self.effects));
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "page_metrics", self.as_fields())
    }
}
