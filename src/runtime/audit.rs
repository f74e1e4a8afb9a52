//! Runtime lifecycle audit records.
//!
//! `PageRuntime` reports each lifecycle checkpoint to an optional
//! [`RuntimeAudit`] sink. Records carry the page time at which they happened
//! plus structured details, so tests and tooling can replay how a page
//! reached its revealed state.

use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

/// Distinct lifecycle checkpoints emitted by `PageRuntime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeAuditStage {
    /// A new runtime instance was constructed.
    RuntimeConstructed,
    /// A plugin was registered with the runtime.
    PluginRegistered,
    /// Start was requested; plugins are about to initialise.
    RuntimeStarted,
    /// A plugin finished its `init` hook.
    PluginInitialized,
    /// A timer came due and is about to be dispatched.
    TimerFired,
    /// A runtime event finished propagating.
    EventDispatched,
    /// A host-side effect was queued.
    EffectEmitted,
    /// The host finished with the runtime.
    RuntimeStopped,
}

/// Structured audit entry.
#[derive(Debug, Clone)]
pub struct RuntimeAuditEvent {
    pub page_time: Duration,
    pub stage: RuntimeAuditStage,
    pub details: Vec<(String, Value)>,
}

impl RuntimeAuditEvent {
    fn new(stage: RuntimeAuditStage) -> Self {
        Self {
            page_time: Duration::ZERO,
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

/// Builder helper to append fields ergonomically.
pub struct RuntimeAuditEventBuilder {
    event: RuntimeAuditEvent,
}

impl RuntimeAuditEventBuilder {
    pub fn new(stage: RuntimeAuditStage) -> Self {
        Self {
            event: RuntimeAuditEvent::new(stage),
        }
    }

    pub fn at(&mut self, page_time: Duration) -> &mut Self {
        self.event.page_time = page_time;
        self
    }

    pub fn detail(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.event.details.push((key.into(), value));
        self
    }

    pub fn finish(self) -> RuntimeAuditEvent {
        self.event
    }
}

/// Trait implemented by any audit sink.
pub trait RuntimeAudit: Send + Sync {
    fn record(&self, event: RuntimeAuditEvent);
}

/// Default no-op implementation used when auditing is disabled.
#[derive(Debug, Default)]
pub struct NullRuntimeAudit;

impl RuntimeAudit for NullRuntimeAudit {
    fn record(&self, _event: RuntimeAuditEvent) {}
}

/// Buffers every record in memory.
#[derive(Debug, Default)]
pub struct MemoryAudit {
    events: Mutex<Vec<RuntimeAuditEvent>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RuntimeAuditEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<RuntimeAuditStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }
}

impl RuntimeAudit for MemoryAudit {
    fn record(&self, event: RuntimeAuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
