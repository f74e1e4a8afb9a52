use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};

use crate::document::{Document, ElementId};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::readiness::MediaSignal;
use crate::timer::{Clock, FiredTimer, TimerId, TimerQueue};
use crate::{PageMetrics, Result};

pub mod audit;
pub mod bundles;
pub mod diagnostics;
pub mod driver;

use audit::{RuntimeAudit, RuntimeAuditEventBuilder, RuntimeAuditStage};

/// Configuration knobs for the page runtime.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Optional structured logger shared with plugins through the context.
    pub logger: Option<Logger>,
    /// Metrics accumulator used for periodic snapshots.
    pub metrics: Option<Arc<Mutex<PageMetrics>>>,
    /// Page-time interval between metrics snapshots. Zero disables snapshots.
    pub metrics_interval: Duration,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
    /// Lifecycle audit sink.
    pub audit: Option<Arc<dyn RuntimeAudit>>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            metrics_interval: Duration::from_secs(5),
            metrics_target: "curtain::metrics".to_string(),
            audit: None,
        }
    }
}

impl RuntimeConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(PageMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<PageMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Events delivered to plugins.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    /// The page finished parsing; plugins start their work here.
    Ready,
    /// A timer scheduled through [`RuntimeContext`] came due.
    Timer(FiredTimer),
    /// A media element delivered a readiness notification.
    Media {
        element: ElementId,
        signal: MediaSignal,
    },
    /// The window scrolled to `y` pixels.
    Scroll { y: f64 },
    Click(ElementId),
    /// A form was submitted.
    Submit(ElementId),
    /// Broadcast once, after a plugin triggered the page reveal.
    Revealed,
}

impl RuntimeEvent {
    pub fn describe(&self) -> &'static str {
        match self {
            RuntimeEvent::Ready => "ready",
            RuntimeEvent::Timer(_) => "timer",
            RuntimeEvent::Media { .. } => "media",
            RuntimeEvent::Scroll { .. } => "scroll",
            RuntimeEvent::Click(_) => "click",
            RuntimeEvent::Submit(_) => "submit",
            RuntimeEvent::Revealed => "revealed",
        }
    }
}

/// Control the propagation of an event across plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Consumed,
}

/// Side effects the host performs outside the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEffect {
    /// Start the hero reveal animations.
    Reveal,
    /// Smooth-scroll the element into view.
    ScrollIntoView(ElementId),
    /// Media playback was started.
    PlayMedia(ElementId),
    /// Open a URL, e.g. a messaging deep link, in the named browsing context.
    OpenUrl { url: String, target: String },
}

impl PageEffect {
    pub fn describe(&self) -> &'static str {
        match self {
            PageEffect::Reveal => "reveal",
            PageEffect::ScrollIntoView(_) => "scroll_into_view",
            PageEffect::PlayMedia(_) => "play_media",
            PageEffect::OpenUrl { .. } => "open_url",
        }
    }
}

/// Context passed to plugins so they can interact with the page safely.
pub struct RuntimeContext<'a> {
    document: &'a mut Document,
    timers: &'a mut TimerQueue,
    logger: Option<&'a Logger>,
    effects: Vec<PageEffect>,
    reveal_requested: bool,
    cancelled: usize,
}

impl<'a> RuntimeContext<'a> {
    fn new(
        document: &'a mut Document,
        timers: &'a mut TimerQueue,
        logger: Option<&'a Logger>,
    ) -> Self {
        Self {
            document,
            timers,
            logger,
            effects: Vec::new(),
            reveal_requested: false,
            cancelled: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &*self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut *self.document
    }

    /// Page time elapsed since the runtime started.
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn schedule_once(&mut self, delay: Duration, label: &'static str) -> TimerId {
        self.timers.schedule_once(delay, label)
    }

    pub fn schedule_repeating(&mut self, interval: Duration, label: &'static str) -> TimerId {
        self.timers.schedule_repeating(interval, label)
    }

    /// Cancel a pending timer; returns false if it was not pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let cancelled = self.timers.cancel(id);
        if cancelled {
            self.cancelled += 1;
        }
        cancelled
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.is_pending(id)
    }

    /// Queue a host-side effect. Applied after the plugin returns.
    pub fn emit(&mut self, effect: PageEffect) {
        self.effects.push(effect);
    }

    /// Emit the reveal effect and broadcast [`RuntimeEvent::Revealed`] once the
    /// current event has finished propagating.
    pub fn reveal(&mut self) {
        self.reveal_requested = true;
    }

    pub fn logger(&self) -> Option<&Logger> {
        self.logger
    }

    pub fn log<I>(&self, level: LogLevel, target: &str, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.logger {
            let _ = logger.log_event(event_with_fields(level, target, message, fields));
        }
    }

    fn into_outcome(self) -> ContextOutcome {
        ContextOutcome {
            effects: self.effects,
            reveal_requested: self.reveal_requested,
            cancelled: self.cancelled,
        }
    }
}

struct ContextOutcome {
    effects: Vec<PageEffect>,
    reveal_requested: bool,
    cancelled: usize,
}

/// Behaviour injection point for the runtime.
pub trait PagePlugin: Send {
    fn name(&self) -> &str {
        "page_plugin"
    }

    fn init(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_event(
        &mut self,
        _ctx: &mut RuntimeContext<'_>,
        _event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        Ok(EventFlow::Continue)
    }
}

/// Group of plugins registered together, each with a priority. Lower
/// priorities see events first; equal priorities keep registration order.
#[derive(Default)]
pub struct PluginBundle {
    plugins: Vec<(Box<dyn PagePlugin>, i32)>,
}

impl PluginBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugin<P>(mut self, plugin: P, priority: i32) -> Self
    where
        P: PagePlugin + 'static,
    {
        self.plugins.push((Box::new(plugin), priority));
        self
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

struct RegisteredPlugin {
    priority: i32,
    plugin: Box<dyn PagePlugin>,
}

/// Single-threaded page event loop.
///
/// Every event runs to completion across all plugins before the next one
/// starts. Timers fire in page-time order as the host advances the clock.
pub struct PageRuntime {
    document: Document,
    timers: TimerQueue,
    plugins: Vec<RegisteredPlugin>,
    config: RuntimeConfig,
    pending: VecDeque<RuntimeEvent>,
    effects: Vec<PageEffect>,
    started: bool,
    reveals: usize,
    last_metrics_emit: Option<Duration>,
}

impl PageRuntime {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, RuntimeConfig::default())
    }

    pub fn with_config(document: Document, config: RuntimeConfig) -> Self {
        let runtime = Self {
            document,
            timers: TimerQueue::new(),
            plugins: Vec::new(),
            config,
            pending: VecDeque::new(),
            effects: Vec::new(),
            started: false,
            reveals: 0,
            last_metrics_emit: None,
        };
        runtime.audit(RuntimeAuditStage::RuntimeConstructed, std::iter::empty());
        runtime
    }

    pub fn config_mut(&mut self) -> &mut RuntimeConfig {
        &mut self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Host-side document access, e.g. to simulate media buffering.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// How many times a plugin triggered the page reveal.
    pub fn reveal_count(&self) -> usize {
        self.reveals
    }

    pub fn register_plugin<P>(&mut self, plugin: P)
    where
        P: PagePlugin + 'static,
    {
        self.register_boxed(Box::new(plugin), 0);
    }

    pub fn register_plugin_with_priority<P>(&mut self, plugin: P, priority: i32)
    where
        P: PagePlugin + 'static,
    {
        self.register_boxed(Box::new(plugin), priority);
    }

    pub fn register_bundle(&mut self, bundle: PluginBundle) {
        for (plugin, priority) in bundle.plugins {
            self.register_boxed(plugin, priority);
        }
    }

    fn register_boxed(&mut self, plugin: Box<dyn PagePlugin>, priority: i32) {
        let name = plugin.name().to_string();
        let position = self
            .plugins
            .iter()
            .position(|entry| entry.priority > priority)
            .unwrap_or(self.plugins.len());
        self.plugins
            .insert(position, RegisteredPlugin { priority, plugin });
        self.audit(
            RuntimeAuditStage::PluginRegistered,
            [json_kv("plugin", json!(name)), json_kv("priority", json!(priority))],
        );
    }

    /// Initialise plugins and deliver [`RuntimeEvent::Ready`]. Calling it
    /// again is a no-op.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        self.ensure_metrics_initialized();
        self.last_metrics_emit = Some(self.timers.now());
        self.log_runtime_event(
            LogLevel::Info,
            "runtime_started",
            [
                json_kv("plugins", json!(self.plugins.len())),
                json_kv("elements", json!(self.document.ids().len())),
            ],
        );
        self.audit(
            RuntimeAuditStage::RuntimeStarted,
            [json_kv("plugins", json!(self.plugins.len()))],
        );

        for idx in 0..self.plugins.len() {
            let (outcome, plugin_name) = {
                let plugin = &mut self.plugins[idx].plugin;
                let mut ctx = RuntimeContext::new(
                    &mut self.document,
                    &mut self.timers,
                    self.config.logger.as_ref(),
                );
                plugin.init(&mut ctx)?;
                (ctx.into_outcome(), plugin.name().to_string())
            };
            self.audit(
                RuntimeAuditStage::PluginInitialized,
                [json_kv("plugin", json!(plugin_name))],
            );
            self.apply_outcome(outcome);
        }

        self.dispatch(RuntimeEvent::Ready)?;
        Ok(())
    }

    /// Deliver an external event and everything it triggers.
    pub fn dispatch(&mut self, event: RuntimeEvent) -> Result<EventFlow> {
        let flow = self.dispatch_one(event)?;
        while let Some(next) = self.pending.pop_front() {
            self.dispatch_one(next)?;
        }
        Ok(flow)
    }

    /// Advance page time by `by`, firing every timer that comes due.
    /// Returns the number of timers fired.
    pub fn advance(&mut self, by: Duration) -> Result<usize> {
        let deadline = self.timers.now() + by;
        self.advance_to(deadline)
    }

    pub fn advance_to(&mut self, deadline: Duration) -> Result<usize> {
        let mut fired = 0;
        while let Some(timer) = self.timers.pop_due(deadline) {
            fired += 1;
            self.record_metric(PageMetrics::record_timer_fired);
            self.audit(
                RuntimeAuditStage::TimerFired,
                [
                    json_kv("label", json!(timer.label)),
                    json_kv("due_ms", json!(timer.due.as_millis() as u64)),
                ],
            );
            self.dispatch(RuntimeEvent::Timer(timer))?;
        }
        self.timers.settle_at(deadline);
        self.maybe_emit_metrics();
        Ok(fired)
    }

    /// Advance page time to match `clock`.
    pub fn catch_up(&mut self, clock: &impl Clock) -> Result<usize> {
        self.advance_to(clock.elapsed())
    }

    /// Replay `(page time, event)` pairs in order, firing timers in between.
    pub fn run_script<I>(&mut self, script: I) -> Result<()>
    where
        I: IntoIterator<Item = (Duration, RuntimeEvent)>,
    {
        self.start()?;
        for (at, event) in script {
            self.advance_to(at)?;
            self.dispatch(event)?;
        }
        Ok(())
    }

    /// Effects emitted since the last call, in emission order.
    pub fn drain_effects(&mut self) -> Vec<PageEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Log the final lifecycle record.
    pub fn finish(&mut self) {
        let page_time_ms = self.timers.now().as_millis() as u64;
        self.log_runtime_event(
            LogLevel::Info,
            "runtime_stopped",
            [
                json_kv("page_time_ms", json!(page_time_ms)),
                json_kv("reveals", json!(self.reveals)),
            ],
        );
        self.audit(
            RuntimeAuditStage::RuntimeStopped,
            [json_kv("page_time_ms", json!(page_time_ms))],
        );
    }

    fn dispatch_one(&mut self, event: RuntimeEvent) -> Result<EventFlow> {
        let mut consumed_by = None;
        for idx in 0..self.plugins.len() {
            let (flow, outcome, name) = {
                let plugin = &mut self.plugins[idx].plugin;
                let mut ctx = RuntimeContext::new(
                    &mut self.document,
                    &mut self.timers,
                    self.config.logger.as_ref(),
                );
                let flow = plugin.on_event(&mut ctx, &event)?;
                (flow, ctx.into_outcome(), plugin.name().to_string())
            };
            self.apply_outcome(outcome);
            if matches!(flow, EventFlow::Consumed) {
                consumed_by = Some(name);
                break;
            }
        }

        let mutations = self.document.take_mutation_count();
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                guard.record_event();
                guard.record_mutations(mutations);
            }
        }

        if let (RuntimeEvent::Timer(timer), None) = (&event, &consumed_by) {
            self.log_runtime_event(
                LogLevel::Debug,
                "timer_unclaimed",
                [json_kv("label", json!(timer.label))],
            );
        }

        self.log_runtime_event(
            LogLevel::Trace,
            "event_dispatched",
            [
                json_kv("event", json!(event.describe())),
                json_kv("consumed_by", json!(consumed_by)),
                json_kv("mutations", json!(mutations)),
            ],
        );
        self.audit(
            RuntimeAuditStage::EventDispatched,
            [
                json_kv("event", json!(event.describe())),
                json_kv("consumed", json!(consumed_by.is_some())),
            ],
        );

        Ok(if consumed_by.is_some() {
            EventFlow::Consumed
        } else {
            EventFlow::Continue
        })
    }

    fn apply_outcome(&mut self, outcome: ContextOutcome) {
        let ContextOutcome {
            effects,
            reveal_requested,
            cancelled,
        } = outcome;

        for _ in 0..cancelled {
            self.record_metric(PageMetrics::record_timer_cancelled);
        }

        if reveal_requested {
            self.reveals += 1;
            self.push_effect(PageEffect::Reveal);
            self.pending.push_back(RuntimeEvent::Revealed);
        }

        for effect in effects {
            self.push_effect(effect);
        }
    }

    fn push_effect(&mut self, effect: PageEffect) {
        self.log_runtime_event(
            LogLevel::Debug,
            "effect_emitted",
            [json_kv("effect", json!(effect.describe()))],
        );
        self.audit(
            RuntimeAuditStage::EffectEmitted,
            [json_kv("effect", json!(effect.describe()))],
        );
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                guard.record_effects(1);
            }
        }
        self.effects.push(effect);
    }

    fn ensure_metrics_initialized(&mut self) {
        if self.config.metrics.is_none() && self.config.metrics_interval > Duration::ZERO {
            self.config.enable_metrics();
        }
    }

    fn record_metric(&self, record: impl FnOnce(&mut PageMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut *guard);
            }
        }
    }

    fn maybe_emit_metrics(&mut self) {
        if self.config.metrics_interval == Duration::ZERO {
            return;
        }
        let now = self.timers.now();
        match self.last_metrics_emit {
            Some(last) if now.saturating_sub(last) < self.config.metrics_interval => return,
            _ => self.last_metrics_emit = Some(now),
        }

        if let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        {
            if let Ok(guard) = metrics.lock() {
                let event = guard
                    .snapshot(now)
                    .to_log_event(self.config.metrics_target.as_str());
                let _ = logger.log_event(event);
            }
        }
    }

    fn log_runtime_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, "curtain::runtime", message, fields);
            let _ = logger.log_event(event);
        }
    }

    fn audit<I>(&self, stage: RuntimeAuditStage, details: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(audit) = self.config.audit.as_ref() {
            let mut builder = RuntimeAuditEventBuilder::new(stage);
            builder.at(self.timers.now());
            for (key, value) in details {
                builder.detail(key, value);
            }
            audit.record(builder.finish());
        }
    }
}
