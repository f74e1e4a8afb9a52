//! Bootstrap sequencer: loader screen, media race, and the one-time reveal.
//!
//! ```text
//! Pending ──visited / no loader──▶ Skipped ──▶ Revealed
//!    │
//!    └────────────────────────────▶ Loading ──progress 100──▶ Revealing ──settle──▶ Revealed
//! ```
//!
//! Phases only move forward. The reveal fires exactly once on either path,
//! and the session flag is read once at ready and written once at the lift.

use std::sync::{Arc, RwLock};

use rand::Rng;
use rand::rngs::StdRng;
use serde_json::json;

use crate::config::{LoaderTimings, PageConfig};
use crate::document::{Document, ElementId};
use crate::logging::{LogLevel, json_kv};
use crate::progress::{ProgressSimulator, ProgressTick, fill_width};
use crate::readiness::{MediaSignal, MediaWatcher};
use crate::runtime::{EventFlow, PageEffect, PagePlugin, RuntimeContext, RuntimeEvent};
use crate::session::SessionStore;
use crate::timer::TimerId;
use crate::Result;

const TARGET: &str = "curtain::bootstrap";

pub const DEFAULT_LOADER: &str = "loader-wrapper";
pub const DEFAULT_PROGRESS_FILL: &str = "progress-fill";
pub const DEFAULT_MEDIA: &str = "hero-video";

/// Element ids the sequencer works with. Any of them may be missing from the
/// document; absence selects a branch, it is never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapTargets {
    pub loader: Option<ElementId>,
    pub progress_fill: Option<ElementId>,
    pub media: Option<ElementId>,
}

impl Default for BootstrapTargets {
    fn default() -> Self {
        Self {
            loader: Some(DEFAULT_LOADER.to_string()),
            progress_fill: Some(DEFAULT_PROGRESS_FILL.to_string()),
            media: Some(DEFAULT_MEDIA.to_string()),
        }
    }
}

impl BootstrapTargets {
    /// Loader container and fill, only when both exist in `document`.
    fn loader_ui(&self, document: &Document) -> Option<(ElementId, ElementId)> {
        let loader = self.loader.as_ref().filter(|id| document.contains(id))?;
        let fill = self
            .progress_fill
            .as_ref()
            .filter(|id| document.contains(id))?;
        Some((loader.clone(), fill.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPhase {
    /// Constructed, waiting for page ready.
    Pending,
    /// Loader bypassed for a returning visitor or a page without loader UI.
    Skipped,
    Loading,
    /// Progress hit 100; waiting out the settle delay.
    Revealing,
    Revealed,
}

impl BootstrapPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapPhase::Pending => "pending",
            BootstrapPhase::Skipped => "skipped",
            BootstrapPhase::Loading => "loading",
            BootstrapPhase::Revealing => "revealing",
            BootstrapPhase::Revealed => "revealed",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            BootstrapPhase::Pending => 0,
            BootstrapPhase::Skipped | BootstrapPhase::Loading => 1,
            BootstrapPhase::Revealing => 2,
            BootstrapPhase::Revealed => 3,
        }
    }
}

/// Observable snapshot of the sequencer, shared with hosts and renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapStatus {
    pub phase: BootstrapPhase,
    pub progress: f64,
    pub media_ready: bool,
    pub ticks: u64,
}

impl Default for BootstrapStatus {
    fn default() -> Self {
        Self {
            phase: BootstrapPhase::Pending,
            progress: 0.0,
            media_ready: false,
            ticks: 0,
        }
    }
}

pub type SharedBootstrapStatus = Arc<RwLock<BootstrapStatus>>;

#[derive(Debug, Default)]
struct BootstrapTimers {
    tick: Option<TimerId>,
    media_timeout: Option<TimerId>,
    settle: Option<TimerId>,
    scroll: Option<TimerId>,
}

pub struct BootstrapSequencer<S: SessionStore, R: Rng = StdRng> {
    targets: BootstrapTargets,
    timings: LoaderTimings,
    session: S,
    simulator: ProgressSimulator<R>,
    watcher: Option<MediaWatcher>,
    phase: BootstrapPhase,
    timers: BootstrapTimers,
    scroll_target: Option<ElementId>,
    status: SharedBootstrapStatus,
}

impl<S: SessionStore> BootstrapSequencer<S, StdRng> {
    pub fn new(targets: BootstrapTargets, config: &PageConfig, session: S) -> Result<Self> {
        let simulator = ProgressSimulator::new(config.progress.clone())?;
        Self::with_simulator(targets, config, session, simulator)
    }

    /// Deterministic progress increments for tests and benchmarks.
    pub fn seeded(
        targets: BootstrapTargets,
        config: &PageConfig,
        session: S,
        seed: u64,
    ) -> Result<Self> {
        let simulator = ProgressSimulator::seeded(config.progress.clone(), seed)?;
        Self::with_simulator(targets, config, session, simulator)
    }
}

impl<S: SessionStore, R: Rng> BootstrapSequencer<S, R> {
    pub fn with_simulator(
        targets: BootstrapTargets,
        config: &PageConfig,
        session: S,
        simulator: ProgressSimulator<R>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            targets,
            timings: config.loader.clone(),
            session,
            simulator,
            watcher: None,
            phase: BootstrapPhase::Pending,
            timers: BootstrapTimers::default(),
            scroll_target: None,
            status: Arc::new(RwLock::new(BootstrapStatus::default())),
        })
    }

    pub fn phase(&self) -> BootstrapPhase {
        self.phase
    }

    /// Handle that tracks phase and progress after the plugin is registered.
    pub fn status_handle(&self) -> SharedBootstrapStatus {
        Arc::clone(&self.status)
    }

    fn begin(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        let visited = self.session.visited();
        match (visited, self.targets.loader_ui(ctx.document())) {
            (false, Some((loader, fill))) => self.enter_loading(ctx, &loader, &fill),
            (_, loader_ui) => {
                ctx.log(
                    LogLevel::Info,
                    TARGET,
                    "loader_skipped",
                    [
                        json_kv("visited", json!(visited)),
                        json_kv("loader_present", json!(loader_ui.is_some())),
                    ],
                );
                self.skip(ctx)
            }
        }
    }

    fn skip(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.set_phase(ctx, BootstrapPhase::Skipped);
        if let Some(loader) = self.present(ctx.document(), self.targets.loader.as_ref()) {
            ctx.document_mut().set_style(&loader, "display", "none")?;
        }
        ctx.reveal();
        let delay = self.timings.skip_scroll_delay();
        self.schedule_fragment_scroll(ctx, delay);
        self.set_phase(ctx, BootstrapPhase::Revealed);
        Ok(())
    }

    fn enter_loading(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        loader: &str,
        fill: &str,
    ) -> Result<()> {
        self.set_phase(ctx, BootstrapPhase::Loading);
        ctx.document_mut().set_style(fill, "width", fill_width(0.0))?;
        ctx.document_mut().set_style(loader, "opacity", "1")?;

        let watcher = MediaWatcher::attach(ctx.document(), self.targets.media.as_deref());
        if let Some(source) = watcher.settled_by() {
            ctx.log(
                LogLevel::Debug,
                TARGET,
                "media_ready",
                [json_kv("source", json!(source.as_str()))],
            );
        } else {
            self.timers.media_timeout =
                Some(ctx.schedule_once(self.timings.media_timeout(), "bootstrap.media_timeout"));
        }
        self.watcher = Some(watcher);
        self.timers.tick =
            Some(ctx.schedule_repeating(self.timings.tick_interval(), "bootstrap.tick"));
        self.publish();
        Ok(())
    }

    fn on_tick(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        let media_ready = self.media_ready();
        let outcome = self.simulator.tick(media_ready);
        let fill = self.present(ctx.document(), self.targets.progress_fill.as_ref());

        match outcome {
            ProgressTick::Advanced(progress) => {
                if let Some(fill) = fill {
                    ctx.document_mut()
                        .set_style(&fill, "width", fill_width(progress))?;
                }
            }
            ProgressTick::Completed => {
                if let Some(fill) = fill {
                    ctx.document_mut()
                        .set_style(&fill, "width", fill_width(self.simulator.progress()))?;
                }
                if let Some(tick) = self.timers.tick.take() {
                    ctx.cancel(tick);
                }
                if let Some(timeout) = self.timers.media_timeout.take() {
                    ctx.cancel(timeout);
                }
                ctx.log(
                    LogLevel::Info,
                    TARGET,
                    "progress_complete",
                    [
                        json_kv("ticks", json!(self.simulator.ticks())),
                        json_kv("page_time_ms", json!(ctx.now().as_millis() as u64)),
                    ],
                );
                self.set_phase(ctx, BootstrapPhase::Revealing);
                self.timers.settle =
                    Some(ctx.schedule_once(self.timings.settle_delay(), "bootstrap.settle"));
            }
            ProgressTick::Finished => {}
        }
        self.publish();
        Ok(())
    }

    fn on_media_timeout(&mut self, ctx: &mut RuntimeContext<'_>) {
        self.timers.media_timeout = None;
        let flipped = self
            .watcher
            .as_mut()
            .map(MediaWatcher::time_out)
            .unwrap_or(false);
        if flipped {
            ctx.log(
                LogLevel::Warn,
                TARGET,
                "media_timeout",
                [json_kv(
                    "timeout_ms",
                    json!(self.timings.media_timeout_ms),
                )],
            );
            self.publish();
        }
    }

    fn on_media(&mut self, ctx: &mut RuntimeContext<'_>, element: &str, signal: MediaSignal) {
        if self.phase != BootstrapPhase::Loading {
            return;
        }
        let Some(watcher) = self.watcher.as_mut() else {
            return;
        };
        if watcher.media() != Some(element) {
            return;
        }
        if watcher.observe(signal) {
            ctx.log(
                LogLevel::Debug,
                TARGET,
                "media_ready",
                [json_kv("source", json!(signal.as_str()))],
            );
            self.publish();
        }
    }

    /// Settle delay elapsed: lift the loader and reveal the page.
    fn lift(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.timers.settle = None;
        if let Some(loader) = self.present(ctx.document(), self.targets.loader.as_ref()) {
            let document = ctx.document_mut();
            document.set_style(&loader, "opacity", "0")?;
            document.set_style(&loader, "visibility", "hidden")?;
        }
        ctx.reveal();

        if let Err(err) = self.session.mark_visited() {
            ctx.log(
                LogLevel::Warn,
                TARGET,
                "session_write_failed",
                [json_kv("error", json!(err.to_string()))],
            );
        }

        if let Some(media) = self.watcher.as_ref().and_then(|w| w.media()).map(str::to_string) {
            match ctx.document_mut().play(&media) {
                Ok(()) => ctx.emit(PageEffect::PlayMedia(media)),
                Err(err) => ctx.log(
                    LogLevel::Warn,
                    TARGET,
                    "autoplay_prevented",
                    [json_kv("error", json!(err.to_string()))],
                ),
            }
        }

        let delay = self.timings.reveal_scroll_delay();
        self.schedule_fragment_scroll(ctx, delay);
        self.set_phase(ctx, BootstrapPhase::Revealed);
        Ok(())
    }

    fn schedule_fragment_scroll(&mut self, ctx: &mut RuntimeContext<'_>, delay: std::time::Duration) {
        if let Some(target) = ctx.document().fragment_target() {
            self.timers.scroll = Some(ctx.schedule_once(delay, "bootstrap.fragment_scroll"));
            self.scroll_target = Some(target);
        }
    }

    fn on_fragment_scroll(&mut self, ctx: &mut RuntimeContext<'_>) {
        self.timers.scroll = None;
        if let Some(target) = self.scroll_target.take() {
            ctx.emit(PageEffect::ScrollIntoView(target));
        }
    }

    fn media_ready(&self) -> bool {
        self.watcher
            .as_ref()
            .map(MediaWatcher::is_ready)
            .unwrap_or(true)
    }

    fn present(&self, document: &Document, id: Option<&ElementId>) -> Option<ElementId> {
        id.filter(|id| document.contains(id)).cloned()
    }

    fn set_phase(&mut self, ctx: &mut RuntimeContext<'_>, next: BootstrapPhase) {
        debug_assert!(
            next.rank() > self.phase.rank(),
            "bootstrap phase moved backwards: {:?} -> {:?}",
            self.phase,
            next
        );
        ctx.log(
            LogLevel::Info,
            TARGET,
            "phase_changed",
            [
                json_kv("from", json!(self.phase.as_str())),
                json_kv("to", json!(next.as_str())),
                json_kv("page_time_ms", json!(ctx.now().as_millis() as u64)),
            ],
        );
        self.phase = next;
        self.publish();
    }

    fn publish(&self) {
        if let Ok(mut guard) = self.status.write() {
            guard.phase = self.phase;
            guard.progress = self.simulator.progress();
            guard.media_ready = self.watcher.as_ref().is_some_and(MediaWatcher::is_ready);
            guard.ticks = self.simulator.ticks();
        }
    }
}

impl<S, R> PagePlugin for BootstrapSequencer<S, R>
where
    S: SessionStore + 'static,
    R: Rng + Send + 'static,
{
    fn name(&self) -> &str {
        "curtain::bootstrap"
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        match event {
            RuntimeEvent::Ready if self.phase == BootstrapPhase::Pending => {
                self.begin(ctx)?;
                Ok(EventFlow::Continue)
            }
            RuntimeEvent::Media { element, signal } => {
                self.on_media(ctx, element, *signal);
                Ok(EventFlow::Continue)
            }
            RuntimeEvent::Timer(fired) => {
                let id = Some(fired.id);
                if id == self.timers.tick {
                    self.on_tick(ctx)?;
                } else if id == self.timers.media_timeout {
                    self.on_media_timeout(ctx);
                } else if id == self.timers.settle {
                    self.lift(ctx)?;
                } else if id == self.timers.scroll {
                    self.on_fragment_scroll(ctx);
                } else {
                    return Ok(EventFlow::Continue);
                }
                Ok(EventFlow::Consumed)
            }
            _ => Ok(EventFlow::Continue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, StepRange};
    use crate::document::{Element, ReadyState};
    use crate::CurtainError;
    use crate::logging::{Logger, MemorySink};
    use crate::runtime::{PageRuntime, RuntimeConfig};
    use crate::session::MemorySession;
    use std::time::Duration;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn loader_page() -> Document {
        Document::new()
            .with_element(Element::block(DEFAULT_LOADER))
            .unwrap()
            .with_element(Element::block(DEFAULT_PROGRESS_FILL).with_parent(DEFAULT_LOADER))
            .unwrap()
            .with_element(Element::block("services").with_top(1200.0))
            .unwrap()
    }

    fn with_media(document: Document, state: ReadyState, autoplay: bool) -> Document {
        document
            .with_element(Element::media(DEFAULT_MEDIA, state).with_autoplay(autoplay))
            .unwrap()
    }

    struct Harness {
        runtime: PageRuntime,
        status: SharedBootstrapStatus,
        session: MemorySession,
        sink: MemorySink,
    }

    fn harness(document: Document, session: MemorySession) -> Harness {
        let sink = MemorySink::new();
        let mut config = RuntimeConfig::default();
        config.logger = Some(Logger::new(sink.clone()));
        let mut runtime = PageRuntime::with_config(document, config);
        let sequencer = BootstrapSequencer::seeded(
            BootstrapTargets::default(),
            &PageConfig::default(),
            session.clone(),
            42,
        )
        .unwrap();
        let status = sequencer.status_handle();
        runtime.register_plugin(sequencer);
        runtime.start().unwrap();
        Harness {
            runtime,
            status,
            session,
            sink,
        }
    }

    fn phase(h: &Harness) -> BootstrapPhase {
        h.status.read().unwrap().phase
    }

    fn tick_count(h: &Harness) -> u64 {
        h.status.read().unwrap().ticks
    }

    #[test]
    fn no_media_fast_finishes_from_first_tick() {
        let mut h = harness(loader_page(), MemorySession::new());
        assert_eq!(phase(&h), BootstrapPhase::Loading);
        assert!(h.status.read().unwrap().media_ready);

        h.runtime.advance(ms(50)).unwrap();
        let progress = h.status.read().unwrap().progress;
        assert!((5.0..15.0).contains(&progress), "progress {progress}");

        h.runtime.advance(ms(50 * 20)).unwrap();
        assert_eq!(phase(&h), BootstrapPhase::Revealed);
        assert_eq!(h.runtime.reveal_count(), 1);
        assert_eq!(
            h.runtime.document().style(DEFAULT_PROGRESS_FILL, "width"),
            Some("100%")
        );
        assert_eq!(
            h.runtime.document().style(DEFAULT_LOADER, "visibility"),
            Some("hidden")
        );
        assert!(h.session.visited());
    }

    #[test]
    fn tick_timer_is_cancelled_at_completion() {
        let mut h = harness(loader_page(), MemorySession::new());
        h.runtime.advance(ms(2000)).unwrap();
        let ticks = tick_count(&h);
        assert!(ticks <= 20);
        h.runtime.advance(ms(2000)).unwrap();
        assert_eq!(tick_count(&h), ticks);
        assert_eq!(h.runtime.pending_timers(), 0);
    }

    #[test]
    fn reveal_waits_for_settle_delay() {
        let mut h = harness(loader_page(), MemorySession::new());
        let mut elapsed = 0;
        while phase(&h) == BootstrapPhase::Loading {
            h.runtime.advance(ms(50)).unwrap();
            elapsed += 50;
            assert!(elapsed <= 1000);
        }
        assert_eq!(phase(&h), BootstrapPhase::Revealing);
        assert_eq!(h.runtime.reveal_count(), 0);
        assert!(!h.session.visited());

        h.runtime.advance(ms(499)).unwrap();
        assert_eq!(h.runtime.reveal_count(), 0);
        h.runtime.advance(ms(1)).unwrap();
        assert_eq!(phase(&h), BootstrapPhase::Revealed);
        assert_eq!(h.runtime.reveal_count(), 1);
    }

    #[test]
    fn visited_session_skips_without_ticking() {
        let mut h = harness(loader_page(), MemorySession::visited_already());
        assert_eq!(phase(&h), BootstrapPhase::Revealed);
        assert_eq!(
            h.runtime.document().style(DEFAULT_LOADER, "display"),
            Some("none")
        );
        assert_eq!(h.runtime.reveal_count(), 1);
        h.runtime.advance(ms(10_000)).unwrap();
        assert_eq!(tick_count(&h), 0);
        assert_eq!(h.runtime.reveal_count(), 1);
        assert_eq!(h.runtime.drain_effects(), vec![PageEffect::Reveal]);
        assert!(!h.status.read().unwrap().media_ready);
    }

    #[test]
    fn invalid_progress_config_is_rejected_at_construction() {
        let mut config = PageConfig::default();
        config.progress.fast_step = StepRange::new(5.0, 5.0);
        let result = BootstrapSequencer::seeded(
            BootstrapTargets::default(),
            &config,
            MemorySession::new(),
            1,
        );
        assert!(matches!(
            result,
            Err(CurtainError::Config(ConfigError::InvalidRange { .. }))
        ));

        let mut config = PageConfig::default();
        config.loader.tick_interval_ms = 0;
        let simulator = ProgressSimulator::seeded(config.progress.clone(), 1).unwrap();
        assert!(
            BootstrapSequencer::with_simulator(
                BootstrapTargets::default(),
                &config,
                MemorySession::new(),
                simulator,
            )
            .is_err()
        );
    }

    #[test]
    fn missing_loader_ui_takes_skip_path() {
        let document = Document::new()
            .with_element(Element::block(DEFAULT_LOADER))
            .unwrap();
        let h = harness(document, MemorySession::new());
        assert_eq!(phase(&h), BootstrapPhase::Revealed);
        assert!(!h.session.visited());
    }

    #[test]
    fn second_visit_in_same_session_skips() {
        let session = MemorySession::new();
        let mut first = harness(loader_page(), session.clone());
        first.runtime.advance(ms(5000)).unwrap();
        assert!(session.visited());

        let second = harness(loader_page(), session);
        assert_eq!(phase(&second), BootstrapPhase::Revealed);
        assert_eq!(tick_count(&second), 0);
    }

    #[test]
    fn slow_media_stalls_at_ceiling_until_signal() {
        let document = with_media(loader_page(), ReadyState::HaveMetadata, true);
        let mut h = harness(document, MemorySession::new());
        assert!(!h.status.read().unwrap().media_ready);

        h.runtime.advance(ms(4000)).unwrap();
        let status = h.status.read().unwrap().clone();
        assert_eq!(status.phase, BootstrapPhase::Loading);
        assert!(status.progress <= 85.0);

        h.runtime
            .dispatch(RuntimeEvent::Media {
                element: DEFAULT_MEDIA.into(),
                signal: MediaSignal::LoadedData,
            })
            .unwrap();
        assert!(h.status.read().unwrap().media_ready);
        let mut fast_ticks = 0;
        while phase(&h) == BootstrapPhase::Loading {
            h.runtime.advance(ms(50)).unwrap();
            fast_ticks += 1;
            assert!(fast_ticks <= 20);
        }
        assert_eq!(phase(&h), BootstrapPhase::Revealing);
        h.runtime.advance(ms(500)).unwrap();
        assert_eq!(phase(&h), BootstrapPhase::Revealed);
        assert!(h.runtime.document().media(DEFAULT_MEDIA).unwrap().playing);
        assert!(
            h.runtime
                .drain_effects()
                .contains(&PageEffect::PlayMedia(DEFAULT_MEDIA.into()))
        );
    }

    #[test]
    fn timeout_forces_fast_finish_for_broken_media() {
        let document = with_media(loader_page(), ReadyState::HaveNothing, true);
        let mut h = harness(document, MemorySession::new());
        h.runtime.advance(ms(4950)).unwrap();
        assert!(!h.status.read().unwrap().media_ready);
        h.runtime.advance(ms(50)).unwrap();
        assert!(h.status.read().unwrap().media_ready);
        assert_eq!(h.sink.messages("media_timeout").len(), 1);
        h.runtime.advance(ms(1500)).unwrap();
        assert_eq!(phase(&h), BootstrapPhase::Revealed);
    }

    #[test]
    fn buffered_media_needs_no_timeout() {
        let document = with_media(loader_page(), ReadyState::HaveEnoughData, true);
        let mut h = harness(document, MemorySession::new());
        h.runtime.advance(ms(50)).unwrap();
        assert!(h.status.read().unwrap().progress >= 5.0);
        h.runtime.advance(ms(1500)).unwrap();
        assert_eq!(phase(&h), BootstrapPhase::Revealed);
        assert!(h.sink.messages("media_timeout").is_empty());
    }

    #[test]
    fn blocked_autoplay_is_logged_not_fatal() {
        let document = with_media(loader_page(), ReadyState::HaveEnoughData, false);
        let mut h = harness(document, MemorySession::new());
        h.runtime.advance(ms(2000)).unwrap();
        assert_eq!(phase(&h), BootstrapPhase::Revealed);
        assert_eq!(h.sink.messages("autoplay_prevented").len(), 1);
        assert!(
            !h.runtime
                .drain_effects()
                .iter()
                .any(|effect| matches!(effect, PageEffect::PlayMedia(_)))
        );
    }

    #[test]
    fn fragment_scroll_follows_reveal_once() {
        let mut document = loader_page();
        document.set_location_hash(Some("#services"));
        let mut h = harness(document, MemorySession::new());

        while phase(&h) != BootstrapPhase::Revealed {
            h.runtime.advance(ms(50)).unwrap();
        }
        let scrolls = |effects: &[PageEffect]| {
            effects
                .iter()
                .filter(|effect| matches!(effect, PageEffect::ScrollIntoView(_)))
                .count()
        };
        assert_eq!(scrolls(&h.runtime.drain_effects()), 0);
        h.runtime.advance(ms(500)).unwrap();
        let effects = h.runtime.drain_effects();
        assert_eq!(scrolls(&effects), 1);
        assert!(effects.contains(&PageEffect::ScrollIntoView("services".into())));
        h.runtime.advance(ms(5000)).unwrap();
        assert_eq!(scrolls(&h.runtime.drain_effects()), 0);
    }

    #[test]
    fn skip_path_scrolls_after_short_delay() {
        let mut document = loader_page();
        document.set_location_hash(Some("#services"));
        let mut h = harness(document, MemorySession::visited_already());
        h.runtime.advance(ms(99)).unwrap();
        assert_eq!(h.runtime.drain_effects(), vec![PageEffect::Reveal]);
        h.runtime.advance(ms(1)).unwrap();
        assert_eq!(
            h.runtime.drain_effects(),
            vec![PageEffect::ScrollIntoView("services".into())]
        );
    }

    #[test]
    fn unknown_fragment_is_ignored() {
        let mut document = loader_page();
        document.set_location_hash(Some("#nowhere"));
        let mut h = harness(document, MemorySession::visited_already());
        h.runtime.advance(ms(1000)).unwrap();
        assert_eq!(h.runtime.drain_effects(), vec![PageEffect::Reveal]);
    }

    #[test]
    fn media_events_after_reveal_are_ignored() {
        let document = with_media(loader_page(), ReadyState::HaveEnoughData, true);
        let mut h = harness(document, MemorySession::new());
        h.runtime.advance(ms(2000)).unwrap();
        let flow = h
            .runtime
            .dispatch(RuntimeEvent::Media {
                element: DEFAULT_MEDIA.into(),
                signal: MediaSignal::CanPlayThrough,
            })
            .unwrap();
        assert_eq!(flow, EventFlow::Continue);
        assert_eq!(phase(&h), BootstrapPhase::Revealed);
        assert_eq!(h.runtime.reveal_count(), 1);
    }
}
