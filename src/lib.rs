//! Client-side behaviour layer for a single-page marketing site.
//!
//! A [`PageRuntime`] owns a virtual [`Document`] and a page-time timer queue
//! and delivers events to [`PagePlugin`]s. The [`BootstrapSequencer`] races
//! the hero media against a hard timeout while a simulated progress bar
//! fills, then lifts the loader and reveals the page exactly once. The
//! typewriter and the page collaborators react to that reveal and to
//! scroll, click and submit events.
//!
//! Hosts drive time explicitly (`advance`, `catch_up`), which keeps every
//! behaviour deterministic under test; [`CliDriver`] runs the same page
//! against the wall clock in a terminal.

pub mod bootstrap;
pub mod collaborators;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod progress;
pub mod readiness;
pub mod render;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod typewriter;

pub use bootstrap::{
    BootstrapPhase, BootstrapSequencer, BootstrapStatus, BootstrapTargets, SharedBootstrapStatus,
};
pub use collaborators::{
    BookingFormIds, BookingFormPlugin, BookingRequest, HeroRevealPlugin, HeroRevealTargets,
    MobileMenuPlugin, MobileMenuTargets, NavbarPlugin, RevealDirection, ScrollRevealPlugin,
    parallax_position, whatsapp_link,
};
pub use config::{
    BookingConfig, ConfigError, ConfigResult, LoaderTimings, NavbarConfig, PageConfig,
    ProgressPolicy, ScrollConfig, StepRange, TypewriterConfig,
};
pub use document::{
    Document, Element, ElementId, ElementKind, ElementState, MediaState, PlaybackError, ReadyState,
};
pub use error::{CurtainError, Result};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{MetricSnapshot, PageMetrics};
pub use progress::{ProgressSimulator, ProgressTick, fill_width};
pub use readiness::{MediaSignal, MediaWatcher, READY_THRESHOLD, ReadinessLatch, ReadySource};
pub use render::{PageView, RendererSettings, TerminalRenderer, display_width};
pub use runtime::audit::{
    MemoryAudit, NullRuntimeAudit, RuntimeAudit, RuntimeAuditEvent, RuntimeAuditEventBuilder,
    RuntimeAuditStage,
};
pub use runtime::bundles::{
    DiagnosticsConfig, PageBundle, PageBundleConfig, PageOptions, marketing_page_bundle,
    marketing_page_document,
};
pub use runtime::diagnostics::LifecycleLoggerPlugin;
pub use runtime::driver::cli::{CliDriver, CliDriverError, DriverCommand, DriverResult};
pub use runtime::{
    EventFlow, PageEffect, PagePlugin, PageRuntime, PluginBundle, RuntimeConfig, RuntimeContext,
    RuntimeEvent,
};
pub use session::{FileSession, MemorySession, SessionError, SessionResult, SessionStore};
pub use timer::{Clock, FiredTimer, ManualClock, SystemClock, TimerId, TimerQueue};
pub use typewriter::{TypeStep, Typewriter, TypewriterPlugin};
