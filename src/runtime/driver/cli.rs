use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use thiserror::Error;

use crate::bootstrap::{BootstrapStatus, DEFAULT_MEDIA, SharedBootstrapStatus};
use crate::collaborators::{BookingFormIds, MobileMenuTargets};
use crate::document::ElementId;
use crate::readiness::MediaSignal;
use crate::render::TerminalRenderer;
use crate::runtime::{PageEffect, PageRuntime, RuntimeEvent};
use crate::timer::{Clock, SystemClock};
use crate::CurtainError;

pub type DriverResult<T> = std::result::Result<T, CliDriverError>;

#[derive(Debug, Error)]
pub enum CliDriverError {
    #[error("runtime error: {0}")]
    Runtime(#[from] CurtainError),
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Host actions bound to keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverCommand {
    Quit,
    ScrollBy(f64),
    /// Pretend the hero media buffered enough to play through.
    MediaReady,
    ToggleMenu,
    SubmitBooking,
}

/// `q`/`Esc`/`Ctrl+C` quit, arrows and PageUp/PageDown scroll, `r` fires
/// media readiness, `m` toggles the menu, `b` submits the booking form.
pub fn map_key(key: KeyEvent, scroll_step: f64) -> Option<DriverCommand> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(DriverCommand::Quit)
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(DriverCommand::Quit),
        KeyCode::Down => Some(DriverCommand::ScrollBy(scroll_step)),
        KeyCode::Up => Some(DriverCommand::ScrollBy(-scroll_step)),
        KeyCode::PageDown => Some(DriverCommand::ScrollBy(scroll_step * 8.0)),
        KeyCode::PageUp => Some(DriverCommand::ScrollBy(-scroll_step * 8.0)),
        KeyCode::Char('r') => Some(DriverCommand::MediaReady),
        KeyCode::Char('m') => Some(DriverCommand::ToggleMenu),
        KeyCode::Char('b') => Some(DriverCommand::SubmitBooking),
        _ => None,
    }
}

/// Element ids the key bindings target.
#[derive(Debug, Clone)]
pub struct DriverTargets {
    pub media: ElementId,
    pub menu_toggle: ElementId,
    pub booking_form: ElementId,
}

impl Default for DriverTargets {
    fn default() -> Self {
        Self {
            media: DEFAULT_MEDIA.to_string(),
            menu_toggle: MobileMenuTargets::default().toggle,
            booking_form: BookingFormIds::default().form,
        }
    }
}

/// One-line summary of loader state, scroll and the latest host effect.
pub fn status_line(
    status: Option<&BootstrapStatus>,
    page_time: Duration,
    scroll_y: f64,
    last_effect: Option<&str>,
) -> String {
    let mut line = format!("t={:>6}ms  y={scroll_y:>5}", page_time.as_millis());
    if let Some(status) = status {
        line.push_str(&format!(
            "  phase={}  progress={:.0}%  media={}",
            status.phase.as_str(),
            status.progress,
            if status.media_ready { "ready" } else { "loading" }
        ));
    }
    if let Some(effect) = last_effect {
        line.push_str(&format!("  last={effect}"));
    }
    line
}

/// Terminal driver that owns a started-on-run `PageRuntime`, feeds it wall
/// clock time and key presses, and redraws when the document changes.
pub struct CliDriver {
    runtime: PageRuntime,
    renderer: TerminalRenderer,
    clock: SystemClock,
    targets: DriverTargets,
    status: Option<SharedBootstrapStatus>,
    frame: Duration,
    scroll_step: f64,
    scroll_y: f64,
    last_effect: Option<String>,
}

impl CliDriver {
    pub fn new(runtime: PageRuntime) -> Self {
        Self {
            runtime,
            renderer: TerminalRenderer::with_default(),
            clock: SystemClock::start(),
            targets: DriverTargets::default(),
            status: None,
            frame: Duration::from_millis(50),
            scroll_step: 80.0,
            scroll_y: 0.0,
            last_effect: None,
        }
    }

    pub fn with_status(mut self, status: SharedBootstrapStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_renderer(mut self, renderer: TerminalRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_targets(mut self, targets: DriverTargets) -> Self {
        self.targets = targets;
        self
    }

    pub fn run(mut self) -> DriverResult<()> {
        let mut stdout = io::stdout();
        self.enter(&mut stdout)?;
        let result = self.run_inner(&mut stdout);
        self.exit(&mut stdout);
        self.runtime.finish();
        result
    }

    fn run_inner(&mut self, stdout: &mut impl Write) -> DriverResult<()> {
        let (width, _) = terminal::size()?;
        self.renderer.settings_mut().width = width;
        self.clock = SystemClock::start();
        self.runtime.start()?;
        self.redraw(stdout)?;

        loop {
            let now = self.clock.elapsed();
            let timeout = self
                .runtime
                .next_due()
                .map(|due| due.saturating_sub(now))
                .unwrap_or(self.frame)
                .min(self.frame);

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) => match map_key(key, self.scroll_step) {
                        Some(DriverCommand::Quit) => break,
                        Some(command) => self.apply(command)?,
                        None => {}
                    },
                    Event::Resize(width, _) => {
                        self.renderer.settings_mut().width = width;
                        execute!(stdout, Clear(ClearType::All))?;
                        self.redraw(stdout)?;
                    }
                    _ => {}
                }
            }

            self.runtime.catch_up(&self.clock)?;
            let effects_changed = self.collect_effects();
            if effects_changed || self.runtime.document().has_dirty() {
                self.redraw(stdout)?;
            }
        }
        Ok(())
    }

    fn apply(&mut self, command: DriverCommand) -> DriverResult<()> {
        self.runtime.catch_up(&self.clock)?;
        let event = match command {
            DriverCommand::Quit => return Ok(()),
            DriverCommand::ScrollBy(delta) => {
                self.scroll_y = (self.scroll_y + delta).max(0.0);
                RuntimeEvent::Scroll { y: self.scroll_y }
            }
            DriverCommand::MediaReady => RuntimeEvent::Media {
                element: self.targets.media.clone(),
                signal: MediaSignal::CanPlayThrough,
            },
            DriverCommand::ToggleMenu => RuntimeEvent::Click(self.targets.menu_toggle.clone()),
            DriverCommand::SubmitBooking => RuntimeEvent::Submit(self.targets.booking_form.clone()),
        };
        self.runtime.dispatch(event)?;
        Ok(())
    }

    fn collect_effects(&mut self) -> bool {
        let effects = self.runtime.drain_effects();
        let Some(last) = effects.last() else {
            return false;
        };
        self.last_effect = Some(match last {
            PageEffect::ScrollIntoView(id) => {
                if let Some(top) = self.runtime.document().get(id).map(|state| state.top) {
                    self.scroll_y = top;
                }
                format!("scroll_into_view({id})")
            }
            PageEffect::OpenUrl { url, .. } => format!("open_url({url})"),
            PageEffect::PlayMedia(id) => format!("play_media({id})"),
            PageEffect::Reveal => "reveal".to_string(),
        });
        true
    }

    fn redraw(&mut self, stdout: &mut impl Write) -> DriverResult<()> {
        let snapshot = self
            .status
            .as_ref()
            .and_then(|status| status.read().ok().map(|guard| guard.clone()));
        let line = status_line(
            snapshot.as_ref(),
            self.runtime.now(),
            self.scroll_y,
            self.last_effect.as_deref(),
        );
        self.renderer.render(stdout, self.runtime.document(), &line)?;
        self.runtime.document_mut().take_dirty();
        Ok(())
    }

    fn enter(&self, stdout: &mut impl Write) -> DriverResult<()> {
        terminal::enable_raw_mode().map_err(|err| CliDriverError::Terminal(err.to_string()))?;
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(())
    }

    fn exit(&self, stdout: &mut impl Write) {
        execute!(stdout, Show, LeaveAlternateScreen).ok();
        terminal::disable_raw_mode().ok();
    }
}
