//! Typewriter text cycler with a blinking cursor.
//!
//! [`Typewriter`] is the pure state machine: each [`Typewriter::step`] yields
//! the text to display and how long to wait before the next step.
//! [`TypewriterPlugin`] drives it from runtime timers and owns the cursor
//! element.

use std::time::Duration;

use serde_json::json;

use crate::config::TypewriterConfig;
use crate::document::{Element, ElementId};
use crate::logging::{LogLevel, json_kv};
use crate::runtime::{EventFlow, PagePlugin, RuntimeContext, RuntimeEvent};
use crate::timer::TimerId;
use crate::Result;

const TARGET: &str = "curtain::typewriter";

pub const DEFAULT_DISPLAY: &str = "typewriter";
pub const CURSOR_SUFFIX: &str = "-cursor";
pub const CURSOR_GLYPH: &str = "|";
pub const CURSOR_CLASS: &str = "text-type__cursor";

/// Output of one typewriter step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeStep {
    pub text: String,
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct Typewriter {
    phrases: Vec<Vec<char>>,
    text_index: usize,
    char_index: usize,
    deleting: bool,
    type_delay: Duration,
    delete_delay: Duration,
    hold_delay: Duration,
    next_phrase_delay: Duration,
}

impl Typewriter {
    /// Returns `None` for an empty phrase list; nothing can be cycled.
    pub fn new(config: &TypewriterConfig) -> Option<Self> {
        if config.phrases.is_empty() {
            return None;
        }
        Some(Self {
            phrases: config
                .phrases
                .iter()
                .map(|phrase| phrase.chars().collect())
                .collect(),
            text_index: 0,
            char_index: 0,
            deleting: false,
            type_delay: Duration::from_millis(config.type_delay_ms),
            delete_delay: Duration::from_millis(config.delete_delay_ms),
            hold_delay: Duration::from_millis(config.hold_delay_ms),
            next_phrase_delay: Duration::from_millis(config.next_phrase_delay_ms),
        })
    }

    pub fn text_index(&self) -> usize {
        self.text_index
    }

    pub fn char_index(&self) -> usize {
        self.char_index
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    pub fn step(&mut self) -> TypeStep {
        let phrase = &self.phrases[self.text_index];
        let mut delay = if self.deleting {
            self.char_index = self.char_index.saturating_sub(1);
            self.delete_delay
        } else {
            self.char_index = (self.char_index + 1).min(phrase.len());
            self.type_delay
        };
        let text: String = phrase[..self.char_index].iter().collect();

        if !self.deleting && self.char_index == phrase.len() {
            self.deleting = true;
            delay = self.hold_delay;
        } else if self.deleting && self.char_index == 0 {
            self.deleting = false;
            self.text_index = (self.text_index + 1) % self.phrases.len();
            delay = self.next_phrase_delay;
        }

        TypeStep { text, delay }
    }
}

pub struct TypewriterPlugin {
    display: ElementId,
    cursor: ElementId,
    writer: Option<Typewriter>,
    blink_interval: Duration,
    cursor_visible: bool,
    step_timer: Option<TimerId>,
    blink_timer: Option<TimerId>,
}

impl TypewriterPlugin {
    pub fn new(display: impl Into<ElementId>, config: &TypewriterConfig) -> Self {
        let display = display.into();
        Self {
            cursor: format!("{display}{CURSOR_SUFFIX}"),
            display,
            writer: Typewriter::new(config),
            blink_interval: Duration::from_millis(config.cursor_blink_ms.max(1)),
            cursor_visible: true,
            step_timer: None,
            blink_timer: None,
        }
    }

    pub fn cursor_id(&self) -> &str {
        &self.cursor
    }

    fn attach(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        let Some(display) = ctx.document().get(&self.display) else {
            ctx.log(
                LogLevel::Debug,
                TARGET,
                "display_missing",
                [json_kv("element", json!(self.display))],
            );
            return Ok(());
        };
        if self.writer.is_none() {
            return Ok(());
        }

        // Cursor sits beside the display element, inside the same container.
        let parent = display.parent.clone();
        if !ctx.document().contains(&self.cursor) {
            let mut cursor = Element::block(self.cursor.clone())
                .with_class(CURSOR_CLASS)
                .with_text(CURSOR_GLYPH)
                .with_style("opacity", "1");
            if let Some(parent) = parent {
                cursor = cursor.with_parent(parent);
            }
            ctx.document_mut().insert(cursor)?;
        }
        self.blink_timer = Some(ctx.schedule_repeating(self.blink_interval, "typewriter.blink"));
        self.run_step(ctx)
    }

    fn run_step(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let step = writer.step();
        ctx.document_mut().set_text(&self.display, step.text)?;
        self.step_timer = Some(ctx.schedule_once(step.delay, "typewriter.step"));
        Ok(())
    }

    fn blink(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.cursor_visible = !self.cursor_visible;
        let opacity = if self.cursor_visible { "1" } else { "0" };
        if ctx.document().contains(&self.cursor) {
            ctx.document_mut().set_style(&self.cursor, "opacity", opacity)?;
        }
        Ok(())
    }
}

impl PagePlugin for TypewriterPlugin {
    fn name(&self) -> &str {
        "curtain::typewriter"
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        match event {
            RuntimeEvent::Ready if self.step_timer.is_none() => {
                self.attach(ctx)?;
                Ok(EventFlow::Continue)
            }
            RuntimeEvent::Timer(fired) if Some(fired.id) == self.step_timer => {
                self.run_step(ctx)?;
                Ok(EventFlow::Consumed)
            }
            RuntimeEvent::Timer(fired) if Some(fired.id) == self.blink_timer => {
                self.blink(ctx)?;
                Ok(EventFlow::Consumed)
            }
            _ => Ok(EventFlow::Continue),
        }
    }
}
