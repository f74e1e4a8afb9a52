use serde_json::json;

use crate::config::ScrollConfig;
use crate::document::{Document, ElementId};
use crate::logging::{LogLevel, json_kv};
use crate::runtime::{EventFlow, PagePlugin, RuntimeContext, RuntimeEvent};
use crate::Result;

pub const PARALLAX_CLASS: &str = "services-section";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealDirection {
    Up,
    Left,
    Right,
}

impl RevealDirection {
    pub const ALL: [RevealDirection; 3] = [Self::Up, Self::Left, Self::Right];

    pub fn class(&self) -> &'static str {
        match self {
            RevealDirection::Up => "reveal-up",
            RevealDirection::Left => "reveal-left",
            RevealDirection::Right => "reveal-right",
        }
    }

    fn hidden_transform(&self) -> &'static str {
        match self {
            RevealDirection::Up => "translateY(60px)",
            RevealDirection::Left => "translateX(-100px)",
            RevealDirection::Right => "translateX(100px)",
        }
    }

    fn start(&self, config: &ScrollConfig) -> f64 {
        match self {
            RevealDirection::Up => config.up_start,
            RevealDirection::Left | RevealDirection::Right => config.side_start,
        }
    }
}

#[derive(Debug)]
struct RevealEntry {
    id: ElementId,
    direction: RevealDirection,
    top: f64,
    revealed: bool,
}

/// Background position for the services parallax at scroll offset `scroll_y`.
///
/// The range runs from the section's top meeting the viewport bottom to its
/// bottom leaving the viewport top; outside it the position is clamped.
pub fn parallax_position(top: f64, height: f64, viewport: f64, scroll_y: f64, shift: f64) -> String {
    let span = height + viewport;
    let progress = if span > 0.0 {
        ((scroll_y - (top - viewport)) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let offset = (shift * progress * 100.0).round() / 100.0;
    format!("50% {offset}%")
}

/// One-shot scroll reveals plus the services background parallax.
pub struct ScrollRevealPlugin {
    config: ScrollConfig,
    entries: Vec<RevealEntry>,
    parallax: Option<(ElementId, f64, f64)>,
}

impl ScrollRevealPlugin {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            parallax: None,
        }
    }

    pub fn revealed(&self) -> usize {
        self.entries.iter().filter(|entry| entry.revealed).count()
    }

    fn collect(&mut self, document: &mut Document) -> Result<()> {
        self.entries.clear();
        for direction in RevealDirection::ALL {
            for id in document.by_class(direction.class()) {
                let top = document.get(&id).map(|state| state.top).unwrap_or(0.0);
                document.set_style(&id, "opacity", "0")?;
                document.set_style(&id, "transform", direction.hidden_transform())?;
                self.entries.push(RevealEntry {
                    id,
                    direction,
                    top,
                    revealed: false,
                });
            }
        }

        self.parallax = document
            .by_class(PARALLAX_CLASS)
            .into_iter()
            .next()
            .and_then(|id| {
                let (top, height) = document.get(&id).map(|state| (state.top, state.height))?;
                Some((id, top, height))
            });
        if let Some((id, _, _)) = &self.parallax {
            document.set_style(id, "background-position", "50% 0%")?;
        }
        Ok(())
    }

    fn on_scroll(&mut self, ctx: &mut RuntimeContext<'_>, scroll_y: f64) -> Result<()> {
        let viewport = self.config.viewport_height;
        let mut newly = 0;
        for entry in self.entries.iter_mut().filter(|entry| !entry.revealed) {
            let line = scroll_y + viewport * entry.direction.start(&self.config);
            if entry.top <= line {
                entry.revealed = true;
                let document = ctx.document_mut();
                document.set_style(&entry.id, "opacity", "1")?;
                document.set_style(&entry.id, "transform", "none")?;
                newly += 1;
            }
        }
        if newly > 0 {
            ctx.log(
                LogLevel::Debug,
                "curtain::scroll",
                "elements_revealed",
                [
                    json_kv("count", json!(newly)),
                    json_kv("scroll_y", json!(scroll_y)),
                ],
            );
        }

        if let Some((id, top, height)) = &self.parallax {
            let position =
                parallax_position(*top, *height, viewport, scroll_y, self.config.parallax_shift);
            ctx.document_mut()
                .set_style(id, "background-position", position)?;
        }
        Ok(())
    }
}

impl PagePlugin for ScrollRevealPlugin {
    fn name(&self) -> &str {
        "curtain::scroll"
    }

    fn init(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.collect(ctx.document_mut())
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        match event {
            RuntimeEvent::Ready => self.on_scroll(ctx, 0.0)?,
            RuntimeEvent::Scroll { y } => self.on_scroll(ctx, *y)?,
            _ => {}
        }
        Ok(EventFlow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;
    use crate::runtime::PageRuntime;

    fn page() -> Document {
        Document::new()
            .with_element(Element::block("above-fold").with_class("reveal-up").with_top(300.0))
            .unwrap()
            .with_element(Element::block("card").with_class("reveal-up").with_top(1000.0))
            .unwrap()
            .with_element(Element::block("photo").with_class("reveal-left").with_top(1000.0))
            .unwrap()
            .with_element(
                Element::block("services")
                    .with_class(PARALLAX_CLASS)
                    .with_top(1600.0)
                    .with_height(800.0),
            )
            .unwrap()
    }

    fn runtime() -> PageRuntime {
        let mut runtime = PageRuntime::new(page());
        runtime.register_plugin(ScrollRevealPlugin::new(ScrollConfig::default()));
        runtime.start().unwrap();
        runtime
    }

    #[test]
    fn elements_in_view_at_load_are_revealed() {
        let runtime = runtime();
        let doc = runtime.document();
        assert_eq!(doc.style("above-fold", "opacity"), Some("1"));
        assert_eq!(doc.style("card", "opacity"), Some("0"));
        assert_eq!(doc.style("photo", "transform"), Some("translateX(-100px)"));
    }

    #[test]
    fn side_reveals_need_a_deeper_scroll_than_upward_ones() {
        let mut runtime = runtime();
        // 1000 <= 330 + 680 for up, but 1000 > 330 + 640 for side.
        runtime.dispatch(RuntimeEvent::Scroll { y: 330.0 }).unwrap();
        assert_eq!(runtime.document().style("card", "opacity"), Some("1"));
        assert_eq!(runtime.document().style("photo", "opacity"), Some("0"));

        runtime.dispatch(RuntimeEvent::Scroll { y: 370.0 }).unwrap();
        assert_eq!(runtime.document().style("photo", "opacity"), Some("1"));
    }

    #[test]
    fn reveals_are_one_shot() {
        let mut runtime = runtime();
        runtime.dispatch(RuntimeEvent::Scroll { y: 2000.0 }).unwrap();
        runtime.dispatch(RuntimeEvent::Scroll { y: 0.0 }).unwrap();
        assert_eq!(runtime.document().style("card", "opacity"), Some("1"));
    }

    #[test]
    fn parallax_tracks_scroll_across_section() {
        assert_eq!(parallax_position(1600.0, 800.0, 800.0, 0.0, 20.0), "50% 0%");
        assert_eq!(parallax_position(1600.0, 800.0, 800.0, 800.0, 20.0), "50% 0%");
        assert_eq!(parallax_position(1600.0, 800.0, 800.0, 1600.0, 20.0), "50% 10%");
        assert_eq!(parallax_position(1600.0, 800.0, 800.0, 5000.0, 20.0), "50% 20%");

        let mut runtime = runtime();
        runtime.dispatch(RuntimeEvent::Scroll { y: 1600.0 }).unwrap();
        assert_eq!(
            runtime.document().style("services", "background-position"),
            Some("50% 10%")
        );
    }
}
