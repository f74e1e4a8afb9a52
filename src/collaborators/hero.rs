use serde_json::json;

use crate::document::{Document, ElementId};
use crate::logging::{LogLevel, json_kv};
use crate::runtime::{EventFlow, PagePlugin, RuntimeContext, RuntimeEvent};
use crate::Result;

/// Selectors the hero reveal animates.
#[derive(Debug, Clone)]
pub struct HeroRevealTargets {
    /// Class carried by headline lines that rise into view.
    pub text_class: String,
    /// Container whose direct children (logo, links, toggle) drop into view.
    pub nav_container: ElementId,
    /// Class of the backdrop that zooms out to its natural size.
    pub backdrop_class: String,
}

impl Default for HeroRevealTargets {
    fn default() -> Self {
        Self {
            text_class: "reveal-text".to_string(),
            nav_container: "nav-content".to_string(),
            backdrop_class: "hero-bg".to_string(),
        }
    }
}

/// Hides hero content at init and shows it when the page is revealed.
///
/// Only the end states are applied; easing and stagger belong to the host.
pub struct HeroRevealPlugin {
    targets: HeroRevealTargets,
    triggered: usize,
}

impl HeroRevealPlugin {
    pub fn new(targets: HeroRevealTargets) -> Self {
        Self {
            targets,
            triggered: 0,
        }
    }

    pub fn triggered(&self) -> usize {
        self.triggered
    }

    fn text_elements(&self, document: &Document) -> Vec<ElementId> {
        document.by_class(&self.targets.text_class)
    }

    fn nav_elements(&self, document: &Document) -> Vec<ElementId> {
        document.children_of(&self.targets.nav_container)
    }

    fn prepare(&self, document: &mut Document) -> Result<()> {
        for id in self.text_elements(document) {
            document.set_style(&id, "opacity", "0")?;
            document.set_style(&id, "transform", "translateY(50px)")?;
        }
        for id in self.nav_elements(document) {
            document.set_style(&id, "opacity", "0")?;
            document.set_style(&id, "transform", "translateY(-20px)")?;
        }
        for id in document.by_class(&self.targets.backdrop_class) {
            document.set_style(&id, "transform", "scale(1.3)")?;
        }
        Ok(())
    }

    fn play(&self, document: &mut Document) -> Result<usize> {
        let mut shown = 0;
        for id in document.by_class(&self.targets.backdrop_class) {
            document.set_style(&id, "transform", "scale(1)")?;
        }
        for id in self
            .text_elements(document)
            .into_iter()
            .chain(self.nav_elements(document))
        {
            document.set_style(&id, "opacity", "1")?;
            document.set_style(&id, "transform", "none")?;
            shown += 1;
        }
        Ok(shown)
    }
}

impl Default for HeroRevealPlugin {
    fn default() -> Self {
        Self::new(HeroRevealTargets::default())
    }
}

impl PagePlugin for HeroRevealPlugin {
    fn name(&self) -> &str {
        "curtain::hero"
    }

    fn init(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.prepare(ctx.document_mut())
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        if matches!(event, RuntimeEvent::Revealed) {
            let shown = self.play(ctx.document_mut())?;
            self.triggered += 1;
            ctx.log(
                LogLevel::Info,
                "curtain::hero",
                "hero_revealed",
                [
                    json_kv("elements", json!(shown)),
                    json_kv("triggered", json!(self.triggered)),
                ],
            );
        }
        Ok(EventFlow::Continue)
    }
}
