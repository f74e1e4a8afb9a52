use crate::config::NavbarConfig;
use crate::document::ElementId;
use crate::runtime::{EventFlow, PagePlugin, RuntimeContext, RuntimeEvent};
use crate::Result;

pub const SCROLLED_CLASS: &str = "scrolled";

/// Marks the navbar `scrolled` once the page leaves the top.
pub struct NavbarPlugin {
    navbar: ElementId,
    threshold: f64,
}

impl NavbarPlugin {
    pub fn new(navbar: impl Into<ElementId>, config: &NavbarConfig) -> Self {
        Self {
            navbar: navbar.into(),
            threshold: config.scroll_threshold,
        }
    }
}

impl PagePlugin for NavbarPlugin {
    fn name(&self) -> &str {
        "curtain::navbar"
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        if let RuntimeEvent::Scroll { y } = event {
            if ctx.document().contains(&self.navbar) {
                let document = ctx.document_mut();
                if *y > self.threshold {
                    document.add_class(&self.navbar, SCROLLED_CLASS)?;
                } else {
                    document.remove_class(&self.navbar, SCROLLED_CLASS)?;
                }
            }
        }
        Ok(EventFlow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, Element};
    use crate::runtime::PageRuntime;

    #[test]
    fn class_follows_threshold_both_ways() {
        let document = Document::new()
            .with_element(Element::block("navbar"))
            .unwrap();
        let mut runtime = PageRuntime::new(document);
        runtime.register_plugin(NavbarPlugin::new("navbar", &NavbarConfig::default()));
        runtime.start().unwrap();

        runtime.dispatch(RuntimeEvent::Scroll { y: 50.0 }).unwrap();
        assert!(!runtime.document().has_class("navbar", SCROLLED_CLASS));
        runtime.dispatch(RuntimeEvent::Scroll { y: 51.0 }).unwrap();
        assert!(runtime.document().has_class("navbar", SCROLLED_CLASS));
        runtime.dispatch(RuntimeEvent::Scroll { y: 0.0 }).unwrap();
        assert!(!runtime.document().has_class("navbar", SCROLLED_CLASS));
    }

    #[test]
    fn missing_navbar_is_ignored() {
        let mut runtime = PageRuntime::new(Document::new());
        runtime.register_plugin(NavbarPlugin::new("navbar", &NavbarConfig::default()));
        runtime.start().unwrap();
        assert!(runtime.dispatch(RuntimeEvent::Scroll { y: 400.0 }).is_ok());
    }
}
