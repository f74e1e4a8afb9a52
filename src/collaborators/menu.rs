use std::time::Duration;

use serde_json::json;

use crate::document::{Document, ElementId};
use crate::logging::{LogLevel, json_kv};
use crate::runtime::{EventFlow, PagePlugin, RuntimeContext, RuntimeEvent};
use crate::timer::TimerId;
use crate::Result;

pub const ACTIVE_CLASS: &str = "active";

#[derive(Debug, Clone)]
pub struct MobileMenuTargets {
    pub toggle: ElementId,
    pub links: ElementId,
    /// Class of the anchors inside the link list; clicking one closes the menu.
    pub link_class: String,
}

impl Default for MobileMenuTargets {
    fn default() -> Self {
        Self {
            toggle: "menu-toggle".to_string(),
            links: "nav-links".to_string(),
            link_class: "nav-link".to_string(),
        }
    }
}

/// Mobile navigation toggle. Opening the menu slides its items in one by one.
pub struct MobileMenuPlugin {
    targets: MobileMenuTargets,
    first_delay: Duration,
    stagger: Duration,
    pending: Vec<(TimerId, ElementId)>,
}

impl MobileMenuPlugin {
    pub fn new(targets: MobileMenuTargets) -> Self {
        Self {
            targets,
            first_delay: Duration::from_millis(200),
            stagger: Duration::from_millis(100),
            pending: Vec::new(),
        }
    }

    fn present(&self, document: &Document) -> bool {
        document.contains(&self.targets.toggle) && document.contains(&self.targets.links)
    }

    fn toggle(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        let open = ctx
            .document_mut()
            .toggle_class(&self.targets.links, ACTIVE_CLASS)?;
        ctx.document_mut()
            .toggle_class(&self.targets.toggle, ACTIVE_CLASS)?;

        for (timer, _) in self.pending.drain(..) {
            ctx.cancel(timer);
        }
        if open {
            let items = ctx.document().children_of(&self.targets.links);
            for (index, item) in items.into_iter().enumerate() {
                let document = ctx.document_mut();
                document.set_style(&item, "opacity", "0")?;
                document.set_style(&item, "transform", "translateX(50px)")?;
                let delay = self.first_delay + self.stagger * index as u32;
                let timer = ctx.schedule_once(delay, "menu.item_in");
                self.pending.push((timer, item));
            }
        }
        ctx.log(
            LogLevel::Debug,
            "curtain::menu",
            "menu_toggled",
            [json_kv("open", json!(open))],
        );
        Ok(())
    }

    fn close(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        let document = ctx.document_mut();
        document.remove_class(&self.targets.links, ACTIVE_CLASS)?;
        document.remove_class(&self.targets.toggle, ACTIVE_CLASS)?;
        Ok(())
    }

    fn is_menu_link(&self, document: &Document, id: &str) -> bool {
        if !document.has_class(id, &self.targets.link_class) {
            return false;
        }
        let mut current = document.get(id).and_then(|state| state.parent.clone());
        while let Some(parent) = current {
            if parent == self.targets.links {
                return true;
            }
            current = document.get(&parent).and_then(|state| state.parent.clone());
        }
        false
    }
}

impl Default for MobileMenuPlugin {
    fn default() -> Self {
        Self::new(MobileMenuTargets::default())
    }
}

impl PagePlugin for MobileMenuPlugin {
    fn name(&self) -> &str {
        "curtain::menu"
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        match event {
            RuntimeEvent::Click(id) if self.present(ctx.document()) => {
                if *id == self.targets.toggle {
                    self.toggle(ctx)?;
                    return Ok(EventFlow::Consumed);
                }
                if self.is_menu_link(ctx.document(), id) {
                    self.close(ctx)?;
                }
                Ok(EventFlow::Continue)
            }
            RuntimeEvent::Timer(fired) => {
                let Some(index) = self.pending.iter().position(|(timer, _)| *timer == fired.id)
                else {
                    return Ok(EventFlow::Continue);
                };
                let (_, item) = self.pending.remove(index);
                let document = ctx.document_mut();
                document.set_style(&item, "opacity", "1")?;
                document.set_style(&item, "transform", "none")?;
                Ok(EventFlow::Consumed)
            }
            _ => Ok(EventFlow::Continue),
        }
    }
}
