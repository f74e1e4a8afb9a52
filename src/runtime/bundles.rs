use crate::Result;
use crate::bootstrap::{
    BootstrapSequencer, BootstrapTargets, DEFAULT_LOADER, DEFAULT_MEDIA, DEFAULT_PROGRESS_FILL,
    SharedBootstrapStatus,
};
use crate::collaborators::{
    BookingFormIds, BookingFormPlugin, HeroRevealPlugin, HeroRevealTargets, MobileMenuPlugin,
    MobileMenuTargets, NavbarPlugin, PARALLAX_CLASS, RevealDirection, ScrollRevealPlugin,
};
use crate::config::PageConfig;
use crate::document::{Document, Element, ElementId, ReadyState};
use crate::logging::{LogLevel, Logger};
use crate::session::SessionStore;
use crate::typewriter::{DEFAULT_DISPLAY, TypewriterPlugin};

use super::PluginBundle;
use super::diagnostics::LifecycleLoggerPlugin;

pub const DEFAULT_NAVBAR: &str = "navbar";

#[derive(Clone)]
pub struct PageBundleConfig {
    pub page: PageConfig,
    pub bootstrap: BootstrapTargets,
    pub hero: HeroRevealTargets,
    pub typewriter_display: ElementId,
    pub navbar: ElementId,
    pub menu: MobileMenuTargets,
    pub booking: BookingFormIds,
    /// Fixed seed for the progress simulator; `None` seeds from the OS.
    pub progress_seed: Option<u64>,
    pub bootstrap_priority: i32,
    pub collaborator_priority: i32,
    pub diagnostics: Option<DiagnosticsConfig>,
}

impl Default for PageBundleConfig {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            bootstrap: BootstrapTargets::default(),
            hero: HeroRevealTargets::default(),
            typewriter_display: DEFAULT_DISPLAY.to_string(),
            navbar: DEFAULT_NAVBAR.to_string(),
            menu: MobileMenuTargets::default(),
            booking: BookingFormIds::default(),
            progress_seed: None,
            bootstrap_priority: 0,
            collaborator_priority: 10,
            diagnostics: None,
        }
    }
}

#[derive(Clone)]
pub struct DiagnosticsConfig {
    pub logger: Logger,
    pub lifecycle_priority: i32,
    pub level: LogLevel,
    pub log_scroll: bool,
    pub log_timers: bool,
}

impl DiagnosticsConfig {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            lifecycle_priority: -100,
            level: LogLevel::Debug,
            log_scroll: false,
            log_timers: false,
        }
    }

    fn build_logger_plugin(&self) -> LifecycleLoggerPlugin {
        LifecycleLoggerPlugin::new(self.logger.clone())
            .with_level(self.level)
            .log_scroll(self.log_scroll)
            .log_timers(self.log_timers)
    }
}

/// Plugins for the full marketing page plus a handle on the loader state.
pub struct PageBundle {
    pub plugins: PluginBundle,
    pub status: SharedBootstrapStatus,
}

/// Sequencer first, collaborators after it in a fixed order, so the loader
/// decides before anything reacts to the reveal.
///
/// Fails when `config.page` does not validate.
pub fn marketing_page_bundle<S>(config: PageBundleConfig, session: S) -> Result<PageBundle>
where
    S: SessionStore + 'static,
{
    let page = &config.page;
    let sequencer = match config.progress_seed {
        Some(seed) => BootstrapSequencer::seeded(config.bootstrap.clone(), page, session, seed)?,
        None => BootstrapSequencer::new(config.bootstrap.clone(), page, session)?,
    };
    let status = sequencer.status_handle();
    let base = config.collaborator_priority;

    let mut plugins = PluginBundle::new()
        .with_plugin(sequencer, config.bootstrap_priority)
        .with_plugin(HeroRevealPlugin::new(config.hero.clone()), base)
        .with_plugin(
            TypewriterPlugin::new(config.typewriter_display.clone(), &page.typewriter),
            base + 1,
        )
        .with_plugin(ScrollRevealPlugin::new(page.scroll.clone()), base + 2)
        .with_plugin(NavbarPlugin::new(config.navbar.clone(), &page.navbar), base + 3)
        .with_plugin(MobileMenuPlugin::new(config.menu.clone()), base + 4)
        .with_plugin(
            BookingFormPlugin::new(config.booking.clone(), &page.booking),
            base + 5,
        );

    if let Some(diag) = config.diagnostics.as_ref() {
        plugins = plugins.with_plugin(diag.build_logger_plugin(), diag.lifecycle_priority);
    }

    Ok(PageBundle { plugins, status })
}

/// Hero media as the page ships it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeroMedia {
    pub ready_state: ReadyState,
    pub autoplay_allowed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub media: Option<HeroMedia>,
    pub location_hash: Option<String>,
    pub include_loader: bool,
}

impl PageOptions {
    pub fn with_loader() -> Self {
        Self {
            include_loader: true,
            ..Self::default()
        }
    }

    pub fn media(mut self, ready_state: ReadyState, autoplay_allowed: bool) -> Self {
        self.media = Some(HeroMedia {
            ready_state,
            autoplay_allowed,
        });
        self
    }

    pub fn location_hash(mut self, hash: impl Into<String>) -> Self {
        self.location_hash = Some(hash.into());
        self
    }
}

/// The auto-service landing page: navbar, loader, hero with typewriter,
/// services, about section, and the booking form.
pub fn marketing_page_document(options: &PageOptions) -> Result<Document> {
    let booking = BookingFormIds::default();
    let menu = MobileMenuTargets::default();

    let mut document = Document::new()
        .with_element(Element::block(DEFAULT_NAVBAR).with_style("position", "fixed"))?
        .with_element(Element::block("nav-content").with_parent(DEFAULT_NAVBAR))?
        .with_element(
            Element::block("logo")
                .with_parent("nav-content")
                .with_text("AUTO CARE"),
        )?
        .with_element(Element::block(menu.links.clone()).with_parent("nav-content"))?;

    for (item, label) in [("home", "Home"), ("services", "Services"), ("booking", "Book")] {
        let li = format!("nav-item-{item}");
        document.insert(Element::block(li.clone()).with_parent(menu.links.clone()))?;
        document.insert(
            Element::block(format!("nav-link-{item}"))
                .with_parent(li)
                .with_class(menu.link_class.clone())
                .with_text(label),
        )?;
    }
    document.insert(
        Element::block(menu.toggle.clone())
            .with_parent("nav-content")
            .with_text("☰"),
    )?;

    if options.include_loader {
        document.insert(Element::block(DEFAULT_LOADER).with_class("loader-wrapper"))?;
        document.insert(
            Element::block(DEFAULT_PROGRESS_FILL)
                .with_parent(DEFAULT_LOADER)
                .with_class("progress-fill"),
        )?;
    }

    document.insert(Element::block("home").with_top(0.0).with_height(800.0))?;
    document.insert(Element::block("hero-backdrop").with_parent("home").with_class("hero-bg"))?;
    if let Some(media) = options.media {
        document.insert(
            Element::media(DEFAULT_MEDIA, media.ready_state)
                .with_parent("home")
                .with_autoplay(media.autoplay_allowed),
        )?;
    }
    document.insert(
        Element::block("hero-title")
            .with_parent("home")
            .with_class("reveal-text"),
    )?;
    document.insert(Element::block(DEFAULT_DISPLAY).with_parent("hero-title"))?;
    document.insert(
        Element::block("hero-subtitle")
            .with_parent("home")
            .with_class("reveal-text")
            .with_text("Dubai's trusted car care"),
    )?;

    document.insert(
        Element::block("services")
            .with_class(PARALLAX_CLASS)
            .with_top(900.0)
            .with_height(900.0),
    )?;
    for (index, name) in ["Oil Change", "Detailing", "Battery"].into_iter().enumerate() {
        document.insert(
            Element::block(format!("service-card-{index}"))
                .with_parent("services")
                .with_class(RevealDirection::Up.class())
                .with_top(1000.0 + 100.0 * index as f64)
                .with_text(name),
        )?;
    }

    document.insert(Element::block("about").with_top(2000.0).with_height(700.0))?;
    document.insert(
        Element::block("about-photo")
            .with_parent("about")
            .with_class(RevealDirection::Left.class())
            .with_top(2050.0),
    )?;
    document.insert(
        Element::block("about-copy")
            .with_parent("about")
            .with_class(RevealDirection::Right.class())
            .with_top(2050.0)
            .with_text("Family run since 2009"),
    )?;

    document.insert(Element::block("booking").with_top(2800.0).with_height(600.0))?;
    document.insert(Element::block(booking.form.clone()).with_parent("booking"))?;
    for field in [
        &booking.name,
        &booking.phone,
        &booking.vehicle,
        &booking.service,
        &booking.message,
    ] {
        document.insert(Element::input(field.clone()).with_parent(booking.form.clone()))?;
    }
    document.insert(
        Element::button(booking.button.clone(), "Book Appointment")
            .with_parent(booking.form.clone()),
    )?;

    document.set_location_hash(options.location_hash.as_deref());
    Ok(document)
}
