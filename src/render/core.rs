use std::io::Write;

use crate::bootstrap::{DEFAULT_LOADER, DEFAULT_PROGRESS_FILL};
use crate::collaborators::{ACTIVE_CLASS, MobileMenuTargets, SCROLLED_CLASS};
use crate::document::{Document, ElementId};
use crate::error::Result;
use crate::runtime::bundles::DEFAULT_NAVBAR;
use crate::typewriter::{CURSOR_GLYPH, CURSOR_SUFFIX, DEFAULT_DISPLAY};

use super::width::{display_width, truncate_to_width};

/// Renderer runtime parameters.
#[derive(Debug, Clone)]
pub struct RendererSettings {
    /// Columns available for each line.
    pub width: u16,
    /// Cells used by the loader bar itself.
    pub bar_width: u16,
    pub restore_cursor: Option<(u16, u16)>,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            width: 80,
            bar_width: 40,
            restore_cursor: None,
        }
    }
}

/// Which elements feed each line of the terminal view.
#[derive(Debug, Clone)]
pub struct PageView {
    pub navbar: ElementId,
    pub logo: ElementId,
    pub menu: MobileMenuTargets,
    pub loader: ElementId,
    pub progress_fill: ElementId,
    pub typewriter: ElementId,
}

impl Default for PageView {
    fn default() -> Self {
        Self {
            navbar: DEFAULT_NAVBAR.to_string(),
            logo: "logo".to_string(),
            menu: MobileMenuTargets::default(),
            loader: DEFAULT_LOADER.to_string(),
            progress_fill: DEFAULT_PROGRESS_FILL.to_string(),
            typewriter: DEFAULT_DISPLAY.to_string(),
        }
    }
}

/// Text bar for a CSS width such as `42.37%`, e.g. `[████░░░░]  42%`.
pub fn loader_bar(fill_width: Option<&str>, cells: u16) -> String {
    let percent = fill_width
        .and_then(|raw| raw.trim_end_matches('%').parse::<f64>().ok())
        .unwrap_or(0.0)
        .clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * f64::from(cells)).round() as usize;
    let empty = usize::from(cells).saturating_sub(filled);
    format!(
        "[{}{}] {:>3}%",
        "█".repeat(filled),
        "░".repeat(empty),
        percent.floor() as u32
    )
}

/// ANSI renderer that redraws the page summary in place.
pub struct TerminalRenderer {
    settings: RendererSettings,
    view: PageView,
}

impl TerminalRenderer {
    pub fn new(settings: RendererSettings, view: PageView) -> Self {
        Self { settings, view }
    }

    pub fn with_default() -> Self {
        Self::new(RendererSettings::default(), PageView::default())
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    /// Lines of the current frame, before padding.
    pub fn compose(&self, document: &Document, status: &str) -> Vec<String> {
        vec![
            self.nav_line(document),
            String::new(),
            self.hero_line(document),
            String::new(),
            status.to_string(),
        ]
    }

    pub fn render(&mut self, writer: &mut impl Write, document: &Document, status: &str) -> Result<()> {
        let width = usize::from(self.settings.width);
        for (row, line) in self.compose(document, status).iter().enumerate() {
            let mut line = truncate_to_width(line, width);
            pad_line(&mut line, width);
            write!(writer, "\x1b[{};1H{}", row + 1, line)?;
        }

        if let Some((row, col)) = self.settings.restore_cursor {
            write!(writer, "\x1b[{};{}H", row + 1, col + 1)?;
        }

        writer.flush()?;
        Ok(())
    }

    fn nav_line(&self, document: &Document) -> String {
        let links: Vec<&str> = document
            .by_class(&self.view.menu.link_class)
            .iter()
            .filter_map(|id| document.text(id))
            .collect();
        let mut line = document.text(&self.view.logo).unwrap_or_default().to_string();
        if !links.is_empty() {
            if !line.is_empty() {
                line.push_str("  ");
            }
            line.push_str(&links.join(" · "));
        }
        if document.has_class(&self.view.menu.links, ACTIVE_CLASS) {
            line.push_str("  [menu open]");
        }
        if document.has_class(&self.view.navbar, SCROLLED_CLASS) {
            line.push_str("  [scrolled]");
        }
        line
    }

    fn hero_line(&self, document: &Document) -> String {
        if self.loader_visible(document) {
            let fill = document.style(&self.view.progress_fill, "width");
            return format!(
                "LOADING {}",
                loader_bar(fill, self.settings.bar_width)
            );
        }

        let mut line = document
            .text(&self.view.typewriter)
            .unwrap_or_default()
            .to_string();
        let cursor = format!("{}{CURSOR_SUFFIX}", self.view.typewriter);
        let cursor_visible = document.contains(&cursor)
            && document.style(&cursor, "opacity") != Some("0");
        if cursor_visible {
            line.push_str(CURSOR_GLYPH);
        }
        line
    }

    fn loader_visible(&self, document: &Document) -> bool {
        document.contains(&self.view.loader)
            && document.style(&self.view.loader, "display") != Some("none")
            && document.style(&self.view.loader, "visibility") != Some("hidden")
    }
}

fn pad_line(line: &mut String, width: usize) {
    let display = display_width(line);
    if display < width {
        line.push_str(&" ".repeat(width - display));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;

    fn page() -> Document {
        Document::new()
            .with_element(Element::block("navbar"))
            .unwrap()
            .with_element(Element::block("logo").with_parent("navbar").with_text("AUTO"))
            .unwrap()
            .with_element(Element::block("nav-links").with_parent("navbar"))
            .unwrap()
            .with_element(
                Element::block("home-link")
                    .with_parent("nav-links")
                    .with_class("nav-link")
                    .with_text("Home"),
            )
            .unwrap()
            .with_element(Element::block("loader-wrapper"))
            .unwrap()
            .with_element(
                Element::block("progress-fill")
                    .with_parent("loader-wrapper")
                    .with_style("width", "50%"),
            )
            .unwrap()
            .with_element(Element::block("typewriter").with_text("EXPERT"))
            .unwrap()
            .with_element(Element::block("typewriter-cursor").with_style("opacity", "1"))
            .unwrap()
    }

    #[test]
    fn loader_bar_scales_with_fill() {
        assert_eq!(loader_bar(Some("50%"), 4), "[██░░]  50%");
        assert_eq!(loader_bar(Some("100%"), 4), "[████] 100%");
        assert_eq!(loader_bar(None, 2), "[░░]   0%");
    }

    #[test]
    fn loader_replaces_hero_until_hidden() {
        let mut document = page();
        let renderer = TerminalRenderer::with_default();
        let lines = renderer.compose(&document, "phase=loading");
        assert_eq!(lines[0], "AUTO  Home");
        assert!(lines[2].starts_with("LOADING ["));
        assert_eq!(lines[4], "phase=loading");

        document
            .set_style("loader-wrapper", "visibility", "hidden")
            .unwrap();
        document.add_class("navbar", SCROLLED_CLASS).unwrap();
        let lines = renderer.compose(&document, "");
        assert_eq!(lines[2], "EXPERT|");
        assert!(lines[0].ends_with("[scrolled]"));

        document
            .set_style("typewriter-cursor", "opacity", "0")
            .unwrap();
        assert_eq!(renderer.compose(&document, "")[2], "EXPERT");
    }

    #[test]
    fn renderer_writes_cursor_sequences_and_pads() {
        let document = page();
        let mut renderer = TerminalRenderer::new(
            RendererSettings {
                width: 12,
                ..RendererSettings::default()
            },
            PageView::default(),
        );
        let mut output = Vec::new();
        renderer.render(&mut output, &document, "status").unwrap();

        let rendered = String::from_utf8(output).unwrap();
        assert!(rendered.contains("\u{1b}[1;1HAUTO  Home  "));
        assert!(rendered.contains("\u{1b}[5;1Hstatus      "));
        let plain = String::from_utf8(strip_ansi_escapes::strip(&rendered)).unwrap();
        assert_eq!(plain.chars().count(), 12 * 5);
    }
}
