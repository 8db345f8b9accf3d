//! Scroll-driven navigation state: active section, back-to-top, header chrome.

use shared::domain::SectionId;
use tracing::debug;

use crate::dom::{Document, NodeId};

/// Height reserved for the fixed header when deciding the current section.
pub const HEADER_OFFSET: f64 = 100.0;
pub const BACK_TO_TOP_THRESHOLD: f64 = 400.0;
pub const HEADER_CHROME_THRESHOLD: f64 = 50.0;

pub const NAV_ID: &str = "nav";
pub const NAV_LINK_CLASS: &str = "nav__link";
pub const BACK_TO_TOP_ID: &str = "back-to-top";
const ACTIVE_CLASS: &str = "active";
const SHOW_CLASS: &str = "show";

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: SectionId,
    pub top: f64,
    pub height: f64,
}

impl Section {
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            id: SectionId::new(id),
            top,
            height,
        }
    }

    pub fn contains(&self, position: f64) -> bool {
        position >= self.top && position < self.top + self.height
    }
}

/// First section whose extent contains `scroll_y + HEADER_OFFSET`.
pub fn compute_active_section(scroll_y: f64, sections: &[Section]) -> Option<SectionId> {
    let position = scroll_y + HEADER_OFFSET;
    sections
        .iter()
        .find(|section| section.contains(position))
        .map(|section| section.id.clone())
}

pub fn should_show_back_to_top(scroll_y: f64) -> bool {
    scroll_y > BACK_TO_TOP_THRESHOLD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurLevel {
    Low,
    High,
}

impl BlurLevel {
    pub fn css(self) -> &'static str {
        match self {
            BlurLevel::Low => "blur(10px)",
            BlurLevel::High => "blur(15px)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shadow {
    None,
    Present,
}

impl Shadow {
    pub fn css(self) -> &'static str {
        match self {
            Shadow::None => "none",
            Shadow::Present => "var(--shadow-sm)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromeState {
    pub blur: BlurLevel,
    pub shadow: Shadow,
}

pub fn update_header_chrome(scroll_y: f64) -> ChromeState {
    if scroll_y >= HEADER_CHROME_THRESHOLD {
        ChromeState {
            blur: BlurLevel::High,
            shadow: Shadow::Present,
        }
    } else {
        ChromeState {
            blur: BlurLevel::Low,
            shadow: Shadow::None,
        }
    }
}

/// Sections of the page, in document order, with their current layout.
pub fn collect_sections(doc: &Document) -> Vec<Section> {
    doc.query(|element| element.tag == "section" && element.id.is_some())
        .into_iter()
        .filter_map(|node| {
            let element = doc.element(node)?;
            let id = element.id.clone()?;
            Some(Section {
                id: SectionId(id),
                top: element.layout.top,
                height: element.layout.height,
            })
        })
        .collect()
}

pub fn nav_link_for(doc: &Document, section: &SectionId) -> Option<NodeId> {
    let href = format!("#{section}");
    doc.query(|element| {
        element.has_class(NAV_LINK_CLASS) && element.attribute("href") == Some(href.as_str())
    })
    .into_iter()
    .next()
}

/// Which section's navigation link is highlighted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavState {
    active: Option<SectionId>,
}

impl NavState {
    pub fn active(&self) -> Option<&SectionId> {
        self.active.as_ref()
    }

    /// Adopts `candidate` when there is one; `None` keeps the previous
    /// highlight. Returns whether the highlight changed.
    pub fn apply(&mut self, candidate: Option<SectionId>) -> bool {
        match candidate {
            Some(section) if self.active.as_ref() != Some(&section) => {
                self.active = Some(section);
                true
            }
            _ => false,
        }
    }
}

/// Marks exactly the active section's link, clearing every other link.
pub fn render_nav(doc: &mut Document, state: &NavState) {
    let Some(active) = state.active() else {
        return;
    };
    for link in doc.query_class(NAV_LINK_CLASS) {
        doc.remove_class(link, ACTIVE_CLASS);
    }
    match nav_link_for(doc, active) {
        Some(link) => doc.add_class(link, ACTIVE_CLASS),
        None => debug!(section = %active, "tracker: no nav link for active section"),
    }
}

pub fn render_back_to_top(doc: &mut Document, visible: bool) {
    let Some(button) = doc.get_element_by_id(BACK_TO_TOP_ID) else {
        return;
    };
    if visible {
        doc.add_class(button, SHOW_CLASS);
        doc.set_style(button, "opacity", "1");
        doc.set_style(button, "visibility", "visible");
    } else {
        doc.remove_class(button, SHOW_CLASS);
        doc.set_style(button, "opacity", "0");
        doc.set_style(button, "visibility", "hidden");
    }
}

pub fn render_header_chrome(doc: &mut Document, chrome: ChromeState) {
    let Some(nav) = doc.get_element_by_id(NAV_ID) else {
        return;
    };
    doc.set_style(nav, "backdrop-filter", chrome.blur.css());
    doc.set_style(nav, "box-shadow", chrome.shadow.css());
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollOutcome {
    pub active: Option<SectionId>,
    pub back_to_top: bool,
    pub chrome: ChromeState,
}

#[derive(Debug, Default)]
pub struct SectionTracker {
    nav: NavState,
}

impl SectionTracker {
    pub fn nav(&self) -> &NavState {
        &self.nav
    }

    /// Recomputes every scroll-derived piece of state from the document's
    /// current scroll offset and renders it.
    pub fn handle_scroll(&mut self, doc: &mut Document) -> ScrollOutcome {
        let scroll_y = doc.scroll_y();
        let sections = collect_sections(doc);
        if self.nav.apply(compute_active_section(scroll_y, &sections)) {
            debug!(section = ?self.nav.active(), scroll_y, "tracker: active section changed");
            render_nav(doc, &self.nav);
        }

        let back_to_top = should_show_back_to_top(scroll_y);
        render_back_to_top(doc, back_to_top);

        let chrome = update_header_chrome(scroll_y);
        render_header_chrome(doc, chrome);

        ScrollOutcome {
            active: self.nav.active().cloned(),
            back_to_top,
            chrome,
        }
    }
}
