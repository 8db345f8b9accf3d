//! Mobile menu and in-page scrolling.

use tracing::{debug, info, warn};

use crate::{
    dom::{Document, NodeId},
    tracker::{BACK_TO_TOP_ID, NAV_ID, NAV_LINK_CLASS},
};

pub const NAV_TOGGLE_ID: &str = "nav-toggle";
pub const NAV_MENU_ID: &str = "nav-menu";
pub const HERO_CTA_CLASS: &str = "hero__cta";
const ACTIVE_CLASS: &str = "active";

/// Used when the page has no navigation bar to measure.
pub const DEFAULT_NAV_HEIGHT: f64 = 70.0;
/// Extra breathing room left above a section after scrolling to it.
pub const SCROLL_GAP: f64 = 10.0;

pub fn scroll_target(section_top: f64, nav_height: f64) -> f64 {
    (section_top - nav_height - SCROLL_GAP).max(0.0)
}

/// Open/closed state of the collapsible navigation menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavMenu {
    open: bool,
}

impl NavMenu {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self, doc: &mut Document) {
        let (Some(menu), Some(toggle)) = (
            doc.get_element_by_id(NAV_MENU_ID),
            doc.get_element_by_id(NAV_TOGGLE_ID),
        ) else {
            return;
        };
        self.open = doc.toggle_class(menu, ACTIVE_CLASS);
        if self.open {
            doc.add_class(toggle, ACTIVE_CLASS);
        } else {
            doc.remove_class(toggle, ACTIVE_CLASS);
        }
        render_body_lock(doc, self.open);
    }

    pub fn close(&mut self, doc: &mut Document) {
        let (Some(menu), Some(toggle)) = (
            doc.get_element_by_id(NAV_MENU_ID),
            doc.get_element_by_id(NAV_TOGGLE_ID),
        ) else {
            return;
        };
        doc.remove_class(menu, ACTIVE_CLASS);
        doc.remove_class(toggle, ACTIVE_CLASS);
        self.open = false;
        render_body_lock(doc, false);
    }

    /// A click anywhere outside the navigation bar closes an open menu.
    pub fn handle_document_click(&mut self, doc: &mut Document, target: NodeId) {
        if !self.open {
            return;
        }
        let inside_nav = doc
            .get_element_by_id(NAV_ID)
            .is_some_and(|nav| doc.contains(nav, target));
        if !inside_nav {
            self.close(doc);
        }
    }
}

fn render_body_lock(doc: &mut Document, locked: bool) {
    let body = doc.body();
    doc.set_style(body, "overflow", if locked { "hidden" } else { "" });
}

/// Scrolls to the section referenced by `href` (`#id`). Returns the requested
/// offset, or `None` when `href` is not an in-page anchor or the section is missing.
pub fn scroll_to_section(doc: &mut Document, href: &str) -> Option<f64> {
    let id = href.strip_prefix('#')?;
    let Some(section) = doc.get_element_by_id(id) else {
        warn!(target_id = href, "nav: section not found");
        return None;
    };
    let section_top = doc.layout(section)?.top;
    let nav_height = doc
        .get_element_by_id(NAV_ID)
        .and_then(|nav| doc.layout(nav))
        .map(|rect| rect.height)
        .unwrap_or(DEFAULT_NAV_HEIGHT);
    let top = scroll_target(section_top, nav_height);
    doc.request_scroll(top);
    info!(target_id = href, top, "nav: scrolling to section");
    Some(top)
}

/// Handles a click on a navigation link or hero call-to-action.
pub fn activate_link(menu: &mut NavMenu, doc: &mut Document, link: NodeId) -> Option<f64> {
    let is_nav_link = doc.has_class(link, NAV_LINK_CLASS);
    if !is_nav_link && !doc.has_class(link, HERO_CTA_CLASS) {
        debug!("nav: click on an element that is not a navigation link");
        return None;
    }
    if is_nav_link {
        menu.close(doc);
    }
    let href = doc.attribute(link, "href")?.to_string();
    scroll_to_section(doc, &href)
}

pub fn back_to_top(doc: &mut Document) {
    if doc.get_element_by_id(BACK_TO_TOP_ID).is_none() {
        return;
    }
    doc.request_scroll(0.0);
    info!("nav: back to top");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Element, ScrollRequest};

    fn page() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let nav = doc.append(body, Element::new("nav").with_id(NAV_ID).with_layout(0.0, 64.0));
        doc.append(nav, Element::new("button").with_id(NAV_TOGGLE_ID));
        let menu = doc.append(nav, Element::new("ul").with_id(NAV_MENU_ID));
        let link = doc.append(
            menu,
            Element::new("a")
                .with_class(NAV_LINK_CLASS)
                .with_attr("href", "#projects"),
        );
        doc.append(
            body,
            Element::new("section")
                .with_id("projects")
                .with_layout(1800.0, 900.0),
        );
        let outside = doc.append(body, Element::new("main"));
        (doc, link, outside)
    }

    #[test]
    fn scroll_target_clamps_at_page_top() {
        assert_eq!(scroll_target(500.0, 70.0), 420.0);
        assert_eq!(scroll_target(40.0, 70.0), 0.0);
    }

    #[test]
    fn toggle_locks_body_scroll_while_open() {
        let (mut doc, _, _) = page();
        let mut menu = NavMenu::default();

        menu.toggle(&mut doc);
        assert!(menu.is_open());
        let toggle = doc.get_element_by_id(NAV_TOGGLE_ID).expect("toggle");
        assert!(doc.has_class(toggle, "active"));
        assert_eq!(doc.style(doc.body(), "overflow"), Some("hidden"));

        menu.toggle(&mut doc);
        assert!(!menu.is_open());
        assert!(!doc.has_class(toggle, "active"));
        assert_eq!(doc.style(doc.body(), "overflow"), None);
    }

    #[test]
    fn outside_click_closes_menu_but_inside_click_does_not() {
        let (mut doc, link, outside) = page();
        let mut menu = NavMenu::default();
        menu.toggle(&mut doc);

        menu.handle_document_click(&mut doc, link);
        assert!(menu.is_open());

        menu.handle_document_click(&mut doc, outside);
        assert!(!menu.is_open());
    }

    #[test]
    fn nav_link_closes_menu_and_scrolls_below_header() {
        let (mut doc, link, _) = page();
        let mut menu = NavMenu::default();
        menu.toggle(&mut doc);

        let top = activate_link(&mut menu, &mut doc, link);
        assert_eq!(top, Some(1800.0 - 64.0 - 10.0));
        assert!(!menu.is_open());
        assert_eq!(
            doc.scroll_requests(),
            &[ScrollRequest {
                top: 1726.0,
                smooth: true
            }]
        );
    }

    #[test]
    fn missing_section_and_external_links_do_nothing() {
        let (mut doc, _, _) = page();
        assert_eq!(scroll_to_section(&mut doc, "#nowhere"), None);
        assert_eq!(scroll_to_section(&mut doc, "https://github.com"), None);
        assert!(doc.scroll_requests().is_empty());
    }

    #[test]
    fn nav_height_defaults_without_nav_bar() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.append(body, Element::new("section").with_id("about").with_layout(600.0, 400.0));
        assert_eq!(scroll_to_section(&mut doc, "#about"), Some(520.0));
    }
}
