//! Page layouts described in TOML, and the document they produce.
//!
//! A layout lists the measured geometry of the host page; [`PageLayout::build_document`]
//! turns it into a [`Document`] that follows the markup contract the
//! controllers expect (`nav`, `nav-menu`, `.nav__link`, `back-to-top`,
//! `section[id]`, `.timeline`, `contact-form` with its fields and error slots).

use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shared::domain::FieldName;

use crate::{
    dom::{Document, Element},
    form::{FORM_ERROR_CLASS, FORM_ID},
    nav::{NAV_MENU_ID, NAV_TOGGLE_ID},
    timeline::{CONTENT_CLASS, ITEM_CLASS, MARKER_CLASS, TIMELINE_CLASS},
    tracker::{BACK_TO_TOP_ID, NAV_ID, NAV_LINK_CLASS},
};

pub const SUBMIT_LABEL: &str = "Send Message";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionLayout {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineLayout {
    /// Section the timeline is placed in.
    pub section: String,
    pub top: f64,
    pub item_height: f64,
    pub items: usize,
    #[serde(default = "default_marker_offset")]
    pub marker_offset: f64,
    #[serde(default = "default_marker_height")]
    pub marker_height: f64,
}

fn default_marker_offset() -> f64 {
    20.0
}

fn default_marker_height() -> f64 {
    16.0
}

fn default_viewport_height() -> f64 {
    Document::DEFAULT_VIEWPORT_HEIGHT
}

fn default_nav_height() -> f64 {
    70.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
    #[serde(default = "default_nav_height")]
    pub nav_height: f64,
    pub sections: Vec<SectionLayout>,
    #[serde(default)]
    pub timeline: Option<TimelineLayout>,
    /// Section holding the contact form.
    #[serde(default)]
    pub contact_section: Option<String>,
}

impl PageLayout {
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        toml::from_str(raw).context("failed to parse page layout")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read page layout '{}'", path.display()))?;
        Self::from_toml(&raw)
    }

    pub fn build_document(&self) -> Document {
        let mut doc = Document::new();
        doc.set_viewport_height(self.viewport_height);
        let body = doc.body();

        let nav = doc.append(
            body,
            Element::new("nav")
                .with_id(NAV_ID)
                .with_layout(0.0, self.nav_height),
        );
        doc.append(nav, Element::new("button").with_id(NAV_TOGGLE_ID));
        let menu = doc.append(nav, Element::new("ul").with_id(NAV_MENU_ID));
        for section in &self.sections {
            doc.append(
                menu,
                Element::new("a")
                    .with_class(NAV_LINK_CLASS)
                    .with_attr("href", format!("#{}", section.id))
                    .with_text(&section.id),
            );
        }

        for section in &self.sections {
            let node = doc.append(
                body,
                Element::new("section")
                    .with_id(&section.id)
                    .with_layout(section.top, section.height),
            );

            if let Some(timeline) = self
                .timeline
                .as_ref()
                .filter(|timeline| timeline.section == section.id)
            {
                let height = timeline.item_height * timeline.items as f64;
                let container = doc.append(
                    node,
                    Element::new("div")
                        .with_class(TIMELINE_CLASS)
                        .with_layout(timeline.top, height),
                );
                for index in 0..timeline.items {
                    let top = timeline.top + timeline.item_height * index as f64;
                    let item = doc.append(
                        container,
                        Element::new("div")
                            .with_class(ITEM_CLASS)
                            .with_layout(top, timeline.item_height),
                    );
                    doc.append(
                        item,
                        Element::new("span")
                            .with_class(MARKER_CLASS)
                            .with_layout(top + timeline.marker_offset, timeline.marker_height),
                    );
                    doc.append(
                        item,
                        Element::new("div")
                            .with_class(CONTENT_CLASS)
                            .with_layout(top, timeline.item_height),
                    );
                }
            }

            if self.contact_section.as_deref() == Some(section.id.as_str()) {
                append_contact_form(&mut doc, node, section.top);
            }
        }

        doc.append(body, Element::new("button").with_id(BACK_TO_TOP_ID));
        doc
    }
}

fn append_contact_form(doc: &mut Document, parent: crate::dom::NodeId, top: f64) {
    let form = doc.append(
        parent,
        Element::new("form").with_id(FORM_ID).with_layout(top, 600.0),
    );
    for field in FieldName::ALL {
        let tag = match field {
            FieldName::Subject => "select",
            FieldName::Message => "textarea",
            FieldName::Name | FieldName::Email => "input",
        };
        doc.append(
            form,
            Element::new(tag)
                .with_id(field.as_str())
                .with_attr("name", field.as_str())
                .with_class("form-control"),
        );
        doc.append(
            form,
            Element::new("div")
                .with_id(field.error_slot_id())
                .with_class(FORM_ERROR_CLASS),
        );
    }
    doc.append(
        form,
        Element::new("button")
            .with_attr("type", "submit")
            .with_text(SUBMIT_LABEL),
    );
}

#[cfg(test)]
pub(crate) const SAMPLE_LAYOUT: &str = r#"
viewport_height = 900
contact_section = "contact"

[[sections]]
id = "home"
top = 0
height = 800

[[sections]]
id = "experience"
top = 800
height = 1200

[[sections]]
id = "contact"
top = 2000
height = 900

[timeline]
section = "experience"
top = 900
item_height = 300
items = 3
"#;

#[cfg(test)]
pub(crate) fn sample_document() -> Document {
    PageLayout::from_toml(SAMPLE_LAYOUT)
        .expect("sample layout")
        .build_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{form, tracker::collect_sections};

    #[test]
    fn parses_and_builds_the_markup_contract() {
        let layout = PageLayout::from_toml(SAMPLE_LAYOUT).expect("layout");
        assert_eq!(layout.nav_height, 70.0);
        let doc = layout.build_document();

        assert_eq!(doc.viewport_height(), 900.0);
        assert_eq!(collect_sections(&doc).len(), 3);
        assert_eq!(doc.query_class(NAV_LINK_CLASS).len(), 3);
        assert_eq!(doc.query_class(ITEM_CLASS).len(), 3);
        assert_eq!(doc.query_class(MARKER_CLASS).len(), 3);
        assert!(doc.get_element_by_id(BACK_TO_TOP_ID).is_some());

        let button = form::submit_button(&doc).expect("submit button");
        assert_eq!(doc.text(button), Some(SUBMIT_LABEL));
        for field in FieldName::ALL {
            assert!(form::field_node(&doc, field).is_some());
            assert!(doc.get_element_by_id(&field.error_slot_id()).is_some());
        }
    }

    #[test]
    fn rejects_layout_without_sections() {
        let err = PageLayout::from_toml("viewport_height = 900").expect_err("must fail");
        assert!(err.to_string().contains("failed to parse page layout"));
    }
}
