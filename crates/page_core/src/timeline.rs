//! Reversible entrance state for the experience timeline.
//!
//! Items entering the viewport get `animate` on their marker and content and
//! lose it again when they leave. The connecting line is drawn down to the
//! lowest animated marker through the `--line-bottom` custom property on the
//! container.

use tracing::debug;

use crate::{
    dom::{Document, NodeId},
    observer::{IntersectionObserver, ObserverOptions, VisibilityChange},
};

pub const TIMELINE_CLASS: &str = "timeline";
pub const ITEM_CLASS: &str = "timeline__item";
pub const MARKER_CLASS: &str = "timeline__marker";
pub const CONTENT_CLASS: &str = "timeline__content";
pub const ANIMATE_CLASS: &str = "animate";
pub const LINE_BOTTOM_PROPERTY: &str = "--line-bottom";

pub const TIMELINE_OBSERVER: ObserverOptions = ObserverOptions {
    threshold: 0.2,
    bottom_margin: -50.0,
};

/// `container_height - max(0, lowest animated marker bottom relative to the container)`.
pub fn compute_line_bottom(
    container_top: f64,
    container_height: f64,
    animated_marker_bottoms: impl IntoIterator<Item = f64>,
) -> f64 {
    let last_visible = animated_marker_bottoms
        .into_iter()
        .map(|bottom| bottom - container_top)
        .fold(0.0_f64, f64::max);
    container_height - last_visible
}

pub fn format_px(value: f64) -> String {
    format!("{value}px")
}

pub struct TimelineAnimator {
    container: NodeId,
    items: Vec<NodeId>,
    observer: IntersectionObserver,
}

impl TimelineAnimator {
    /// Finds the timeline in `doc`; `None` when there is no container or no items.
    pub fn attach(doc: &Document) -> Option<Self> {
        let container = doc.query_class(TIMELINE_CLASS).into_iter().next()?;
        let items = doc.query_within(container, |element| element.has_class(ITEM_CLASS));
        if items.is_empty() {
            return None;
        }
        let mut observer = IntersectionObserver::new(TIMELINE_OBSERVER);
        for item in &items {
            observer.observe(*item);
        }
        debug!(items = items.len(), "timeline: observing items");
        Some(Self {
            container,
            items,
            observer,
        })
    }

    pub fn observer(&self) -> &IntersectionObserver {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut IntersectionObserver {
        &mut self.observer
    }

    /// Applies one observer batch and recomputes the line offset.
    pub fn apply_batch(&self, doc: &mut Document, batch: &[VisibilityChange]) {
        for change in batch {
            let marker = doc.first_class_within(change.target, MARKER_CLASS);
            let content = doc.first_class_within(change.target, CONTENT_CLASS);
            for part in [marker, content].into_iter().flatten() {
                if change.is_intersecting {
                    doc.add_class(part, ANIMATE_CLASS);
                } else {
                    doc.remove_class(part, ANIMATE_CLASS);
                }
            }
        }
        self.update_line(doc);
    }

    pub fn update_line(&self, doc: &mut Document) {
        let Some(container) = doc.layout(self.container) else {
            return;
        };
        let animated_bottoms: Vec<f64> = self
            .items
            .iter()
            .filter_map(|item| doc.first_class_within(*item, MARKER_CLASS))
            .filter(|marker| doc.has_class(*marker, ANIMATE_CLASS))
            .filter_map(|marker| doc.layout(marker).map(|rect| rect.bottom()))
            .collect();
        let offset = compute_line_bottom(container.top, container.height, animated_bottoms);
        doc.set_style(self.container, LINE_BOTTOM_PROPERTY, &format_px(offset));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dom::Element, observer::VisibilityUpdate};

    #[test]
    fn line_bottom_uses_zero_baseline_without_animated_items() {
        assert_eq!(compute_line_bottom(1000.0, 900.0, Vec::new()), 900.0);
    }

    #[test]
    fn line_bottom_follows_lowest_animated_marker() {
        let offset = compute_line_bottom(1000.0, 900.0, [1040.0, 1320.0, 1180.0]);
        assert_eq!(offset, 580.0);
    }

    fn timeline() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new();
        let body = doc.body();
        let container = doc.append(
            body,
            Element::new("div")
                .with_class(TIMELINE_CLASS)
                .with_layout(1000.0, 900.0),
        );
        let mut items = Vec::new();
        for index in 0..3 {
            let top = 1000.0 + index as f64 * 300.0;
            let item = doc.append(
                container,
                Element::new("div")
                    .with_class(ITEM_CLASS)
                    .with_layout(top, 300.0),
            );
            doc.append(
                item,
                Element::new("span")
                    .with_class(MARKER_CLASS)
                    .with_layout(top + 20.0, 16.0),
            );
            doc.append(
                item,
                Element::new("div")
                    .with_class(CONTENT_CLASS)
                    .with_layout(top, 280.0),
            );
            items.push(item);
        }
        (doc, items)
    }

    #[test]
    fn enter_and_exit_are_reversible() {
        let (mut doc, items) = timeline();
        let animator = TimelineAnimator::attach(&doc).expect("timeline");
        let marker = doc.first_class_within(items[1], MARKER_CLASS).expect("marker");
        let content = doc.first_class_within(items[1], CONTENT_CLASS).expect("content");

        animator.apply_batch(
            &mut doc,
            &[VisibilityChange {
                target: items[1],
                is_intersecting: true,
            }],
        );
        assert!(doc.has_class(marker, ANIMATE_CLASS));
        assert!(doc.has_class(content, ANIMATE_CLASS));
        // marker bottom 1336 - container top 1000 = 336
        assert_eq!(
            doc.style(animator.container, LINE_BOTTOM_PROPERTY),
            Some("564px")
        );

        animator.apply_batch(
            &mut doc,
            &[VisibilityChange {
                target: items[1],
                is_intersecting: false,
            }],
        );
        assert!(!doc.has_class(marker, ANIMATE_CLASS));
        assert!(!doc.has_class(content, ANIMATE_CLASS));
        assert_eq!(
            doc.style(animator.container, LINE_BOTTOM_PROPERTY),
            Some("900px")
        );
    }

    #[test]
    fn observer_drives_items_from_scroll_position() {
        let (mut doc, items) = timeline();
        let mut animator = TimelineAnimator::attach(&doc).expect("timeline");
        doc.set_scroll_y(700.0);

        let batch = animator.observer_mut().evaluate(&doc);
        animator.apply_batch(&mut doc, &batch);

        let first_marker = doc.first_class_within(items[0], MARKER_CLASS).expect("marker");
        let last_marker = doc.first_class_within(items[2], MARKER_CLASS).expect("marker");
        assert!(doc.has_class(first_marker, ANIMATE_CLASS));
        assert!(!doc.has_class(last_marker, ANIMATE_CLASS));
    }

    #[test]
    fn lagged_update_catches_up_on_missed_flips() {
        let (mut doc, items) = timeline();
        let mut animator = TimelineAnimator::attach(&doc).expect("timeline");
        doc.set_scroll_y(700.0);
        // The batch from this evaluation never reaches the consumer.
        animator.observer_mut().evaluate(&doc);

        let batch = VisibilityUpdate::Lagged { skipped: 1 }.resolve(animator.observer());
        animator.apply_batch(&mut doc, &batch);

        let first_marker = doc.first_class_within(items[0], MARKER_CLASS).expect("marker");
        let last_marker = doc.first_class_within(items[2], MARKER_CLASS).expect("marker");
        assert!(doc.has_class(first_marker, ANIMATE_CLASS));
        assert!(!doc.has_class(last_marker, ANIMATE_CLASS));
    }

    #[test]
    fn attach_requires_items() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.append(body, Element::new("div").with_class(TIMELINE_CLASS));
        assert!(TimelineAnimator::attach(&doc).is_none());
    }
}
