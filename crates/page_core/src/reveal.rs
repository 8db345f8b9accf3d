//! One-shot entrance animations.

use std::time::Duration;

use crate::{
    dom::Document,
    observer::{IntersectionObserver, ObserverOptions, VisibilityChange},
};

pub const FADE_IN_CLASS: &str = "fade-in-up";

pub const REVEAL_TARGET_CLASSES: [&str; 6] = [
    "skill__category",
    "timeline__item",
    "project__card",
    "cert__card",
    "highlight__item",
    "achievement__item",
];

pub const REVEAL_OBSERVER: ObserverOptions = ObserverOptions {
    threshold: 0.1,
    bottom_margin: -50.0,
};

/// Hero elements and how long after startup each one fades in.
pub const HERO_SCHEDULE: [(&str, Duration); 5] = [
    ("hero__title", Duration::from_millis(100)),
    ("hero__subtitle", Duration::from_millis(200)),
    ("hero__description", Duration::from_millis(300)),
    ("hero__actions", Duration::from_millis(400)),
    ("hero__avatar", Duration::from_millis(500)),
];

pub struct RevealAnimator {
    observer: IntersectionObserver,
}

impl RevealAnimator {
    pub fn attach(doc: &Document) -> Self {
        let mut observer = IntersectionObserver::new(REVEAL_OBSERVER);
        let targets = doc.query(|element| {
            REVEAL_TARGET_CLASSES
                .iter()
                .any(|class| element.has_class(class))
        });
        for target in targets {
            observer.observe(target);
        }
        Self { observer }
    }

    pub fn observer(&self) -> &IntersectionObserver {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut IntersectionObserver {
        &mut self.observer
    }

    /// Reveals entering targets and stops watching them.
    pub fn apply_batch(&mut self, doc: &mut Document, batch: &[VisibilityChange]) {
        for change in batch.iter().filter(|change| change.is_intersecting) {
            doc.add_class(change.target, FADE_IN_CLASS);
            self.observer.unobserve(change.target);
        }
    }
}

/// Reveals the hero element with class `class`, if the page has one.
pub fn reveal_hero_element(doc: &mut Document, class: &str) {
    if let Some(node) = doc.query_class(class).into_iter().next() {
        doc.add_class(node, FADE_IN_CLASS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    #[test]
    fn targets_are_revealed_once_and_unobserved() {
        let mut doc = Document::new();
        let body = doc.body();
        let card = doc.append(
            body,
            Element::new("div")
                .with_class("project__card")
                .with_layout(100.0, 200.0),
        );
        doc.append(body, Element::new("div").with_class("unrelated"));

        let mut reveal = RevealAnimator::attach(&doc);
        assert_eq!(reveal.observer().targets(), &[card]);

        let batch = reveal.observer_mut().evaluate(&doc);
        reveal.apply_batch(&mut doc, &batch);
        assert!(doc.has_class(card, FADE_IN_CLASS));
        assert!(reveal.observer().targets().is_empty());

        doc.set_scroll_y(5000.0);
        assert!(reveal.observer_mut().evaluate(&doc).is_empty());
        assert!(doc.has_class(card, FADE_IN_CLASS));
    }

    #[test]
    fn hero_schedule_is_staggered() {
        let delays: Vec<_> = HERO_SCHEDULE.iter().map(|(_, delay)| *delay).collect();
        assert!(delays.windows(2).all(|pair| pair[1] - pair[0] == Duration::from_millis(100)));
    }

    #[test]
    fn missing_hero_elements_are_skipped() {
        let mut doc = Document::new();
        reveal_hero_element(&mut doc, "hero__subtitle");
        assert!(doc.query_class(FADE_IN_CLASS).is_empty());
    }
}
