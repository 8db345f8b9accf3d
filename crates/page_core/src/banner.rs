//! The transient success banner shown after a delivered contact message.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::{
    dom::{Document, Element, Rect},
    form::form_node,
    page::SharedPage,
};

pub const BANNER_CLASS: &str = "form-success";
pub const BANNER_MESSAGE: &str =
    "Thank you! Your message has been sent successfully. I'll get back to you within 24 hours.";
pub const BANNER_DISPLAY: Duration = Duration::from_secs(8);
pub const BANNER_FADE: Duration = Duration::from_millis(300);
const TICKET_ATTR: &str = "data-banner";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerPhase {
    Visible,
    Fading,
}

/// Identifies one showing of the banner so stale timers can tell they lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannerTicket(u64);

#[derive(Debug, Default)]
pub struct BannerState {
    current: Option<(BannerTicket, BannerPhase)>,
    issued: u64,
}

impl BannerState {
    /// Shows a fresh banner, replacing any banner still on screen.
    pub fn show(&mut self) -> BannerTicket {
        self.issued += 1;
        let ticket = BannerTicket(self.issued);
        self.current = Some((ticket, BannerPhase::Visible));
        ticket
    }

    pub fn begin_fade(&mut self, ticket: BannerTicket) -> bool {
        match &mut self.current {
            Some((current, phase)) if *current == ticket && *phase == BannerPhase::Visible => {
                *phase = BannerPhase::Fading;
                true
            }
            _ => false,
        }
    }

    pub fn dismiss(&mut self, ticket: BannerTicket) -> bool {
        if self.current.is_some_and(|(current, _)| current == ticket) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<(BannerTicket, BannerPhase)> {
        self.current
    }
}

/// Scroll offset that centres `rect` in the viewport, never above the page top.
pub fn center_offset(rect: Rect, viewport_height: f64) -> f64 {
    (rect.top + rect.height / 2.0 - viewport_height / 2.0).max(0.0)
}

/// Makes the form's banner elements match `state`: none, or exactly one.
pub fn render_banner(doc: &mut Document, state: &BannerState) {
    let Some(form) = form_node(doc) else {
        return;
    };
    let existing = doc.query_within(form, |element| element.has_class(BANNER_CLASS));
    let Some((ticket, phase)) = state.current() else {
        for banner in existing {
            doc.remove(banner);
        }
        return;
    };

    let ticket_value = ticket.0.to_string();
    let mut kept = None;
    for banner in existing {
        if kept.is_none() && doc.attribute(banner, TICKET_ATTR) == Some(ticket_value.as_str()) {
            kept = Some(banner);
        } else {
            doc.remove(banner);
        }
    }

    let banner = match kept {
        Some(banner) => banner,
        None => {
            let banner = doc.prepend(
                form,
                Element::new("div")
                    .with_class(BANNER_CLASS)
                    .with_attr(TICKET_ATTR, ticket_value)
                    .with_text(BANNER_MESSAGE),
            );
            // A banner without its own layout sits at the top edge of the form.
            let anchor = doc
                .layout(banner)
                .or_else(|| doc.layout(form).map(|form| Rect::new(form.top, 0.0)));
            if let Some(rect) = anchor {
                doc.request_scroll(center_offset(rect, doc.viewport_height()));
            }
            debug!(ticket = ticket.0, "banner: inserted");
            banner
        }
    };

    if phase == BannerPhase::Fading {
        doc.set_style(banner, "opacity", "0");
        doc.set_style(banner, "transform", "translateY(-10px)");
    }
}

/// Fades the banner out after the display window and removes it after the
/// fade. Does nothing if another banner replaced it in the meantime.
pub fn spawn_auto_dismiss(page: SharedPage, ticket: BannerTicket) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(BANNER_DISPLAY).await;
        {
            let mut state = page.lock().await;
            if !state.banner.begin_fade(ticket) {
                return;
            }
            let state = &mut *state;
            render_banner(&mut state.document, &state.banner);
        }

        tokio::time::sleep(BANNER_FADE).await;
        let mut state = page.lock().await;
        if state.banner.dismiss(ticket) {
            let state = &mut *state;
            render_banner(&mut state.document, &state.banner);
            debug!(ticket = ticket.0, "banner: dismissed");
        }
    })
}
