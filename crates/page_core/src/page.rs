//! Wiring of both controllers against one document.

use std::sync::Arc;

use futures::StreamExt;
use shared::domain::{FieldName, Validity};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info};

use crate::{
    banner::BannerState,
    dom::{Document, NodeId},
    form,
    frame::{FrameGate, FRAME_INTERVAL},
    nav::{self, NavMenu},
    reveal::{reveal_hero_element, RevealAnimator, HERO_SCHEDULE},
    submission::{FormController, SubmissionReport, SubmitError},
    timeline::TimelineAnimator,
    tracker::{ScrollOutcome, SectionTracker},
};

pub struct PageState {
    pub document: Document,
    pub tracker: SectionTracker,
    pub menu: NavMenu,
    pub banner: BannerState,
    pub timeline: Option<TimelineAnimator>,
    pub reveal: RevealAnimator,
    pub frame: FrameGate,
    pub last_scroll: Option<ScrollOutcome>,
}

impl PageState {
    fn new(document: Document) -> Self {
        let timeline = TimelineAnimator::attach(&document);
        let reveal = RevealAnimator::attach(&document);
        Self {
            document,
            tracker: SectionTracker::default(),
            menu: NavMenu::default(),
            banner: BannerState::default(),
            timeline,
            reveal,
            frame: FrameGate::default(),
            last_scroll: None,
        }
    }

    /// One animation frame: scroll-derived state, then observer evaluation.
    fn run_frame(&mut self) {
        self.frame.complete();
        self.last_scroll = Some(self.tracker.handle_scroll(&mut self.document));
        if let Some(timeline) = self.timeline.as_mut() {
            timeline.observer_mut().evaluate(&self.document);
        }
        self.reveal.observer_mut().evaluate(&self.document);
    }
}

pub type SharedPage = Arc<Mutex<PageState>>;

/// The enhancement layer for one loaded page.
///
/// Must be started inside a tokio runtime: observer consumers, frame
/// callbacks and banner timers run as tasks.
pub struct PortfolioPage {
    state: SharedPage,
    form: Arc<FormController>,
    tasks: Vec<JoinHandle<()>>,
}

impl PortfolioPage {
    pub fn start(document: Document, form: FormController) -> Self {
        let mut initial = PageState::new(document);
        let mut tasks = Vec::new();

        let timeline_batches = initial
            .timeline
            .as_ref()
            .map(|timeline| timeline.observer().subscribe());
        let reveal_batches = initial.reveal.observer().subscribe();

        // Initial pass before the first scroll event; observer batches from it
        // are already buffered for the consumers below.
        initial.run_frame();
        let state = Arc::new(Mutex::new(initial));

        if let Some(batches) = timeline_batches {
            let state = Arc::clone(&state);
            tasks.push(tokio::spawn(async move {
                futures::pin_mut!(batches);
                while let Some(update) = batches.next().await {
                    let mut guard = state.lock().await;
                    let page = &mut *guard;
                    if let Some(timeline) = page.timeline.as_ref() {
                        let batch = update.resolve(timeline.observer());
                        timeline.apply_batch(&mut page.document, &batch);
                    }
                }
            }));
        }

        {
            let state = Arc::clone(&state);
            tasks.push(tokio::spawn(async move {
                futures::pin_mut!(reveal_batches);
                while let Some(update) = reveal_batches.next().await {
                    let mut guard = state.lock().await;
                    let page = &mut *guard;
                    let batch = update.resolve(page.reveal.observer());
                    page.reveal.apply_batch(&mut page.document, &batch);
                }
            }));
        }

        {
            let state = Arc::clone(&state);
            tasks.push(tokio::spawn(async move {
                let started = tokio::time::Instant::now();
                for (class, delay) in HERO_SCHEDULE {
                    tokio::time::sleep_until(started + delay).await;
                    reveal_hero_element(&mut state.lock().await.document, class);
                }
            }));
        }

        info!("page: initialized");
        Self {
            state,
            form: Arc::new(form),
            tasks,
        }
    }

    pub fn state(&self) -> SharedPage {
        Arc::clone(&self.state)
    }

    pub fn form(&self) -> Arc<FormController> {
        Arc::clone(&self.form)
    }

    /// Records the new offset; the page updates on the next frame.
    pub async fn on_scroll(&self, scroll_y: f64) {
        let schedule = {
            let mut state = self.state.lock().await;
            state.document.set_scroll_y(scroll_y);
            state.frame.request()
        };
        if schedule {
            self.schedule_frame();
        }
    }

    pub async fn on_resize(&self, viewport_height: f64) {
        let schedule = {
            let mut state = self.state.lock().await;
            state.document.set_viewport_height(viewport_height);
            state.frame.request()
        };
        if schedule {
            self.schedule_frame();
        }
    }

    fn schedule_frame(&self) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(FRAME_INTERVAL).await;
            state.lock().await.run_frame();
        });
    }

    pub async fn on_nav_toggle(&self) {
        let mut state = self.state.lock().await;
        let state = &mut *state;
        state.menu.toggle(&mut state.document);
    }

    pub async fn on_document_click(&self, target: NodeId) {
        let mut state = self.state.lock().await;
        let state = &mut *state;
        state.menu.handle_document_click(&mut state.document, target);
    }

    /// Click on a navigation link or hero call-to-action.
    pub async fn on_link_click(&self, link: NodeId) -> Option<f64> {
        let mut state = self.state.lock().await;
        let state = &mut *state;
        nav::activate_link(&mut state.menu, &mut state.document, link)
    }

    pub async fn on_back_to_top(&self) {
        nav::back_to_top(&mut self.state.lock().await.document);
    }

    pub async fn on_field_blur(&self, field: FieldName) -> Validity {
        form::on_blur(&mut self.state.lock().await.document, field)
    }

    pub async fn on_field_input(&self, field: FieldName, value: &str) {
        form::on_input(&mut self.state.lock().await.document, field, value);
    }

    pub async fn submit(&self) -> Result<SubmissionReport, SubmitError> {
        self.form.submit(&self.state).await
    }
}

impl Drop for PortfolioPage {
    fn drop(&mut self) {
        debug!(tasks = self.tasks.len(), "page: stopping background tasks");
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
