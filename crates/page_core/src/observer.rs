//! Viewport intersection observation as a subscription.
//!
//! An [`IntersectionObserver`] is evaluated against the document whenever
//! layout or scroll position may have changed. Each evaluation that flips the
//! visibility of at least one target publishes one batch of
//! [`VisibilityChange`]s to every subscriber. Subscribing again restarts the
//! sequence from the next batch.

use std::collections::HashMap;

use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::warn;

use crate::dom::{Document, NodeId, Rect};

const BATCH_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    /// Fraction of the target that must be inside the root to count as visible.
    pub threshold: f64,
    /// Added to the bottom edge of the viewport; negative values shrink it.
    pub bottom_margin: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityChange {
    pub target: NodeId,
    pub is_intersecting: bool,
}

pub type VisibilityBatch = Vec<VisibilityChange>;

/// One item of an observer subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityUpdate {
    Batch(VisibilityBatch),
    /// The subscriber fell behind and `skipped` batches were dropped.
    Lagged { skipped: u64 },
}

impl VisibilityUpdate {
    /// The changes to apply. After a lag that is the observer's full
    /// recorded state, so consumers catch up on the flips they missed.
    pub fn resolve(self, observer: &IntersectionObserver) -> VisibilityBatch {
        match self {
            VisibilityUpdate::Batch(batch) => batch,
            VisibilityUpdate::Lagged { .. } => observer.recorded_state(),
        }
    }
}

/// Fraction of `rect` inside the viewport `[scroll_y, scroll_y + viewport_height + bottom_margin)`.
pub fn intersection_ratio(rect: Rect, scroll_y: f64, viewport_height: f64, bottom_margin: f64) -> f64 {
    let root_top = scroll_y;
    let root_bottom = scroll_y + viewport_height + bottom_margin;
    if root_bottom <= root_top {
        return 0.0;
    }
    if rect.height <= 0.0 {
        return if rect.top >= root_top && rect.top < root_bottom {
            1.0
        } else {
            0.0
        };
    }
    let overlap = rect.bottom().min(root_bottom) - rect.top.max(root_top);
    (overlap.max(0.0) / rect.height).min(1.0)
}

pub struct IntersectionObserver {
    options: ObserverOptions,
    targets: Vec<NodeId>,
    last_state: HashMap<NodeId, bool>,
    batches: broadcast::Sender<VisibilityBatch>,
}

impl IntersectionObserver {
    pub fn new(options: ObserverOptions) -> Self {
        let (batches, _) = broadcast::channel(BATCH_CHANNEL_CAPACITY);
        Self {
            options,
            targets: Vec::new(),
            last_state: HashMap::new(),
            batches,
        }
    }

    pub fn options(&self) -> ObserverOptions {
        self.options
    }

    pub fn observe(&mut self, target: NodeId) {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
    }

    pub fn unobserve(&mut self, target: NodeId) {
        self.targets.retain(|observed| *observed != target);
        self.last_state.remove(&target);
    }

    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    /// Lazy, never-ending stream of visibility batches.
    pub fn subscribe(&self) -> impl Stream<Item = VisibilityUpdate> + Send + 'static {
        BroadcastStream::new(self.batches.subscribe()).map(|batch| match batch {
            Ok(batch) => VisibilityUpdate::Batch(batch),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "observer: subscriber lagged, resyncing");
                VisibilityUpdate::Lagged { skipped }
            }
        })
    }

    /// Last evaluated visibility of every observed target, in observation order.
    pub fn recorded_state(&self) -> VisibilityBatch {
        self.targets
            .iter()
            .filter_map(|target| {
                self.last_state
                    .get(target)
                    .map(|is_intersecting| VisibilityChange {
                        target: *target,
                        is_intersecting: *is_intersecting,
                    })
            })
            .collect()
    }

    /// Compares every target against the current viewport and publishes the
    /// targets whose visibility changed. A target's first evaluation always
    /// reports, mirroring the initial callback of a browser observer.
    pub fn evaluate(&mut self, doc: &Document) -> VisibilityBatch {
        let mut batch = Vec::new();
        self.targets.retain(|target| doc.is_live(*target));
        for target in &self.targets {
            let Some(rect) = doc.layout(*target) else {
                continue;
            };
            let ratio = intersection_ratio(
                rect,
                doc.scroll_y(),
                doc.viewport_height(),
                self.options.bottom_margin,
            );
            let is_intersecting = ratio > 0.0 && ratio >= self.options.threshold;
            if self.last_state.insert(*target, is_intersecting) != Some(is_intersecting) {
                batch.push(VisibilityChange {
                    target: *target,
                    is_intersecting,
                });
            }
        }
        if !batch.is_empty() {
            // No subscribers is fine; the batch is still returned to the caller.
            let _ = self.batches.send(batch.clone());
        }
        batch
    }
}
