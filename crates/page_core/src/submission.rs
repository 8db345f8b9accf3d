//! The contact form submit lifecycle.
//!
//! A submit disables the button, then issues the auto-reply and the owner
//! notification concurrently. Only the owner notification decides what the
//! visitor sees; as soon as it settles the button and form are reset, while
//! the auto-reply outcome is only logged.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::{
    domain::{FieldName, FormSnapshot},
    error::DeliveryError,
    protocol::{Notification, OwnerNotificationParams},
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    banner::{render_banner, spawn_auto_dismiss},
    config::Settings,
    dom::NodeId,
    form,
    page::SharedPage,
    transport::{build_transport, NotificationTransport},
};

pub const LOADING_LABEL: &str = "Sending…";
pub const OWNER_FAILURE_ALERT: &str = "Message sent, but notification failed.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    Busy,
    #[error("contact form or its submit button is missing")]
    MissingForm,
    #[error("submission refused, invalid fields: {0:?}")]
    Invalid(Vec<FieldName>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitPolicy {
    /// When false, invalid fields are reported inline but still sent.
    pub enforce_validation: bool,
}

/// One in-flight submit, alive from the click until both notifications settle.
#[derive(Debug, Clone)]
pub struct SubmissionAttempt {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub snapshot: FormSnapshot,
    button: NodeId,
    original_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub id: Uuid,
    pub snapshot: FormSnapshot,
    pub auto_reply: Result<(), DeliveryError>,
    pub owner_notification: Result<(), DeliveryError>,
}

pub struct FormController {
    transport: Arc<dyn NotificationTransport>,
    policy: SubmitPolicy,
}

impl FormController {
    pub fn new(transport: Arc<dyn NotificationTransport>, policy: SubmitPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self::new(
            build_transport(settings)?,
            SubmitPolicy {
                enforce_validation: settings.enforce_validation,
            },
        ))
    }

    pub fn policy(&self) -> SubmitPolicy {
        self.policy
    }

    pub async fn submit(&self, page: &SharedPage) -> Result<SubmissionReport, SubmitError> {
        let (attempt, live_fields) = self.begin(page).await?;
        info!(
            attempt = %attempt.id,
            started_at = %attempt.started_at,
            "contact: submission started"
        );

        let auto_reply = async {
            let outcome = self
                .transport
                .send(Notification::auto_reply(live_fields))
                .await;
            match &outcome {
                Ok(()) => info!(attempt = %attempt.id, "contact: auto-reply sent to visitor"),
                Err(err) => error!(attempt = %attempt.id, error = %err, "contact: auto-reply failed"),
            }
            outcome
        };

        let owner_notification = async {
            let outcome = self
                .transport
                .send(Notification::owner(OwnerNotificationParams::from(
                    &attempt.snapshot,
                )))
                .await;
            settle(page, &attempt, &outcome).await;
            outcome
        };

        let (auto_reply, owner_notification) = tokio::join!(auto_reply, owner_notification);
        debug!(attempt = %attempt.id, "contact: submission finished");
        Ok(SubmissionReport {
            id: attempt.id,
            snapshot: attempt.snapshot,
            auto_reply,
            owner_notification,
        })
    }

    /// Checks the form, snapshots it and puts the button into its loading state.
    async fn begin(
        &self,
        page: &SharedPage,
    ) -> Result<(SubmissionAttempt, Vec<(FieldName, String)>), SubmitError> {
        let mut state = page.lock().await;
        let doc = &mut state.document;
        let Some(button) = form::submit_button(doc) else {
            warn!("contact: submit ignored, form or submit button missing");
            return Err(SubmitError::MissingForm);
        };
        if doc.is_disabled(button) {
            debug!("contact: submit ignored while a submission is in flight");
            return Err(SubmitError::Busy);
        }

        let invalid = form::revalidate_all(doc);
        if !invalid.is_empty() {
            if self.policy.enforce_validation {
                info!(fields = ?invalid, "contact: submission refused, invalid fields");
                return Err(SubmitError::Invalid(invalid));
            }
            warn!(fields = ?invalid, "contact: submitting with invalid fields");
        }

        let attempt = SubmissionAttempt {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            snapshot: form::snapshot(doc),
            button,
            original_label: doc.text(button).unwrap_or_default().to_string(),
        };
        let live_fields = form::live_fields(doc);
        doc.set_disabled(button, true);
        doc.set_text(button, LOADING_LABEL);
        Ok((attempt, live_fields))
    }
}

/// Applies the owner notification's outcome and resets the form.
async fn settle(page: &SharedPage, attempt: &SubmissionAttempt, outcome: &Result<(), DeliveryError>) {
    let mut state = page.lock().await;
    let state = &mut *state;
    match outcome {
        Ok(()) => {
            info!(attempt = %attempt.id, "contact: owner notified");
            let ticket = state.banner.show();
            render_banner(&mut state.document, &state.banner);
            spawn_auto_dismiss(Arc::clone(page), ticket);
        }
        Err(err) => {
            error!(attempt = %attempt.id, error = %err, "contact: owner notification failed");
            state.document.alert(OWNER_FAILURE_ALERT);
        }
    }

    let doc = &mut state.document;
    doc.set_disabled(attempt.button, false);
    doc.set_text(attempt.button, &attempt.original_label);
    form::reset(doc);
    form::clear_all_errors(doc);
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
