//! Delivery of outbound notifications through the email service's REST API.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{ServiceId, TemplateId},
    error::DeliveryError,
    protocol::{Notification, NotificationKind, SendEmailRequest},
};
use tracing::{debug, warn};
use url::Url;

use crate::config::Settings;

#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), DeliveryError>;
}

/// Stands in when no public key is configured; every send fails.
pub struct MissingTransport;

#[async_trait]
impl NotificationTransport for MissingTransport {
    async fn send(&self, notification: Notification) -> Result<(), DeliveryError> {
        Err(DeliveryError::misconfigured(format!(
            "email delivery is not configured; dropped {:?}",
            notification.kind()
        )))
    }
}

pub struct EmailJsTransport {
    http: Client,
    endpoint: Url,
    public_key: String,
    access_token: Option<String>,
    service_id: ServiceId,
    auto_reply_template: TemplateId,
    owner_template: TemplateId,
}

impl EmailJsTransport {
    pub fn new(settings: &Settings) -> Result<Self> {
        let endpoint = Url::parse(&settings.email_endpoint)
            .with_context(|| format!("invalid email endpoint '{}'", settings.email_endpoint))?;
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .context("failed to build email http client")?;
        Ok(Self {
            http,
            endpoint,
            public_key: settings.public_key.clone(),
            access_token: settings.access_token.clone(),
            service_id: ServiceId::new(settings.service_id.clone()),
            auto_reply_template: TemplateId::new(settings.auto_reply_template.clone()),
            owner_template: TemplateId::new(settings.owner_template.clone()),
        })
    }

    pub fn template_for(&self, kind: NotificationKind) -> &TemplateId {
        match kind {
            NotificationKind::AutoReply => &self.auto_reply_template,
            NotificationKind::OwnerNotification => &self.owner_template,
        }
    }

    pub fn request_for(&self, notification: &Notification) -> SendEmailRequest {
        SendEmailRequest {
            service_id: self.service_id.clone(),
            template_id: self.template_for(notification.kind()).clone(),
            user_id: self.public_key.clone(),
            template_params: notification.template_params(),
            access_token: self.access_token.clone(),
        }
    }
}

fn delivery_error(err: reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        DeliveryError::timeout(err.to_string())
    } else {
        DeliveryError::transport(err.to_string())
    }
}

#[async_trait]
impl NotificationTransport for EmailJsTransport {
    async fn send(&self, notification: Notification) -> Result<(), DeliveryError> {
        let request = self.request_for(&notification);
        debug!(
            kind = ?notification.kind(),
            template = %request.template_id,
            "email: sending"
        );
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(delivery_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::rejected(status.as_u16(), body))
    }
}

/// The HTTP transport when a public key is configured, otherwise [`MissingTransport`].
pub fn build_transport(settings: &Settings) -> Result<Arc<dyn NotificationTransport>> {
    if settings.public_key.trim().is_empty() {
        warn!("email: no public key configured, contact form delivery disabled");
        return Ok(Arc::new(MissingTransport));
    }
    Ok(Arc::new(EmailJsTransport::new(settings)?))
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
