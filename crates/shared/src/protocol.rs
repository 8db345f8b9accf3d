use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{FieldName, FormSnapshot, ServiceId, TemplateId};

pub type TemplateParams = BTreeMap<String, String>;

/// Body of a `POST /api/v1.0/email/send` call to the email service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEmailRequest {
    pub service_id: ServiceId,
    pub template_id: TemplateId,
    /// Public key of the email service account.
    pub user_id: String,
    pub template_params: TemplateParams,
    #[serde(
        rename = "accessToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub access_token: Option<String>,
}

/// Parameters of the notification addressed to the site owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerNotificationParams {
    pub from_name: String,
    pub from_email: String,
    pub subject: String,
    pub message: String,
}

impl From<&FormSnapshot> for OwnerNotificationParams {
    fn from(snapshot: &FormSnapshot) -> Self {
        Self {
            from_name: snapshot.name.clone(),
            from_email: snapshot.email.clone(),
            subject: snapshot.subject.clone(),
            message: snapshot.message.clone(),
        }
    }
}

impl OwnerNotificationParams {
    pub fn to_template_params(&self) -> TemplateParams {
        BTreeMap::from([
            ("from_name".to_string(), self.from_name.clone()),
            ("from_email".to_string(), self.from_email.clone()),
            ("subject".to_string(), self.subject.clone()),
            ("message".to_string(), self.message.clone()),
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AutoReply,
    OwnerNotification,
}

/// One outbound request to the email service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Addressed to the submitter; parameters are bound by form field name.
    AutoReply { params: TemplateParams },
    /// Addressed to the owner address configured in the template.
    OwnerNotification { params: OwnerNotificationParams },
}

impl Notification {
    pub fn auto_reply(fields: impl IntoIterator<Item = (FieldName, String)>) -> Self {
        Self::AutoReply {
            params: fields
                .into_iter()
                .map(|(field, value)| (field.as_str().to_string(), value))
                .collect(),
        }
    }

    pub fn owner(params: OwnerNotificationParams) -> Self {
        Self::OwnerNotification { params }
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::AutoReply { .. } => NotificationKind::AutoReply,
            Notification::OwnerNotification { .. } => NotificationKind::OwnerNotification,
        }
    }

    pub fn template_params(&self) -> TemplateParams {
        match self {
            Notification::AutoReply { params } => params.clone(),
            Notification::OwnerNotification { params } => params.to_template_params(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_params_are_taken_from_snapshot() {
        let snapshot = FormSnapshot {
            name: "Ada".into(),
            email: "ada@example.org".into(),
            subject: "job".into(),
            message: "Hello there, Ada here.".into(),
        };
        let params = OwnerNotificationParams::from(&snapshot).to_template_params();
        assert_eq!(params.len(), 4);
        assert_eq!(params["from_name"], "Ada");
        assert_eq!(params["from_email"], "ada@example.org");
        assert_eq!(params["subject"], "job");
        assert_eq!(params["message"], "Hello there, Ada here.");
    }

    #[test]
    fn auto_reply_binds_params_by_field_name() {
        let notification = Notification::auto_reply([
            (FieldName::Name, "Ada".to_string()),
            (FieldName::Email, "ada@example.org".to_string()),
        ]);
        assert_eq!(notification.kind(), NotificationKind::AutoReply);
        let params = notification.template_params();
        assert_eq!(params["name"], "Ada");
        assert_eq!(params["email"], "ada@example.org");
    }

    #[test]
    fn send_request_omits_missing_access_token() {
        let request = SendEmailRequest {
            service_id: ServiceId::new("service_x"),
            template_id: TemplateId::new("template_y"),
            user_id: "public-key".into(),
            template_params: TemplateParams::new(),
            access_token: None,
        };
        let raw = serde_json::to_value(&request).expect("serialize");
        assert_eq!(raw["service_id"], "service_x");
        assert_eq!(raw["user_id"], "public-key");
        assert!(raw.get("accessToken").is_none());
    }
}
