use std::{fs, io, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "folio.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub email_endpoint: String,
    pub public_key: String,
    pub access_token: Option<String>,
    pub service_id: String,
    pub auto_reply_template: String,
    pub owner_template: String,
    /// Zero disables the timeout, leaving a hung request pending forever.
    pub request_timeout_secs: u64,
    /// Refuse to submit while any field is invalid.
    pub enforce_validation: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            email_endpoint: "https://api.emailjs.com/api/v1.0/email/send".into(),
            public_key: String::new(),
            access_token: None,
            service_id: "service_p8mb7fk".into(),
            auto_reply_template: "template_crvnpvk".into(),
            owner_template: "template_1hojypr".into(),
            request_timeout_secs: 20,
            enforce_validation: false,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    email_endpoint: Option<String>,
    public_key: Option<String>,
    access_token: Option<String>,
    service_id: Option<String>,
    auto_reply_template: Option<String>,
    owner_template: Option<String>,
    request_timeout_secs: Option<u64>,
    enforce_validation: Option<bool>,
}

/// Defaults, then `folio.toml` in the working directory, then the environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_with(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
            apply_file(&mut settings, file_cfg);
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, env);
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.email_endpoint {
        settings.email_endpoint = v;
    }
    if let Some(v) = file_cfg.public_key {
        settings.public_key = v;
    }
    if let Some(v) = file_cfg.access_token {
        settings.access_token = Some(v);
    }
    if let Some(v) = file_cfg.service_id {
        settings.service_id = v;
    }
    if let Some(v) = file_cfg.auto_reply_template {
        settings.auto_reply_template = v;
    }
    if let Some(v) = file_cfg.owner_template {
        settings.owner_template = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.enforce_validation {
        settings.enforce_validation = v;
    }
}

fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("EMAILJS_ENDPOINT") {
        settings.email_endpoint = v;
    }
    if let Some(v) = env("APP__EMAIL_ENDPOINT") {
        settings.email_endpoint = v;
    }

    if let Some(v) = env("EMAILJS_PUBLIC_KEY") {
        settings.public_key = v;
    }
    if let Some(v) = env("APP__PUBLIC_KEY") {
        settings.public_key = v;
    }

    if let Some(v) = env("EMAILJS_ACCESS_TOKEN") {
        settings.access_token = Some(v);
    }

    if let Some(v) = env("EMAILJS_SERVICE_ID") {
        settings.service_id = v;
    }
    if let Some(v) = env("EMAILJS_AUTO_REPLY_TEMPLATE") {
        settings.auto_reply_template = v;
    }
    if let Some(v) = env("EMAILJS_OWNER_TEMPLATE") {
        settings.owner_template = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
    if let Some(v) = env("APP__ENFORCE_VALIDATION") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.enforce_validation = parsed;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings = load_settings_with(&dir.path().join(CONFIG_FILE), |_| None).expect("settings");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(20)));
    }

    #[test]
    fn file_values_then_env_overrides() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
public_key = "file-key"
owner_template = "template_owner"
request_timeout_secs = 0
enforce_validation = true
"#,
        )
        .expect("write settings");

        let env_vars = HashMap::from([
            ("APP__PUBLIC_KEY", "env-key"),
            ("APP__REQUEST_TIMEOUT_SECS", "not-a-number"),
        ]);
        let settings = load_settings_with(&path, |key| {
            env_vars.get(key).map(|v| v.to_string())
        })
        .expect("settings");

        assert_eq!(settings.public_key, "env-key");
        assert_eq!(settings.owner_template, "template_owner");
        assert_eq!(settings.auto_reply_template, "template_crvnpvk");
        assert_eq!(settings.request_timeout(), None);
        assert!(settings.enforce_validation);
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "request_timeout_secs = \"soon\"").expect("write settings");
        let err = load_settings_with(&path, |_| None).expect_err("must fail");
        assert!(err.to_string().contains("failed to parse settings file"));
    }
}
