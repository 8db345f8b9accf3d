use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use page_core::{
    banner::BANNER_CLASS,
    config::{load_settings_with, CONFIG_FILE},
    form,
    frame::FRAME_INTERVAL,
    layout::PageLayout,
    timeline::{LINE_BOTTOM_PROPERTY, TIMELINE_CLASS},
    FormController, MissingTransport, PortfolioPage, SubmitPolicy,
};
use serde_json::json;
use shared::{domain::FieldName, error::DeliveryError};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    /// Settings file; missing is fine, the environment still applies.
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ContactFields {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    subject: String,
    #[arg(long, default_value = "")]
    message: String,
}

impl ContactFields {
    fn entries(&self) -> [(FieldName, &str); 4] {
        [
            (FieldName::Name, self.name.as_str()),
            (FieldName::Email, self.email.as_str()),
            (FieldName::Subject, self.subject.as_str()),
            (FieldName::Message, self.message.as_str()),
        ]
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check contact form values without sending anything.
    Validate {
        #[command(flatten)]
        fields: ContactFields,
    },
    /// Print the scroll-derived page state at an offset.
    Track {
        #[arg(long)]
        layout: PathBuf,
        #[arg(long)]
        scroll_y: f64,
    },
    /// Fill in the contact form of a page and submit it.
    Send {
        #[arg(long)]
        layout: PathBuf,
        #[command(flatten)]
        fields: ContactFields,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Validate { fields } => validate(&fields),
        Command::Track { layout, scroll_y } => track(&layout, scroll_y).await,
        Command::Send { layout, fields } => send(&cli.config, &layout, &fields).await,
    }
}

fn validate(fields: &ContactFields) -> Result<()> {
    let mut report = serde_json::Map::new();
    let mut invalid = 0;
    for (field, value) in fields.entries() {
        let validity = form::validate(field, value);
        if !validity.is_valid() {
            invalid += 1;
        }
        report.insert(field.to_string(), json!(validity.message()));
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    if invalid > 0 {
        bail!("{invalid} field(s) invalid");
    }
    Ok(())
}

async fn track(layout: &Path, scroll_y: f64) -> Result<()> {
    let document = PageLayout::load(layout)?.build_document();
    let page = PortfolioPage::start(
        document,
        FormController::new(Arc::new(MissingTransport), SubmitPolicy::default()),
    );
    page.on_scroll(scroll_y).await;
    // One frame for the scroll, then time for the observer consumers.
    tokio::time::sleep(FRAME_INTERVAL * 4).await;

    let state = page.state();
    let state = state.lock().await;
    let outcome = state
        .last_scroll
        .clone()
        .context("no frame ran for the scroll")?;
    let line_bottom = state
        .document
        .query_class(TIMELINE_CLASS)
        .into_iter()
        .next()
        .and_then(|timeline| state.document.style(timeline, LINE_BOTTOM_PROPERTY));

    let report = json!({
        "scroll_y": scroll_y,
        "active_section": outcome.active.map(|section| section.to_string()),
        "back_to_top": outcome.back_to_top,
        "header_blur": outcome.chrome.blur.css(),
        "header_shadow": outcome.chrome.shadow.css(),
        "timeline_line_bottom": line_bottom,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn send(config: &Path, layout: &Path, fields: &ContactFields) -> Result<()> {
    let settings = load_settings_with(config, |key| std::env::var(key).ok())?;
    let controller = FormController::from_settings(&settings)?;
    let document = PageLayout::load(layout)?.build_document();
    if form::form_node(&document).is_none() {
        bail!("layout '{}' has no contact section", layout.display());
    }

    let page = PortfolioPage::start(document, controller);
    for (field, value) in fields.entries() {
        page.on_field_input(field, value).await;
    }
    let report = page.submit().await?;
    info!(attempt = %report.id, "folio: submission settled");

    let (alerts, banner_shown) = {
        let state = page.state();
        let state = state.lock().await;
        (
            state.document.alerts().to_vec(),
            !state.document.query_class(BANNER_CLASS).is_empty(),
        )
    };
    let outcome = |result: &Result<(), DeliveryError>| match result {
        Ok(()) => json!("sent"),
        Err(err) => json!(err.to_string()),
    };
    let summary = json!({
        "attempt": report.id.to_string(),
        "auto_reply": outcome(&report.auto_reply),
        "owner_notification": outcome(&report.owner_notification),
        "banner_shown": banner_shown,
        "alerts": alerts,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Err(err) = report.owner_notification {
        bail!("owner notification failed: {err}");
    }
    Ok(())
}
