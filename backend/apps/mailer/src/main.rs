//! Mailer Entry Point
//!
//! Drains the `email_jobs` outbox written by the api and delivers each job
//! through SMTP. Without `SMTP_HOST` emails are only logged.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use mail::{
    EmailSender, LogEmailSender, MailTemplates, OutboxWorker, PgOutbox, SmtpEmailSender,
    SmtpSettings, WorkerConfig,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailer=info,mail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    let templates = MailTemplates::new(
        env::var("APP_NAME").unwrap_or_else(|_| "MySolidApp".to_string()),
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
        env_or("PASSWORD_RESET_TOKEN_EXPIRE_HOURS", 2)?,
    );
    let poll_ms: u64 = env_or("MAILER_POLL_INTERVAL_MS", 2000)?;
    let config = WorkerConfig::default().with_poll_interval(Duration::from_millis(poll_ms));
    let outbox = PgOutbox::new(pool);
    match outbox.pending_count().await {
        Ok(pending) => tracing::info!(pending, "Email outbox backlog"),
        Err(e) => tracing::warn!(error = %e, "Failed to count pending emails"),
    }

    match smtp_settings()? {
        Some(settings) => {
            tracing::info!(
                host = %settings.host,
                port = settings.port,
                authenticated = settings.credentials.is_some(),
                "Delivering through SMTP"
            );
            let sender = SmtpEmailSender::new(&settings)?;
            run(OutboxWorker::new(outbox, sender, templates, config)).await;
        }
        None => {
            tracing::warn!("SMTP_HOST not set, emails will only be logged");
            run(OutboxWorker::new(outbox, LogEmailSender, templates, config)).await;
        }
    }

    Ok(())
}

async fn run<S: EmailSender>(worker: OutboxWorker<PgOutbox, S>) {
    worker
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await;
}

/// SMTP settings; `None` when no host is configured
fn smtp_settings() -> anyhow::Result<Option<SmtpSettings>> {
    let Ok(host) = env::var("SMTP_HOST") else {
        return Ok(None);
    };

    let credentials = match env::var("SMTP_USERNAME") {
        Ok(username) if !username.is_empty() => {
            let password = env::var("SMTP_PASSWORD").context("SMTP_PASSWORD must be set")?;
            Some((username, password))
        }
        _ => None,
    };

    Ok(Some(SmtpSettings {
        host,
        port: env_or("SMTP_PORT", if credentials.is_some() { 587 } else { 1025 })?,
        credentials,
        from: env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@localhost".to_string()),
    }))
}

fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {name}")),
        Err(_) => Ok(default),
    }
}
