//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-level errors are
//! `account::AccountError`, rendered through `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use account::application::config::SameSite;
use account::{AccountConfig, PgAccountRepository, account_router};
use anyhow::Context;
use axum::{
    Router, http,
    http::{Method, header},
};
use mail::PgOutbox;
use platform::crypto::{key_from_base64, random_key};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,account=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: remove expired sessions
    // Errors here should not prevent server startup
    let repo = PgAccountRepository::new(pool.clone());
    match repo.cleanup_expired().await {
        Ok(sessions) => {
            tracing::info!(sessions_deleted = sessions, "Session cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session cleanup failed, continuing anyway");
        }
    }

    let config = load_account_config()?;
    let outbox = PgOutbox::new(pool.clone());

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api", account_router(repo, outbox, config))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 5000)))?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Build the account configuration from the environment
fn load_account_config() -> anyhow::Result<AccountConfig> {
    let base = if cfg!(debug_assertions) {
        AccountConfig::development()
    } else {
        AccountConfig::default()
    };

    let password_pepper = env::var("PASSWORD_PEPPER")
        .ok()
        .filter(|p| !p.is_empty())
        .map(String::into_bytes);

    let reset_ttl = hours(
        "PASSWORD_RESET_TOKEN_EXPIRE_HOURS",
        env_or("PASSWORD_RESET_TOKEN_EXPIRE_HOURS", 2)?,
    )?;
    let session_ttl = hours("SESSION_TTL_HOURS", env_or("SESSION_TTL_HOURS", 168)?)?;
    let cookie_same_site = match env::var("COOKIE_SAME_SITE") {
        Ok(value) => SameSite::parse(&value)
            .context("COOKIE_SAME_SITE must be one of Strict, Lax, None")?,
        Err(_) => base.cookie_same_site,
    };

    Ok(AccountConfig {
        session_secret: load_key("SESSION_SECRET")?,
        totp_encryption_key: load_key("TOTP_ENCRYPTION_KEY")?,
        password_pepper,
        password_reset_token_ttl: reset_ttl,
        session_ttl,
        totp_issuer: env::var("TOTP_ISSUER").unwrap_or(base.totp_issuer.clone()),
        cookie_secure: env_or("COOKIE_SECURE", base.cookie_secure)?,
        cookie_same_site,
        ..base
    })
}

/// 32-byte base64 secret; random in debug builds when unset
fn load_key(name: &str) -> anyhow::Result<[u8; 32]> {
    match env::var(name) {
        Ok(value) => {
            key_from_base64(&value).with_context(|| format!("{name} must be 32 bytes of base64"))
        }
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!(variable = name, "Secret not set, using a random one");
            Ok(random_key())
        }
        Err(_) => anyhow::bail!("{name} must be set in production"),
    }
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

fn hours(name: &str, value: u64) -> anyhow::Result<Duration> {
    value
        .checked_mul(3600)
        .map(Duration::from_secs)
        .with_context(|| format!("{name} is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hours() {
        assert_eq!(hours("TTL", 2).unwrap(), Duration::from_secs(7200));
        assert!(hours("TTL", u64::MAX / 1000).is_err());
    }
}
