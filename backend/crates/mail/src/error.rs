//! Mail Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid job payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Unknown email kind: {0}")]
    UnknownKind(String),

    #[error("Invalid link: {0}")]
    Link(#[from] url::ParseError),

    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

pub type MailResult<T> = Result<T, MailError>;
