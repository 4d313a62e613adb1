//! Email Delivery
//!
//! The API never talks to SMTP directly. It inserts [`EmailJob`]s into the
//! `email_jobs` table through [`PgOutbox`], and the `mailer` binary drains
//! that table with an [`OutboxWorker`].

pub mod error;
pub mod job;
pub mod outbox;
pub mod sender;
pub mod template;
pub mod worker;

pub use error::{MailError, MailResult};
pub use job::{EmailJob, EmailKind};
pub use outbox::{JobQueue, PgOutbox, QueuedEmail};
pub use sender::{EmailSender, LogEmailSender, SmtpEmailSender, SmtpSettings};
pub use template::{MailTemplates, RenderedEmail};
pub use worker::{OutboxWorker, WorkerConfig};
