//! Postgres Email Outbox
//!
//! Producers insert rows into `email_jobs`. Consumers claim one row at a time
//! by deleting it under `FOR UPDATE SKIP LOCKED`, so concurrent workers never
//! see the same job and a claimed job is gone whether or not delivery works.

use chrono::{DateTime, Utc};
use kernel::id::EmailJobId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::MailResult;
use crate::job::EmailJob;

#[trait_variant::make(JobQueue: Send)]
pub trait LocalJobQueue {
    /// Remove the oldest job from the queue, if any
    async fn claim_next(&self) -> MailResult<Option<QueuedEmail>>;
}

#[derive(Clone)]
pub struct PgOutbox {
    pool: PgPool,
}

/// A job removed from the queue, not yet decoded
#[derive(Debug, Clone)]
pub struct QueuedEmail {
    pub job_id: EmailJobId,
    pub kind: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

impl QueuedEmail {
    pub fn decode(&self) -> MailResult<EmailJob> {
        EmailJob::from_stored(&self.kind, &self.payload)
    }
}

impl PgOutbox {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn enqueue(&self, job: &EmailJob) -> MailResult<EmailJobId> {
        let job_id = EmailJobId::new();
        let payload = job.to_payload()?;

        sqlx::query(
            r#"
            INSERT INTO email_jobs (job_id, kind, payload, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(job_id.as_uuid())
        .bind(job.kind().as_str())
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(job_id)
    }

    pub async fn pending_count(&self) -> MailResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM email_jobs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

impl JobQueue for PgOutbox {
    async fn claim_next(&self) -> MailResult<Option<QueuedEmail>> {
        let row = sqlx::query_as::<_, EmailJobRow>(
            r#"
            DELETE FROM email_jobs
            WHERE job_id = (
                SELECT job_id
                FROM email_jobs
                ORDER BY created_at, job_id
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING job_id, kind, payload, created_at
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EmailJobRow::into_queued))
    }
}

#[derive(sqlx::FromRow)]
struct EmailJobRow {
    job_id: Uuid,
    kind: String,
    payload: String,
    created_at: DateTime<Utc>,
}

impl EmailJobRow {
    fn into_queued(self) -> QueuedEmail {
        QueuedEmail {
            job_id: EmailJobId::from_uuid(self.job_id),
            kind: self.kind,
            payload: self.payload,
            created_at: self.created_at,
        }
    }
}
