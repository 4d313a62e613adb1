//! Email queue backed by the mail crate's Postgres outbox

use mail::{EmailJob, MailError, PgOutbox};

use crate::domain::repository::EmailQueue;
use crate::error::{AccountError, AccountResult};

impl EmailQueue for PgOutbox {
    async fn enqueue(&self, job: EmailJob) -> AccountResult<()> {
        let job_id = PgOutbox::enqueue(self, &job).await.map_err(|e| match e {
            MailError::Database(e) => AccountError::Database(e),
            other => AccountError::Internal(other.to_string()),
        })?;

        tracing::debug!(job_id = %job_id, kind = %job.kind(), "Email job enqueued");
        Ok(())
    }
}
