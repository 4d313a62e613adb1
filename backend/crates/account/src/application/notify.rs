//! Email notifications
//!
//! Enqueue failures never fail the request that caused them.

use mail::EmailJob;

use crate::domain::repository::EmailQueue;

pub(crate) async fn enqueue_email<Q>(queue: &Q, job: EmailJob)
where
    Q: EmailQueue,
{
    let kind = job.kind();
    if let Err(e) = queue.enqueue(job).await {
        tracing::warn!(kind = %kind, error = %e, "Failed to enqueue email");
    }
}
