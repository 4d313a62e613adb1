//! Outbox Worker
//!
//! Delivery is fire-and-forget: a claimed job is already deleted, so a failed
//! render or send is logged and the job is dropped.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::MailResult;
use crate::outbox::{JobQueue, QueuedEmail};
use crate::sender::EmailSender;
use crate::template::MailTemplates;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_DRAIN_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sleep between polls once the queue is empty
    pub poll_interval: Duration,
    /// Maximum jobs handled per poll
    pub drain_limit: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            drain_limit: DEFAULT_DRAIN_LIMIT,
        }
    }
}

impl WorkerConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_drain_limit(mut self, drain_limit: usize) -> Self {
        self.drain_limit = drain_limit;
        self
    }

    fn normalize(mut self) -> Self {
        if self.poll_interval < MIN_POLL_INTERVAL {
            self.poll_interval = MIN_POLL_INTERVAL;
        }
        self.drain_limit = self.drain_limit.max(1);
        self
    }
}

pub struct OutboxWorker<Q, S> {
    queue: Q,
    sender: S,
    templates: MailTemplates,
    config: WorkerConfig,
}

impl<Q, S> OutboxWorker<Q, S>
where
    Q: JobQueue,
    S: EmailSender,
{
    pub fn new(queue: Q, sender: S, templates: MailTemplates, config: WorkerConfig) -> Self {
        Self {
            queue,
            sender,
            templates,
            config: config.normalize(),
        }
    }

    /// Claim and deliver one job; `Ok(false)` means the queue was empty
    pub async fn process_next(&self) -> MailResult<bool> {
        let Some(queued) = self.queue.claim_next().await? else {
            return Ok(false);
        };

        match self.deliver(&queued).await {
            Ok(()) => info!(
                job_id = %queued.job_id,
                kind = %queued.kind,
                "Email sent"
            ),
            Err(e) => error!(
                job_id = %queued.job_id,
                kind = %queued.kind,
                error = %e,
                "Email delivery failed, job dropped"
            ),
        }

        Ok(true)
    }

    async fn deliver(&self, queued: &QueuedEmail) -> MailResult<()> {
        let job = queued.decode()?;
        let email = self.templates.render(&job)?;
        self.sender.send(&email).await
    }

    /// Process jobs until the queue is empty or the drain limit is reached
    pub async fn drain(&self) -> MailResult<usize> {
        let mut processed = 0;
        while processed < self.config.drain_limit {
            if !self.process_next().await? {
                break;
            }
            processed += 1;
        }
        Ok(processed)
    }

    /// Poll the queue until `shutdown` resolves
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Email worker started"
        );

        loop {
            match self.drain().await {
                Ok(0) => {}
                Ok(processed) => debug!(processed, "Email batch processed"),
                Err(e) => error!(error = %e, "Email outbox poll failed"),
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = sleep(self.config.poll_interval) => {}
            }
        }

        info!("Email worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use chrono::Utc;
    use kernel::id::EmailJobId;

    use super::*;
    use crate::error::MailError;
    use crate::job::EmailJob;
    use crate::template::RenderedEmail;

    #[derive(Default)]
    struct MemoryQueue {
        jobs: Mutex<VecDeque<QueuedEmail>>,
    }

    impl MemoryQueue {
        fn push(&self, kind: &str, payload: String) {
            self.jobs.lock().unwrap().push_back(QueuedEmail {
                job_id: EmailJobId::new(),
                kind: kind.to_string(),
                payload,
                created_at: Utc::now(),
            });
        }

        fn push_job(&self, job: &EmailJob) {
            self.push(job.kind().as_str(), job.to_payload().unwrap());
        }

        fn len(&self) -> usize {
            self.jobs.lock().unwrap().len()
        }
    }

    impl JobQueue for &MemoryQueue {
        async fn claim_next(&self) -> MailResult<Option<QueuedEmail>> {
            Ok(self.jobs.lock().unwrap().pop_front())
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<RenderedEmail>>,
        fail: bool,
    }

    impl EmailSender for &RecordingSender {
        async fn send(&self, email: &RenderedEmail) -> MailResult<()> {
            if self.fail {
                return Err(MailError::UnknownKind("smtp down".to_string()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn templates() -> MailTemplates {
        MailTemplates::new("MySolidApp", "http://localhost:3000", 2)
    }

    #[tokio::test]
    async fn test_process_next_delivers_rendered_email() {
        let queue = MemoryQueue::default();
        let sender = RecordingSender::default();
        queue.push_job(&EmailJob::email_verification("a@example.com", "tok"));

        let worker = OutboxWorker::new(&queue, &sender, templates(), WorkerConfig::default());
        assert!(worker.process_next().await.unwrap());
        assert!(!worker.process_next().await.unwrap());

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@example.com");
        assert!(sent[0].html.contains("verification_token=tok"));
    }

    #[tokio::test]
    async fn test_failed_delivery_drops_job() {
        let queue = MemoryQueue::default();
        let sender = RecordingSender {
            fail: true,
            ..Default::default()
        };
        queue.push_job(&EmailJob::password_reset("a@example.com", "tok"));

        let worker = OutboxWorker::new(&queue, &sender, templates(), WorkerConfig::default());
        assert!(worker.process_next().await.unwrap());
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_job_is_skipped() {
        let queue = MemoryQueue::default();
        let sender = RecordingSender::default();
        queue.push("password_reset", "{not json".to_string());
        queue.push_job(&EmailJob::password_reset("b@example.com", "tok"));

        let worker = OutboxWorker::new(&queue, &sender, templates(), WorkerConfig::default());
        assert_eq!(worker.drain().await.unwrap(), 2);

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "b@example.com");
    }

    #[tokio::test]
    async fn test_drain_respects_limit() {
        let queue = MemoryQueue::default();
        let sender = RecordingSender::default();
        for i in 0..5 {
            queue.push_job(&EmailJob::email_verification(format!("u{i}@example.com"), "t"));
        }

        let config = WorkerConfig::default().with_drain_limit(3);
        let worker = OutboxWorker::new(&queue, &sender, templates(), config);
        assert_eq!(worker.drain().await.unwrap(), 3);
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let queue = MemoryQueue::default();
        let sender = RecordingSender::default();
        queue.push_job(&EmailJob::email_verification("a@example.com", "t"));

        let worker = OutboxWorker::new(&queue, &sender, templates(), WorkerConfig::default());
        worker.run(async {}).await;

        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_config_normalize() {
        let config = WorkerConfig::default()
            .with_poll_interval(Duration::from_millis(1))
            .with_drain_limit(0)
            .normalize();
        assert_eq!(config.poll_interval, MIN_POLL_INTERVAL);
        assert_eq!(config.drain_limit, 1);
    }
}
