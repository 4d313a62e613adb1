//! Email Senders

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

use crate::error::MailResult;
use crate::template::RenderedEmail;

#[trait_variant::make(EmailSender: Send)]
pub trait LocalEmailSender {
    async fn send(&self, email: &RenderedEmail) -> MailResult<()>;
}

/// SMTP connection settings
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// `None` selects a plain, unauthenticated connection (Mailpit, MailHog)
    pub credentials: Option<(String, String)>,
    pub from: String,
}

#[derive(Clone)]
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(settings: &SmtpSettings) -> MailResult<Self> {
        let from: Mailbox = settings.from.parse()?;

        let transport = match &settings.credentials {
            Some((username, password)) => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
                    .port(settings.port)
                    .credentials(Credentials::new(username.clone(), password.clone()))
                    .build()
            }
            None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
                .port(settings.port)
                .build(),
        };

        Ok(Self { transport, from })
    }
}

impl EmailSender for SmtpEmailSender {
    async fn send(&self, email: &RenderedEmail) -> MailResult<()> {
        let message = build_message(&self.from, email)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

fn build_message(from: &Mailbox, email: &RenderedEmail) -> MailResult<Message> {
    let to: Mailbox = email.to.parse()?;
    let message = Message::builder()
        .from(from.clone())
        .to(to)
        .subject(email.subject.clone())
        .header(ContentType::TEXT_HTML)
        .body(email.html.clone())?;
    Ok(message)
}

/// Sender for local development that only logs the envelope
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    async fn send(&self, email: &RenderedEmail) -> MailResult<()> {
        info!(to = %email.to, subject = %email.subject, "Email delivery skipped (log sender)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MailError;

    fn email(to: &str) -> RenderedEmail {
        RenderedEmail {
            to: to.to_string(),
            subject: "🛁 MySolidApp - Email verification".to_string(),
            html: "<p>hello</p>".to_string(),
        }
    }

    #[test]
    fn test_build_message() {
        let from: Mailbox = "MySolidApp <no-reply@example.com>".parse().unwrap();
        let message = build_message(&from, &email("someone@example.com")).unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: someone@example.com"));
        assert!(raw.contains("Content-Type: text/html"));
    }

    #[test]
    fn test_build_message_rejects_bad_receiver() {
        let from: Mailbox = "no-reply@example.com".parse().unwrap();
        let result = build_message(&from, &email("not-an-address"));
        assert!(matches!(result, Err(MailError::Address(_))));
    }

    #[tokio::test]
    async fn test_local_sender_without_credentials() {
        let settings = SmtpSettings {
            host: "localhost".to_string(),
            port: 1025,
            credentials: None,
            from: "no-reply@example.com".to_string(),
        };
        assert!(SmtpEmailSender::new(&settings).is_ok());

        let bad_from = SmtpSettings {
            from: "nope".to_string(),
            ..settings
        };
        assert!(SmtpEmailSender::new(&bad_from).is_err());
    }

    #[tokio::test]
    async fn test_log_sender_accepts_everything() {
        assert!(
            EmailSender::send(&LogEmailSender, &email("someone@example.com"))
                .await
                .is_ok()
        );
    }
}
