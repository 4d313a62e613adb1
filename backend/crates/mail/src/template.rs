//! Email Templates
//!
//! Substituted values are HTML-escaped: links for a double-quoted `href`,
//! everything else as text.

use html_escape::{encode_double_quoted_attribute, encode_text};
use url::Url;

use crate::error::MailResult;
use crate::job::EmailJob;

const VERIFY_EMAIL_TEMPLATE: &str = include_str!("../templates/verify_email.html");
const FORGOT_PASSWORD_TEMPLATE: &str = include_str!("../templates/forgot_password.html");

/// A message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct MailTemplates {
    pub app_name: String,
    /// Base URL of the web client the links point to
    pub frontend_url: String,
    /// Password reset token lifetime, stated in the reset email
    pub reset_hours: u64,
}

impl MailTemplates {
    pub fn new(
        app_name: impl Into<String>,
        frontend_url: impl Into<String>,
        reset_hours: u64,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            frontend_url: frontend_url.into(),
            reset_hours,
        }
    }

    pub fn render(&self, job: &EmailJob) -> MailResult<RenderedEmail> {
        match job {
            EmailJob::EmailVerification {
                receiver,
                verification_token,
            } => {
                let link = self.link(
                    "verify-email",
                    &[
                        ("email", receiver.as_str()),
                        ("verification_token", verification_token.as_str()),
                    ],
                )?;
                let html = VERIFY_EMAIL_TEMPLATE
                    .replace("{{app_name}}", &encode_text(&self.app_name))
                    .replace(
                        "{{verification_link}}",
                        &encode_double_quoted_attribute(link.as_str()),
                    );

                Ok(RenderedEmail {
                    to: receiver.clone(),
                    subject: format!("🛁 {} - Email verification", self.app_name),
                    html,
                })
            }
            EmailJob::PasswordReset {
                receiver,
                reset_token,
            } => {
                let link = self.link(
                    "reset-password",
                    &[
                        ("email", receiver.as_str()),
                        ("reset_token", reset_token.as_str()),
                    ],
                )?;
                let html = FORGOT_PASSWORD_TEMPLATE
                    .replace("{{app_name}}", &encode_text(&self.app_name))
                    .replace("{{reset_link}}", &encode_double_quoted_attribute(link.as_str()))
                    .replace("{{reset_hours}}", &self.reset_hours.to_string());

                Ok(RenderedEmail {
                    to: receiver.clone(),
                    subject: format!("🛁 {} - Password reset", self.app_name),
                    html,
                })
            }
        }
    }

    fn link(&self, path: &str, params: &[(&str, &str)]) -> MailResult<Url> {
        let base = self.frontend_url.trim_end_matches('/');
        Ok(Url::parse_with_params(&format!("{base}/{path}"), params)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> MailTemplates {
        MailTemplates::new("MySolidApp", "http://localhost:3000/", 2)
    }

    #[test]
    fn test_verification_email() {
        let job = EmailJob::email_verification("someone@example.com", "abc-123");
        let email = templates().render(&job).unwrap();

        assert_eq!(email.to, "someone@example.com");
        assert_eq!(email.subject, "🛁 MySolidApp - Email verification");
        assert!(email.html.contains(
            "http://localhost:3000/verify-email?email=someone%40example.com&amp;verification_token=abc-123"
        ));
        assert!(!email.html.contains("{{"));
    }

    #[test]
    fn test_reset_email_states_expiry() {
        let job = EmailJob::password_reset("someone@example.com", "xyz");
        let email = templates().render(&job).unwrap();

        assert_eq!(email.subject, "🛁 MySolidApp - Password reset");
        assert!(email.html.contains(
            "http://localhost:3000/reset-password?email=someone%40example.com&amp;reset_token=xyz"
        ));
        assert!(email.html.contains("valid for 2 hours"));
    }

    #[test]
    fn test_query_values_are_encoded() {
        let job = EmailJob::email_verification("a+b@example.com", "t&k=1");
        let email = templates().render(&job).unwrap();

        assert!(email.html.contains("email=a%2Bb%40example.com"));
        assert!(email.html.contains("verification_token=t%26k%3D1"));
    }

    #[test]
    fn test_app_name_is_escaped_in_html_only() {
        let templates = MailTemplates::new("<Tom & Jerry>", "http://localhost:3000", 2);
        let job = EmailJob::email_verification("a@example.com", "t");
        let email = templates.render(&job).unwrap();

        assert!(email.html.contains("Welcome to &lt;Tom &amp; Jerry&gt;!"));
        assert!(!email.html.contains("<Tom"));
        assert_eq!(email.subject, "🛁 <Tom & Jerry> - Email verification");
    }

    #[test]
    fn test_invalid_frontend_url() {
        let templates = MailTemplates::new("MySolidApp", "not a url", 2);
        let job = EmailJob::email_verification("a@example.com", "t");
        assert!(templates.render(&job).is_err());
    }
}
