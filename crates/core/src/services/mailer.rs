//! Notification mail.
//!
//! Services depend only on [`NotificationSender`]. The transport is chosen
//! from configuration at startup: `SendGrid` over HTTP, an SMTP relay, or a
//! logging sender for development.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use serde::Serialize;
use social_common::config::{MailConfig, MailProvider};
use social_common::{AppError, AppResult};

const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";
const SENDGRID_MAX_ATTEMPTS: u32 = 3;

/// Trait for delivering templated notifications.
///
/// Returns the provider's status code on success.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Render `template` with `data` and deliver it.
    ///
    /// # Arguments
    /// * `template` - Which message to send
    /// * `recipient_name` - Display name of the recipient
    /// * `recipient_address` - Email address of the recipient
    /// * `data` - Values substituted into the template
    /// * `sandbox` - Ask the provider to accept but not deliver the message
    async fn send(
        &self,
        template: MailTemplate,
        recipient_name: &str,
        recipient_address: &str,
        data: &TemplateData,
        sandbox: bool,
    ) -> AppResult<u16>;
}

/// Shared handle to a notification sender.
pub type SharedNotificationSender = Arc<dyn NotificationSender>;

/// Mail templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTemplate {
    /// Account activation invitation.
    UserInvitation,
}

/// Values substituted into a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateData {
    /// Recipient username.
    pub username: String,
    /// Link that activates the account.
    pub activation_url: String,
}

/// A rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub html: String,
}

impl MailTemplate {
    /// Render subject and HTML body.
    #[must_use]
    pub fn render(self, data: &TemplateData) -> RenderedMail {
        match self {
            Self::UserInvitation => {
                let username = escape_html(&data.username);
                let url = escape_html(&data.activation_url);
                RenderedMail {
                    subject: "Finish Registration with Social".to_string(),
                    html: wrap_html(&format!(
                        r#"<p>Hi {username},</p>
    <p>Thanks for signing up for Social. We're excited to have you on board!</p>
    <p>Before you can start using Social, you need to confirm your email address. Click the link below to confirm your email address:</p>
    <p><a href="{url}">{url}</a></p>
    <p>If you want to activate manually, copy and paste the link above into your browser.</p>
    <p>If you didn't sign up for Social, you can safely ignore this email.</p>"#
                    )),
                }
            }
        }
    }
}

fn wrap_html(content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
        a {{ color: #007bff; }}
    </style>
</head>
<body>
    {content}
    <p>Thanks,<br>The Social Team</p>
</body>
</html>"#
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Build the configured sender.
pub fn sender_from_config(config: &MailConfig) -> AppResult<SharedNotificationSender> {
    match config.provider {
        MailProvider::Sendgrid => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| AppError::Config("mail.api_key is required for sendgrid".into()))?;
            Ok(Arc::new(SendGridMailer::new(
                api_key,
                config.from_email.clone(),
                config.from_name.clone(),
            )))
        }
        MailProvider::Smtp => Ok(Arc::new(SmtpMailer::from_config(config)?)),
        MailProvider::Log => Ok(Arc::new(LogMailer)),
    }
}

/// `SendGrid` v3 HTTP sender.
#[derive(Clone)]
pub struct SendGridMailer {
    http_client: reqwest::Client,
    api_key: String,
    from_email: String,
    from_name: String,
    endpoint: String,
    max_attempts: u32,
    backoff: Duration,
}

impl SendGridMailer {
    /// Create a sender for the public `SendGrid` API.
    #[must_use]
    pub fn new(api_key: String, from_email: String, from_name: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key,
            from_email,
            from_name,
            endpoint: SENDGRID_ENDPOINT.to_string(),
            max_attempts: SENDGRID_MAX_ATTEMPTS,
            backoff: Duration::from_secs(1),
        }
    }

    /// Send to a different API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Change the retry policy. Attempt `n` waits `n * backoff` before the next.
    #[must_use]
    pub fn with_retry(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.backoff = backoff;
        self
    }

    fn payload(
        &self,
        mail: &RenderedMail,
        recipient_name: &str,
        recipient_address: &str,
        sandbox: bool,
    ) -> serde_json::Value {
        serde_json::json!({
            "personalizations": [{
                "to": [{"email": recipient_address, "name": recipient_name}]
            }],
            "from": {
                "email": self.from_email,
                "name": self.from_name
            },
            "subject": mail.subject,
            "content": [
                {"type": "text/html", "value": mail.html}
            ],
            "mail_settings": {
                "sandbox_mode": {"enable": sandbox}
            }
        })
    }
}

#[async_trait]
impl NotificationSender for SendGridMailer {
    async fn send(
        &self,
        template: MailTemplate,
        recipient_name: &str,
        recipient_address: &str,
        data: &TemplateData,
        sandbox: bool,
    ) -> AppResult<u16> {
        let mail = template.render(data);
        let body = self.payload(&mail, recipient_name, recipient_address, sandbox);
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self
                .http_client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.status().as_u16());
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let detail = response.text().await.unwrap_or_default();
                    tracing::warn!(
                        recipient = recipient_address,
                        attempt,
                        max_attempts = self.max_attempts,
                        status,
                        "SendGrid rejected message"
                    );
                    last_error = format!("status {status}: {detail}");
                }
                Err(e) => {
                    tracing::warn!(
                        recipient = recipient_address,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Failed to send email"
                    );
                    last_error = e.to_string();
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.backoff * attempt).await;
            }
        }

        Err(AppError::DeliveryFailure(format!(
            "failed to send email after {} attempts: {last_error}",
            self.max_attempts
        )))
    }
}

/// SMTP relay sender.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a STARTTLS relay transport from mail configuration.
    pub fn from_config(config: &MailConfig) -> AppResult<Self> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| AppError::Config("mail.smtp_host is required for smtp".into()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| AppError::Config(format!("Invalid SMTP relay: {e}")))?
            .port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Config(format!("Invalid sender address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl NotificationSender for SmtpMailer {
    async fn send(
        &self,
        template: MailTemplate,
        recipient_name: &str,
        recipient_address: &str,
        data: &TemplateData,
        _sandbox: bool,
    ) -> AppResult<u16> {
        let mail = template.render(data);
        let to = format!("{recipient_name} <{recipient_address}>")
            .parse::<Mailbox>()
            .map_err(|e| AppError::DeliveryFailure(format!("Invalid recipient: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_HTML)
            .body(mail.html)
            .map_err(|e| AppError::DeliveryFailure(format!("Failed to build message: {e}")))?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| AppError::DeliveryFailure(format!("SMTP send failed: {e}")))?;

        Ok(response.code().to_string().parse().unwrap_or(250))
    }
}

/// Sender that only logs; for development.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl NotificationSender for LogMailer {
    async fn send(
        &self,
        template: MailTemplate,
        recipient_name: &str,
        recipient_address: &str,
        data: &TemplateData,
        sandbox: bool,
    ) -> AppResult<u16> {
        let mail = template.render(data);
        tracing::info!(
            recipient = recipient_address,
            name = recipient_name,
            subject = %mail.subject,
            activation_url = %data.activation_url,
            sandbox,
            "Mail not sent (log transport)"
        );
        Ok(200)
    }
}
