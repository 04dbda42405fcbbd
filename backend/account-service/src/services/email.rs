/// Email delivery for lifecycle notifications
use crate::config::EmailSettings;
use crate::error::{LifecycleError, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

/// Mail sender interface the lifecycle engine depends on.
///
/// The engine hands over fully rendered content; template engines and
/// branding live outside the core.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<()>;
}

/// Async SMTP transport wrapper (or no-op)
#[derive(Clone)]
pub struct EmailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl EmailService {
    /// Build email service from configuration.
    ///
    /// If the SMTP host is empty, operates in no-op mode (logs only). Useful
    /// for development and testing without email infrastructure.
    pub fn new(config: &EmailSettings) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| LifecycleError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; email service will operate in no-op mode");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| {
                LifecycleError::Internal(format!("Failed to configure SMTP transport: {}", e))
            })?
            .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.to_string(), password.to_string()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }

    /// Check if the SMTP transport is enabled.
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }
}

#[async_trait]
impl Notifier for EmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
    ) -> Result<()> {
        let Some(transport) = &self.transport else {
            info!(
                subject,
                recipient, "Email service running in no-op mode; skipping actual send"
            );
            return Ok(());
        };

        let to = recipient.parse::<Mailbox>().map_err(|e| {
            LifecycleError::Notification(format!("Invalid recipient email address: {}", e))
        })?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| {
                LifecycleError::Notification(format!("Failed to build email message: {}", e))
            })?;

        transport
            .send(email)
            .await
            .map_err(|e| LifecycleError::Notification(format!("Failed to send email: {}", e)))?;

        info!(subject, "email sent successfully");
        Ok(())
    }
}
