//! Outbound account e-mails.
//!
//! Callers await a notifier only after their own transaction has committed
//! and downgrade any failure to a warning.

use async_trait::async_trait;
use lettre::{
    message::{header, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("failed to send e-mail: {0}")]
    SendError(String),
}

/// Body of one outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

pub fn account_setup_mail(name: &str, setup_url: &str, ttl_days: i64) -> MailContent {
    MailContent {
        subject: "Set Up Your Attendance System Account".to_string(),
        text: format!(
            "Hello {name},\n\nAn attendance account has been created for you.\n\
             Choose your password here:\n\n{setup_url}\n\nThis link expires in {ttl_days} days."
        ),
        html: format!(
            "<p>Hello {name},</p><p>An attendance account has been created for you.</p>\
             <p><a href=\"{setup_url}\">Choose your password</a></p>\
             <p>This link expires in {ttl_days} days.</p>"
        ),
    }
}

pub fn welcome_mail(name: &str, login_url: &str) -> MailContent {
    MailContent {
        subject: "Welcome to Attendance System".to_string(),
        text: format!(
            "Hello {name},\n\nYour account is ready. Sign in here:\n\n{login_url}"
        ),
        html: format!(
            "<p>Hello {name},</p><p>Your account is ready.</p>\
             <p><a href=\"{login_url}\">Sign in</a></p>"
        ),
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_account_setup(
        &self,
        to: &str,
        name: &str,
        setup_url: &str,
        ttl_days: i64,
    ) -> Result<(), NotificationError>;

    async fn send_welcome(
        &self,
        to: &str,
        name: &str,
        login_url: &str,
    ) -> Result<(), NotificationError>;
}

pub struct SmtpNotifier {
    from_address: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotificationError> {
        let transport = if config.username.is_empty() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .build()
        } else {
            let creds = Credentials::new(config.username.clone(), config.password.clone());
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| NotificationError::SendError(format!("SMTP relay error: {}", e)))?
                .port(config.port)
                .credentials(creds)
                .build()
        };

        Ok(Self {
            from_address: config.from_address.clone(),
            transport,
        })
    }

    async fn deliver(&self, to: &str, mail: MailContent) -> Result<(), NotificationError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotificationError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| NotificationError::InvalidAddress(to.to_string()))?)
            .subject(mail.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(mail.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(mail.html),
                    ),
            )
            .map_err(|e| NotificationError::SendError(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotificationError::SendError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_account_setup(
        &self,
        to: &str,
        name: &str,
        setup_url: &str,
        ttl_days: i64,
    ) -> Result<(), NotificationError> {
        self.deliver(to, account_setup_mail(name, setup_url, ttl_days))
            .await
    }

    async fn send_welcome(
        &self,
        to: &str,
        name: &str,
        login_url: &str,
    ) -> Result<(), NotificationError> {
        self.deliver(to, welcome_mail(name, login_url)).await
    }
}

/// Writes messages to the log instead of sending them. Used when SMTP is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_account_setup(
        &self,
        to: &str,
        name: &str,
        setup_url: &str,
        ttl_days: i64,
    ) -> Result<(), NotificationError> {
        let mail = account_setup_mail(name, setup_url, ttl_days);
        tracing::info!(to, subject = %mail.subject, setup_url, "SMTP not configured, logging setup e-mail");
        Ok(())
    }

    async fn send_welcome(
        &self,
        to: &str,
        name: &str,
        login_url: &str,
    ) -> Result<(), NotificationError> {
        let mail = welcome_mail(name, login_url);
        tracing::info!(to, subject = %mail.subject, "SMTP not configured, logging welcome e-mail");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_mail_carries_link_and_expiry() {
        let mail = account_setup_mail("Ann", "http://app/setup?token=abc", 7);
        assert!(mail.text.contains("http://app/setup?token=abc"));
        assert!(mail.html.contains("href=\"http://app/setup?token=abc\""));
        assert!(mail.text.contains("7 days"));
    }

    #[tokio::test]
    async fn log_notifier_never_fails() {
        let notifier = LogNotifier;
        assert!(notifier
            .send_account_setup("ann@example.com", "Ann", "http://app/setup", 7)
            .await
            .is_ok());
        assert!(notifier
            .send_welcome("ann@example.com", "Ann", "http://app/login")
            .await
            .is_ok());
    }
}
