//! Mail transports

use async_trait::async_trait;
use common::settings::env_or;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::env;
use tracing::info;

use super::{Email, MailError, Mailer};

/// SMTP settings
#[derive(Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS when set, STARTTLS otherwise
    pub secure: bool,
    pub user: String,
    pub password: String,
    pub from: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

impl EmailConfig {
    /// Read SMTP settings from the environment.
    ///
    /// Returns `None` unless `EMAIL_HOST`, `EMAIL_USER` and `EMAIL_PASS` are
    /// all set. `EMAIL_FROM` falls back to `EMAIL_USER`.
    pub fn from_env() -> Option<Self> {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());

        let host = non_empty("EMAIL_HOST")?;
        let user = non_empty("EMAIL_USER")?;
        let password = non_empty("EMAIL_PASS")?;

        let port = env_or("EMAIL_PORT", 587);
        let secure = env::var("EMAIL_SECURE").is_ok_and(|v| v == "true");
        let from = non_empty("EMAIL_FROM").unwrap_or_else(|| user.clone());

        Some(EmailConfig {
            host,
            port,
            secure,
            user,
            password,
            from,
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Delivers mail through an SMTP relay
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, MailError> {
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| MailError::Transport(format!("SMTP relay error: {}", e)))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: parse_mailbox(&config.from)?,
        })
    }

    /// Open a connection to the relay and report whether it accepted us
    pub async fn verify(&self) -> Result<bool, MailError> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Logs mail instead of sending it, used when SMTP is not configured
#[derive(Debug, Clone, Default)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            html = %email.html,
            "Email delivery not configured, logging message"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_email_env() {
        for key in [
            "EMAIL_HOST",
            "EMAIL_PORT",
            "EMAIL_SECURE",
            "EMAIL_USER",
            "EMAIL_PASS",
            "EMAIL_FROM",
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_email_config_requires_credentials() {
        clear_email_env();
        unsafe {
            env::set_var("EMAIL_HOST", "smtp.example.com");
            env::set_var("EMAIL_USER", "mailer@example.com");
        }
        assert!(EmailConfig::from_env().is_none());

        clear_email_env();
    }

    #[test]
    #[serial]
    fn test_email_config_defaults() {
        clear_email_env();
        unsafe {
            env::set_var("EMAIL_HOST", "smtp.example.com");
            env::set_var("EMAIL_USER", "mailer@example.com");
            env::set_var("EMAIL_PASS", "secret");
        }

        let config = EmailConfig::from_env().unwrap();
        assert_eq!(config.port, 587);
        assert!(!config.secure);
        assert_eq!(config.from, "mailer@example.com");
        assert!(!format!("{:?}", config).contains("secret"));

        clear_email_env();
    }

    #[test]
    #[serial]
    fn test_email_config_from_env() {
        clear_email_env();
        unsafe {
            env::set_var("EMAIL_HOST", "smtp.example.com");
            env::set_var("EMAIL_PORT", "465");
            env::set_var("EMAIL_SECURE", "true");
            env::set_var("EMAIL_USER", "mailer@example.com");
            env::set_var("EMAIL_PASS", "secret");
            env::set_var("EMAIL_FROM", "EventHub <noreply@example.com>");
        }

        let config = EmailConfig::from_env().unwrap();
        assert_eq!(config.port, 465);
        assert!(config.secure);
        assert_eq!(config.from, "EventHub <noreply@example.com>");

        clear_email_env();
    }

    #[test]
    fn test_parse_mailbox_rejects_garbage() {
        assert!(parse_mailbox("EventHub <noreply@example.com>").is_ok());
        assert!(matches!(
            parse_mailbox("not an address"),
            Err(MailError::Address { .. })
        ));
    }

    #[tokio::test]
    async fn test_console_mailer_always_succeeds() {
        let email = Email {
            to: "someone@example.com".to_string(),
            subject: "Subject".to_string(),
            html: "<p>body</p>".to_string(),
        };
        assert!(ConsoleMailer.send(&email).await.is_ok());
    }
}
