//! Best-effort email notifications
//!
//! Notifications are sent from a spawned task after the triggering write has
//! been committed. A failed or slow send is logged and never reaches the
//! client.

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub mod mailer;
pub mod templates;

pub use mailer::{ConsoleMailer, EmailConfig, SmtpMailer};

/// Mail delivery failures
#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outbound mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Fire-and-forget dispatcher shared by the handlers
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    send_timeout: Duration,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, send_timeout: Duration) -> Self {
        Self {
            mailer,
            send_timeout,
        }
    }

    /// Send `email` on a background task.
    ///
    /// The handle resolves to whether delivery succeeded. Handlers drop it.
    pub fn dispatch(&self, email: Email) -> JoinHandle<bool> {
        let mailer = Arc::clone(&self.mailer);
        let send_timeout = self.send_timeout;

        tokio::spawn(async move {
            match tokio::time::timeout(send_timeout, mailer.send(&email)).await {
                Ok(Ok(())) => {
                    info!("Sent \"{}\" to {}", email.subject, email.to);
                    true
                }
                Ok(Err(e)) => {
                    error!("Failed to send \"{}\" to {}: {}", email.subject, email.to, e);
                    false
                }
                Err(_) => {
                    warn!(
                        "Timed out after {:?} sending \"{}\" to {}",
                        send_timeout, email.subject, email.to
                    );
                    false
                }
            }
        })
    }
}

#[cfg(test)]
pub mod testing {
    //! Mailer doubles

    use super::*;
    use tokio::sync::Mutex;

    /// Records every message instead of sending it
    #[derive(Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<Email>>,
    }

    impl RecordingMailer {
        pub async fn sent(&self) -> Vec<Email> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &Email) -> Result<(), MailError> {
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }

    /// Always fails, optionally after a delay
    #[derive(Default)]
    pub struct FailingMailer {
        pub delay: Option<Duration>,
    }

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _email: &Email) -> Result<(), MailError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Err(MailError::Transport("connection refused".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FailingMailer, RecordingMailer};
    use super::*;

    fn email() -> Email {
        Email {
            to: "host@example.com".to_string(),
            subject: "Hello".to_string(),
            html: "<p>hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_delivers_through_mailer() {
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = Notifier::new(mailer.clone(), Duration::from_secs(1));

        assert!(notifier.dispatch(email()).await.unwrap());
        assert_eq!(mailer.sent().await, vec![email()]);
    }

    #[tokio::test]
    async fn test_dispatch_reports_failure() {
        let notifier = Notifier::new(Arc::new(FailingMailer::default()), Duration::from_secs(1));
        assert!(!notifier.dispatch(email()).await.unwrap());
    }

    #[tokio::test]
    async fn test_dispatch_gives_up_after_timeout() {
        let mailer = FailingMailer {
            delay: Some(Duration::from_secs(5)),
        };
        let notifier = Notifier::new(Arc::new(mailer), Duration::from_millis(20));
        assert!(!notifier.dispatch(email()).await.unwrap());
    }
}
