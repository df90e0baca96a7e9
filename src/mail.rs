use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::config::MailConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail provider rejected the message with status {0}")]
    Rejected(u16),
}

/// Out-of-band mail channel. Only the forgot-password flow sends mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Mailer backed by an HTTP mail API (Mailtrap/Resend-style JSON endpoint).
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
    from: String,
}

impl HttpMailer {
    pub fn new(cfg: &MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: cfg.endpoint.clone(),
            username: cfg.username.clone(),
            password: cfg.password.clone(),
            from: cfg.from.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "text": body,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(MailError::Rejected(resp.status().as_u16()));
        }
        debug!(to, subject, "mail sent");
        Ok(())
    }
}
