//! HTTP mail API transport.
//!
//! Posts each message as JSON to a transactional mail endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use blog_core::ports::{MailError, Mailer, OutgoingEmail, mask_email};

/// Configuration for the HTTP mail transport.
#[derive(Debug, Clone)]
pub struct HttpMailerConfig {
    /// Endpoint receiving the message payload.
    pub url: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl HttpMailerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Serialize)]
struct MailPayload<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
}

/// Mailer backed by an HTTP mail API.
pub struct HttpMailer {
    config: HttpMailerConfig,
    client: reqwest::Client,
}

impl HttpMailer {
    pub fn new(config: HttpMailerConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let payload = MailPayload {
            from: &email.from,
            to: &email.to,
            subject: &email.subject,
            text: &email.body,
        };

        let mut request = self.client.post(&self.config.url).json(&payload);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected(format!("{}: {}", status, detail)));
        }

        let recipients: Vec<String> = email.to.iter().map(|to| mask_email(to)).collect();
        tracing::info!(subject = %email.subject, to = ?recipients, "Mail delivered");
        Ok(())
    }
}
