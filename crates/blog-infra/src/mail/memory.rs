//! In-memory outbox - used when no mail transport is configured.

use async_trait::async_trait;
use tokio::sync::RwLock;

use blog_core::ports::{MailError, Mailer, OutgoingEmail, mask_email};

/// Mailer that keeps every message in an outbox instead of delivering it.
///
/// Messages are also logged, so a development server shows what would have
/// been sent.
pub struct InMemoryMailer {
    outbox: RwLock<Vec<OutgoingEmail>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self {
            outbox: RwLock::new(Vec::new()),
        }
    }

    /// Messages sent so far, oldest first.
    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox.read().await.clone()
    }
}

impl Default for InMemoryMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if email.to.is_empty() {
            return Err(MailError::Rejected("No recipients".to_string()));
        }

        let recipients: Vec<String> = email.to.iter().map(|to| mask_email(to)).collect();
        tracing::info!(
            subject = %email.subject,
            to = ?recipients,
            "Mail stored in outbox"
        );

        self.outbox.write().await.push(email);
        Ok(())
    }
}
