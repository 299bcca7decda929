//! Outbound mail port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

/// Mail transport trait - abstraction over delivery backends.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Attempt delivery of one message.
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Mail delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Message rejected: {0}")]
    Rejected(String),
}

/// Mask the local part of an address for logging.
pub fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{}***", first),
                _ => "***".to_string(),
            };
            format!("{}{}", masked_local, domain)
        }
        None => "***".to_string(),
    }
}
