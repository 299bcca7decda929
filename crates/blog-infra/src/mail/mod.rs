//! Mail transports - HTTP mail API and in-memory outbox fallback.

mod memory;

#[cfg(feature = "http-mail")]
mod http;

pub use memory::InMemoryMailer;

#[cfg(feature = "http-mail")]
pub use http::{HttpMailer, HttpMailerConfig};
