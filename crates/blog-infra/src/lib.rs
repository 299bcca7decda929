//! # Blog Infrastructure
//!
//! Concrete implementations of the ports defined in `blog-core`.
//! This crate contains the database, in-memory and mail integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `http-mail` - Mail delivery through an HTTP mail API via reqwest

pub mod database;
pub mod mail;
pub mod memory;

// Re-exports - In-Memory
pub use database::{DatabaseConfig, DatabaseConnections};
pub use mail::InMemoryMailer;
pub use memory::InMemoryStore;

// Re-exports - External services
#[cfg(feature = "postgres")]
pub use database::{
    PostgresCommentRepository, PostgresPostRepository, PostgresTagRepository,
    PostgresUserRepository,
};
#[cfg(feature = "http-mail")]
pub use mail::{HttpMailer, HttpMailerConfig};
