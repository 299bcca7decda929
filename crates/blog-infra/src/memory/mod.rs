//! In-memory store - used as fallback when no database is configured.

mod store;

pub use store::{
    InMemoryCommentRepository, InMemoryPostRepository, InMemoryStore, InMemoryTagRepository,
    InMemoryUserRepository,
};

#[cfg(test)]
mod tests;
