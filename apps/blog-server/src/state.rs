//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::ports::Mailer;
use blog_core::services::Repositories;
use blog_core::{BlogService, BlogSettings};
use blog_infra::database::DatabaseConnections;
use blog_infra::{InMemoryMailer, InMemoryStore};

use crate::config::{AppConfig, MailConfig};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: Arc<BlogService>,
    pub db: Option<Arc<DatabaseConnections>>,
}

/// Repositories over the in-memory store, for when no database is configured.
pub fn in_memory_repositories(store: &InMemoryStore) -> Repositories {
    Repositories {
        users: Arc::new(store.users()),
        posts: Arc::new(store.posts()),
        comments: Arc::new(store.comments()),
        tags: Arc::new(store.tags()),
    }
}

#[cfg(feature = "postgres")]
fn postgres_repositories(conn: &DatabaseConnections) -> Repositories {
    use blog_infra::database::{
        PostgresCommentRepository, PostgresPostRepository, PostgresTagRepository,
        PostgresUserRepository,
    };

    Repositories {
        users: Arc::new(PostgresUserRepository::new(conn.main.clone())),
        posts: Arc::new(PostgresPostRepository::new(conn.main.clone())),
        comments: Arc::new(PostgresCommentRepository::new(conn.main.clone())),
        tags: Arc::new(PostgresTagRepository::new(conn.main.clone())),
    }
}

/// The HTTP mail API transport, when one is configured.
#[cfg(feature = "http-mail")]
fn http_mailer(config: &MailConfig) -> Option<Arc<dyn Mailer>> {
    use blog_infra::{HttpMailer, HttpMailerConfig};

    let url = config.api_url.as_ref()?;
    let mut mailer_config = HttpMailerConfig::new(url.clone());
    if let Some(key) = &config.api_key {
        mailer_config = mailer_config.with_api_key(key.clone());
    }

    match HttpMailer::new(mailer_config) {
        Ok(mailer) => {
            tracing::info!("Mail API transport configured");
            Some(Arc::new(mailer))
        }
        Err(e) => {
            tracing::error!("Failed to build mail transport: {}. Using in-memory outbox.", e);
            None
        }
    }
}

#[cfg(not(feature = "http-mail"))]
fn http_mailer(config: &MailConfig) -> Option<Arc<dyn Mailer>> {
    if config.api_url.is_some() {
        tracing::warn!("MAIL_API_URL set but http-mail feature disabled. Using in-memory outbox.");
    }
    None
}

/// Pick the mail transport: the HTTP mail API when configured, else the outbox.
fn build_mailer(config: &MailConfig) -> Arc<dyn Mailer> {
    if let Some(mailer) = http_mailer(config) {
        return mailer;
    }

    tracing::info!("Outgoing mail is kept in the in-memory outbox");
    Arc::new(InMemoryMailer::new())
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let mailer = build_mailer(&config.mail);

        // Initialize database connections if configured
        #[cfg(feature = "postgres")]
        let (db, repos): (Option<Arc<DatabaseConnections>>, Repositories) = {
            if let Some(db_config) = &config.database {
                match DatabaseConnections::init(db_config).await {
                    Ok(connections) => {
                        let conn = Arc::new(connections);
                        let repos = postgres_repositories(&conn);
                        (Some(conn), repos)
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                        (None, in_memory_repositories(&InMemoryStore::new()))
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (None, in_memory_repositories(&InMemoryStore::new()))
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (db, repos): (Option<Arc<DatabaseConnections>>, Repositories) = {
            if config.database.is_some() {
                tracing::warn!("DATABASE_URL set but postgres feature disabled.");
            }
            tracing::info!("Running without postgres feature - using in-memory repositories");
            (None, in_memory_repositories(&InMemoryStore::new()))
        };

        tracing::info!("Application state initialized");

        Self::from_parts(repos, mailer, config.blog.clone(), db)
    }

    pub fn from_parts(
        repos: Repositories,
        mailer: Arc<dyn Mailer>,
        settings: BlogSettings,
        db: Option<Arc<DatabaseConnections>>,
    ) -> Self {
        Self {
            blog: Arc::new(BlogService::new(repos, mailer, settings)),
            db,
        }
    }
}
