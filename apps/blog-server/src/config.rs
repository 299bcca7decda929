//! Application configuration loaded from environment variables.

use std::env;

use blog_core::BlogSettings;
use blog_infra::database::DatabaseConfig;

/// Outbound mail configuration.
#[derive(Debug, Clone, Default)]
pub struct MailConfig {
    /// HTTP mail API endpoint. Without it mail goes to the in-memory outbox.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub mail: MailConfig,
    pub blog: BlogSettings,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            max_connections: parse_var("DB_MAX_CONNECTIONS").unwrap_or(20),
            min_connections: parse_var("DB_MIN_CONNECTIONS").unwrap_or(2),
            sqlx_logging: env::var("DB_LOG_STATEMENTS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            ..DatabaseConfig::new(url)
        });

        let mail = MailConfig {
            api_url: non_empty_var("MAIL_API_URL"),
            api_key: non_empty_var("MAIL_API_KEY"),
        };

        let defaults = BlogSettings::default();
        let blog = BlogSettings {
            site_url: non_empty_var("SITE_URL")
                .unwrap_or_else(|| format!("http://{}:{}", host, port)),
            mail_from: non_empty_var("MAIL_FROM").unwrap_or(defaults.mail_from.clone()),
            ..defaults
        };

        Self {
            host,
            port,
            database,
            mail,
            blog,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
