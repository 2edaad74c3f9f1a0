//! Application configuration management

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Database path (SQLite)
    pub database_url: String,

    /// Minutes between reconciliation passes
    pub poll_interval_minutes: u64,

    /// Whether to suppress releases duplicating an already-acquired episode
    pub skip_duplicate_episodes: bool,

    /// User agent sent when fetching feeds
    pub user_agent: String,

    /// Feed urls to register on startup (comma-separated in the env)
    pub feed_urls: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_PATH")
            .or_else(|_| env::var("DATABASE_URL"))
            .unwrap_or_else(|_| "sqlite://./data/feedarr.db".to_string());

        Ok(Self {
            database_url,

            poll_interval_minutes: env::var("POLL_INTERVAL_MINUTES")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .context("Invalid POLL_INTERVAL_MINUTES")?,

            skip_duplicate_episodes: env::var("SKIP_DUPLICATE_EPISODES")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),

            user_agent: env::var("FEED_USER_AGENT")
                .unwrap_or_else(|_| "feedarr/0.1".to_string()),

            feed_urls: env::var("FEED_URLS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}
