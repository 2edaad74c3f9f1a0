//! feedarr - RSS release feed reconciliation with duplicate-episode suppression
//!
//! Polls registered feeds on an interval, records every observed release in
//! the acquisition ledger, and suppresses entries that duplicate an episode
//! already acquired for the same series.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedarr::config::Config;
use feedarr::db::{CreateFeed, Database};
use feedarr::services::{LogOnlyTrigger, ReconcileService, RssService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedarr=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting feedarr");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;
    tracing::info!("Database connected and migrated");

    // Register configured feeds not yet in the registry
    for url in &config.feed_urls {
        if db.feeds().get_by_url(url).await?.is_none() {
            let feed = db
                .feeds()
                .create(CreateFeed {
                    name: url.clone(),
                    url: url.clone(),
                })
                .await?;
            tracing::info!(feed = %feed.url, "Registered feed");
        }
    }

    let rss = RssService::new(&config.user_agent);
    let reconcile = ReconcileService::new(db, rss, Arc::new(LogOnlyTrigger));

    let mut interval =
        tokio::time::interval(Duration::from_secs(config.poll_interval_minutes * 60));

    loop {
        interval.tick().await;

        // The toggle is an explicit per-pass input to the engine, not
        // ambient state it reads itself
        match reconcile.run_pass(config.skip_duplicate_episodes).await {
            Ok(summary) => {
                tracing::info!(
                    items = summary.items_seen,
                    suppressed = summary.suppressed,
                    triggered = summary.triggered,
                    "Pass finished"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Reconciliation pass failed");
            }
        }
    }
}
