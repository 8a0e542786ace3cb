//! Administrative command handlers.
//!
//! This module contains CLI command handlers for administrative tasks
//! such as cleaning expired links, running migrations, rebuilding click
//! counters, viewing statistics, and pinging the cache server.

use crate::cache::Cache;
use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, AppResult};
use clap::Subcommand;
use tracing::info;

/// Administrative commands available via CLI.
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Clean expired links from the database
    CleanExpired,

    /// Run database migrations
    Migrate,

    /// Show statistics
    Stats,

    /// Rebuild a link's cached click counter from the event log
    Recount {
        /// Link id whose counter should be rebuilt
        id: i64,
    },

    /// Ping the cache server
    PingCache,
}

/// Run an administrative command with the given configuration.
pub async fn run(config: Config, admin_command: AdminCommands) -> AppResult<()> {
    match admin_command {
        AdminCommands::CleanExpired => clean_expired(config).await,
        AdminCommands::Migrate => migrate(config).await,
        AdminCommands::Stats => stats(config).await,
        AdminCommands::Recount { id } => recount(config, id).await,
        AdminCommands::PingCache => ping_cache(config).await,
    }
}

async fn connect(config: &Config) -> AppResult<Repository> {
    Repository::new(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
        config.database.acquire_timeout_seconds,
    )
    .await
}

/// Clean expired links from the database.
async fn clean_expired(config: Config) -> AppResult<()> {
    info!("Cleaning expired links...");

    let repository = connect(&config).await?;
    let deleted_count = repository.delete_expired_links().await?;

    info!("Deleted {} expired link(s)", deleted_count);
    Ok(())
}

/// Run database migrations.
async fn migrate(config: Config) -> AppResult<()> {
    info!("Running database migrations...");

    let repository = connect(&config).await?;
    repository.run_migrations().await?;

    info!("Migrations completed successfully");
    Ok(())
}

/// Display statistics.
async fn stats(config: Config) -> AppResult<()> {
    info!("Fetching statistics...");

    let repository = connect(&config).await?;
    let stats = repository.get_stats().await?;

    println!("\n=== shortly Statistics ===");
    println!("Total Links:     {}", stats.total_links);
    println!("Total Clicks:    {}", stats.total_clicks);
    println!("Active Links:    {}", stats.active_links);
    println!("Expired Links:   {}", stats.expired_links);
    println!();

    Ok(())
}

/// Rebuild one link's click counter from the event log.
async fn recount(config: Config, id: i64) -> AppResult<()> {
    info!("Recounting clicks for link {}...", id);

    let repository = connect(&config).await?;
    let count = repository
        .recount_clicks(id)
        .await?
        .ok_or(AppError::LinkNotFound(id.to_string()))?;

    println!("Link {} click_count rebuilt: {}", id, count);
    Ok(())
}

/// Ping the cache server.
async fn ping_cache(config: Config) -> AppResult<()> {
    info!("Pinging cache server...");

    let cache = Cache::new(
        &config.cache.url,
        config.cache.max_connections,
        config.cache.default_ttl_seconds,
    )
    .await?;

    let response = cache.ping().await?;

    info!("Cache server responded: {}", response);

    Ok(())
}
