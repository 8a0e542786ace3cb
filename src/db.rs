use crate::error::{AppError, AppResult};
use crate::models::{ClickEvent, Link, NewClick, UpdateLinkRequest};
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions, PgPool,
};
use std::str::FromStr;
use std::time::Duration;

/// Database repository
pub struct Repository {
    pub(crate) pool: PgPool,
}

/// Fields for a new link row. The short code is passed separately by the
/// allocation path so retries only swap the code.
#[derive(Debug, Clone)]
pub struct NewLink<'a> {
    pub original_url: &'a str,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Repository {
    /// Create a new repository with a connection pool
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_seconds: u64,
    ) -> AppResult<Self> {
        let options = PgConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Configuration(format!("Invalid database URL: {}", e)))?
            .disable_statement_logging();

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_seconds))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Insert a new link row.
    ///
    /// The uniqueness of `short_code` is enforced by the database constraint,
    /// not by a prior existence check; a violation surfaces as
    /// `AppError::DuplicateCode` so the allocation path can distinguish
    /// "retry with a fresh code" from "caller's alias is taken".
    pub async fn insert_link(&self, short_code: &str, link: &NewLink<'_>) -> AppResult<Link> {
        let result = sqlx::query_as::<_, Link>(
            r#"
            INSERT INTO links (short_code, original_url, title, description, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(short_code)
        .bind(link.original_url)
        .bind(link.title)
        .bind(link.description)
        .bind(link.expires_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(link) => Ok(link),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::DuplicateCode(short_code.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a link by short code
    pub async fn get_link_by_code(&self, short_code: &str) -> AppResult<Option<Link>> {
        let result = sqlx::query_as::<_, Link>(
            r#"
            SELECT * FROM links
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    /// Get a link by its primary key
    pub async fn get_link_by_id(&self, id: i64) -> AppResult<Option<Link>> {
        let result = sqlx::query_as::<_, Link>(
            r#"
            SELECT * FROM links
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    /// Partially update a link's mutable fields. Absent fields keep their
    /// current value.
    pub async fn update_link(
        &self,
        id: i64,
        update: &UpdateLinkRequest,
    ) -> AppResult<Option<Link>> {
        let result = sqlx::query_as::<_, Link>(
            r#"
            UPDATE links
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                is_active = COALESCE($3, is_active),
                expires_at = COALESCE($4, expires_at),
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(update.title.as_deref())
        .bind(update.description.as_deref())
        .bind(update.is_active)
        .bind(update.expires_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    /// Delete a link. Returns the deleted row so callers can evict its cache
    /// entry. Click events cascade away with the row.
    pub async fn delete_link(&self, id: i64) -> AppResult<Option<Link>> {
        let result = sqlx::query_as::<_, Link>(
            r#"
            DELETE FROM links WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    /// Record one click: append the immutable event row and bump the owning
    /// link's cached counter in the same transaction, so the counter can
    /// never drift from the event log.
    pub async fn record_click(&self, click: &NewClick) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO click_events
                (link_id, clicked_at, ip_address, country, user_agent, referer, visitor_fingerprint)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(click.link_id)
        .bind(click.clicked_at)
        .bind(click.ip_address.as_deref())
        .bind(click.country.as_deref())
        .bind(click.user_agent.as_deref())
        .bind(click.referer.as_deref())
        .bind(&click.visitor_fingerprint)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE links
            SET click_count = click_count + 1
            WHERE id = $1
            "#,
        )
        .bind(click.link_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Rebuild a link's cached click counter from the event log.
    pub async fn recount_clicks(&self, id: i64) -> AppResult<Option<i64>> {
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE links
            SET click_count = (SELECT COUNT(*) FROM click_events WHERE link_id = $1)
            WHERE id = $1
            RETURNING click_count
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    /// Fetch all click events for a link, newest first. Feeds the analytics
    /// aggregator; a single snapshot so the report agrees with itself.
    pub async fn clicks_for_link(&self, link_id: i64) -> AppResult<Vec<ClickEvent>> {
        let results = sqlx::query_as::<_, ClickEvent>(
            r#"
            SELECT * FROM click_events
            WHERE link_id = $1
            ORDER BY clicked_at DESC, id DESC
            "#,
        )
        .bind(link_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    /// Delete all expired links
    pub async fn delete_expired_links(&self) -> AppResult<u64> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            DELETE FROM links WHERE expires_at IS NOT NULL AND expires_at < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Get global statistics
    pub async fn get_stats(&self) -> AppResult<Stats> {
        let row = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*) as total_links,
                COUNT(*) FILTER (WHERE expires_at IS NULL OR expires_at > NOW()) as active_links,
                COUNT(*) FILTER (WHERE expires_at IS NOT NULL AND expires_at <= NOW()) as expired_links
            FROM links
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let total_clicks =
            sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM click_events"#)
                .fetch_one(&self.pool)
                .await?;

        Ok(Stats {
            total_links: row.0,
            total_clicks,
            active_links: row.1,
            expired_links: row.2,
        })
    }
}

/// Statistics struct
#[derive(Debug)]
pub struct Stats {
    pub total_links: i64,
    pub total_clicks: i64,
    pub active_links: i64,
    pub expired_links: i64,
}

/// Clone implementation for Repository
impl Clone for Repository {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_creation() {
        let stats = Stats {
            total_links: 100,
            total_clicks: 1000,
            active_links: 80,
            expired_links: 20,
        };

        assert_eq!(stats.total_links, 100);
        assert_eq!(stats.total_clicks, 1000);
        assert_eq!(stats.active_links, 80);
        assert_eq!(stats.expired_links, 20);
    }
}
