use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Shortened link record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Link {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Link {
    /// A link with `expires_at` in the past is dead but distinct from one
    /// that never existed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at < now,
            None => false,
        }
    }
}

/// One recorded resolution attempt against a link. Rows are immutable and
/// append-only; they are only ever aggregated over.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: i64,
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub visitor_fingerprint: String,
}

/// Fully-enriched click ready for insertion by the background worker.
#[derive(Debug, Clone)]
pub struct NewClick {
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub visitor_fingerprint: String,
}

/// Request to create a short URL
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    #[validate(
        url(message = "Must be a valid URL"),
        length(max = 2048, message = "URL must be at most 2048 characters")
    )]
    pub original_url: String,

    #[validate(length(min = 3, max = 50, message = "Custom alias must be 3-50 characters"))]
    pub custom_alias: Option<String>,

    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update of mutable link fields. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub is_active: Option<bool>,

    pub expires_at: Option<DateTime<Utc>>,
}

/// Link representation returned by the API
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LinkResponse {
    pub fn from_link(link: Link, base_url: &str) -> Self {
        let short_url = format!("{}/{}", base_url, link.short_code);
        LinkResponse {
            id: link.id,
            short_code: link.short_code,
            short_url,
            original_url: link.original_url,
            title: link.title,
            description: link.description,
            is_active: link.is_active,
            click_count: link.click_count,
            created_at: link.created_at,
            updated_at: link.updated_at,
            expires_at: link.expires_at,
        }
    }
}

/// One calendar-day bucket in the analytics time series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub count: i64,
}

/// One country bucket in the analytics breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryBucket {
    pub country: String,
    pub count: i64,
}

/// A recent click as rendered by the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct RecentClick {
    pub clicked_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

/// Analytics report for a single link
#[derive(Debug, Serialize)]
pub struct AnalyticsReport {
    pub total_clicks: i64,
    pub unique_clicks: i64,
    /// Unique clicks as a percentage of total clicks; 0 when there are none.
    pub conversion_rate: f64,
    pub clicks_by_day: Vec<DayBucket>,
    pub clicks_by_country: Vec<CountryBucket>,
    pub recent_clicks: Vec<RecentClick>,
}
