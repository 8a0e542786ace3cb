use crate::cache::Cache;
use crate::db::Repository;
use crate::jobs::JobSender;

/// Application state shared across all HTTP handlers.
///
/// This struct is wrapped in `Arc` and shared across all request handlers
/// via Axum's State extraction. It contains all the necessary dependencies
/// for handling HTTP requests.
#[derive(Clone)]
pub struct AppState {
    /// Database repository for link and click-event operations
    pub repository: Repository,

    /// Redis cache for storing frequently accessed links
    pub cache: Cache,

    /// Background job sender for asynchronous click recording
    pub job_sender: JobSender,

    /// Base URL for constructing short URLs (e.g., "http://localhost:3000")
    pub base_url: String,

    /// Length of randomly generated short codes
    pub short_code_length: usize,

    /// Maximum number of attempts to allocate a unique short code
    pub short_code_max_attempts: u32,

    /// Whether caching is enabled for link lookups
    pub cache_enabled: bool,
}
