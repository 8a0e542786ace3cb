use crate::db::Repository;
use crate::error::AppResult;
use crate::models::NewClick;
use crate::services::fingerprint::visitor_fingerprint;
use crate::services::geo::GeoResolver;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// A click captured on the redirect path, before enrichment. Everything
/// expensive (geo lookup, fingerprinting, the database write) happens in
/// the worker so the redirect itself never waits.
#[derive(Debug)]
pub struct ClickJob {
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

/// Background job types
#[derive(Debug)]
pub enum Job {
    /// Record a click event for a link
    RecordClick(ClickJob),
}

/// Background worker configuration
#[derive(Clone)]
pub struct WorkerConfig {
    /// Maximum retries for failed jobs
    pub max_retries: u32,
    /// Backoff duration between retries
    pub retry_delay_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

/// Background job worker
pub struct Worker {
    repository: Repository,
    geo: GeoResolver,
    receiver: mpsc::UnboundedReceiver<Job>,
    config: WorkerConfig,
}

impl Worker {
    /// Create a new worker
    pub fn new(
        repository: Repository,
        geo: GeoResolver,
        receiver: mpsc::UnboundedReceiver<Job>,
    ) -> Self {
        Self {
            repository,
            geo,
            receiver,
            config: WorkerConfig::default(),
        }
    }

    /// Set worker configuration
    #[allow(dead_code)]
    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the worker - processes jobs until channel closes
    pub async fn run(mut self) {
        info!("Background worker started");

        while let Some(job) = self.receiver.recv().await {
            self.process_job(job).await;
        }

        info!("Background worker stopped");
    }

    /// Process a single job with retries. Click recording is best-effort:
    /// after all retries the event is dropped, never resurfaced to the
    /// redirect that produced it.
    async fn process_job(&self, job: Job) {
        let mut retries = 0;

        loop {
            match self.execute_job(&job).await {
                Ok(_) => {
                    break;
                }
                Err(e) if e.is_foreign_key_violation() => {
                    // Link deleted between redirect and recording; the event
                    // has no owner anymore and is dropped.
                    warn!("Dropping click for a link deleted mid-flight: {:?}", job);
                    break;
                }
                Err(e) if retries < self.config.max_retries => {
                    retries += 1;
                    let delay = std::time::Duration::from_millis(self.config.retry_delay_ms);
                    warn!(
                        "Job failed (attempt {}/{}), retrying in {:?}: {}",
                        retries, self.config.max_retries, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        "Job failed after {} retries, dropping: {:?} ({})",
                        self.config.max_retries, job, e
                    );
                    break;
                }
            }
        }
    }

    /// Execute a job without retries
    async fn execute_job(&self, job: &Job) -> AppResult<()> {
        match job {
            Job::RecordClick(click) => {
                // Geo enrichment is best-effort; a failed lookup stores NULL
                let country = match click.ip_address.as_deref() {
                    Some(ip) => self.geo.lookup(ip).await,
                    None => None,
                };

                let fingerprint = visitor_fingerprint(
                    click.ip_address.as_deref(),
                    click.user_agent.as_deref(),
                );

                self.repository
                    .record_click(&NewClick {
                        link_id: click.link_id,
                        clicked_at: click.clicked_at,
                        ip_address: click.ip_address.clone(),
                        country,
                        user_agent: click.user_agent.clone(),
                        referer: click.referer.clone(),
                        visitor_fingerprint: fingerprint,
                    })
                    .await
            }
        }
    }
}

/// Job sender - used to submit jobs to the worker
#[derive(Clone)]
pub struct JobSender {
    sender: mpsc::UnboundedSender<Job>,
}

impl JobSender {
    /// Create a new job sender
    pub fn new(sender: mpsc::UnboundedSender<Job>) -> Self {
        Self { sender }
    }

    /// Submit a job to be processed asynchronously
    pub fn send(&self, job: Job) {
        if self.sender.send(job).is_err() {
            error!("Failed to send job to worker - channel may be closed");
        }
    }

    /// Submit a click for recording. Fire-and-forget: a closed channel is
    /// logged and the click lost, the redirect is unaffected.
    pub fn record_click(&self, click: ClickJob) {
        self.send(Job::RecordClick(click));
    }
}

/// Create a new job sender and receiver pair
pub fn create_job_channel() -> (JobSender, mpsc::UnboundedReceiver<Job>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (JobSender::new(sender), receiver)
}
