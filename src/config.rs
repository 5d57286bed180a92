use crate::error::{AppError, Result};

pub const MOLIT_API_URL: &str =
    "https://apis.data.go.kr/1613000/RTMSDataSvcAptTradeDev/getRTMSDataSvcAptTradeDev";

/// Months fetched per parallel batch against the MOLIT API. The open-data
/// gateway throttles aggressively above this.
pub const FETCH_BATCH_SIZE: usize = 6;

/// Pause between ingestion batches (rate-limit headroom).
pub const FETCH_BATCH_DELAY_MS: u64 = 200;

/// Upstream fetch attempts before a (district, month) is treated as empty.
pub const FETCH_RETRIES: u32 = 3;

/// Linear backoff base between retries (attempt 1 → 2s, attempt 2 → 4s).
pub const FETCH_BACKOFF_MS: u64 = 2_000;

/// Rows per upsert batch during ingestion.
pub const UPSERT_BATCH_SIZE: usize = 500;

/// Rows per page when reading summary views; the store interface is
/// assumed to cap single-query result size.
pub const DB_PAGE_SIZE: i64 = 1_000;

/// CDN cache directives for read endpoints (seconds).
pub const CACHE_MAX_AGE: u64 = 86_400;
pub const STALE_REVALIDATE: u64 = 3_600;
pub const SEARCH_CACHE_MAX_AGE: u64 = 3_600;
pub const SEARCH_STALE_REVALIDATE: u64 = 600;

/// Hard cap on the search result limit parameter.
pub const SEARCH_LIMIT_MAX: i64 = 30;

/// Recent transactions sampled per apartment group for the rolling average.
pub const RECENT_SAMPLE_SIZE: usize = 5;

/// Months per surge/plunge comparison window.
pub const CHANGE_WINDOW_MONTHS: usize = 3;

/// Minimum trades an apartment group needs in each window to qualify
/// for the surge/plunge ranking.
pub const CHANGE_MIN_TRADES: usize = 2;

/// `months` query parameters are clamped to this range to bound the
/// upstream fan-out.
pub const MONTHS_MIN: u32 = 1;
pub const MONTHS_MAX: u32 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-encoded service key for the MOLIT API (MOLIT_API_KEY).
    /// Inserted into the query string verbatim; re-encoding it breaks auth.
    pub molit_api_key: String,
    pub molit_api_url: String,
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            molit_api_key: std::env::var("MOLIT_API_KEY").unwrap_or_default(),
            molit_api_url: std::env::var("MOLIT_API_URL")
                .unwrap_or_else(|_| MOLIT_API_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "apt_deals.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
        })
    }
}
