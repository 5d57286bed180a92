//! Bulk ingestion: backfills MOLIT transactions for every tracked district.
//!
//! Usage: `seed [months=36]`

use std::time::{Duration, Instant};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use apt_deal_scanner::config::{Config, FETCH_BATCH_DELAY_MS};
use apt_deal_scanner::db;
use apt_deal_scanner::error::Result;
use apt_deal_scanner::fetcher::fetch_months;
use apt_deal_scanner::regions::{district_name, DISTRICTS};
use apt_deal_scanner::stats::month_list;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if cfg.molit_api_key.is_empty() {
        error!("MOLIT_API_KEY must be set for ingestion");
        std::process::exit(1);
    }

    let months: u32 = std::env::args()
        .nth(1)
        .and_then(|a| a.parse().ok())
        .unwrap_or(36);

    if let Err(e) = run(cfg, months).await {
        error!("Ingestion failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config, months: u32) -> Result<()> {
    let pool = db::connect(&cfg.db_path).await?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let month_keys = month_list(months);
    info!(
        "Ingestion start: {} → {} ({months} months), {} districts, {} upstream calls",
        month_keys.last().map(String::as_str).unwrap_or(""),
        month_keys.first().map(String::as_str).unwrap_or(""),
        DISTRICTS.len(),
        DISTRICTS.len() * months as usize,
    );

    let start = Instant::now();
    let mut total_rows = 0u64;

    for (i, code) in DISTRICTS.iter().enumerate() {
        let district_start = Instant::now();

        let trades = fetch_months(
            &client,
            &cfg,
            code,
            &month_keys,
            Duration::from_millis(FETCH_BATCH_DELAY_MS),
        )
        .await;
        let inserted = db::upsert_trades(&pool, &trades).await?;

        total_rows += inserted;
        let progress = (i + 1) as f64 / DISTRICTS.len() as f64 * 100.0;
        info!(
            "[{progress:.1}%] {}({code}): {inserted} rows ({:.1}s) | total: {total_rows}",
            district_name(code),
            district_start.elapsed().as_secs_f64(),
        );
    }

    info!(
        "Ingestion complete: {} districts, {total_rows} rows, {:.1} min",
        DISTRICTS.len(),
        start.elapsed().as_secs_f64() / 60.0,
    );

    Ok(())
}
