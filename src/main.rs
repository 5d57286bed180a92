use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use apt_deal_scanner::api::routes::{router, ApiState};
use apt_deal_scanner::config::Config;
use apt_deal_scanner::db;
use apt_deal_scanner::error::Result;

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

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let pool = db::connect(&cfg.db_path).await?;
    info!("Database ready at {}", cfg.db_path);

    if cfg.molit_api_key.is_empty() {
        warn!("MOLIT_API_KEY not set; live endpoints (/api/trades, /api/apartments) will return empty results");
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;

    let state = ApiState {
        pool,
        cfg: cfg.clone(),
        client,
    };
    let app = router(state);

    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
