use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::apartments::{apartment_summaries, price_changes};
use crate::config::{
    Config, CACHE_MAX_AGE, MONTHS_MAX, MONTHS_MIN, SEARCH_CACHE_MAX_AGE, SEARCH_LIMIT_MAX,
    SEARCH_STALE_REVALIDATE, STALE_REVALIDATE,
};
use crate::error::AppError;
use crate::fetcher::fetch_months;
use crate::regions::{expand_code, fold_code, full_district_name};
use crate::stats::{combine_monthly, month_list, rank_districts, MonthAnchor};
use crate::tier::{tier_for, Tier};
use crate::types::{ApartmentSummary, AptTrade, MonthlyStat, PriceChangeItem};

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
    pub cfg: Config,
    pub client: reqwest::Client,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/trades", get(get_trades))
        .route("/api/apartments", get(get_apartments))
        .route("/api/search", get(get_search))
        .route("/api/district-stats", get(get_district_stats))
        .route("/api/metro-stats", get(get_metro_stats))
        .route("/api/district-ranking", get(get_district_ranking))
        .route("/api/apartment-ranking", get(get_apartment_ranking))
        .with_state(state)
}

/// Upstream data changes at most monthly, so responses carry long CDN
/// cache lifetimes with background revalidation.
fn cache_control(max_age: u64, stale: u64) -> [(header::HeaderName, String); 1] {
    [(
        header::CACHE_CONTROL,
        format!("public, s-maxage={max_age}, stale-while-revalidate={stale}"),
    )]
}

fn clamp_months(months: Option<u32>, default: u32) -> u32 {
    months.unwrap_or(default).clamp(MONTHS_MIN, MONTHS_MAX)
}

fn require_code(code: &Option<String>) -> Result<&str, AppError> {
    match code.as_deref() {
        Some(c) if !c.trim().is_empty() => Ok(c.trim()),
        _ => Err(AppError::BadRequest("지역코드(code)가 필요합니다".to_string())),
    }
}

fn valid_sido(sido: &str) -> bool {
    sido.len() == 2 && sido.chars().all(|c| c.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct TradesQuery {
    pub code: Option<String>,
    pub months: Option<u32>,
}

#[derive(Deserialize)]
pub struct ApartmentsQuery {
    pub code: Option<String>,
    pub months: Option<u32>,
    /// "recent" (default) or "max".
    pub sort: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct MetroStatsQuery {
    pub sido: Option<String>,
    pub months: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentRankingQuery {
    pub sido: Option<String>,
    pub min_trades: Option<i64>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TradesResponse {
    pub trades: Vec<AptTrade>,
}

#[derive(Serialize)]
pub struct ApartmentsResponse {
    pub apartments: Vec<ApartmentSummary>,
    pub up: Vec<PriceChangeItem>,
    pub down: Vec<PriceChangeItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub apartment_name: String,
    pub district_code: String,
    pub district_name: String,
    pub dong_name: String,
    pub recent_price: i64,
    pub trade_count: i64,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub stats: Vec<MonthlyStat>,
    pub total_count: i64,
    pub latest_avg_price: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingItem {
    pub code: String,
    pub name: String,
    pub avg_price: i64,
    pub trade_count: i64,
    pub tier: &'static Tier,
}

#[derive(Serialize)]
pub struct RankingResponse {
    pub rankings: Vec<RankingItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentRankingResponse {
    pub apartments: Vec<SearchResult>,
    pub total_count: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Live transaction list for one district, newest first. Served straight
/// from the upstream source; months that fail upstream contribute zero
/// rows rather than failing the request.
async fn get_trades(
    State(state): State<ApiState>,
    Query(params): Query<TradesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let code = require_code(&params.code)?;
    let months = clamp_months(params.months, 6);

    let mut trades = fetch_months(
        &state.client,
        &state.cfg,
        code,
        &month_list(months),
        Duration::ZERO,
    )
    .await;
    trades.sort_by(|a, b| b.date_key().cmp(&a.date_key()));

    Ok((
        cache_control(CACHE_MAX_AGE, STALE_REVALIDATE),
        Json(TradesResponse { trades }),
    ))
}

/// Apartment-group summaries plus the surge/plunge rankings for one
/// district window.
async fn get_apartments(
    State(state): State<ApiState>,
    Query(params): Query<ApartmentsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let code = require_code(&params.code)?;
    let months = clamp_months(params.months, 36);

    let trades = fetch_months(
        &state.client,
        &state.cfg,
        code,
        &month_list(months),
        Duration::ZERO,
    )
    .await;

    let mut apartments = apartment_summaries(&trades);
    if params.sort.as_deref() == Some("max") {
        apartments.sort_by(|a, b| b.max_price.cmp(&a.max_price));
    }
    let changes = price_changes(&trades);

    Ok((
        cache_control(CACHE_MAX_AGE, STALE_REVALIDATE),
        Json(ApartmentsResponse {
            apartments,
            up: changes.up,
            down: changes.down,
        }),
    ))
}

async fn get_search(
    State(state): State<ApiState>,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(AppError::BadRequest("검색어(q)가 필요합니다".to_string()));
    }
    let limit = params.limit.unwrap_or(10).clamp(1, SEARCH_LIMIT_MAX);

    let rows = crate::db::search_apartments(&state.pool, query, limit).await?;
    let results = rows.into_iter().map(fold_search_row).collect();

    Ok((
        cache_control(SEARCH_CACHE_MAX_AGE, SEARCH_STALE_REVALIDATE),
        Json(SearchResponse { results }),
    ))
}

async fn get_district_stats(
    State(state): State<ApiState>,
    Query(params): Query<TradesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let code = require_code(&params.code)?;
    let months = clamp_months(params.months, 36);
    let anchor = MonthAnchor::months_back(months);

    let raw_codes = expand_code(code);
    let rows = crate::db::district_rollups(&state.pool, &raw_codes, anchor.year).await?;
    let stats = combine_monthly(&rows, anchor);

    Ok((
        cache_control(CACHE_MAX_AGE, STALE_REVALIDATE),
        Json(stats_response(stats)),
    ))
}

async fn get_metro_stats(
    State(state): State<ApiState>,
    Query(params): Query<MetroStatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let sido = match params.sido.as_deref().map(str::trim) {
        Some(s) if s == "all" || valid_sido(s) => s,
        _ => {
            return Err(AppError::BadRequest(
                "시도코드(sido)가 필요합니다 (예: 11, all)".to_string(),
            ))
        }
    };
    let months = clamp_months(params.months, 36);
    let anchor = MonthAnchor::months_back(months);

    let filter = (sido != "all").then_some(sido);
    let rows = crate::db::metro_rollups(&state.pool, filter, anchor.year).await?;
    // For "all" this folds every sido into a single nationwide series.
    let stats = combine_monthly(&rows, anchor);

    Ok((
        cache_control(CACHE_MAX_AGE, STALE_REVALIDATE),
        Json(stats_response(stats)),
    ))
}

/// Recent-3-month count-weighted average per canonical district, priciest
/// first, each entry carrying its price tier.
async fn get_district_ranking(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, AppError> {
    let anchor = MonthAnchor::months_back(3);
    let rows = crate::db::all_district_rollups(&state.pool, anchor.year).await?;

    let rankings = rank_districts(&rows, anchor, |raw| fold_code(raw).to_string())
        .into_iter()
        .map(|d| RankingItem {
            name: full_district_name(&d.code),
            tier: tier_for(d.avg_price),
            code: d.code,
            avg_price: d.avg_price,
            trade_count: d.trade_count,
        })
        .collect();

    Ok((
        cache_control(CACHE_MAX_AGE, STALE_REVALIDATE),
        Json(RankingResponse { rankings }),
    ))
}

async fn get_apartment_ranking(
    State(state): State<ApiState>,
    Query(params): Query<ApartmentRankingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let sido = match params.sido.as_deref().map(str::trim) {
        Some(s) if valid_sido(s) => s,
        _ => {
            return Err(AppError::BadRequest(
                "시도 코드(sido)가 필요합니다 (예: 11)".to_string(),
            ))
        }
    };
    let min_trades = params.min_trades.unwrap_or(3).max(1);
    let limit = params.limit.unwrap_or(1000).clamp(1, 5000);

    let rows = crate::db::apartment_ranking(
        &state.pool,
        sido,
        min_trades,
        params.min_price,
        params.max_price,
        limit,
    )
    .await?;
    let apartments: Vec<SearchResult> = rows.into_iter().map(fold_search_row).collect();

    Ok((
        cache_control(CACHE_MAX_AGE, STALE_REVALIDATE),
        Json(ApartmentRankingResponse {
            total_count: apartments.len(),
            apartments,
        }),
    ))
}

// ---------------------------------------------------------------------------
// Shaping helpers
// ---------------------------------------------------------------------------

/// Folds a raw-code view row back to its canonical display code and name.
fn fold_search_row(row: crate::db::models::SearchRow) -> SearchResult {
    let canonical = fold_code(&row.district_code).to_string();
    SearchResult {
        apartment_name: row.apartment_name,
        district_name: full_district_name(&canonical),
        district_code: canonical,
        dong_name: row.dong_name.unwrap_or_default(),
        recent_price: row.recent_price,
        trade_count: row.trade_count,
    }
}

fn stats_response(stats: Vec<MonthlyStat>) -> StatsResponse {
    let total_count = stats.iter().map(|s| s.count).sum();
    let latest_avg_price = stats.last().map(|s| s.avg_price).unwrap_or(0);
    StatsResponse {
        stats,
        total_count,
        latest_avg_price,
    }
}
