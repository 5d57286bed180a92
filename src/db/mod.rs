//! SQLite access: pool setup, idempotent trade upserts and paged reads
//! over the summary views. Reads always page with LIMIT/OFFSET until a
//! short page returns; the store interface is assumed to cap result
//! sizes, so no single query may be trusted to return everything.

pub mod models;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, SqlitePool};

use crate::config::{DB_PAGE_SIZE, UPSERT_BATCH_SIZE};
use crate::error::Result;
use crate::stats::RollupRow;
use crate::types::AptTrade;
use models::{SearchRow, SummaryRow};

pub async fn connect(db_path: &str) -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(opts).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

const TRADE_COLUMNS: &str = "apt_name, deal_amount, deal_year, deal_month, deal_day, \
     exclusive_area, floor, build_year, district_code, dong_name, road_name, jibun, \
     deal_type, seller_type, buyer_type, agent_location, reg_date, apt_dong, apt_seq, \
     land_leasehold";

/// Append transactions, ignoring natural-key duplicates. Safe to re-run
/// over the same upstream window; returns the number of rows actually
/// inserted.
pub async fn upsert_trades(pool: &SqlitePool, trades: &[AptTrade]) -> Result<u64> {
    let mut inserted = 0u64;

    for batch in trades.chunks(UPSERT_BATCH_SIZE) {
        let mut qb = QueryBuilder::<sqlx::Sqlite>::new(format!(
            "INSERT OR IGNORE INTO apt_trades ({TRADE_COLUMNS}) "
        ));
        qb.push_values(batch, |mut b, t| {
            b.push_bind(&t.apt_name)
                .push_bind(t.deal_amount)
                .push_bind(t.deal_year)
                .push_bind(t.deal_month)
                .push_bind(t.deal_day)
                .push_bind(t.exclusive_area)
                .push_bind(t.floor)
                .push_bind(t.build_year)
                .push_bind(&t.district_code)
                .push_bind(&t.dong_name)
                .push_bind(&t.road_name)
                .push_bind(&t.jibun)
                .push_bind(&t.deal_type)
                .push_bind(&t.seller_type)
                .push_bind(&t.buyer_type)
                .push_bind(&t.agent_location)
                .push_bind(&t.reg_date)
                .push_bind(&t.apt_dong)
                .push_bind(&t.apt_seq)
                .push_bind(&t.land_leasehold);
        });
        let result = qb.build().execute(pool).await?;
        inserted += result.rows_affected();
    }

    Ok(inserted)
}

const SUMMARY_COLUMNS: &str =
    "deal_year, deal_month, avg_price, max_price, min_price, trade_count";

/// Monthly rollups for a set of raw district codes, from `start_year` up,
/// ordered ascending by (year, month).
pub async fn district_rollups(
    pool: &SqlitePool,
    codes: &[String],
    start_year: i32,
) -> Result<Vec<RollupRow>> {
    let mut rows: Vec<RollupRow> = Vec::new();
    let mut offset = 0i64;

    loop {
        let mut qb = QueryBuilder::<sqlx::Sqlite>::new(format!(
            "SELECT district_code, {SUMMARY_COLUMNS} FROM district_monthly_summary \
             WHERE deal_year >= "
        ));
        qb.push_bind(start_year);
        qb.push(" AND district_code IN (");
        let mut sep = qb.separated(", ");
        for code in codes {
            sep.push_bind(code);
        }
        qb.push(") ORDER BY deal_year, deal_month, district_code LIMIT ");
        qb.push_bind(DB_PAGE_SIZE);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let page: Vec<SummaryRow> = qb.build_query_as().fetch_all(pool).await?;
        let short = (page.len() as i64) < DB_PAGE_SIZE;
        rows.extend(page.into_iter().map(RollupRow::from));
        if short {
            return Ok(rows);
        }
        offset += DB_PAGE_SIZE;
    }
}

/// Rollups across every raw district code (ranking input).
pub async fn all_district_rollups(pool: &SqlitePool, start_year: i32) -> Result<Vec<RollupRow>> {
    let mut rows: Vec<RollupRow> = Vec::new();
    let mut offset = 0i64;

    loop {
        let page: Vec<SummaryRow> = sqlx::query_as(&format!(
            "SELECT district_code, {SUMMARY_COLUMNS} FROM district_monthly_summary \
             WHERE deal_year >= ? ORDER BY deal_year, deal_month, district_code \
             LIMIT ? OFFSET ?"
        ))
        .bind(start_year)
        .bind(DB_PAGE_SIZE)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let short = (page.len() as i64) < DB_PAGE_SIZE;
        rows.extend(page.into_iter().map(RollupRow::from));
        if short {
            return Ok(rows);
        }
        offset += DB_PAGE_SIZE;
    }
}

/// Metro rollups; `sido` of None applies no filter and returns every sido's
/// rows for the caller to combine.
pub async fn metro_rollups(
    pool: &SqlitePool,
    sido: Option<&str>,
    start_year: i32,
) -> Result<Vec<RollupRow>> {
    let mut rows: Vec<RollupRow> = Vec::new();
    let mut offset = 0i64;

    loop {
        let mut qb = QueryBuilder::<sqlx::Sqlite>::new(format!(
            "SELECT sido_code AS district_code, {SUMMARY_COLUMNS} FROM metro_monthly_summary \
             WHERE deal_year >= "
        ));
        qb.push_bind(start_year);
        if let Some(sido) = sido {
            qb.push(" AND sido_code = ");
            qb.push_bind(sido);
        }
        qb.push(" ORDER BY deal_year, deal_month, sido_code LIMIT ");
        qb.push_bind(DB_PAGE_SIZE);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let page: Vec<SummaryRow> = qb.build_query_as().fetch_all(pool).await?;
        let short = (page.len() as i64) < DB_PAGE_SIZE;
        rows.extend(page.into_iter().map(RollupRow::from));
        if short {
            return Ok(rows);
        }
        offset += DB_PAGE_SIZE;
    }
}

/// Partial-match name search over the `apartment_search` view, most-traded
/// first.
pub async fn search_apartments(
    pool: &SqlitePool,
    query: &str,
    limit: i64,
) -> Result<Vec<SearchRow>> {
    let rows = sqlx::query_as(
        "SELECT apartment_name, district_code, dong_name, recent_price, trade_count \
         FROM apartment_search \
         WHERE apartment_name LIKE '%' || ? || '%' \
         ORDER BY trade_count DESC, recent_price DESC \
         LIMIT ?",
    )
    .bind(query)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Apartments in one metro meeting a trade-count floor, optionally within
/// a [min_price, max_price) band, priciest first.
pub async fn apartment_ranking(
    pool: &SqlitePool,
    sido: &str,
    min_trades: i64,
    min_price: Option<i64>,
    max_price: Option<i64>,
    limit: i64,
) -> Result<Vec<SearchRow>> {
    let mut qb = QueryBuilder::<sqlx::Sqlite>::new(
        "SELECT apartment_name, district_code, dong_name, recent_price, trade_count \
         FROM apartment_search WHERE district_code LIKE ",
    );
    qb.push_bind(format!("{sido}%"));
    qb.push(" AND trade_count >= ");
    qb.push_bind(min_trades);
    if let Some(min_price) = min_price {
        qb.push(" AND recent_price >= ");
        qb.push_bind(min_price);
    }
    if let Some(max_price) = max_price {
        qb.push(" AND recent_price < ");
        qb.push_bind(max_price);
    }
    qb.push(" ORDER BY recent_price DESC LIMIT ");
    qb.push_bind(limit);

    let rows = qb.build_query_as().fetch_all(pool).await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        // One connection only; each :memory: connection is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn trade(name: &str, code: &str, year: i32, month: i32, day: i32, amount: i64) -> AptTrade {
        AptTrade {
            apt_name: name.to_string(),
            deal_amount: amount,
            deal_year: year,
            deal_month: month,
            deal_day: day,
            exclusive_area: 84.99,
            floor: Some(7),
            build_year: Some(2015),
            district_code: code.to_string(),
            dong_name: Some("역삼동".to_string()),
            road_name: None,
            jibun: None,
            deal_type: None,
            seller_type: None,
            buyer_type: None,
            agent_location: None,
            reg_date: None,
            apt_dong: None,
            apt_seq: None,
            land_leasehold: None,
        }
    }

    async fn trade_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM apt_trades")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn double_ingest_does_not_duplicate() {
        let pool = test_pool().await;
        let trades = vec![
            trade("은마", "11680", 2024, 1, 10, 250_000),
            trade("은마", "11680", 2024, 1, 15, 255_000),
        ];

        let first = upsert_trades(&pool, &trades).await.unwrap();
        let second = upsert_trades(&pool, &trades).await.unwrap();
        assert_eq!(first, 2);
        assert_eq!(second, 0);
        assert_eq!(trade_count(&pool).await, 2);

        // Downstream aggregates must not inflate either.
        let rollups = district_rollups(&pool, &["11680".to_string()], 2024)
            .await
            .unwrap();
        assert_eq!(rollups.len(), 1);
        assert_eq!(rollups[0].trade_count, 2);
    }

    #[tokio::test]
    async fn unknown_floor_rows_also_deduplicate() {
        let pool = test_pool().await;
        let mut t = trade("은마", "11680", 2024, 2, 1, 250_000);
        t.floor = None;
        upsert_trades(&pool, &[t.clone()]).await.unwrap();
        let second = upsert_trades(&pool, &[t]).await.unwrap();
        assert_eq!(second, 0);
        assert_eq!(trade_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn district_rollups_filter_by_code_set() {
        let pool = test_pool().await;
        upsert_trades(
            &pool,
            &[
                trade("부천A", "41192", 2024, 1, 5, 50_000),
                trade("부천B", "41194", 2024, 1, 8, 70_000),
                trade("강남", "11680", 2024, 1, 9, 300_000),
            ],
        )
        .await
        .unwrap();

        let codes = crate::regions::expand_code("41190");
        let rollups = district_rollups(&pool, &codes, 2024).await.unwrap();
        assert_eq!(rollups.len(), 2);
        assert!(rollups.iter().all(|r| r.code.starts_with("4119")));
    }

    #[tokio::test]
    async fn metro_rollups_group_by_sido() {
        let pool = test_pool().await;
        upsert_trades(
            &pool,
            &[
                trade("강남", "11680", 2024, 1, 9, 300_000),
                trade("마포", "11440", 2024, 1, 12, 150_000),
                trade("해운대", "26350", 2024, 1, 3, 90_000),
            ],
        )
        .await
        .unwrap();

        let seoul = metro_rollups(&pool, Some("11"), 2024).await.unwrap();
        assert_eq!(seoul.len(), 1);
        assert_eq!(seoul[0].code, "11");
        assert_eq!(seoul[0].trade_count, 2);
        assert_eq!(seoul[0].avg_price, 225_000);

        let all = metro_rollups(&pool, None, 2024).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn search_surfaces_latest_price() {
        let pool = test_pool().await;
        upsert_trades(
            &pool,
            &[
                trade("경희궁자이", "11110", 2024, 1, 5, 180_000),
                trade("경희궁자이", "11110", 2024, 3, 20, 193_000),
            ],
        )
        .await
        .unwrap();

        let rows = search_apartments(&pool, "경희궁", 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].recent_price, 193_000);
        assert_eq!(rows[0].trade_count, 2);
    }

    #[tokio::test]
    async fn ranking_applies_trade_floor_and_price_band() {
        let pool = test_pool().await;
        upsert_trades(
            &pool,
            &[
                trade("다건", "11680", 2024, 1, 1, 100_000),
                trade("다건", "11680", 2024, 1, 2, 110_000),
                trade("다건", "11680", 2024, 1, 3, 120_000),
                trade("한건", "11680", 2024, 1, 4, 500_000),
                trade("다건저가", "11440", 2024, 1, 1, 30_000),
                trade("다건저가", "11440", 2024, 1, 2, 31_000),
                trade("다건저가", "11440", 2024, 1, 3, 32_000),
            ],
        )
        .await
        .unwrap();

        // "한건" fails the trade floor; "다건저가" falls under the band.
        let rows = apartment_ranking(&pool, "11", 3, Some(100_000), Some(200_000), 100)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].apartment_name, "다건");
        assert_eq!(rows[0].recent_price, 120_000);
    }
}
