//! sqlx row types for the summary views.

use crate::stats::RollupRow;

/// One row of `district_monthly_summary` / `metro_monthly_summary`
/// (the metro query aliases `sido_code` to `district_code`).
#[derive(Debug, sqlx::FromRow)]
pub struct SummaryRow {
    pub district_code: String,
    pub deal_year: i32,
    pub deal_month: i32,
    pub avg_price: i64,
    pub max_price: i64,
    pub min_price: i64,
    pub trade_count: i64,
}

impl From<SummaryRow> for RollupRow {
    fn from(r: SummaryRow) -> Self {
        RollupRow {
            code: r.district_code,
            year: r.deal_year,
            month: r.deal_month,
            avg_price: r.avg_price,
            max_price: r.max_price,
            min_price: r.min_price,
            trade_count: r.trade_count,
        }
    }
}

/// One row of the `apartment_search` view.
#[derive(Debug, sqlx::FromRow)]
pub struct SearchRow {
    pub apartment_name: String,
    pub district_code: String,
    pub dong_name: Option<String>,
    pub recent_price: i64,
    pub trade_count: i64,
}
