//! Time-series aggregation: monthly bucketing, count-weighted rollup
//! merging, change rates and lookback anchors.
//!
//! The same "bucket by month → average → rate vs previous emitted entry"
//! contract backs every statistics endpoint; handlers only differ in where
//! the rows come from and which grouping key they fold by.

use std::collections::BTreeMap;

use chrono::{Datelike, Utc};

use crate::types::{AptTrade, MonthlyStat};

/// Pre-aggregated monthly rollup row as stored per raw district or metro
/// code. Input to the cross-entity combine, never raw transactions.
#[derive(Debug, Clone)]
pub struct RollupRow {
    pub code: String,
    pub year: i32,
    pub month: i32,
    pub avg_price: i64,
    pub max_price: i64,
    pub min_price: i64,
    pub trade_count: i64,
}

/// Inclusive lower bound of a lookback window, truncated to month
/// granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthAnchor {
    pub year: i32,
    pub month: i32,
}

impl MonthAnchor {
    /// Anchor at "now minus `months_back` months".
    pub fn months_back(months_back: u32) -> Self {
        let now = Utc::now().date_naive();
        let (year, month) = shift_month(now.year(), now.month() as i32, months_back as i32);
        Self { year, month }
    }

    pub fn includes(&self, year: i32, month: i32) -> bool {
        year > self.year || (year == self.year && month >= self.month)
    }
}

/// Month arithmetic without day-of-month pitfalls: `(2024, 1) - 3 → (2023, 10)`.
fn shift_month(year: i32, month: i32, back: i32) -> (i32, i32) {
    let total = year * 12 + (month - 1) - back;
    (total.div_euclid(12), total.rem_euclid(12) + 1)
}

/// YYYYMM keys for the most recent `months` months, newest first.
pub fn month_list(months: u32) -> Vec<String> {
    let now = Utc::now().date_naive();
    (0..months as i32)
        .map(|back| {
            let (y, m) = shift_month(now.year(), now.month() as i32, back);
            format!("{y}{m:02}")
        })
        .collect()
}

/// Percent change vs the previous average, rounded to one decimal.
/// None when there is no usable previous value.
pub fn change_rate(avg: i64, prev_avg: Option<i64>) -> Option<f64> {
    match prev_avg {
        Some(prev) if prev != 0 => {
            Some(((avg - prev) as f64 / prev as f64 * 1000.0).round() / 10.0)
        }
        _ => None,
    }
}

pub(crate) fn round_avg(sum: i64, count: i64) -> i64 {
    (sum as f64 / count as f64).round() as i64
}

/// Monthly Aggregator: unordered transactions → ascending MonthlyStat
/// sequence. Change rates compare adjacent entries of the *output*; a
/// missing calendar month is simply absent, and its successor rates
/// against whatever entry precedes it.
pub fn monthly_stats(trades: &[AptTrade]) -> Vec<MonthlyStat> {
    let mut by_month: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for t in trades {
        by_month.entry(t.month_key()).or_default().push(t.deal_amount);
    }

    let mut stats: Vec<MonthlyStat> = Vec::with_capacity(by_month.len());
    for (month, prices) in by_month {
        let sum: i64 = prices.iter().sum();
        let avg = round_avg(sum, prices.len() as i64);
        let prev_avg = stats.last().map(|s: &MonthlyStat| s.avg_price);
        stats.push(MonthlyStat {
            month,
            avg_price: avg,
            max_price: *prices.iter().max().unwrap_or(&0),
            min_price: *prices.iter().min().unwrap_or(&0),
            count: prices.len() as i64,
            change_rate: change_rate(avg, prev_avg),
        });
    }
    stats
}

#[derive(Debug, Default)]
struct MonthAgg {
    sum_price: i64,
    max_price: i64,
    min_price: i64,
    total_count: i64,
}

/// Cross-Entity Aggregator: merges rollup rows from several raw codes into
/// one per-month series. Averages combine count-weighted: each input avg
/// summarizes a different number of trades, so `sum += avg * count` and a
/// final `sum / total` is required for correctness; a naive mean of means
/// is not.
pub fn combine_monthly(rows: &[RollupRow], anchor: MonthAnchor) -> Vec<MonthlyStat> {
    let mut by_month: BTreeMap<String, MonthAgg> = BTreeMap::new();

    for row in rows {
        if !anchor.includes(row.year, row.month) {
            continue;
        }
        let key = format!("{}{:02}", row.year, row.month);
        let agg = by_month.entry(key).or_insert_with(|| MonthAgg {
            min_price: i64::MAX,
            ..Default::default()
        });
        agg.sum_price += row.avg_price * row.trade_count;
        agg.max_price = agg.max_price.max(row.max_price);
        agg.min_price = agg.min_price.min(row.min_price);
        agg.total_count += row.trade_count;
    }

    let mut stats: Vec<MonthlyStat> = Vec::with_capacity(by_month.len());
    for (month, agg) in by_month {
        // A zero-count group would divide by zero; skip rather than emit NaN.
        if agg.total_count == 0 {
            continue;
        }
        let avg = round_avg(agg.sum_price, agg.total_count);
        let prev_avg = stats.last().map(|s: &MonthlyStat| s.avg_price);
        stats.push(MonthlyStat {
            month,
            avg_price: avg,
            max_price: agg.max_price,
            min_price: agg.min_price,
            count: agg.total_count,
            change_rate: change_rate(avg, prev_avg),
        });
    }
    stats
}

/// One district's recent-window weighted average for the ranking endpoint.
#[derive(Debug, Clone)]
pub struct DistrictAgg {
    pub code: String,
    pub avg_price: i64,
    pub trade_count: i64,
}

/// Folds rollup rows by a caller-supplied code mapping (raw → canonical)
/// and computes one count-weighted average per canonical code over the
/// anchor window, sorted by price descending.
pub fn rank_districts<F>(rows: &[RollupRow], anchor: MonthAnchor, fold: F) -> Vec<DistrictAgg>
where
    F: Fn(&str) -> String,
{
    let mut by_code: BTreeMap<String, (i64, i64)> = BTreeMap::new();

    for row in rows {
        if !anchor.includes(row.year, row.month) {
            continue;
        }
        let entry = by_code.entry(fold(&row.code)).or_insert((0, 0));
        entry.0 += row.avg_price * row.trade_count;
        entry.1 += row.trade_count;
    }

    let mut ranked: Vec<DistrictAgg> = by_code
        .into_iter()
        .filter(|(_, (_, count))| *count > 0)
        .map(|(code, (sum, count))| DistrictAgg {
            code,
            avg_price: round_avg(sum, count),
            trade_count: count,
        })
        .collect();
    ranked.sort_by(|a, b| b.avg_price.cmp(&a.avg_price));
    ranked
}
