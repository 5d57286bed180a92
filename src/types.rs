use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Canonical transaction
// ---------------------------------------------------------------------------

/// One apartment sale, normalized from a MOLIT record. Amounts are in
/// manwon (10,000-won units). Created once by the normalizer, immutable
/// thereafter; cancelled upstream records are never represented.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AptTrade {
    pub apt_name: String,
    pub deal_amount: i64,
    pub deal_year: i32,
    pub deal_month: i32,
    pub deal_day: i32,
    /// Exclusive (usable) floor area in m².
    pub exclusive_area: f64,
    /// None means unknown, never conflated with 0 (ground floor).
    pub floor: Option<i32>,
    pub build_year: Option<i32>,
    pub district_code: String,
    pub dong_name: Option<String>,
    pub road_name: Option<String>,
    pub jibun: Option<String>,
    pub deal_type: Option<String>,
    pub seller_type: Option<String>,
    pub buyer_type: Option<String>,
    pub agent_location: Option<String>,
    pub reg_date: Option<String>,
    pub apt_dong: Option<String>,
    pub apt_seq: Option<String>,
    pub land_leasehold: Option<String>,
}

impl AptTrade {
    /// Composite sortable date, `year*10000 + month*100 + day`.
    pub fn date_key(&self) -> i32 {
        self.deal_year * 10_000 + self.deal_month * 100 + self.deal_day
    }

    /// YYYYMM bucket key.
    pub fn month_key(&self) -> String {
        format!("{}{:02}", self.deal_year, self.deal_month)
    }
}

// ---------------------------------------------------------------------------
// Monthly statistics
// ---------------------------------------------------------------------------

/// Per-month price summary. Sequences are always emitted ascending by
/// `month`; `change_rate` compares against the previous *emitted* entry
/// (not the calendar-adjacent month) and is None for the first entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    /// YYYYMM.
    pub month: String,
    pub avg_price: i64,
    pub max_price: i64,
    pub min_price: i64,
    pub count: i64,
    /// Percent vs previous entry, one decimal.
    pub change_rate: Option<f64>,
}

// ---------------------------------------------------------------------------
// Apartment grouping output
// ---------------------------------------------------------------------------

/// Summary of one apartment group (base complex name + pyeong bucket).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentSummary {
    pub apt_name: String,
    pub exclusive_area: f64,
    pub pyeong: i32,
    pub dong_name: Option<String>,
    pub build_year: Option<i32>,
    /// Average of the most recent (up to 5) transactions, rounded.
    pub recent_avg_price: i64,
    /// Maximum over the group's full history.
    pub max_price: i64,
    /// Total transactions across the group's full history.
    pub count: usize,
}

/// One entry of the surge/plunge ranking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChangeItem {
    pub apt_name: String,
    pub pyeong: i32,
    pub dong_name: Option<String>,
    pub recent_avg: i64,
    pub prev_avg: i64,
    /// Percent, one decimal. Positive in the `up` list, negative in `down`.
    pub change_rate: f64,
}
