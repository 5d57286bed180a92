//! Apartment grouping and ranking.
//!
//! Transactions are grouped into (base complex name, supply-pyeong bucket)
//! keys: sub-complex suffixes like "(2단지)" fold into one complex, and
//! minor exclusive-area variance folds into one pyeong bucket so that
//! near-identical unit layouts are ranked as one entity.

use std::collections::HashMap;

use crate::config::{CHANGE_MIN_TRADES, CHANGE_WINDOW_MONTHS, RECENT_SAMPLE_SIZE};
use crate::stats::change_rate;
use crate::types::{ApartmentSummary, AptTrade, PriceChangeItem};

/// Exclusive m² → supply-area-equivalent pyeong bucket. The 1.3 factor
/// approximates gross supply area from exclusive area; 3.3058 m² per pyeong.
pub fn supply_pyeong(sqm: f64) -> i32 {
    (sqm * 1.3 / 3.3058).round() as i32
}

/// Strips a trailing "(<digits>단지)" sub-complex suffix. Anything else
/// (other parenthesized text, a non-numeric 단지 marker, or the suffix not
/// at the end) is left untouched.
pub fn base_apt_name(name: &str) -> &str {
    let trimmed = name.trim();
    if let Some(without_close) = trimmed.strip_suffix(')') {
        if let Some(open) = without_close.rfind('(') {
            let inner = &without_close[open + 1..];
            if let Some(digits) = inner.strip_suffix("단지") {
                if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                    return without_close[..open].trim_end();
                }
            }
        }
    }
    trimmed
}

fn group_key(t: &AptTrade) -> (String, i32) {
    (base_apt_name(&t.apt_name).to_string(), supply_pyeong(t.exclusive_area))
}

/// Per-group summaries, sorted by recent average price descending. Rank is
/// positional; nothing is stored.
pub fn apartment_summaries(trades: &[AptTrade]) -> Vec<ApartmentSummary> {
    let mut groups: HashMap<(String, i32), Vec<&AptTrade>> = HashMap::new();
    for t in trades {
        groups.entry(group_key(t)).or_default().push(t);
    }

    let mut summaries: Vec<ApartmentSummary> = groups
        .into_iter()
        .map(|((name, pyeong), mut group)| {
            group.sort_by(|a, b| b.date_key().cmp(&a.date_key()));
            let recent = &group[..group.len().min(RECENT_SAMPLE_SIZE)];
            let recent_sum: i64 = recent.iter().map(|t| t.deal_amount).sum();
            let recent_avg_price =
                (recent_sum as f64 / recent.len() as f64).round() as i64;
            // Max spans the full group history, not just the recent sample.
            let max_price = group.iter().map(|t| t.deal_amount).max().unwrap_or(0);
            let latest = group[0];

            ApartmentSummary {
                apt_name: name,
                exclusive_area: latest.exclusive_area,
                pyeong,
                dong_name: latest.dong_name.clone(),
                build_year: latest.build_year,
                recent_avg_price,
                max_price,
                count: group.len(),
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.recent_avg_price.cmp(&a.recent_avg_price));
    summaries
}

/// Surge ("up") and plunge ("down") rankings, top 5 each.
#[derive(Debug, Default)]
pub struct PriceChanges {
    pub up: Vec<PriceChangeItem>,
    pub down: Vec<PriceChangeItem>,
}

/// Period-over-period ranking: compares each group's average over the
/// newest 3 distinct months against months 4-6 back. Groups with fewer
/// than 2 trades in either window are excluded; an empty previous window
/// must never read as infinite growth.
pub fn price_changes(trades: &[AptTrade]) -> PriceChanges {
    let mut months: Vec<String> = trades.iter().map(|t| t.month_key()).collect();
    months.sort_by(|a, b| b.cmp(a));
    months.dedup();

    // The recent window needs its full 3 months plus at least one month of
    // history to compare against.
    if months.len() < CHANGE_WINDOW_MONTHS + 1 {
        return PriceChanges::default();
    }

    let recent_months = &months[..CHANGE_WINDOW_MONTHS.min(months.len())];
    let prev_end = (2 * CHANGE_WINDOW_MONTHS).min(months.len());
    let prev_months = &months[CHANGE_WINDOW_MONTHS..prev_end];

    let mut windows: HashMap<(String, i32), (Vec<i64>, Vec<i64>)> = HashMap::new();
    for t in trades {
        let key = t.month_key();
        let entry = windows.entry(group_key(t)).or_default();
        if recent_months.contains(&key) {
            entry.0.push(t.deal_amount);
        } else if prev_months.contains(&key) {
            entry.1.push(t.deal_amount);
        }
    }

    let mut items: Vec<PriceChangeItem> = Vec::new();
    for ((name, pyeong), (recent, prev)) in windows {
        if recent.len() < CHANGE_MIN_TRADES || prev.len() < CHANGE_MIN_TRADES {
            continue;
        }
        let recent_avg =
            (recent.iter().sum::<i64>() as f64 / recent.len() as f64).round() as i64;
        let prev_avg = (prev.iter().sum::<i64>() as f64 / prev.len() as f64).round() as i64;
        let Some(rate) = change_rate(recent_avg, Some(prev_avg)) else {
            continue;
        };
        // Latest trade of this exact group, not a sibling pyeong bucket.
        let dong_name = trades
            .iter()
            .filter(|t| base_apt_name(&t.apt_name) == name && supply_pyeong(t.exclusive_area) == pyeong)
            .max_by_key(|t| t.date_key())
            .and_then(|t| t.dong_name.clone());
        items.push(PriceChangeItem {
            apt_name: name,
            pyeong,
            dong_name,
            recent_avg,
            prev_avg,
            change_rate: rate,
        });
    }

    let mut up: Vec<PriceChangeItem> =
        items.iter().filter(|i| i.change_rate > 0.0).cloned().collect();
    up.sort_by(|a, b| b.change_rate.total_cmp(&a.change_rate));
    up.truncate(5);

    let mut down: Vec<PriceChangeItem> =
        items.into_iter().filter(|i| i.change_rate < 0.0).collect();
    down.sort_by(|a, b| a.change_rate.total_cmp(&b.change_rate));
    down.truncate(5);

    PriceChanges { up, down }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(name: &str, area: f64, year: i32, month: i32, day: i32, amount: i64) -> AptTrade {
        AptTrade {
            apt_name: name.to_string(),
            deal_amount: amount,
            deal_year: year,
            deal_month: month,
            deal_day: day,
            exclusive_area: area,
            floor: Some(5),
            build_year: Some(2008),
            district_code: "11110".to_string(),
            dong_name: Some("사직동".to_string()),
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

    #[test]
    fn sub_complex_suffix_is_stripped() {
        assert_eq!(base_apt_name("경희궁자이(2단지)"), "경희궁자이");
        assert_eq!(base_apt_name("래미안 원베일리(10단지)"), "래미안 원베일리");
    }

    #[test]
    fn non_matching_suffixes_are_kept() {
        // Not digits, not 단지, or not at the end.
        assert_eq!(base_apt_name("한강타운(A단지)"), "한강타운(A단지)");
        assert_eq!(base_apt_name("한강타운(2차)"), "한강타운(2차)");
        assert_eq!(base_apt_name("(3단지)한강타운"), "(3단지)한강타운");
        assert_eq!(base_apt_name("한강타운"), "한강타운");
    }

    #[test]
    fn pyeong_bucket_converts_supply_area() {
        // 84.99㎡ * 1.3 / 3.3058 = 33.42… → 33평
        assert_eq!(supply_pyeong(84.99), 33);
        // 59.9㎡ → 23.55… → 24평
        assert_eq!(supply_pyeong(59.9), 24);
    }

    #[test]
    fn same_base_name_and_bucket_forms_one_group() {
        let trades = vec![
            trade("테스트(2단지)", 84.91, 2024, 1, 5, 100),
            trade("테스트(3단지)", 84.99, 2024, 1, 9, 120),
            trade("테스트", 84.95, 2024, 2, 1, 140),
        ];
        // All normalize to "테스트" / 33평 → one group of 3.
        let summaries = apartment_summaries(&trades);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].apt_name, "테스트");
        assert_eq!(summaries[0].count, 3);
    }

    #[test]
    fn differing_base_names_stay_distinct() {
        let trades = vec![
            trade("테스트1차", 84.99, 2024, 1, 5, 100),
            trade("테스트2차", 84.99, 2024, 1, 9, 120),
        ];
        assert_eq!(apartment_summaries(&trades).len(), 2);
    }

    #[test]
    fn recent_average_samples_latest_five_but_max_spans_all() {
        let trades: Vec<AptTrade> = (1..=7)
            .map(|day| trade("샘플", 84.99, 2024, 1, day, day as i64 * 100))
            .collect();
        let summaries = apartment_summaries(&trades);
        assert_eq!(summaries.len(), 1);
        // Recent 5 by date desc: days 7..3 → prices 700..300, avg 500.
        assert_eq!(summaries[0].recent_avg_price, 500);
        assert_eq!(summaries[0].max_price, 700);
        assert_eq!(summaries[0].count, 7);
    }

    #[test]
    fn summaries_rank_by_recent_average_descending() {
        let trades = vec![
            trade("저가", 59.9, 2024, 1, 1, 50_000),
            trade("고가", 84.99, 2024, 1, 2, 200_000),
        ];
        let summaries = apartment_summaries(&trades);
        assert_eq!(summaries[0].apt_name, "고가");
        assert_eq!(summaries[1].apt_name, "저가");
    }

    #[test]
    fn fewer_than_four_months_yields_no_rankings() {
        let trades = vec![
            trade("테스트", 84.99, 2024, 1, 1, 100),
            trade("테스트", 84.99, 2024, 2, 1, 110),
            trade("테스트", 84.99, 2024, 3, 1, 120),
        ];
        let changes = price_changes(&trades);
        assert!(changes.up.is_empty());
        assert!(changes.down.is_empty());
    }

    #[test]
    fn surge_direction_matches_window_averages() {
        // 4 distinct months: recent window = {04,03,02}, prev = {01}.
        let trades = vec![
            trade("상승", 84.99, 2024, 1, 5, 100),
            trade("상승", 84.99, 2024, 1, 20, 100),
            trade("상승", 84.99, 2024, 2, 1, 130),
            trade("상승", 84.99, 2024, 3, 1, 140),
            trade("하락", 59.9, 2024, 1, 5, 200),
            trade("하락", 59.9, 2024, 1, 20, 200),
            trade("하락", 59.9, 2024, 2, 1, 150),
            trade("하락", 59.9, 2024, 4, 1, 150),
            // fourth distinct month for the first group too
            trade("상승", 84.99, 2024, 4, 1, 150),
        ];
        let changes = price_changes(&trades);
        assert_eq!(changes.up.len(), 1);
        assert_eq!(changes.up[0].apt_name, "상승");
        assert!(changes.up[0].change_rate > 0.0);
        assert_eq!(changes.down.len(), 1);
        assert_eq!(changes.down[0].apt_name, "하락");
        assert!(changes.down[0].change_rate < 0.0);
    }

    #[test]
    fn ranking_dong_comes_from_the_groups_latest_trade() {
        // A sibling pyeong bucket of the same complex sits first in the
        // input with a different dong; it must not leak into the 33평
        // group's entry, and within the group the newest dong wins.
        let mut sibling_bucket = trade("복합", 59.9, 2024, 1, 1, 80);
        sibling_bucket.dong_name = Some("딴동".to_string());

        let mut old_a = trade("복합", 84.99, 2024, 1, 5, 100);
        old_a.dong_name = Some("구동".to_string());
        let mut old_b = trade("복합", 84.99, 2024, 1, 20, 100);
        old_b.dong_name = Some("구동".to_string());
        let mid_a = trade("복합", 84.99, 2024, 2, 1, 130);
        let mid_b = trade("복합", 84.99, 2024, 3, 1, 140);
        let mut newest = trade("복합", 84.99, 2024, 4, 1, 150);
        newest.dong_name = Some("신동".to_string());

        let trades = vec![sibling_bucket, old_a, old_b, mid_a, mid_b, newest];
        let changes = price_changes(&trades);
        assert_eq!(changes.up.len(), 1);
        assert_eq!(changes.up[0].pyeong, 33);
        assert_eq!(changes.up[0].dong_name.as_deref(), Some("신동"));
    }

    #[test]
    fn rankings_order_by_change_magnitude() {
        let mut trades = Vec::new();
        // Two rising groups: +40% must outrank +10%.
        for (name, area, prices) in [
            ("급등", 84.99, [130, 140, 150]),
            ("완등", 59.9, [105, 110, 115]),
        ] {
            trades.push(trade(name, area, 2024, 1, 5, 100));
            trades.push(trade(name, area, 2024, 1, 20, 100));
            for (i, price) in prices.into_iter().enumerate() {
                trades.push(trade(name, area, 2024, 2 + i as i32, 1, price));
            }
        }
        let changes = price_changes(&trades);
        assert_eq!(changes.up.len(), 2);
        assert_eq!(changes.up[0].apt_name, "급등");
        assert_eq!(changes.up[1].apt_name, "완등");
        assert!(changes.up[0].change_rate > changes.up[1].change_rate);
    }

    #[test]
    fn thin_previous_window_excludes_the_group() {
        // One trade in the previous window: must appear in neither list,
        // never as infinite growth.
        let trades = vec![
            trade("단건", 84.99, 2024, 1, 5, 100),
            trade("단건", 84.99, 2024, 2, 1, 120),
            trade("단건", 84.99, 2024, 3, 1, 130),
            trade("단건", 84.99, 2024, 4, 1, 140),
        ];
        let changes = price_changes(&trades);
        assert!(changes.up.is_empty());
        assert!(changes.down.is_empty());
    }
}
