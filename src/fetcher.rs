//! MOLIT 실거래가 upstream client and transaction normalizer.
//!
//! The open-data gateway speaks flat XML with no namespaces or attributes,
//! so items are extracted by plain string scanning. Every failure mode
//! (transport errors after retries, a non-`000` result code, an
//! unparseable body) degrades to an empty result for that
//! (district, month) query; errors never propagate out of a batch.

use std::time::Duration;

use futures_util::future::join_all;
use tracing::warn;

use crate::config::{Config, FETCH_BACKOFF_MS, FETCH_BATCH_SIZE, FETCH_RETRIES};
use crate::types::AptTrade;

/// MOLIT result code for a successful response.
const RESULT_OK: &str = "000";

/// Fetch one (district, month) page. Transport failures and non-success
/// gateway result codes both retry with linear backoff; rate-limit codes
/// in particular clear after a pause. Exhausted attempts degrade to an
/// empty result.
pub async fn fetch_month(
    client: &reqwest::Client,
    cfg: &Config,
    lawd_cd: &str,
    deal_ymd: &str,
) -> Vec<AptTrade> {
    // The service key is pre-encoded; building the query by hand avoids
    // double-encoding it.
    let url = format!(
        "{}?serviceKey={}&LAWD_CD={}&DEAL_YMD={}&numOfRows=9999&pageNo=1",
        cfg.molit_api_url, cfg.molit_api_key, lawd_cd, deal_ymd
    );

    for attempt in 1..=FETCH_RETRIES {
        let xml = match client.get(&url).send().await {
            Ok(resp) => match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    if attempt < FETCH_RETRIES {
                        tokio::time::sleep(Duration::from_millis(
                            FETCH_BACKOFF_MS * attempt as u64,
                        ))
                        .await;
                        continue;
                    }
                    warn!("MOLIT body read failed for {lawd_cd}/{deal_ymd}: {e}");
                    return Vec::new();
                }
            },
            Err(e) => {
                if attempt < FETCH_RETRIES {
                    tokio::time::sleep(Duration::from_millis(FETCH_BACKOFF_MS * attempt as u64))
                        .await;
                    continue;
                }
                warn!("MOLIT fetch failed for {lawd_cd}/{deal_ymd}: {e}");
                return Vec::new();
            }
        };

        if let Some(code) = tag_value(&xml, "resultCode") {
            if code != RESULT_OK {
                if attempt < FETCH_RETRIES {
                    tokio::time::sleep(Duration::from_millis(FETCH_BACKOFF_MS * attempt as u64))
                        .await;
                    continue;
                }
                let msg = tag_value(&xml, "resultMsg").unwrap_or_default();
                warn!("MOLIT error for {lawd_cd}/{deal_ymd}: code={code} msg={msg}");
                return Vec::new();
            }
        }

        return parse_response(&xml, lawd_cd);
    }

    Vec::new()
}

/// Fetch several month keys for one district in parallel batches of 6,
/// joining each batch before issuing the next. `batch_delay` inserts the
/// ingestion rate-limit pause between batches; pass zero on request paths.
pub async fn fetch_months(
    client: &reqwest::Client,
    cfg: &Config,
    lawd_cd: &str,
    month_keys: &[String],
    batch_delay: Duration,
) -> Vec<AptTrade> {
    let mut all = Vec::new();
    for (i, batch) in month_keys.chunks(FETCH_BATCH_SIZE).enumerate() {
        if i > 0 && !batch_delay.is_zero() {
            tokio::time::sleep(batch_delay).await;
        }
        let results = join_all(
            batch
                .iter()
                .map(|deal_ymd| fetch_month(client, cfg, lawd_cd, deal_ymd)),
        )
        .await;
        for trades in results {
            all.extend(trades);
        }
    }
    all
}

/// Parse a full MOLIT response body into normalized transactions.
/// Malformed or cancelled items drop individually; the rest survive.
pub fn parse_response(xml: &str, lawd_cd: &str) -> Vec<AptTrade> {
    item_blocks(xml)
        .into_iter()
        .filter_map(|item| parse_item(item, lawd_cd))
        .collect()
}

/// Normalize one `<item>` block. Returns None for cancelled records and
/// records without a positive amount or a complete date, since those
/// cannot be aggregated. Every other malformed field degrades per-field.
fn parse_item(item: &str, lawd_cd: &str) -> Option<AptTrade> {
    // Cancelled transactions are excluded entirely.
    if tag_value(item, "cdealType").as_deref() == Some("O") {
        return None;
    }

    let amount_raw = tag_value(item, "dealAmount")?;
    let deal_amount: i64 = amount_raw.replace(',', "").trim().parse().ok()?;
    if deal_amount <= 0 {
        return None;
    }

    let deal_year = int_field(item, "dealYear")?;
    let deal_month = int_field(item, "dealMonth")?;
    let deal_day = int_field(item, "dealDay")?;

    Some(AptTrade {
        apt_name: tag_value(item, "aptNm").unwrap_or_default(),
        deal_amount,
        deal_year,
        deal_month,
        deal_day,
        exclusive_area: tag_value(item, "excluUseAr")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0),
        // Unknown stays None; 0 would read as "ground floor".
        floor: int_field(item, "floor"),
        build_year: int_field(item, "buildYear"),
        district_code: tag_value(item, "sggCd").unwrap_or_else(|| lawd_cd.to_string()),
        dong_name: tag_value(item, "umdNm"),
        road_name: tag_value(item, "roadNm"),
        jibun: tag_value(item, "jibun"),
        deal_type: tag_value(item, "dealingGbn"),
        seller_type: tag_value(item, "slerGbn"),
        buyer_type: tag_value(item, "buyerGbn"),
        agent_location: tag_value(item, "estateAgentSggNm"),
        reg_date: tag_value(item, "rgstDate"),
        apt_dong: tag_value(item, "aptDong"),
        apt_seq: tag_value(item, "aptSeq"),
        land_leasehold: tag_value(item, "landLeaseholdGbn"),
    })
}

fn int_field(block: &str, tag: &str) -> Option<i32> {
    tag_value(block, tag).and_then(|s| s.parse().ok())
}

/// All `<item>…</item>` block bodies in document order.
fn item_blocks(xml: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find("<item>") {
        let body_start = start + "<item>".len();
        let Some(end) = rest[body_start..].find("</item>") else {
            break;
        };
        blocks.push(&rest[body_start..body_start + end]);
        rest = &rest[body_start + end + "</item>".len()..];
    }
    blocks
}

/// Content of the first `<tag>…</tag>` occurrence, trimmed and
/// entity-decoded. None when the tag is absent or empty.
fn tag_value(block: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = block.find(&open)? + open.len();
    let end = block[start..].find(&close)? + start;
    let value = decode_entities(block[start..end].trim());
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Decodes the five entities the gateway emits. `&amp;` goes last so that
/// double-escaped sequences decode exactly one level.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
