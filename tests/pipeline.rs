//! End-to-end pipeline test: upstream XML → normalizer → idempotent
//! upsert → monthly rollup view → cross-entity combine.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use apt_deal_scanner::db;
use apt_deal_scanner::fetcher::parse_response;
use apt_deal_scanner::stats::{combine_monthly, MonthAnchor};

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

fn response_xml(items: &[(i32, i32, i32, i64)]) -> String {
    let items: String = items
        .iter()
        .map(|(year, month, day, amount)| {
            format!(
                "<item>\
                   <aptNm>은마</aptNm>\
                   <dealAmount>{amount}</dealAmount>\
                   <dealYear>{year}</dealYear>\
                   <dealMonth>{month}</dealMonth>\
                   <dealDay>{day}</dealDay>\
                   <excluUseAr>84.43</excluUseAr>\
                   <floor>9</floor>\
                   <buildYear>1979</buildYear>\
                   <umdNm>대치동</umdNm>\
                   <sggCd>11680</sggCd>\
                 </item>"
            )
        })
        .collect();
    format!(
        "<response><header><resultCode>000</resultCode></header>\
         <body><items>{items}</items></body></response>"
    )
}

#[tokio::test]
async fn ingest_to_monthly_stats_round_trip() {
    let pool = test_pool().await;

    // 202401..202403, one trade per month at 100/110/120.
    let xml = response_xml(&[(2024, 1, 5, 100), (2024, 2, 12, 110), (2024, 3, 20, 120)]);
    let trades = parse_response(&xml, "11680");
    assert_eq!(trades.len(), 3);

    // Ingest twice; the second pass must be a no-op end to end.
    db::upsert_trades(&pool, &trades).await.unwrap();
    let second = db::upsert_trades(&pool, &trades).await.unwrap();
    assert_eq!(second, 0);

    let anchor = MonthAnchor { year: 2024, month: 1 };
    let rows = db::district_rollups(&pool, &["11680".to_string()], anchor.year)
        .await
        .unwrap();
    let stats = combine_monthly(&rows, anchor);

    let expected: Vec<(&str, i64, i64, Option<f64>)> = vec![
        ("202401", 100, 1, None),
        ("202402", 110, 1, Some(10.0)),
        ("202403", 120, 1, Some(9.1)),
    ];
    let got: Vec<(&str, i64, i64, Option<f64>)> = stats
        .iter()
        .map(|s| (s.month.as_str(), s.avg_price, s.count, s.change_rate))
        .collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn consolidated_district_combines_raw_codes() {
    let pool = test_pool().await;

    // Two Bucheon sub-districts landing in the same month.
    let a = parse_response(&response_xml(&[(2024, 5, 1, 100), (2024, 5, 2, 100)]), "x")
        .into_iter()
        .map(|mut t| {
            t.district_code = "41192".to_string();
            t.apt_name = "중동센트럴".to_string();
            t
        })
        .collect::<Vec<_>>();
    let b = parse_response(&response_xml(&[(2024, 5, 3, 200)]), "x")
        .into_iter()
        .map(|mut t| {
            t.district_code = "41194".to_string();
            t.apt_name = "소사역푸르지오".to_string();
            t
        })
        .collect::<Vec<_>>();

    db::upsert_trades(&pool, &a).await.unwrap();
    db::upsert_trades(&pool, &b).await.unwrap();

    let anchor = MonthAnchor { year: 2024, month: 1 };
    let codes = apt_deal_scanner::regions::expand_code("41190");
    let rows = db::district_rollups(&pool, &codes, anchor.year).await.unwrap();
    assert_eq!(rows.len(), 2);

    let stats = combine_monthly(&rows, anchor);
    assert_eq!(stats.len(), 1);
    // Count-weighted: round((100*2 + 200*1) / 3) = 133.
    assert_eq!(stats[0].avg_price, 133);
    assert_eq!(stats[0].count, 3);
    assert_eq!(stats[0].max_price, 200);
    assert_eq!(stats[0].min_price, 100);
}
