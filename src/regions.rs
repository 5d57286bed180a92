//! Static district/metro tables and code reconciliation.
//!
//! The MOLIT feed keys rows by raw 법정동 시군구 codes; the API surface
//! exposes consolidated display codes (several raw sub-district codes fold
//! into one city entry). All tables here are process-wide constants, read
//! concurrently without synchronization.

/// Canonical (display) code → raw DB codes it consolidates.
/// Any code absent here maps to itself in both directions.
const DISTRICT_CODE_MAP: &[(&str, &[&str])] = &[
    ("41170", &["41171"]),                   // 안양시 만안구
    ("41190", &["41192", "41194", "41196"]), // 부천시 (원미/소사/오정구)
    ("41270", &["41271"]),                   // 안산시 상록구
    ("41280", &["41287"]),                   // 고양시 덕양구
    ("41460", &["41465"]),                   // 용인시 처인구
    ("41590", &["41591", "41593", "41595"]), // 화성시
];

/// Canonical → raw set. Identity singleton when unmapped.
pub fn expand_code(canonical: &str) -> Vec<String> {
    DISTRICT_CODE_MAP
        .iter()
        .find(|(c, _)| *c == canonical)
        .map(|(_, raws)| raws.iter().map(|r| r.to_string()).collect())
        .unwrap_or_else(|| vec![canonical.to_string()])
}

/// Raw → canonical. Identity when unmapped.
pub fn fold_code(raw: &str) -> &str {
    for (canonical, raws) in DISTRICT_CODE_MAP {
        if raws.contains(&raw) {
            return canonical;
        }
    }
    raw
}

/// All 111 canonical district codes tracked by the seeder.
pub const DISTRICTS: &[&str] = &[
    // 서울 25
    "11110", "11140", "11170", "11200", "11215", "11230", "11260", "11290", "11305", "11320",
    "11350", "11380", "11410", "11440", "11470", "11500", "11530", "11545", "11560", "11590",
    "11620", "11650", "11680", "11710", "11740",
    // 경기 38
    "41111", "41113", "41115", "41117", "41131", "41133", "41135", "41150", "41170", "41173",
    "41190", "41210", "41220", "41250", "41270", "41273", "41280", "41281", "41285", "41290",
    "41310", "41360", "41370", "41390", "41410", "41430", "41450", "41460", "41461", "41463",
    "41480", "41500", "41550", "41570", "41590", "41610", "41630", "41670",
    // 인천 8
    "28110", "28140", "28177", "28185", "28200", "28237", "28245", "28260",
    // 부산 16
    "26110", "26140", "26170", "26200", "26230", "26260", "26290", "26320", "26350", "26380",
    "26410", "26440", "26470", "26500", "26530", "26710",
    // 대구 8
    "27110", "27140", "27170", "27200", "27230", "27260", "27290", "27710",
    // 대전 5
    "30110", "30140", "30170", "30200", "30230",
    // 광주 5
    "29110", "29140", "29155", "29170", "29200",
    // 울산 5
    "31110", "31140", "31170", "31200", "31710",
    // 세종 1
    "36110",
];

const DISTRICT_NAMES: &[(&str, &str)] = &[
    ("11110", "종로구"), ("11140", "중구"), ("11170", "용산구"), ("11200", "성동구"),
    ("11215", "광진구"), ("11230", "동대문구"), ("11260", "중랑구"), ("11290", "성북구"),
    ("11305", "강북구"), ("11320", "도봉구"), ("11350", "노원구"), ("11380", "은평구"),
    ("11410", "서대문구"), ("11440", "마포구"), ("11470", "양천구"), ("11500", "강서구"),
    ("11530", "구로구"), ("11545", "금천구"), ("11560", "영등포구"), ("11590", "동작구"),
    ("11620", "관악구"), ("11650", "서초구"), ("11680", "강남구"), ("11710", "송파구"),
    ("11740", "강동구"),
    ("41111", "수원장안"), ("41113", "수원권선"), ("41115", "수원팔달"), ("41117", "수원영통"),
    ("41131", "성남수정"), ("41133", "성남중원"), ("41135", "성남분당"), ("41150", "의정부"),
    ("41170", "안양만안"), ("41173", "안양동안"), ("41190", "부천"), ("41210", "광명"),
    ("41220", "평택"), ("41250", "동두천"), ("41270", "안산상록"), ("41273", "안산단원"),
    ("41280", "고양덕양"), ("41281", "고양일산동"), ("41285", "고양일산서"), ("41290", "과천"),
    ("41310", "구리"), ("41360", "남양주"), ("41370", "오산"), ("41390", "시흥"),
    ("41410", "군포"), ("41430", "의왕"), ("41450", "하남"), ("41460", "용인처인"),
    ("41461", "용인기흥"), ("41463", "용인수지"), ("41480", "파주"), ("41500", "이천"),
    ("41550", "안성"), ("41570", "김포"), ("41590", "화성"), ("41610", "광주"),
    ("41630", "양주"), ("41670", "포천"),
    ("28110", "인천중구"), ("28140", "인천동구"), ("28177", "미추홀"), ("28185", "연수"),
    ("28200", "남동"), ("28237", "부평"), ("28245", "계양"), ("28260", "인천서구"),
    ("26110", "부산중구"), ("26140", "부산서구"), ("26170", "부산동구"), ("26200", "영도"),
    ("26230", "부산진"), ("26260", "동래"), ("26290", "부산남구"), ("26320", "부산북구"),
    ("26350", "해운대"), ("26380", "사하"), ("26410", "금정"), ("26440", "부산강서"),
    ("26470", "연제"), ("26500", "수영"), ("26530", "사상"), ("26710", "기장"),
    ("27110", "대구중구"), ("27140", "대구동구"), ("27170", "대구서구"), ("27200", "대구남구"),
    ("27230", "대구북구"), ("27260", "수성"), ("27290", "달서"), ("27710", "달성"),
    ("30110", "대전동구"), ("30140", "대전중구"), ("30170", "대전서구"), ("30200", "유성"),
    ("30230", "대덕"),
    ("29110", "광주동구"), ("29140", "광주서구"), ("29155", "광주남구"), ("29170", "광주북구"),
    ("29200", "광산"),
    ("31110", "울산중구"), ("31140", "울산남구"), ("31170", "울산동구"), ("31200", "울산북구"),
    ("31710", "울주"),
    ("36110", "세종"),
];

const SIDO_NAMES: &[(&str, &str)] = &[
    ("11", "서울"),
    ("26", "부산"),
    ("27", "대구"),
    ("28", "인천"),
    ("29", "광주"),
    ("30", "대전"),
    ("31", "울산"),
    ("36", "세종"),
    ("41", "경기"),
];

/// Short display name for a canonical district code. Falls back to the
/// code itself for districts outside the tracked set.
pub fn district_name(code: &str) -> &str {
    DISTRICT_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, n)| *n)
        .unwrap_or(code)
}

/// Metro (시/도) display name from its 2-digit prefix.
pub fn sido_name(sido: &str) -> &str {
    SIDO_NAMES
        .iter()
        .find(|(c, _)| *c == sido)
        .map(|(_, n)| *n)
        .unwrap_or(sido)
}

/// "경기 부천" style compound name for a canonical code.
pub fn full_district_name(code: &str) -> String {
    let sido = sido_name(&code[..2.min(code.len())]);
    format!("{} {}", sido, district_name(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_code_expands_to_full_raw_set() {
        assert_eq!(expand_code("41190"), vec!["41192", "41194", "41196"]);
        // The canonical code is not a member of its own raw set unless listed.
        assert!(!expand_code("41190").contains(&"41190".to_string()));
    }

    #[test]
    fn unmapped_code_expands_to_itself() {
        assert_eq!(expand_code("11680"), vec!["11680"]);
    }

    #[test]
    fn raw_code_folds_to_canonical() {
        assert_eq!(fold_code("41194"), "41190");
        assert_eq!(fold_code("41591"), "41590");
        assert_eq!(fold_code("41595"), "41590");
    }

    #[test]
    fn unmapped_raw_code_folds_to_itself() {
        assert_eq!(fold_code("11680"), "11680");
    }

    #[test]
    fn round_trip_over_mapping_table() {
        for (canonical, raws) in DISTRICT_CODE_MAP {
            for raw in *raws {
                assert_eq!(fold_code(raw), *canonical);
            }
            assert_eq!(expand_code(canonical), *raws);
        }
    }

    #[test]
    fn names_resolve() {
        assert_eq!(district_name("11680"), "강남구");
        assert_eq!(sido_name("41"), "경기");
        assert_eq!(full_district_name("41190"), "경기 부천");
        assert_eq!(district_name("99999"), "99999");
    }

    #[test]
    fn every_district_has_a_name() {
        for code in DISTRICTS {
            assert_ne!(district_name(code), *code, "missing name for {code}");
        }
    }
}
