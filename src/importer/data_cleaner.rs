// ==========================================
// 料箱仓储仿真系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / UPPER / NULL 标准化 / 时间戳与数量解析
// ==========================================

use crate::importer::importer_trait::DataCleaner as DataCleanerTrait;
use chrono::{NaiveDate, NaiveDateTime};

/// 支持的时间戳格式 (按顺序尝试)
const DATETIME_FORMATS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y"];

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str, uppercase: bool) -> String {
        let trimmed = value.trim();
        if uppercase {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        }
    }

    fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn parse_timestamp(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
            .or_else(|| {
                DATE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
    }

    fn parse_qty(&self, value: &str) -> Option<i64> {
        let qty = value.trim().parse::<f64>().ok()?;
        if !qty.is_finite() {
            return None;
        }
        let rounded = qty.round() as i64;
        (rounded > 0).then_some(rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("  ab-1 ", true), "AB-1");
        assert_eq!(cleaner.clean_text("  ab-1 ", false), "ab-1");
        assert_eq!(cleaner.normalize_null(Some("   ")), None);
        assert_eq!(cleaner.normalize_null(Some(" x ")), Some("x".to_string()));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let cleaner = DataCleaner;
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();

        assert_eq!(cleaner.parse_timestamp("2024-03-05 14:30:00"), Some(expected));
        assert_eq!(cleaner.parse_timestamp("2024-03-05T14:30:00"), Some(expected));
        assert_eq!(cleaner.parse_timestamp("2024-03-05 14:30"), Some(expected));
        assert_eq!(
            cleaner.parse_timestamp("2024-03-05"),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(cleaner.parse_timestamp("not a date"), None);
        assert_eq!(cleaner.parse_timestamp(""), None);
    }

    #[test]
    fn test_parse_qty() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_qty("3"), Some(3));
        assert_eq!(cleaner.parse_qty(" 2.6 "), Some(3));
        assert_eq!(cleaner.parse_qty("0"), None);
        assert_eq!(cleaner.parse_qty("-4"), None);
        assert_eq!(cleaner.parse_qty("x"), None);
    }
}
