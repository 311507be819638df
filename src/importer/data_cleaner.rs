// ==========================================
// 销售数据仓库 ETL - 数据清洗器实现
// ==========================================
// 职责: 字段级标准化
//   文本: TRIM + UPPER, 空 → NULL
//   键值: TRIM, 空 → NULL（保留前导零与大小写）
//   数值: 逗号小数点 / 去空格, 解析失败 → 0
//   日期: 多格式尝试, 解析失败 → NULL
// 红线: 字段级缺陷永不报错
// ==========================================

use crate::domain::types::{format_number, CellValue};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// 不带日序歧义的格式
const UNAMBIGUOUS_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const UNAMBIGUOUS_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

const DAY_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

const MONTH_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m-%d-%Y %H:%M:%S",
];

const MONTH_FIRST_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%m-%d-%Y", "%m.%d.%Y"];

#[derive(Debug, Clone, Copy)]
pub struct DataCleaner {
    day_first: bool,
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self { day_first: true }
    }
}

impl DataCleaner {
    pub fn new(day_first: bool) -> Self {
        Self { day_first }
    }

    /// 单元格的文本形式（未修剪）; 空单元格为 None
    fn raw_text(value: &CellValue) -> Option<String> {
        match value {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            CellValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// 文本标准化: TRIM + UPPER; 空/缺失 → None
    pub fn clean_text(&self, value: &CellValue) -> Option<String> {
        Self::raw_text(value)
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
    }

    /// 键值标准化: 仅 TRIM; 空/缺失 → None
    pub fn clean_key(&self, value: &CellValue) -> Option<String> {
        Self::raw_text(value)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// 数值标准化; 缺失/空/无法解析/非有限值 → 0
    pub fn clean_number(&self, value: &CellValue) -> f64 {
        let parsed = match value {
            CellValue::Number(n) => *n,
            CellValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            CellValue::Text(s) => {
                let normalized: String = s.replace(',', ".").chars().filter(|c| *c != ' ').collect();
                normalized.trim().parse::<f64>().unwrap_or(0.0)
            }
            CellValue::Empty | CellValue::DateTime(_) => 0.0,
        };

        if parsed.is_finite() {
            parsed
        } else {
            0.0
        }
    }

    /// 日期标准化; 缺失/无法解析 → None
    pub fn clean_date(&self, value: &CellValue) -> Option<NaiveDateTime> {
        match value {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Number(n) => excel_serial_to_datetime(*n),
            CellValue::Text(s) => self.parse_date_text(s.trim()),
            CellValue::Empty | CellValue::Bool(_) => None,
        }
    }

    fn parse_date_text(&self, text: &str) -> Option<NaiveDateTime> {
        if text.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.naive_local());
        }

        let (datetime_formats, date_formats) = if self.day_first {
            (DAY_FIRST_DATETIME_FORMATS, DAY_FIRST_DATE_FORMATS)
        } else {
            (MONTH_FIRST_DATETIME_FORMATS, MONTH_FIRST_DATE_FORMATS)
        };

        UNAMBIGUOUS_DATETIME_FORMATS
            .iter()
            .chain(datetime_formats.iter())
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .or_else(|| {
                UNAMBIGUOUS_DATE_FORMATS
                    .iter()
                    .chain(date_formats.iter())
                    .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }
}

/// Excel 序列日期（1900 日期系统）→ NaiveDateTime
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial <= 0.0 || serial > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_clean_text_basic() {
        let cleaner = DataCleaner::default();
        assert_eq!(cleaner.clean_text(&text("  ana  ")), Some("ANA".to_string()));
        assert_eq!(cleaner.clean_text(&text("   ")), None);
        assert_eq!(cleaner.clean_text(&CellValue::Empty), None);
        assert_eq!(cleaner.clean_text(&CellValue::Number(12.0)), Some("12".to_string()));
    }

    #[test]
    fn test_clean_key_keeps_case_and_zeros() {
        let cleaner = DataCleaner::default();
        assert_eq!(cleaner.clean_key(&text(" 00123ab ")), Some("00123ab".to_string()));
        assert_eq!(
            cleaner.clean_key(&CellValue::Number(45678912.0)),
            Some("45678912".to_string())
        );
        assert_eq!(cleaner.clean_key(&text("")), None);
    }

    #[test]
    fn test_clean_number() {
        let cleaner = DataCleaner::default();
        assert_eq!(cleaner.clean_number(&text("2,5")), 2.5);
        assert_eq!(cleaner.clean_number(&text(" 1 250,75 ")), 1250.75);
        assert_eq!(cleaner.clean_number(&CellValue::Number(3.0)), 3.0);
        assert_eq!(cleaner.clean_number(&CellValue::Bool(true)), 1.0);
        assert_eq!(cleaner.clean_number(&text("abc")), 0.0);
        assert_eq!(cleaner.clean_number(&text("")), 0.0);
        assert_eq!(cleaner.clean_number(&CellValue::Empty), 0.0);
        assert_eq!(cleaner.clean_number(&text("inf")), 0.0);
    }

    #[test]
    fn test_clean_date_formats() {
        let cleaner = DataCleaner::default();
        assert_eq!(cleaner.clean_date(&text("2024-03-05")), Some(date(2024, 3, 5)));
        assert_eq!(cleaner.clean_date(&text("20240305")), Some(date(2024, 3, 5)));
        assert_eq!(cleaner.clean_date(&text("05/03/2024")), Some(date(2024, 3, 5)));
        assert_eq!(
            cleaner.clean_date(&text("2024-03-05 14:30:00")),
            date(2024, 3, 5).checked_add_signed(Duration::minutes(14 * 60 + 30))
        );
        assert_eq!(cleaner.clean_date(&text("ayer")), None);
        assert_eq!(cleaner.clean_date(&CellValue::Empty), None);
    }

    #[test]
    fn test_clean_date_month_first() {
        let cleaner = DataCleaner::new(false);
        assert_eq!(cleaner.clean_date(&text("05/03/2024")), Some(date(2024, 5, 3)));
    }

    #[test]
    fn test_clean_date_excel_serial() {
        let cleaner = DataCleaner::default();
        assert_eq!(cleaner.clean_date(&CellValue::Number(45356.0)), Some(date(2024, 3, 5)));
        assert_eq!(cleaner.clean_date(&CellValue::Number(-1.0)), None);
    }
}
