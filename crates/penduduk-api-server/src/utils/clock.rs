//! Local-time formatting used across records, file names and footers.

use chrono::{Local, NaiveDate};

/// `YYYY-MM-DD HH:MM:SS`, the format of every stored timestamp.
pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `YYYYmmdd_HHMMSS` for generated file names.
pub fn file_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// `dd-mm-YYYY HH:MM` for printed footers.
pub fn footer_stamp() -> String {
    Local::now().format("%d-%m-%Y %H:%M").to_string()
}

/// Parse `YYYY-MM-DD - YYYY-MM-DD`. Anything else yields `None`.
pub fn parse_date_range(raw: &str) -> Option<(String, String)> {
    let (start, end) = raw.split_once(" - ")?;
    let start = NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d").ok()?;
    let end = NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d").ok()?;
    Some((
        start.format("%Y-%m-%d").to_string(),
        end.format("%Y-%m-%d").to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_range() {
        assert_eq!(
            parse_date_range("2025-01-01 - 2025-01-31"),
            Some(("2025-01-01".to_string(), "2025-01-31".to_string()))
        );
        assert_eq!(parse_date_range("2025-01-01"), None);
        assert_eq!(parse_date_range("2025-13-01 - 2025-01-31"), None);
        assert_eq!(parse_date_range("kemarin - hari ini"), None);
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = now_timestamp();
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(file_stamp().len(), 15);
    }
}
