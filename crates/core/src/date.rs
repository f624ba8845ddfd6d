use chrono::{DateTime, NaiveDate};

// Two-digit-year forms come first: `%Y` would otherwise accept "24" as year 24.
const FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %y",
    "%d %b %Y",
    "%d-%b-%y",
    "%d-%b-%Y",
    "%d%b%y",
    "%d%b%Y",
    "%b %d, %Y",
    "%b %d %Y",
];

/// Best-effort parse of a date string as printed on a bank statement.
///
/// Numeric forms are read day-first. Returns `None` for anything that does not
/// match a known layout; callers treat that as "no date".
pub fn parse_statement_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, day)
    }

    #[test]
    fn iso_dates() {
        assert_eq!(parse_statement_date("2024-03-05"), d(2024, 3, 5));
        assert_eq!(parse_statement_date("2024-03-05T10:00:00Z"), d(2024, 3, 5));
    }

    #[test]
    fn numeric_dates_are_day_first() {
        assert_eq!(parse_statement_date("05/03/2024"), d(2024, 3, 5));
        assert_eq!(parse_statement_date("05-03-2024"), d(2024, 3, 5));
        assert_eq!(parse_statement_date("05/03/24"), d(2024, 3, 5));
    }

    #[test]
    fn month_name_dates() {
        assert_eq!(parse_statement_date("05 Mar 2024"), d(2024, 3, 5));
        assert_eq!(parse_statement_date("05-MAR-2024"), d(2024, 3, 5));
        assert_eq!(parse_statement_date("March 5, 2024"), d(2024, 3, 5));
        assert_eq!(parse_statement_date("Mar 5, 2024"), d(2024, 3, 5));
    }

    #[test]
    fn compact_month_name_dates() {
        assert_eq!(parse_statement_date("01JAN24"), d(2024, 1, 1));
        assert_eq!(parse_statement_date("01JAN2024"), d(2024, 1, 1));
        assert_eq!(parse_statement_date("15Feb2023"), d(2023, 2, 15));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_statement_date("  2024-01-31 "), d(2024, 1, 31));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_statement_date(""), None);
        assert_eq!(parse_statement_date("N/A"), None);
        assert_eq!(parse_statement_date("31/02/2024"), None);
        assert_eq!(parse_statement_date("Opening balance"), None);
    }
}
