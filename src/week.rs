//! Date parsing and ISO-week bucketing for analytics exports.
//!
//! X exports have used several date shapes over time (`"Thu, Feb 12, 2026"`,
//! `"Feb 12, 2026"`, plain ISO). Every upload must land in some week bucket,
//! so when nothing parses the caller gets a synthetic upload key instead of
//! a silent drop.

use chrono::{Datelike, NaiveDate, Utc};

use crate::csv::CsvRow;

/// Parse a date string from an analytics export.
///
/// Tries, in order: weekday-prefixed long form, long form, strict ISO, then
/// chrono's generic `NaiveDate` parse as a last resort. Surrounding quotes
/// are stripped first. Returns `None` when nothing matches.
#[must_use]
pub fn parse_export_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if cleaned.is_empty() {
        return None;
    }

    const FORMATS: &[&str] = &["%a, %b %d, %Y", "%b %d, %Y", "%Y-%m-%d"];
    for fmt in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, fmt) {
            return Some(date);
        }
    }
    cleaned.parse().ok()
}

/// ISO-8601 week key for a date, formatted `YYYY-W0N`.
///
/// Weeks are Thursday-anchored: the year a week belongs to is the year of
/// its Thursday, so late-December and early-January dates can bucket into
/// the neighboring year's first or last week.
#[must_use]
pub fn week_key(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

/// Week key for a whole upload: the first row whose `Date` column parses
/// wins. Falls back to a timestamp-derived key so no upload is ever lost.
#[must_use]
pub fn detect_week(rows: &[CsvRow]) -> String {
    for row in rows {
        let raw = row.get_any(&["Date", "date"]);
        if let Some(date) = parse_export_date(raw) {
            return week_key(date);
        }
    }
    format!("upload-{}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::parse_lines;

    #[test]
    fn test_weekday_prefixed_form() {
        let date = parse_export_date("Thu, Feb 12, 2026").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 2, 12).unwrap());
    }

    #[test]
    fn test_plain_long_form() {
        let date = parse_export_date("Feb 12, 2026").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 2, 12).unwrap());
    }

    #[test]
    fn test_iso_form() {
        let date = parse_export_date("2026-02-12").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 2, 12).unwrap());
    }

    #[test]
    fn test_quoted_input() {
        assert!(parse_export_date("\"Thu, Feb 12, 2026\"").is_some());
    }

    #[test]
    fn test_unparseable() {
        assert!(parse_export_date("not a date").is_none());
        assert!(parse_export_date("").is_none());
    }

    #[test]
    fn test_week_key_example() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 12).unwrap();
        assert_eq!(week_key(date), "2026-W07");
    }

    #[test]
    fn test_same_week_same_key() {
        // Mon 2026-02-09 through Sun 2026-02-15 are all ISO week 7
        for day in 9..=15 {
            let date = NaiveDate::from_ymd_opt(2026, 2, day).unwrap();
            assert_eq!(week_key(date), "2026-W07", "day {day}");
        }
        let next_monday = NaiveDate::from_ymd_opt(2026, 2, 16).unwrap();
        assert_eq!(week_key(next_monday), "2026-W08");
    }

    #[test]
    fn test_year_boundary_belongs_to_thursday_year() {
        // Jan 1, 2027 is a Friday; its week's Thursday is Dec 31, 2026.
        let date = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        assert_eq!(week_key(date), "2026-W53");
    }

    #[test]
    fn test_detect_week_first_parseable_wins() {
        let rows = parse_lines(
            "Date,Impressions\nbogus,10\n\"Thu, Feb 12, 2026\",20\n\"Feb 20, 2026\",30\n",
        );
        // "bogus,10" has 2 fields and stays; its date fails to parse
        assert_eq!(detect_week(&rows), "2026-W07");
    }

    #[test]
    fn test_detect_week_fallback() {
        let rows = parse_lines("Date,Impressions\nbogus,10\n");
        assert!(detect_week(&rows).starts_with("upload-"));
    }
}
