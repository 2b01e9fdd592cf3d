//! Wikibase time literals to display dates.
//!
//! Wikibase encodes precision by zeroing components: `+2020-05-00T00:00:00Z`
//! is "May 2020", `+2020-00-00T00:00:00Z` is "2020". The highest precision
//! that parses wins.

use chrono::{NaiveDate, NaiveDateTime};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatePrecision {
    Day,
    Month,
    Year,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedDate {
    pub display: String,
    pub precision: DatePrecision,
}

const MONTH_SUFFIX: &str = "-00T00:00:00Z";
const YEAR_SUFFIX: &str = "-00-00T00:00:00Z";

/// Normalizes a signed time literal. Returns `None` when it is empty or
/// matches none of the day, month and year shapes.
pub fn normalize(raw: &str) -> Option<NormalizedDate> {
    let body = raw.strip_prefix('+')?;
    if !has_four_digit_year(body) {
        return None;
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%SZ") {
        return Some(NormalizedDate {
            display: dt.format("%Y-%m-%d").to_string(),
            precision: DatePrecision::Day,
        });
    }

    if let Some(year_month) = body.strip_suffix(MONTH_SUFFIX) {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", year_month), "%Y-%m-%d") {
            return Some(NormalizedDate {
                display: date.format("%B %Y").to_string(),
                precision: DatePrecision::Month,
            });
        }
    }

    let year = body.strip_suffix(YEAR_SUFFIX)?;
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, 1, 1)?;
    Some(NormalizedDate {
        display: date.format("%Y").to_string(),
        precision: DatePrecision::Year,
    })
}

/// Display string only, for callers that don't care about precision.
pub fn normalize_display(raw: &str) -> Option<String> {
    normalize(raw).map(|d| d.display)
}

fn has_four_digit_year(body: &str) -> bool {
    let bytes = body.as_bytes();
    bytes.len() > 4 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_precision() {
        let d = normalize("+2020-01-02T00:00:00Z").unwrap();
        assert_eq!(d.display, "2020-01-02");
        assert_eq!(d.precision, DatePrecision::Day);
    }

    #[test]
    fn month_precision() {
        let d = normalize("+2019-07-00T00:00:00Z").unwrap();
        assert_eq!(d.display, "July 2019");
        assert_eq!(d.precision, DatePrecision::Month);
    }

    #[test]
    fn year_precision() {
        let d = normalize("+1998-00-00T00:00:00Z").unwrap();
        assert_eq!(d.display, "1998");
        assert_eq!(d.precision, DatePrecision::Year);
    }

    #[test]
    fn empty_and_unsigned_are_unparseable() {
        assert!(normalize("").is_none());
        assert!(normalize("2020-01-02T00:00:00Z").is_none());
        assert!(normalize("+").is_none());
    }

    #[test]
    fn invalid_components_are_unparseable() {
        assert!(normalize("+2020-13-00T00:00:00Z").is_none());
        assert!(normalize("+2020-00-15T00:00:00Z").is_none());
        assert!(normalize("+2020-02-30T00:00:00Z").is_none());
        assert!(normalize("+20200-01-01T00:00:00Z").is_none());
        assert!(normalize("-0500-00-00T00:00:00Z").is_none());
        assert!(normalize("+2020-01-01").is_none());
    }
}
