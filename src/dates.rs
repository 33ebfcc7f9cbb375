//! Date and date-time parsing for the date fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// The format name selecting the built-in ISO 8601 parser.
pub const ISO_8601: &str = "iso-8601";

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const ISO_OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d"];

/// A parsed moment, remembering whether the input carried a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Stamp {
    pub fn date(self) -> NaiveDate {
        match self {
            Stamp::Date(d) => d,
            Stamp::DateTime(dt) => dt.date(),
        }
    }

    /// The moment as a date-time; bare dates land on midnight.
    pub fn datetime(self) -> NaiveDateTime {
        match self {
            Stamp::Date(d) => d.and_time(NaiveTime::MIN),
            Stamp::DateTime(dt) => dt,
        }
    }
}

/// Parses an ISO 8601 date or date-time. Date-times carrying an offset are
/// normalized to UTC.
pub fn parse_iso8601(value: &str) -> Option<Stamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(Stamp::DateTime(dt.naive_utc()));
    }
    for format in ISO_OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(Stamp::DateTime(dt.naive_utc()));
        }
    }
    for format in ISO_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Stamp::DateTime(dt));
        }
    }
    ISO_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .map(Stamp::Date)
}

/// Parses `value` with a `strftime`-style `format`, or with
/// [`parse_iso8601`](fn.parse_iso8601.html) when the format is
/// [`ISO_8601`](constant.ISO_8601.html).
pub fn parse(value: &str, format: &str) -> Option<Stamp> {
    if format.eq_ignore_ascii_case(ISO_8601) {
        return parse_iso8601(value);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
        return Some(Stamp::DateTime(dt));
    }
    NaiveDate::parse_from_str(value, format)
        .ok()
        .map(Stamp::Date)
}
