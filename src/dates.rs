use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use tracing::warn;

/// Parses a timestamp as written by the store. Accepts RFC 3339, naive
/// date-times (taken as UTC) and bare dates (UTC midnight).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Reads a stored `recorded_at` value. Anything that is not a parseable
/// timestamp string yields `None`.
pub fn read_timestamp(value: &serde_json::Value) -> Option<DateTime<FixedOffset>> {
    let parsed = value.as_str().and_then(parse_timestamp);
    if parsed.is_none() && !value.is_null() {
        warn!("unreadable timestamp {value}, treating as now");
    }
    parsed
}

/// The instant an observation counts at: its own timestamp, or `now` when
/// it has none.
pub fn effective_instant(
    recorded_at: Option<&DateTime<FixedOffset>>,
    now: &DateTime<FixedOffset>,
) -> DateTime<FixedOffset> {
    recorded_at.copied().unwrap_or(*now)
}

/// Calendar date of `instant` in the timezone carried by `now`.
pub fn calendar_date(instant: &DateTime<FixedOffset>, now: &DateTime<FixedOffset>) -> NaiveDate {
    instant.with_timezone(now.offset()).date_naive()
}
