//! Decimal-text conversions shared by the codec and the handshake.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const DATETIME_FORMAT: &str = "%Y%m%d %H:%M:%S";

pub(crate) fn format_datetime(t: &DateTime<Utc>) -> String {
    t.format(DATETIME_FORMAT).to_string()
}

/// Parse `yyyyMMdd HH:mm:ss [zone]`.
///
/// The gateway sometimes pads the separator with two spaces and appends
/// its local zone name; the zone is not resolved and the timestamp is
/// taken as UTC.
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let mut parts = s.split_whitespace();
    let date = parts.next()?;
    let time = parts.next()?;
    let naive = NaiveDateTime::parse_from_str(&format!("{date} {time}"), DATETIME_FORMAT).ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

pub(crate) fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
    let secs = s.parse::<i64>().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}
