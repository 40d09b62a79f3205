//! Time utilities: unix timestamps and UTC day boundaries.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Convert unix seconds into a UTC timestamp.
/// Out-of-range values collapse to the unix epoch.
pub fn from_unix(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// Whole unix seconds of a timestamp (sub-second part dropped).
pub fn to_unix(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}

/// Calendar day (UTC) of a unix timestamp.
pub fn utc_date(secs: i64) -> NaiveDate {
    from_unix(secs).date_naive()
}

/// 00:00:00.000 UTC of a calendar day.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// 00:00:00.000 UTC of the day containing `dt`.
pub fn start_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    day_start(dt.date_naive())
}

/// 23:59:59.999 UTC of the day containing `dt`.
pub fn end_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(dt) + Duration::days(1) - Duration::milliseconds(1)
}
