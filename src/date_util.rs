use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Error, Result};

/// Storage format for every timestamp column in the fact store.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get the last day of a given month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = next_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next_month, 1).map(|d| d - Duration::days(1))
}

/// The (year, month) immediately after the given one.
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// The (year, month) immediately before the given one.
pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Midnight on the first day of the month.
pub fn month_start(year: i32, month: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, 1).map(|d| d.and_time(NaiveTime::MIN))
}

/// `"YYYY-MM"` label for a month.
pub fn month_key(year: i32, month: u32) -> String {
    format!("{year}-{month:02}")
}

/// Step `n` calendar months back, clamping the day to the target month's length.
pub fn sub_months(ts: NaiveDateTime, n: u32) -> NaiveDateTime {
    let (mut year, mut month) = (ts.year(), ts.month());
    for _ in 0..n {
        (year, month) = previous_month(year, month);
    }
    let last = last_day_of_month(year, month).map(|d| d.day()).unwrap_or(28);
    NaiveDate::from_ymd_opt(year, month, ts.day().min(last))
        .map(|d| d.and_time(ts.time()))
        .unwrap_or(ts)
}

/// Format a timestamp the way the fact store keeps it.
pub fn to_sql(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        return Ok(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(ts);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| Error::TimestampParse(s.to_string()))
}

/// Serde adapter for timestamps in any format [`parse_timestamp`] accepts.
pub mod flexible {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_timestamp(&s).map_err(de::Error::custom)
    }

    /// Same, for nullable columns.
    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{de, Deserialize, Deserializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| super::super::parse_timestamp(&s).map_err(de::Error::custom))
                .transpose()
        }
    }
}
