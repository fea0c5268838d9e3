use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};

use crate::date_util::{month_key, month_start, next_month, previous_month, to_sql};

/// The time span a metric is evaluated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Every row, regardless of timestamp.
    AllTime,
    /// Half-open `[start, end)`; `end: None` leaves the range open-ended.
    Range {
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
    },
    /// A single instant, for point-in-time checks.
    At(NaiveDateTime),
}

impl Window {
    pub fn range(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Window::Range {
            start,
            end: Some(end),
        }
    }

    pub fn since(start: NaiveDateTime) -> Self {
        Window::Range { start, end: None }
    }

    /// The whole calendar month `[first instant, first instant of next month)`.
    ///
    /// Returns `AllTime` only for an impossible month number.
    pub fn month(year: i32, month: u32) -> Self {
        let (ny, nm) = next_month(year, month);
        match (month_start(year, month), month_start(ny, nm)) {
            (Some(start), Some(end)) => Window::range(start, end),
            _ => Window::AllTime,
        }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Window::AllTime => write!(f, "all-time"),
            Window::Range { start, end: Some(end) } => {
                write!(f, "[{}, {})", to_sql(*start), to_sql(*end))
            }
            Window::Range { start, end: None } => write!(f, "[{}, ..)", to_sql(*start)),
            Window::At(t) => write!(f, "@{}", to_sql(*t)),
        }
    }
}

/// Current-month and previous-month boundaries relative to a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindows {
    pub now: NaiveDateTime,
    pub current_month_start: NaiveDateTime,
    pub previous_month_start: NaiveDateTime,
    /// Last second of the previous month.
    pub previous_month_end: NaiveDateTime,
}

impl MonthWindows {
    /// Resolve the month boundaries around `now`.
    pub fn resolve(now: NaiveDateTime) -> Self {
        let current_month_start = now
            .date()
            .with_day(1)
            .unwrap_or(now.date())
            .and_time(NaiveTime::MIN);
        let (py, pm) = previous_month(now.year(), now.month());
        let previous_month_start = month_start(py, pm).unwrap_or(current_month_start);
        let previous_month_end = current_month_start - Duration::seconds(1);
        Self {
            now,
            current_month_start,
            previous_month_start,
            previous_month_end,
        }
    }

    /// `[previous_month_start, current_month_start)`
    pub fn previous_month(&self) -> Window {
        Window::range(self.previous_month_start, self.current_month_start)
    }

    /// `[current_month_start, ..)`
    pub fn current_month_to_date(&self) -> Window {
        Window::since(self.current_month_start)
    }

    /// The full calendar month containing `now`.
    pub fn current_calendar_month(&self) -> Window {
        Window::month(self.now.year(), self.now.month())
    }

    /// The full calendar month before `now`'s month.
    pub fn previous_calendar_month(&self) -> Window {
        Window::month(
            self.previous_month_start.year(),
            self.previous_month_start.month(),
        )
    }

    pub fn current_month_key(&self) -> String {
        month_key(self.current_month_start.year(), self.current_month_start.month())
    }

    pub fn previous_month_key(&self) -> String {
        month_key(self.previous_month_start.year(), self.previous_month_start.month())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_util::parse_timestamp;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn test_resolve_january_rolls_back_to_december() {
        let w = MonthWindows::resolve(ts("2024-01-15"));
        assert_eq!(w.current_month_start, ts("2024-01-01 00:00:00"));
        assert_eq!(w.previous_month_start, ts("2023-12-01 00:00:00"));
        assert_eq!(w.previous_month_end, ts("2023-12-31 23:59:59"));
        assert_eq!(w.current_month_key(), "2024-01");
        assert_eq!(w.previous_month_key(), "2023-12");
    }

    #[test]
    fn test_resolve_mid_year() {
        let w = MonthWindows::resolve(ts("2025-03-31 18:22:05"));
        assert_eq!(w.current_month_start, ts("2025-03-01"));
        assert_eq!(w.previous_month_start, ts("2025-02-01"));
        assert_eq!(w.previous_month_end, ts("2025-02-28 23:59:59"));
    }

    #[test]
    fn test_resolve_on_first_instant_of_month() {
        let w = MonthWindows::resolve(ts("2024-03-01 00:00:00"));
        assert_eq!(w.current_month_start, ts("2024-03-01"));
        assert_eq!(w.previous_month_end, ts("2024-02-29 23:59:59"));
    }

    #[test]
    fn test_calendar_month_windows() {
        let w = MonthWindows::resolve(ts("2023-12-10"));
        assert_eq!(
            w.current_calendar_month(),
            Window::range(ts("2023-12-01"), ts("2024-01-01"))
        );
        assert_eq!(
            w.previous_calendar_month(),
            Window::range(ts("2023-11-01"), ts("2023-12-01"))
        );
        assert_eq!(w.previous_month(), w.previous_calendar_month());
        assert_eq!(w.current_month_to_date(), Window::since(ts("2023-12-01")));
    }

    #[test]
    fn test_window_month() {
        assert_eq!(
            Window::month(2024, 2),
            Window::range(ts("2024-02-01"), ts("2024-03-01"))
        );
        assert_eq!(Window::month(2024, 12).to_string(), "[2024-12-01 00:00:00, 2025-01-01 00:00:00)");
        assert_eq!(Window::month(2024, 13), Window::AllTime);
    }

    #[test]
    fn test_window_display() {
        assert_eq!(Window::AllTime.to_string(), "all-time");
        assert_eq!(
            Window::At(ts("2024-01-15")).to_string(),
            "@2024-01-15 00:00:00"
        );
    }
}
