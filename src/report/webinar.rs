use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::metrics::{evaluate, growth, Metric, MetricValue, Precision};
use crate::query::period::{MonthWindows, Window};
use crate::storage::Database;

/// One dashboard card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub value: MetricValue,
    pub growth: f64,
    pub icon: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebinarStats {
    pub total_webinars: StatCard,
    pub this_month_held: StatCard,
    pub total_participants: StatCard,
    pub average_rating: StatCard,
}

/// Compute the webinar cards as of `now`.
pub async fn compute_webinar_stats(db: &Database, now: NaiveDateTime) -> Result<WebinarStats> {
    db.reader()
        .call(move |conn| assemble(conn, &MonthWindows::resolve(now)))
        .await
        .map_err(Error::from_call)
}

pub(crate) fn assemble(conn: &Connection, w: &MonthWindows) -> Result<WebinarStats> {
    log::debug!(
        "Computing webinar stats for {} vs {}",
        w.current_month_key(),
        w.previous_month_key()
    );
    let this_month = w.current_calendar_month();

    Ok(WebinarStats {
        total_webinars: StatCard {
            value: evaluate(conn, Metric::TotalWebinars, &Window::AllTime)?,
            growth: monthly_growth(conn, Metric::TotalWebinars, w)?,
            icon: "video-camera",
            color: "blue",
        },
        this_month_held: StatCard {
            value: evaluate(conn, Metric::HeldWebinars, &this_month)?,
            growth: monthly_growth(conn, Metric::HeldWebinars, w)?,
            icon: "calendar",
            color: "green",
        },
        // Headline is distinct users overall; growth tracks monthly sign-ups.
        total_participants: StatCard {
            value: evaluate(conn, Metric::WebinarParticipants, &Window::AllTime)?,
            growth: monthly_growth(conn, Metric::WebinarRegistrations, w)?,
            icon: "users",
            color: "purple",
        },
        average_rating: StatCard {
            value: evaluate(conn, Metric::AverageRating, &Window::AllTime)?,
            growth: monthly_growth(conn, Metric::AverageRating, w)?,
            icon: "star",
            color: "orange",
        },
    })
}

/// Previous calendar month vs. the current one, to one decimal.
fn monthly_growth(conn: &Connection, metric: Metric, w: &MonthWindows) -> Result<f64> {
    let old = evaluate(conn, metric, &w.previous_calendar_month())?.as_f64();
    let new = evaluate(conn, metric, &w.current_calendar_month())?.as_f64();
    Ok(growth(old, new, Precision::Tenths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, ts};
    use serde_json::json;

    #[test]
    fn test_empty_store_is_all_zero() {
        let conn = testutil::conn();
        let stats = assemble(&conn, &MonthWindows::resolve(ts("2024-01-15"))).unwrap();
        assert_eq!(stats.total_webinars.value, MetricValue::Count(0));
        assert_eq!(stats.this_month_held.value, MetricValue::Count(0));
        assert_eq!(stats.total_participants.value, MetricValue::Count(0));
        for card in [
            &stats.total_webinars,
            &stats.this_month_held,
            &stats.total_participants,
            &stats.average_rating,
        ] {
            assert_eq!(card.growth, 0.0);
        }
        assert_eq!(stats.average_rating.value, MetricValue::Ratio(4.7));
    }

    #[test]
    fn test_cards() {
        let conn = testutil::conn();
        // December: 3 created, 1 held
        testutil::meeting(&conn, "2023-12-01", "ended", Some("2023-12-05 10:00:00"), None);
        testutil::meeting(&conn, "2023-12-02", "cancelled", Some("2023-12-06 10:00:00"), None);
        testutil::meeting(&conn, "2023-12-03", "scheduled", Some("2024-01-20 10:00:00"), None);
        // January: 1 created; 2 held (one created in December above is still scheduled)
        testutil::meeting(&conn, "2024-01-02", "ended", Some("2024-01-08 10:00:00"), None);
        testutil::meeting(&conn, "2023-11-20", "ended", Some("2024-01-09 10:00:00"), None);

        testutil::meeting_registration(&conn, 10, "2023-12-04");
        testutil::meeting_registration(&conn, 11, "2023-12-04");
        testutil::meeting_registration(&conn, 10, "2024-01-03");
        testutil::meeting_registration(&conn, 12, "2024-01-03");
        testutil::meeting_registration(&conn, 12, "2024-01-04");

        let stats = assemble(&conn, &MonthWindows::resolve(ts("2024-01-15"))).unwrap();

        assert_eq!(stats.total_webinars.value, MetricValue::Count(5));
        assert_eq!(stats.total_webinars.growth, -66.7);

        assert_eq!(stats.this_month_held.value, MetricValue::Count(2));
        assert_eq!(stats.this_month_held.growth, 100.0);

        assert_eq!(stats.total_participants.value, MetricValue::Count(3));
        assert_eq!(stats.total_participants.growth, 50.0);

        assert_eq!(stats.average_rating.growth, 0.0);
    }

    #[test]
    fn test_card_json() {
        let conn = testutil::conn();
        let stats = assemble(&conn, &MonthWindows::resolve(ts("2024-01-15"))).unwrap();
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            value["total_webinars"],
            json!({"value": 0, "growth": 0.0, "icon": "video-camera", "color": "blue"})
        );
        assert_eq!(
            value["average_rating"],
            json!({"value": 4.7, "growth": 0.0, "icon": "star", "color": "orange"})
        );
    }
}
