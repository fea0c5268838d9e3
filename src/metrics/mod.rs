pub mod growth;
pub mod types;

pub use growth::{growth, GrowthType, Precision};
pub use types::*;

use rusqlite::Connection;

use crate::error::{Error, Result};
use crate::metrics::growth::round_to;
use crate::query::builder::{FactQuery, FactTable};
use crate::query::period::Window;

/// Evaluate one metric over a window.
///
/// Range metrics take `AllTime` or `Range`; `ActiveTrainings` takes `At`.
/// `WebinarParticipants` and `AverageRating` ignore the window.
pub fn evaluate(conn: &Connection, metric: Metric, window: &Window) -> Result<MetricValue> {
    let value = match metric {
        Metric::TotalTrainings => {
            range_only(metric, window)?;
            let n = FactQuery::new(FactTable::Trainings)
                .within("created_at", window)
                .count(conn)?;
            MetricValue::Count(n)
        }
        Metric::ActiveTrainings => {
            let Window::At(at) = *window else {
                return Err(invalid(metric, window));
            };
            let n = FactQuery::new(FactTable::Trainings)
                .within("start_date", &Window::At(at))
                .null_or_on_or_after("end_date", at)
                .count(conn)?;
            MetricValue::Count(n)
        }
        Metric::TrainingParticipants => {
            range_only(metric, window)?;
            let n = FactQuery::new(FactTable::TrainingRegistrations)
                .within("created_at", window)
                .count(conn)?;
            MetricValue::Count(n)
        }
        Metric::AverageCompletion => {
            range_only(metric, window)?;
            let scoped = FactQuery::new(FactTable::TrainingProgress).within("updated_at", window);
            let total = scoped.count(conn)?;
            let completed = scoped.eq("status", "completed").count(conn)?;
            MetricValue::Ratio(completion_percentage(completed, total))
        }
        Metric::TotalWebinars => {
            range_only(metric, window)?;
            let n = FactQuery::new(FactTable::Meetings)
                .within("created_at", window)
                .count(conn)?;
            MetricValue::Count(n)
        }
        Metric::HeldWebinars => {
            range_only(metric, window)?;
            let n = FactQuery::new(FactTable::Meetings)
                .eq("status", "ended")
                .within("start_time", window)
                .count(conn)?;
            MetricValue::Count(n)
        }
        Metric::WebinarParticipants => {
            let n = FactQuery::new(FactTable::MeetingRegistrations)
                .count_distinct(conn, "user_id")?;
            MetricValue::Count(n)
        }
        Metric::WebinarRegistrations => {
            range_only(metric, window)?;
            let n = FactQuery::new(FactTable::MeetingRegistrations)
                .within("registered_at", window)
                .count(conn)?;
            MetricValue::Count(n)
        }
        Metric::AverageRating => MetricValue::Ratio(AVERAGE_RATING),
    };
    log::trace!("{metric} over {window} = {value:?}");
    Ok(value)
}

/// `completed / total * 100` to two decimals; `0` for an empty window.
pub fn completion_percentage(completed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(completed as f64 / total as f64 * 100.0, 2)
}

fn range_only(metric: Metric, window: &Window) -> Result<()> {
    match window {
        Window::At(_) => Err(invalid(metric, window)),
        _ => Ok(()),
    }
}

fn invalid(metric: Metric, window: &Window) -> Error {
    Error::InvalidWindow {
        metric: metric.name().to_string(),
        window: window.to_string(),
    }
}
