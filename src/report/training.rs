use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::metrics::{evaluate, growth, GrowthType, Metric, Precision};
use crate::query::period::{MonthWindows, Window};
use crate::storage::Database;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountStat {
    pub count: u64,
    pub growth: f64,
    pub growth_type: GrowthType,
}

impl CountStat {
    fn new(count: u64, growth: f64) -> Self {
        Self {
            count,
            growth,
            growth_type: GrowthType::of(growth),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentageStat {
    pub percentage: f64,
    pub growth: f64,
    pub growth_type: GrowthType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodLabels {
    pub current_month: String,
    pub last_month: String,
}

/// Training dashboard: headline counts with month-over-month growth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingStats {
    pub total_trainings: CountStat,
    pub active_trainings: CountStat,
    pub total_participants: CountStat,
    pub average_completion: PercentageStat,
    pub period: PeriodLabels,
}

/// Compute the training report as of `now`.
///
/// Any failing metric fails the whole report.
pub async fn compute_training_stats(db: &Database, now: NaiveDateTime) -> Result<TrainingStats> {
    db.reader()
        .call(move |conn| assemble(conn, &MonthWindows::resolve(now)))
        .await
        .map_err(Error::from_call)
}

/// Headlines are all-time. Growth compares the previous calendar month with
/// the current month to date, except active trainings, which compare the
/// previous month's last second with `now`.
pub(crate) fn assemble(conn: &Connection, w: &MonthWindows) -> Result<TrainingStats> {
    log::debug!(
        "Computing training stats for {} vs {}",
        w.current_month_key(),
        w.previous_month_key()
    );
    let previous = w.previous_month();
    let current = w.current_month_to_date();

    let total_trainings = CountStat::new(
        evaluate(conn, Metric::TotalTrainings, &Window::AllTime)?.as_count(),
        compare(conn, Metric::TotalTrainings, &previous, &current)?,
    );

    // Active at the last second of the previous month vs. active right now.
    let active_trainings = CountStat::new(
        evaluate(conn, Metric::ActiveTrainings, &Window::At(w.now))?.as_count(),
        compare(
            conn,
            Metric::ActiveTrainings,
            &Window::At(w.previous_month_end),
            &Window::At(w.now),
        )?,
    );

    let total_participants = CountStat::new(
        evaluate(conn, Metric::TrainingParticipants, &Window::AllTime)?.as_count(),
        compare(conn, Metric::TrainingParticipants, &previous, &current)?,
    );

    let completion_growth = compare(conn, Metric::AverageCompletion, &previous, &current)?;
    let average_completion = PercentageStat {
        percentage: evaluate(conn, Metric::AverageCompletion, &Window::AllTime)?.as_f64(),
        growth: completion_growth,
        growth_type: GrowthType::of(completion_growth),
    };

    Ok(TrainingStats {
        total_trainings,
        active_trainings,
        total_participants,
        average_completion,
        period: PeriodLabels {
            current_month: w.current_month_key(),
            last_month: w.previous_month_key(),
        },
    })
}

fn compare(conn: &Connection, metric: Metric, previous: &Window, current: &Window) -> Result<f64> {
    let old = evaluate(conn, metric, previous)?.as_f64();
    let new = evaluate(conn, metric, current)?.as_f64();
    Ok(growth(old, new, Precision::Hundredths))
}
