use serde::Serialize;

/// Fixed webinar rating. There is no rating source behind it.
pub const AVERAGE_RATING: f64 = 4.7;

/// A named scalar derived from the fact streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Trainings created in the window.
    TotalTrainings,
    /// Trainings running at an instant.
    ActiveTrainings,
    /// Training registrations created in the window.
    TrainingParticipants,
    /// Share of progress rows updated in the window that are completed.
    AverageCompletion,
    /// Meetings created in the window.
    TotalWebinars,
    /// Ended meetings whose start time falls in the window.
    HeldWebinars,
    /// Distinct registered users across every meeting, ignoring the window.
    WebinarParticipants,
    /// Meeting registrations made in the window.
    WebinarRegistrations,
    AverageRating,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::TotalTrainings => "total_trainings",
            Metric::ActiveTrainings => "active_trainings",
            Metric::TrainingParticipants => "total_participants",
            Metric::AverageCompletion => "average_completion",
            Metric::TotalWebinars => "total_webinars",
            Metric::HeldWebinars => "this_month_held",
            Metric::WebinarParticipants => "total_webinar_participants",
            Metric::WebinarRegistrations => "webinar_registrations",
            Metric::AverageRating => "average_rating",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of evaluating a metric: a count or a percentage/score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Ratio(f64),
}

impl MetricValue {
    pub fn as_f64(self) -> f64 {
        match self {
            MetricValue::Count(n) => n as f64,
            MetricValue::Ratio(x) => x,
        }
    }

    /// The value as a whole count; ratios are rounded.
    pub fn as_count(self) -> u64 {
        match self {
            MetricValue::Count(n) => n,
            MetricValue::Ratio(x) => x.max(0.0).round() as u64,
        }
    }
}

impl Default for MetricValue {
    fn default() -> Self {
        MetricValue::Count(0)
    }
}
