//! Report assembly and rendering.
//!
//! Each report type decides on its own what happens when computing it fails:
//! the training report lets the error escape to the caller, while the webinar
//! reports turn it into a `{success: false, error, details}` body. The choice
//! lives in [`ReportPolicies`] and can be overridden through `app_config`.

pub mod analytics;
pub mod training;
pub mod webinar;

pub use analytics::WebinarAnalytics;
pub use training::TrainingStats;
pub use webinar::WebinarStats;

use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::storage::repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    TrainingStats,
    WebinarStats,
    WebinarAnalytics,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [
        ReportKind::TrainingStats,
        ReportKind::WebinarStats,
        ReportKind::WebinarAnalytics,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReportKind::TrainingStats => "training_stats",
            ReportKind::WebinarStats => "webinar_stats",
            ReportKind::WebinarAnalytics => "webinar_analytics",
        }
    }

    /// `app_config` key holding this report's error policy.
    pub fn policy_key(self) -> String {
        format!("policy.{}", self.name())
    }

    /// Whether a successful report is wrapped as `{success: true, data}`.
    pub fn enveloped(self) -> bool {
        !matches!(self, ReportKind::TrainingStats)
    }

    fn failure_message(self) -> &'static str {
        match self {
            ReportKind::TrainingStats => "Failed to fetch training statistics",
            ReportKind::WebinarStats => "Failed to fetch webinar statistics",
            ReportKind::WebinarAnalytics => "Failed to fetch analytics",
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What to do with a failure while computing a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Return the error to the caller.
    Propagate,
    /// Render a `{success: false, error, details}` body instead.
    StructuredError,
}

impl ErrorPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorPolicy::Propagate => "propagate",
            ErrorPolicy::StructuredError => "structured-error",
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "propagate" => Ok(ErrorPolicy::Propagate),
            "structured-error" | "structured_error" | "structured" => {
                Ok(ErrorPolicy::StructuredError)
            }
            other => Err(Error::Config(format!(
                "unknown error policy '{other}' (expected propagate or structured-error)"
            ))),
        }
    }
}

impl std::fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error policy per report type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPolicies {
    pub training_stats: ErrorPolicy,
    pub webinar_stats: ErrorPolicy,
    pub webinar_analytics: ErrorPolicy,
}

impl Default for ReportPolicies {
    fn default() -> Self {
        Self {
            training_stats: ErrorPolicy::Propagate,
            webinar_stats: ErrorPolicy::StructuredError,
            webinar_analytics: ErrorPolicy::StructuredError,
        }
    }
}

impl ReportPolicies {
    pub fn get(&self, kind: ReportKind) -> ErrorPolicy {
        match kind {
            ReportKind::TrainingStats => self.training_stats,
            ReportKind::WebinarStats => self.webinar_stats,
            ReportKind::WebinarAnalytics => self.webinar_analytics,
        }
    }

    pub fn set(&mut self, kind: ReportKind, policy: ErrorPolicy) {
        match kind {
            ReportKind::TrainingStats => self.training_stats = policy,
            ReportKind::WebinarStats => self.webinar_stats = policy,
            ReportKind::WebinarAnalytics => self.webinar_analytics = policy,
        }
    }

    /// Defaults overlaid with any `policy.*` keys in `app_config`.
    pub fn from_config(conn: &rusqlite::Connection) -> Result<Self> {
        let mut policies = Self::default();
        for kind in ReportKind::ALL {
            if let Some(value) = repository::get_config(conn, &kind.policy_key())? {
                policies.set(kind, value.parse()?);
            }
        }
        Ok(policies)
    }
}

#[derive(Debug, Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct Failure<'a> {
    success: bool,
    error: &'a str,
    details: String,
}

/// A report turned into its response body.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// `false` when the body is a structured failure.
    pub ok: bool,
    pub body: serde_json::Value,
}

/// Shape a report result into its JSON body, applying the error policy.
pub fn render<T: Serialize>(
    kind: ReportKind,
    policy: ErrorPolicy,
    result: Result<T>,
) -> Result<Rendered> {
    match result {
        Ok(report) => {
            let body = if kind.enveloped() {
                serde_json::to_value(Envelope {
                    success: true,
                    data: report,
                })?
            } else {
                serde_json::to_value(report)?
            };
            Ok(Rendered { ok: true, body })
        }
        Err(e) => match policy {
            ErrorPolicy::Propagate => Err(e),
            ErrorPolicy::StructuredError => {
                log::error!("{kind} failed: {e}");
                let body = serde_json::to_value(Failure {
                    success: false,
                    error: kind.failure_message(),
                    details: e.to_string(),
                })?;
                Ok(Rendered { ok: false, body })
            }
        },
    }
}
