pub mod clock;
pub mod date_util;
pub mod error;
pub mod metrics;
pub mod query;
pub mod report;
pub mod server;
pub mod storage;

#[cfg(test)]
pub(crate) mod testutil;

use std::sync::Arc;

use chrono::NaiveDateTime;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use metrics::{growth, GrowthType, Metric, MetricValue, Precision, AVERAGE_RATING};
pub use query::builder::{FactQuery, FactTable};
pub use query::period::{MonthWindows, Window};
pub use report::{
    ErrorPolicy, Rendered, ReportKind, ReportPolicies, TrainingStats, WebinarAnalytics,
    WebinarStats,
};
pub use storage::repository::FactFixture;
pub use storage::Database;

use storage::repository;

/// Main entry point: the statistics engine over a fact store.
#[derive(Clone)]
pub struct PortalStats {
    db: Database,
    clock: Arc<dyn Clock>,
    policies: ReportPolicies,
}

impl PortalStats {
    /// Engine on the system clock with the default error policies.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            clock: Arc::new(SystemClock),
            policies: ReportPolicies::default(),
        }
    }

    /// Engine with error policies read from `app_config`.
    pub async fn from_config(db: Database) -> Result<Self> {
        let policies = db
            .reader()
            .call(|conn| ReportPolicies::from_config(conn))
            .await
            .map_err(Error::from_call)?;
        Ok(Self::new(db).with_policies(policies))
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_policies(mut self, policies: ReportPolicies) -> Self {
        self.policies = policies;
        self
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn policies(&self) -> &ReportPolicies {
        &self.policies
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    // ── Reports ────────────────────────────────────────────────────

    pub async fn training_stats(&self) -> Result<TrainingStats> {
        report::training::compute_training_stats(&self.db, self.now()).await
    }

    pub async fn webinar_stats(&self) -> Result<WebinarStats> {
        report::webinar::compute_webinar_stats(&self.db, self.now()).await
    }

    pub async fn webinar_analytics(&self) -> Result<WebinarAnalytics> {
        report::analytics::compute_webinar_analytics(&self.db, self.now()).await
    }

    /// Compute a report and shape it into its response body under the
    /// report's error policy. `Err` only when the policy is `Propagate`.
    pub async fn render(&self, kind: ReportKind) -> Result<Rendered> {
        let policy = self.policies.get(kind);
        match kind {
            ReportKind::TrainingStats => report::render(kind, policy, self.training_stats().await),
            ReportKind::WebinarStats => report::render(kind, policy, self.webinar_stats().await),
            ReportKind::WebinarAnalytics => {
                report::render(kind, policy, self.webinar_analytics().await)
            }
        }
    }

    // ── Store ──────────────────────────────────────────────────────

    /// Row counts per fact table.
    pub async fn status(&self) -> Result<Vec<(FactTable, u64)>> {
        let mut counts = Vec::new();
        for table in FactTable::ALL {
            counts.push((table, FactQuery::new(table).count_in(&self.db).await?));
        }
        Ok(counts)
    }

    /// Insert fixture facts, standing in for the platform's write paths.
    pub async fn load_fixture(&self, fixture: FactFixture) -> Result<usize> {
        if fixture.is_empty() {
            log::warn!("Fixture contains no facts");
            return Ok(0);
        }
        let n = self
            .db
            .writer()
            .call(move |conn| repository::load_fixture(conn, &fixture))
            .await?;
        log::info!("Loaded {n} facts");
        Ok(n)
    }

    // ── Config ─────────────────────────────────────────────────────

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        self.db
            .reader()
            .call({
                let key = key.to_string();
                move |conn| repository::get_config(conn, &key)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Store a config value. `policy.*` keys are validated first.
    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        if key.starts_with("policy.") {
            if !ReportKind::ALL.iter().any(|k| k.policy_key() == key) {
                return Err(Error::Config(format!("unknown report in key '{key}'")));
            }
            value.parse::<ErrorPolicy>()?;
        }
        self.db
            .writer()
            .call({
                let key = key.to_string();
                let value = value.to_string();
                move |conn| repository::set_config(conn, &key, &value)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        self.db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ts;
    use serde_json::json;

    async fn engine_at(now: &str) -> PortalStats {
        let db = Database::open_memory().await.unwrap();
        PortalStats::new(db).with_clock(FixedClock(ts(now)))
    }

    #[tokio::test]
    async fn test_webinar_stats_on_empty_store_succeed() {
        let engine = engine_at("2024-01-15").await;
        let rendered = engine.render(ReportKind::WebinarStats).await.unwrap();
        assert!(rendered.ok);
        assert_eq!(rendered.body["success"], json!(true));
        for card in ["total_webinars", "this_month_held", "total_participants"] {
            assert_eq!(rendered.body["data"][card]["value"], json!(0));
            assert_eq!(rendered.body["data"][card]["growth"], json!(0.0));
        }
    }

    #[tokio::test]
    async fn test_failure_policies_by_report() {
        let engine = engine_at("2024-01-15").await;
        engine
            .db()
            .writer()
            .call(|conn| conn.execute_batch("DROP TABLE meetings; DROP TABLE trainings;"))
            .await
            .unwrap();

        let webinar = engine.render(ReportKind::WebinarStats).await.unwrap();
        assert!(!webinar.ok);
        assert_eq!(webinar.body["success"], json!(false));
        assert_eq!(webinar.body["error"], json!("Failed to fetch webinar statistics"));
        assert!(webinar.body["details"].as_str().unwrap().contains("meetings"));

        let analytics = engine.render(ReportKind::WebinarAnalytics).await.unwrap();
        assert_eq!(analytics.body["error"], json!("Failed to fetch analytics"));

        assert!(engine.render(ReportKind::TrainingStats).await.is_err());

        let mut policies = ReportPolicies::default();
        policies.set(ReportKind::TrainingStats, ErrorPolicy::StructuredError);
        policies.set(ReportKind::WebinarStats, ErrorPolicy::Propagate);
        let engine = engine.with_policies(policies);
        let training = engine.render(ReportKind::TrainingStats).await.unwrap();
        assert_eq!(training.body["error"], json!("Failed to fetch training statistics"));
        assert!(engine.render(ReportKind::WebinarStats).await.is_err());
    }

    #[tokio::test]
    async fn test_config_set_validates_policies() {
        let engine = engine_at("2024-01-15").await;
        assert!(engine
            .config_set("policy.training_stats", "whatever")
            .await
            .is_err());
        assert!(engine
            .config_set("policy.nonexistent", "propagate")
            .await
            .is_err());
        engine
            .config_set("policy.training_stats", "structured-error")
            .await
            .unwrap();
        engine.config_set("owner", "admin team").await.unwrap();

        let reloaded = PortalStats::from_config(engine.db().clone()).await.unwrap();
        assert_eq!(
            reloaded.policies().training_stats,
            ErrorPolicy::StructuredError
        );
        assert_eq!(
            engine.config_list().await.unwrap(),
            vec![
                ("owner".to_string(), "admin team".to_string()),
                (
                    "policy.training_stats".to_string(),
                    "structured-error".to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_load_fixture_and_status() {
        let engine = engine_at("2024-01-15").await;
        let fixture: FactFixture = serde_json::from_value(json!({
            "trainings": [{"created_at": "2024-01-02T00:00:00"}],
            "progress": [{"status": "completed", "updated_at": "2024-01-03T00:00:00"}]
        }))
        .unwrap();
        assert_eq!(engine.load_fixture(fixture).await.unwrap(), 2);

        let status = engine.status().await.unwrap();
        assert_eq!(status[0], (FactTable::Trainings, 1));
        assert_eq!(status[2], (FactTable::TrainingProgress, 1));
        assert_eq!(status[3], (FactTable::Meetings, 0));

        let stats = engine.training_stats().await.unwrap();
        assert_eq!(stats.total_trainings.count, 1);
        assert_eq!(stats.average_completion.percentage, 100.0);
    }

    #[tokio::test]
    async fn test_load_empty_fixture_is_noop() {
        let engine = engine_at("2024-01-15").await;
        let fixture: FactFixture = serde_json::from_value(json!({})).unwrap();
        assert_eq!(engine.load_fixture(fixture).await.unwrap(), 0);
        assert!(engine.status().await.unwrap().iter().all(|(_, n)| *n == 0));
    }
}
