use rusqlite::Connection;

use crate::date_util::to_sql;
use crate::error::Result;
use crate::query::period::Window;
use crate::storage::Database;

/// The fact streams the engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactTable {
    Trainings,
    TrainingRegistrations,
    TrainingProgress,
    Meetings,
    MeetingRegistrations,
}

impl FactTable {
    pub const ALL: [FactTable; 5] = [
        FactTable::Trainings,
        FactTable::TrainingRegistrations,
        FactTable::TrainingProgress,
        FactTable::Meetings,
        FactTable::MeetingRegistrations,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            FactTable::Trainings => "trainings",
            FactTable::TrainingRegistrations => "training_registrations",
            FactTable::TrainingProgress => "user_training_progress",
            FactTable::Meetings => "meetings",
            FactTable::MeetingRegistrations => "meeting_registrations",
        }
    }
}

/// What a grouped count buckets rows by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// The raw column value.
    Column(&'static str),
    /// The column truncated to `"YYYY-MM"`.
    Month(&'static str),
}

impl GroupKey {
    fn expr(self) -> String {
        match self {
            GroupKey::Column(col) => col.to_string(),
            GroupKey::Month(col) => format!("strftime('%Y-%m', {col})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrder {
    /// Whatever order the store returns.
    Unordered,
    KeyAscending,
    /// Largest bucket first, ties by key.
    CountDescending,
}

/// Builder for filtered count queries over a single fact table.
///
/// Column names are always crate-provided literals; every value is bound.
#[derive(Debug, Clone)]
pub struct FactQuery {
    table: FactTable,
    conditions: Vec<String>,
    params: Vec<String>,
    limit: Option<u32>,
}

impl FactQuery {
    pub fn new(table: FactTable) -> Self {
        Self {
            table,
            conditions: Vec::new(),
            params: Vec::new(),
            limit: None,
        }
    }

    fn push(mut self, condition: String, value: Option<String>) -> Self {
        self.conditions.push(condition);
        if let Some(v) = value {
            self.params.push(v);
        }
        self
    }

    /// Restrict `column` to a window. `At(t)` keeps rows with `column <= t`.
    ///
    /// The column is normalised with `datetime()` so date-only values
    /// compare as midnight and `T`-separated values compare like spaced ones.
    pub fn within(self, column: &'static str, window: &Window) -> Self {
        match window {
            Window::AllTime => self,
            Window::Range { start, end } => {
                let q = self.push(format!("datetime({column}) >= ?"), Some(to_sql(*start)));
                match end {
                    Some(end) => q.push(format!("datetime({column}) < ?"), Some(to_sql(*end))),
                    None => q,
                }
            }
            Window::At(t) => self.push(format!("datetime({column}) <= ?"), Some(to_sql(*t))),
        }
    }

    pub fn eq(self, column: &'static str, value: &str) -> Self {
        self.push(format!("{column} = ?"), Some(value.to_string()))
    }

    pub fn not_null(self, column: &'static str) -> Self {
        self.push(format!("{column} IS NOT NULL"), None)
    }

    /// Keep rows where `column` is unset or falls on/after the given instant.
    pub fn null_or_on_or_after(self, column: &'static str, ts: chrono::NaiveDateTime) -> Self {
        self.push(
            format!("({column} IS NULL OR datetime({column}) >= ?)"),
            Some(to_sql(ts)),
        )
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    fn param_refs(&self) -> Vec<&dyn rusqlite::types::ToSql> {
        self.params
            .iter()
            .map(|p| p as &dyn rusqlite::types::ToSql)
            .collect()
    }

    /// `SELECT COUNT(*)` over the filtered rows.
    pub fn count(&self, conn: &Connection) -> std::result::Result<u64, rusqlite::Error> {
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            self.table.table_name(),
            self.where_clause()
        );
        let n: i64 = conn.query_row(&sql, self.param_refs().as_slice(), |row| row.get(0))?;
        Ok(n as u64)
    }

    /// `SELECT COUNT(DISTINCT column)` over the filtered rows.
    pub fn count_distinct(
        &self,
        conn: &Connection,
        column: &'static str,
    ) -> std::result::Result<u64, rusqlite::Error> {
        let sql = format!(
            "SELECT COUNT(DISTINCT {column}) FROM {}{}",
            self.table.table_name(),
            self.where_clause()
        );
        let n: i64 = conn.query_row(&sql, self.param_refs().as_slice(), |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Group the filtered rows and count each bucket.
    pub fn group_count(
        &self,
        conn: &Connection,
        key: GroupKey,
        order: GroupOrder,
    ) -> std::result::Result<Vec<(String, u64)>, rusqlite::Error> {
        let order_clause = match order {
            GroupOrder::Unordered => "",
            GroupOrder::KeyAscending => " ORDER BY bucket ASC",
            GroupOrder::CountDescending => " ORDER BY n DESC, bucket ASC",
        };
        let limit_clause = self
            .limit
            .map(|n| format!(" LIMIT {n}"))
            .unwrap_or_default();
        let sql = format!(
            "SELECT {} AS bucket, COUNT(*) AS n FROM {}{} GROUP BY bucket{order_clause}{limit_clause}",
            key.expr(),
            self.table.table_name(),
            self.where_clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(self.param_refs().as_slice(), |row| {
            Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut buckets = Vec::new();
        for row in rows {
            let (bucket, n) = row?;
            if let Some(bucket) = bucket {
                buckets.push((bucket, n as u64));
            }
        }
        Ok(buckets)
    }

    /// Run [`FactQuery::count`] on the database's reader connection.
    pub async fn count_in(self, db: &Database) -> Result<u64> {
        let query = self;
        db.reader()
            .call(move |conn| query.count(conn))
            .await
            .map_err(|e| crate::error::Error::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_util::parse_timestamp;

    fn ts(s: &str) -> chrono::NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn conn_with_meetings() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE meetings (
                id INTEGER PRIMARY KEY,
                status TEXT NOT NULL,
                category TEXT,
                created_at TEXT NOT NULL
             );
             INSERT INTO meetings (status, category, created_at) VALUES
                ('ended', 'agro', '2024-01-03 10:00:00'),
                ('ended', 'agro', '2024-01-20 10:00:00'),
                ('scheduled', NULL, '2024-02-01 00:00:00'),
                ('cancelled', 'vet', '2023-12-31 23:59:59');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_count_within_range_is_half_open() {
        let conn = conn_with_meetings();
        let q = FactQuery::new(FactTable::Meetings)
            .within("created_at", &Window::range(ts("2024-01-01"), ts("2024-02-01")));
        assert_eq!(q.count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_count_all_time_and_open_ended() {
        let conn = conn_with_meetings();
        assert_eq!(FactQuery::new(FactTable::Meetings).count(&conn).unwrap(), 4);
        let q = FactQuery::new(FactTable::Meetings)
            .within("created_at", &Window::since(ts("2024-01-15")));
        assert_eq!(q.count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_count_at_keeps_rows_up_to_instant() {
        let conn = conn_with_meetings();
        let q = FactQuery::new(FactTable::Meetings)
            .within("created_at", &Window::At(ts("2024-01-03 10:00:00")));
        assert_eq!(q.count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_eq_and_distinct() {
        let conn = conn_with_meetings();
        let ended = FactQuery::new(FactTable::Meetings).eq("status", "ended");
        assert_eq!(ended.count(&conn).unwrap(), 2);
        assert_eq!(
            FactQuery::new(FactTable::Meetings)
                .count_distinct(&conn, "status")
                .unwrap(),
            3
        );
    }

    #[test]
    fn test_group_by_month_ascending() {
        let conn = conn_with_meetings();
        let buckets = FactQuery::new(FactTable::Meetings)
            .group_count(&conn, GroupKey::Month("created_at"), GroupOrder::KeyAscending)
            .unwrap();
        assert_eq!(
            buckets,
            vec![
                ("2023-12".to_string(), 1),
                ("2024-01".to_string(), 2),
                ("2024-02".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_group_by_category_excludes_null_and_limits() {
        let conn = conn_with_meetings();
        let buckets = FactQuery::new(FactTable::Meetings)
            .not_null("category")
            .limit(1)
            .group_count(&conn, GroupKey::Column("category"), GroupOrder::CountDescending)
            .unwrap();
        assert_eq!(buckets, vec![("agro".to_string(), 2)]);
    }
}
