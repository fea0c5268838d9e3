use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;

use crate::date_util::{flexible, to_sql};

// ── Fact records ───────────────────────────────────────────────────
//
// These mirror what the platform's CRUD paths persist. The engine never
// writes them during report computation; the inserts below exist for
// fixture loading.

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingRecord {
    #[serde(default)]
    pub title: String,
    pub category: Option<String>,
    #[serde(default, with = "flexible::option")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, with = "flexible::option")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(with = "flexible")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingRegistrationRecord {
    pub user_id: Option<i64>,
    pub training_id: Option<i64>,
    #[serde(default = "default_registration_status")]
    pub status: String,
    #[serde(with = "flexible")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressRecord {
    pub user_id: Option<i64>,
    pub training_id: Option<i64>,
    pub status: String,
    #[serde(with = "flexible")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeetingRecord {
    #[serde(default)]
    pub title: String,
    pub category: Option<String>,
    #[serde(default = "default_meeting_status")]
    pub status: String,
    #[serde(default, with = "flexible::option")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(with = "flexible")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeetingRegistrationRecord {
    pub meeting_id: Option<i64>,
    pub user_id: i64,
    #[serde(with = "flexible")]
    pub registered_at: NaiveDateTime,
}

/// A bundle of facts, as read by `portalstats load`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FactFixture {
    pub trainings: Vec<TrainingRecord>,
    pub training_registrations: Vec<TrainingRegistrationRecord>,
    pub progress: Vec<ProgressRecord>,
    pub meetings: Vec<MeetingRecord>,
    pub meeting_registrations: Vec<MeetingRegistrationRecord>,
}

impl FactFixture {
    pub fn len(&self) -> usize {
        self.trainings.len()
            + self.training_registrations.len()
            + self.progress.len()
            + self.meetings.len()
            + self.meeting_registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn default_registration_status() -> String {
    "pending".to_string()
}

fn default_meeting_status() -> String {
    "scheduled".to_string()
}

pub fn insert_training(conn: &Connection, t: &TrainingRecord) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO trainings (title, category, start_date, end_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            t.title,
            t.category,
            t.start_date.map(to_sql),
            t.end_date.map(to_sql),
            to_sql(t.created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_training_registration(
    conn: &Connection,
    r: &TrainingRegistrationRecord,
) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO training_registrations (user_id, training_id, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![r.user_id, r.training_id, r.status, to_sql(r.created_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_progress(conn: &Connection, p: &ProgressRecord) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO user_training_progress (user_id, training_id, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![p.user_id, p.training_id, p.status, to_sql(p.updated_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_meeting(conn: &Connection, m: &MeetingRecord) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO meetings (title, category, status, start_time, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            m.title,
            m.category,
            m.status,
            m.start_time.map(to_sql),
            to_sql(m.created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_meeting_registration(
    conn: &Connection,
    r: &MeetingRegistrationRecord,
) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO meeting_registrations (meeting_id, user_id, registered_at)
         VALUES (?1, ?2, ?3)",
        params![r.meeting_id, r.user_id, to_sql(r.registered_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert every fact in the fixture inside one transaction.
pub fn load_fixture(conn: &mut Connection, fixture: &FactFixture) -> Result<usize, rusqlite::Error> {
    let tx = conn.transaction()?;
    for t in &fixture.trainings {
        insert_training(&tx, t)?;
    }
    for r in &fixture.training_registrations {
        insert_training_registration(&tx, r)?;
    }
    for p in &fixture.progress {
        insert_progress(&tx, p)?;
    }
    for m in &fixture.meetings {
        insert_meeting(&tx, m)?;
    }
    for r in &fixture.meeting_registrations {
        insert_meeting_registration(&tx, r)?;
    }
    tx.commit()?;
    Ok(fixture.len())
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}
