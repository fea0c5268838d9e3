//! Shared fixtures for unit tests.

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::date_util::parse_timestamp;
use crate::storage::repository::{
    insert_meeting, insert_meeting_registration, insert_progress, insert_training,
    insert_training_registration, MeetingRecord, MeetingRegistrationRecord, ProgressRecord,
    TrainingRecord, TrainingRegistrationRecord,
};
use crate::storage::schema;

pub fn ts(s: &str) -> NaiveDateTime {
    parse_timestamp(s).unwrap()
}

/// In-memory connection with the full schema applied.
pub fn conn() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    schema::migrations().to_latest(&mut conn).unwrap();
    conn
}

pub fn training(conn: &Connection, created_at: &str, start: Option<&str>, end: Option<&str>) {
    insert_training(
        conn,
        &TrainingRecord {
            title: "Training".to_string(),
            category: None,
            start_date: start.map(ts),
            end_date: end.map(ts),
            created_at: ts(created_at),
        },
    )
    .unwrap();
}

pub fn registration(conn: &Connection, created_at: &str) {
    insert_training_registration(
        conn,
        &TrainingRegistrationRecord {
            user_id: Some(1),
            training_id: Some(1),
            status: "approved".to_string(),
            created_at: ts(created_at),
        },
    )
    .unwrap();
}

pub fn progress(conn: &Connection, status: &str, updated_at: &str) {
    insert_progress(
        conn,
        &ProgressRecord {
            user_id: Some(1),
            training_id: Some(1),
            status: status.to_string(),
            updated_at: ts(updated_at),
        },
    )
    .unwrap();
}

pub fn meeting(
    conn: &Connection,
    created_at: &str,
    status: &str,
    start_time: Option<&str>,
    category: Option<&str>,
) {
    insert_meeting(
        conn,
        &MeetingRecord {
            title: "Webinar".to_string(),
            category: category.map(str::to_string),
            status: status.to_string(),
            start_time: start_time.map(ts),
            created_at: ts(created_at),
        },
    )
    .unwrap();
}

pub fn meeting_registration(conn: &Connection, user_id: i64, registered_at: &str) {
    insert_meeting_registration(
        conn,
        &MeetingRegistrationRecord {
            meeting_id: Some(1),
            user_id,
            registered_at: ts(registered_at),
        },
    )
    .unwrap();
}
