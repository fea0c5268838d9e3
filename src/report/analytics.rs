use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use crate::date_util::sub_months;
use crate::error::{Error, Result};
use crate::query::builder::{FactQuery, FactTable, GroupKey, GroupOrder};
use crate::query::period::Window;
use crate::storage::Database;

/// How far back the monthly series reach.
pub const TRAILING_MONTHS: u32 = 12;

/// How many categories `top_categories` keeps.
pub const TOP_CATEGORIES: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    pub month: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBucket {
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBucket {
    pub category: String,
    pub count: u64,
}

/// Grouped webinar counts for trend charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebinarAnalytics {
    pub monthly_trend: Vec<MonthBucket>,
    pub status_distribution: Vec<StatusBucket>,
    pub top_categories: Vec<CategoryBucket>,
    pub monthly_participants: Vec<MonthBucket>,
}

pub async fn compute_webinar_analytics(
    db: &Database,
    now: NaiveDateTime,
) -> Result<WebinarAnalytics> {
    db.reader()
        .call(move |conn| assemble(conn, now))
        .await
        .map_err(Error::from_call)
}

pub(crate) fn assemble(conn: &Connection, now: NaiveDateTime) -> Result<WebinarAnalytics> {
    let trailing = Window::since(sub_months(now, TRAILING_MONTHS));
    log::debug!("Computing webinar analytics over {trailing}");

    let monthly_trend = FactQuery::new(FactTable::Meetings)
        .within("created_at", &trailing)
        .group_count(conn, GroupKey::Month("created_at"), GroupOrder::KeyAscending)?
        .into_iter()
        .map(|(month, count)| MonthBucket { month, count })
        .collect();

    let status_distribution = FactQuery::new(FactTable::Meetings)
        .group_count(conn, GroupKey::Column("status"), GroupOrder::Unordered)?
        .into_iter()
        .map(|(status, count)| StatusBucket { status, count })
        .collect();

    let top_categories = FactQuery::new(FactTable::Meetings)
        .not_null("category")
        .limit(TOP_CATEGORIES)
        .group_count(conn, GroupKey::Column("category"), GroupOrder::CountDescending)?
        .into_iter()
        .map(|(category, count)| CategoryBucket { category, count })
        .collect();

    let monthly_participants = FactQuery::new(FactTable::MeetingRegistrations)
        .within("registered_at", &trailing)
        .group_count(conn, GroupKey::Month("registered_at"), GroupOrder::KeyAscending)?
        .into_iter()
        .map(|(month, count)| MonthBucket { month, count })
        .collect();

    Ok(WebinarAnalytics {
        monthly_trend,
        status_distribution,
        top_categories,
        monthly_participants,
    })
}
