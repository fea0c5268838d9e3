use rusqlite_migration::{Migrations, M};

use crate::query::builder::FactTable;

/// Ordered schema migrations for the fact store.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(include_str!("migrations/001_initial.sql"))])
}

/// Fact tables missing from the connected database.
///
/// Used to warn when pointed at a store the collaborators never populated.
pub fn missing_fact_tables(conn: &rusqlite::Connection) -> Result<Vec<&'static str>, rusqlite::Error> {
    let mut stmt =
        conn.prepare("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    let mut missing = Vec::new();
    for table in FactTable::ALL {
        let n: i64 = stmt.query_row([table.table_name()], |row| row.get(0))?;
        if n == 0 {
            missing.push(table.table_name());
        }
    }
    Ok(missing)
}
