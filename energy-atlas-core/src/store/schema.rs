//! Table declarations for the fact tables and the load history.

use crate::dataset::DatasetKind;
use crate::error::Result;
use rusqlite::Connection;
use tracing::debug;

pub const LOAD_HISTORY_TABLE: &str = "load_history";

/// `CREATE TABLE IF NOT EXISTS` statement for one fact table.
pub fn create_table_sql(kind: DatasetKind) -> String {
    let measures: String = kind
        .measures()
        .iter()
        .map(|m| format!(",\n    {} REAL", m.column))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    \
         id INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
         entity TEXT,\n    \
         code TEXT,\n    \
         year INTEGER{measures}\n)",
        kind.table_name()
    )
}

fn create_history_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {LOAD_HISTORY_TABLE} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    table_name TEXT NOT NULL,
    row_count INTEGER NOT NULL,
    loaded_at TEXT NOT NULL
)"
    )
}

/// Data columns of a fact table in storage order (everything except `id`).
pub fn data_columns(kind: DatasetKind) -> Vec<&'static str> {
    let mut columns = vec!["entity", "code", "year"];
    columns.extend(kind.measures().iter().map(|m| m.column));
    columns
}

/// Create every table that does not exist yet. Existing tables are never altered.
///
/// Also switches the database to WAL so readers keep seeing the last committed
/// snapshot while a load transaction is open.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    debug!(journal_mode = %mode, "Configured journal mode");

    for kind in DatasetKind::ALL {
        conn.execute(&create_table_sql(kind), [])?;
        conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_year ON {table} (year)",
                table = kind.table_name()
            ),
            [],
        )?;
    }
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_per_capita_energy_entity_year ON per_capita_energy (entity, year)",
        [],
    )?;
    conn.execute(&create_history_sql(), [])?;
    Ok(())
}
