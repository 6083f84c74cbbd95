//! Replace-loads: delete every row of a table and bulk-insert the new rows in
//! one transaction.
//!
//! The transaction is opened with `BEGIN IMMEDIATE`, so two loads can never
//! interleave on the same database; the second waits up to the busy timeout.
//! Any failure before commit rolls back and leaves the previous contents intact.

use super::EnergyStore;
use super::history;
use super::schema::data_columns;
use crate::dataset::DatasetKind;
use crate::error::Result;
use crate::records::{DatasetRows, EnergyRecord};
use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Outcome of one committed replace-load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub dataset: DatasetKind,
    pub rows_deleted: usize,
    pub rows_inserted: usize,
    pub loaded_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// Replace the contents of `R`'s table with `rows`.
pub fn replace_table<R: EnergyRecord>(store: &EnergyStore, rows: &[R]) -> Result<LoadSummary> {
    let mut conn = store.connect()?;
    replace_table_in(&mut conn, rows)
}

/// Replace the table matching the tagged rows.
pub fn replace_rows(store: &EnergyStore, rows: &DatasetRows) -> Result<LoadSummary> {
    match rows {
        DatasetRows::GlobalEnergySubstitution(rows) => replace_table(store, rows),
        DatasetRows::ShareRenewables(rows) => replace_table(store, rows),
        DatasetRows::PerCapitaEnergy(rows) => replace_table(store, rows),
    }
}

fn insert_sql(kind: DatasetKind) -> String {
    let columns = data_columns(kind);
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({placeholders})",
        kind.table_name(),
        columns.join(", ")
    )
}

/// Replace-load on an existing connection.
pub fn replace_table_in<R: EnergyRecord>(conn: &mut Connection, rows: &[R]) -> Result<LoadSummary> {
    let kind = R::KIND;
    let started = Instant::now();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let rows_deleted = tx.execute(&format!("DELETE FROM {}", kind.table_name()), [])?;

    {
        let mut stmt = tx.prepare(&insert_sql(kind))?;
        for row in rows {
            let entity = row.entity();
            let code = row.code();
            let year = row.year();
            let measures = row.measures();

            let mut params: Vec<&dyn ToSql> = Vec::with_capacity(3 + measures.len());
            params.push(&entity);
            params.push(&code);
            params.push(&year);
            for value in &measures {
                params.push(value);
            }
            stmt.execute(params.as_slice())?;
        }
    }

    let loaded_at = Utc::now();
    history::record_load(&tx, kind, rows.len(), loaded_at)?;
    tx.commit()?;

    let summary = LoadSummary {
        dataset: kind,
        rows_deleted,
        rows_inserted: rows.len(),
        loaded_at,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        table = kind.table_name(),
        deleted = summary.rows_deleted,
        inserted = summary.rows_inserted,
        elapsed_ms = summary.elapsed_ms,
        "Replaced table contents"
    );
    Ok(summary)
}
