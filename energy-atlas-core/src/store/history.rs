//! Load metadata. One `load_history` row is written inside every committed
//! replace-load, so the history never claims a load that was rolled back.
//! Only the newest [`HISTORY_RETAINED_PER_TABLE`] rows of each table are kept.

use super::EnergyStore;
use super::schema::LOAD_HISTORY_TABLE;
use crate::dataset::DatasetKind;
use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// History rows kept per table; older rows are pruned by the load that commits.
pub const HISTORY_RETAINED_PER_TABLE: usize = 20;

/// The most recent committed load of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRecord {
    pub dataset: DatasetKind,
    pub table: String,
    pub row_count: i64,
    pub loaded_at: DateTime<Utc>,
}

pub(crate) fn record_load(
    conn: &Connection,
    kind: DatasetKind,
    rows: usize,
    loaded_at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {LOAD_HISTORY_TABLE} (table_name, row_count, loaded_at) VALUES (?1, ?2, ?3)"
        ),
        rusqlite::params![kind.table_name(), rows as i64, loaded_at.to_rfc3339()],
    )?;
    conn.execute(
        &format!(
            "DELETE FROM {LOAD_HISTORY_TABLE} WHERE table_name = ?1 AND id NOT IN \
             (SELECT id FROM {LOAD_HISTORY_TABLE} WHERE table_name = ?1 ORDER BY id DESC LIMIT ?2)"
        ),
        rusqlite::params![kind.table_name(), HISTORY_RETAINED_PER_TABLE as i64],
    )?;
    Ok(())
}

/// Latest load per table, in catalogue order. Tables never loaded are absent.
pub fn latest_loads(store: &EnergyStore) -> Result<Vec<LoadRecord>> {
    let conn = store.connect()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT table_name, row_count, loaded_at FROM {LOAD_HISTORY_TABLE} \
         WHERE id IN (SELECT MAX(id) FROM {LOAD_HISTORY_TABLE} GROUP BY table_name)"
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut loads = Vec::new();
    for row in rows {
        let (table, row_count, loaded_at) = row?;
        // Rows for tables outside the catalogue are not ours to report.
        let Some(dataset) = DatasetKind::ALL
            .into_iter()
            .find(|k| k.table_name() == table)
        else {
            continue;
        };
        let loaded_at = DateTime::parse_from_rfc3339(&loaded_at)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?
            .with_timezone(&Utc);
        loads.push(LoadRecord {
            dataset,
            table,
            row_count,
            loaded_at,
        });
    }
    loads.sort_by_key(|l| l.dataset);
    Ok(loads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{EnergyRecord, GlobalEnergySubstitutionRecord, ShareRenewablesRecord};
    use crate::store::replace_table;

    fn setup() -> (tempfile::TempDir, EnergyStore) {
        let dir = tempfile::TempDir::new().unwrap();
        let store = EnergyStore::new(dir.path().join("energy.db"));
        store.ensure_schema().unwrap();
        (dir, store)
    }

    #[test]
    fn test_no_loads_yet() {
        let (_dir, store) = setup();
        assert!(latest_loads(&store).unwrap().is_empty());
    }

    #[test]
    fn test_latest_load_per_table() {
        let (_dir, store) = setup();
        let share = |n: usize| -> Vec<ShareRenewablesRecord> {
            (0..n)
                .map(|i| {
                    ShareRenewablesRecord::from_parts(Some("Norway".into()), None, Some(2000 + i as i32), &[])
                })
                .collect()
        };
        replace_table(&store, &share(3)).unwrap();
        replace_table(&store, &share(5)).unwrap();
        replace_table(
            &store,
            &[GlobalEnergySubstitutionRecord::from_parts(Some("World".into()), None, Some(1800), &[])],
        )
        .unwrap();

        let loads = latest_loads(&store).unwrap();
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[0].dataset, DatasetKind::GlobalEnergySubstitution);
        assert_eq!(loads[0].row_count, 1);
        assert_eq!(loads[1].table, "share_electricity_renewables");
        assert_eq!(loads[1].row_count, 5);
    }

    #[test]
    fn test_record_load_timestamp_roundtrip() {
        let (_dir, store) = setup();
        let at = DateTime::parse_from_rfc3339("2024-05-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let conn = store.connect().unwrap();
        record_load(&conn, DatasetKind::PerCapitaEnergy, 10, at).unwrap();

        let loads = latest_loads(&store).unwrap();
        assert_eq!(loads[0].loaded_at, at);
        assert_eq!(loads[0].table, "per_capita_energy");
    }

    #[test]
    fn test_history_is_pruned_per_table() {
        let (_dir, store) = setup();
        let conn = store.connect().unwrap();
        let at = Utc::now();
        for rows in 0..HISTORY_RETAINED_PER_TABLE + 5 {
            record_load(&conn, DatasetKind::ShareRenewables, rows, at).unwrap();
        }
        record_load(&conn, DatasetKind::PerCapitaEnergy, 7, at).unwrap();

        let count = |table: &str| -> i64 {
            conn.query_row(
                &format!("SELECT COUNT(*) FROM {LOAD_HISTORY_TABLE} WHERE table_name = ?1"),
                [table],
                |r| r.get(0),
            )
            .unwrap()
        };
        assert_eq!(count("share_electricity_renewables"), HISTORY_RETAINED_PER_TABLE as i64);
        assert_eq!(count("per_capita_energy"), 1);

        let loads = latest_loads(&store).unwrap();
        let share = loads
            .iter()
            .find(|l| l.dataset == DatasetKind::ShareRenewables)
            .unwrap();
        assert_eq!(share.row_count, (HISTORY_RETAINED_PER_TABLE + 4) as i64);
    }
}
