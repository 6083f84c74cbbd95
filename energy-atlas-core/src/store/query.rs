//! Filtered reads over the fact tables.
//!
//! Filters compile to parameterised `WHERE` clauses; caller input never reaches
//! the SQL text. Results are ordered by `year` ascending, then `id`, with null
//! years first (SQLite sorts NULL lowest).

use super::EnergyStore;
use crate::error::Result;
use crate::records::{
    EnergyRecord, GlobalEnergySubstitutionRecord, PerCapitaEnergyRecord, ShareRenewablesRecord,
    StoredRecord,
};
use crate::store::schema::data_columns;
use rusqlite::Row;
use rusqlite::types::Value;
use tracing::debug;

/// Which rows a query selects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RowFilter {
    #[default]
    All,
    Year(i32),
    Entity(String),
    YearAndEntity(i32, String),
}

impl RowFilter {
    /// Build a filter from optional parameters. An empty entity means no entity filter.
    pub fn new(year: Option<i32>, entity: Option<&str>) -> Self {
        let entity = entity.filter(|e| !e.is_empty()).map(str::to_string);
        match (year, entity) {
            (None, None) => Self::All,
            (Some(year), None) => Self::Year(year),
            (None, Some(entity)) => Self::Entity(entity),
            (Some(year), Some(entity)) => Self::YearAndEntity(year, entity),
        }
    }

    fn where_clause(&self) -> (&'static str, Vec<Value>) {
        match self {
            Self::All => ("", Vec::new()),
            Self::Year(year) => (" WHERE year = ?1", vec![Value::Integer(i64::from(*year))]),
            Self::Entity(entity) => (" WHERE entity = ?1", vec![Value::Text(entity.clone())]),
            Self::YearAndEntity(year, entity) => (
                " WHERE year = ?1 AND entity = ?2",
                vec![Value::Integer(i64::from(*year)), Value::Text(entity.clone())],
            ),
        }
    }
}

fn select_sql<R: EnergyRecord>(filter: &RowFilter) -> (String, Vec<Value>) {
    let kind = R::KIND;
    let (clause, params) = filter.where_clause();
    let sql = format!(
        "SELECT id, {} FROM {}{clause} ORDER BY year ASC, id ASC",
        data_columns(kind).join(", "),
        kind.table_name()
    );
    (sql, params)
}

fn read_row<R: EnergyRecord>(row: &Row<'_>) -> rusqlite::Result<StoredRecord<R>> {
    let id: i64 = row.get(0)?;
    let entity: Option<String> = row.get(1)?;
    let code: Option<String> = row.get(2)?;
    let year: Option<i32> = row.get(3)?;
    let measure_count = R::KIND.measures().len();
    let mut measures = Vec::with_capacity(measure_count);
    for idx in 0..measure_count {
        measures.push(row.get::<_, Option<f64>>(4 + idx)?);
    }
    Ok(StoredRecord {
        id,
        record: R::from_parts(entity, code, year, &measures),
    })
}

/// All rows of `R`'s table matching `filter`.
pub fn query_table<R: EnergyRecord>(
    store: &EnergyStore,
    filter: &RowFilter,
) -> Result<Vec<StoredRecord<R>>> {
    let conn = store.connect()?;
    let (sql, params) = select_sql::<R>(filter);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), read_row::<R>)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    debug!(table = R::KIND.table_name(), ?filter, rows = rows.len(), "Queried table");
    Ok(rows)
}

pub fn query_global_energy_substitution(
    store: &EnergyStore,
    year: Option<i32>,
) -> Result<Vec<StoredRecord<GlobalEnergySubstitutionRecord>>> {
    query_table(store, &RowFilter::new(year, None))
}

pub fn query_share_renewables(
    store: &EnergyStore,
    year: Option<i32>,
) -> Result<Vec<StoredRecord<ShareRenewablesRecord>>> {
    query_table(store, &RowFilter::new(year, None))
}

/// Per-capita rows, optionally narrowed by year and exact (case-sensitive) entity.
pub fn query_per_capita_energy(
    store: &EnergyStore,
    year: Option<i32>,
    entity: Option<&str>,
) -> Result<Vec<StoredRecord<PerCapitaEnergyRecord>>> {
    query_table(store, &RowFilter::new(year, entity))
}
