//! Chart-side transforms over query results.
//!
//! Nothing here touches the store. Null measures stay null when melting; the
//! ranking substitutes zero for null before summing.

use crate::records::{EnergyRecord, GlobalEnergySubstitutionRecord, PerCapitaEnergyRecord};
use serde::Serialize;

/// Number of entities the per-capita ranking keeps by default.
pub const DEFAULT_TOP_LIMIT: usize = 15;

/// Year the per-capita ranking uses when none is given.
pub const DEFAULT_RANKING_YEAR: i32 = 2023;

/// Total per-capita consumption of one entity across all sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityTotal {
    pub entity: String,
    pub code: Option<String>,
    pub year: Option<i32>,
    /// Sum in kWh with missing sources counted as zero.
    pub total_per_capita: f64,
}

/// One measure of one row in long form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceValue {
    pub entity: Option<String>,
    pub year: Option<i32>,
    pub source: &'static str,
    pub value: Option<f64>,
}

/// Rank entities by total per-capita consumption, highest first, keeping `limit`.
///
/// Rows without an entity name are left out. Entities with equal totals keep
/// their input order.
pub fn per_capita_totals(rows: &[PerCapitaEnergyRecord], limit: usize) -> Vec<EntityTotal> {
    let mut totals: Vec<EntityTotal> = rows
        .iter()
        .filter_map(|row| {
            Some(EntityTotal {
                entity: row.entity.clone()?,
                code: row.code.clone(),
                year: row.year,
                total_per_capita: row.measures().into_iter().map(|v| v.unwrap_or(0.0)).sum(),
            })
        })
        .collect();
    totals.sort_by(|a, b| b.total_per_capita.total_cmp(&a.total_per_capita));
    totals.truncate(limit);
    totals
}

fn melt<R: EnergyRecord>(rows: &[R]) -> Vec<SourceValue> {
    let measures = R::KIND.measures();
    rows.iter()
        .flat_map(|row| {
            measures
                .iter()
                .zip(row.measures())
                .map(|(m, value)| SourceValue {
                    entity: row.entity().map(String::from),
                    year: row.year(),
                    source: m.label,
                    value,
                })
        })
        .collect()
}

/// Wide per-capita rows into (entity, source, value) triples.
pub fn melt_per_capita(rows: &[PerCapitaEnergyRecord]) -> Vec<SourceValue> {
    melt(rows)
}

/// Wide substitution rows into (year, source, value) triples, sorted by year.
pub fn melt_global_substitution(rows: &[GlobalEnergySubstitutionRecord]) -> Vec<SourceValue> {
    let mut melted = melt(rows);
    melted.sort_by_key(|v| v.year);
    melted
}
