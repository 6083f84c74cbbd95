//! Property-based tests for the row mapper and query filters using proptest.

use proptest::prelude::*;

use energy_atlas_core::store::{RowFilter, query_table, replace_table};
use energy_atlas_core::{
    DatasetKind, EnergyRecord, EnergyStore, PerCapitaEnergyRecord, ShareRenewablesRecord,
    map_records,
};

fn to_csv<R: EnergyRecord>(rows: &[R]) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(R::KIND.required_headers()).unwrap();
    for row in rows {
        let mut fields = vec![
            row.entity().unwrap_or_default().to_string(),
            row.code().unwrap_or_default().to_string(),
            row.year().map(|y| y.to_string()).unwrap_or_default(),
        ];
        fields.extend(
            row.measures()
                .into_iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&fields).unwrap();
    }
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}

fn measure() -> impl Strategy<Value = Option<f64>> {
    proptest::option::of(-1.0e12f64..1.0e12)
}

fn share_record() -> impl Strategy<Value = ShareRenewablesRecord> {
    (
        proptest::option::of("[A-Za-z][A-Za-z ,()]{0,20}"),
        proptest::option::of("[A-Z]{3}"),
        proptest::option::of(-1000i32..3000),
        measure(),
    )
        .prop_map(|(entity, code, year, pct)| {
            ShareRenewablesRecord::from_parts(entity, code, year, &[pct])
        })
}

fn per_capita_record() -> impl Strategy<Value = PerCapitaEnergyRecord> {
    (
        "[A-Za-z][A-Za-z ]{0,12}",
        proptest::option::of("[A-Z]{3}"),
        proptest::option::of(1900i32..2030),
        proptest::collection::vec(measure(), 8),
    )
        .prop_map(|(entity, code, year, values)| {
            PerCapitaEnergyRecord::from_parts(Some(entity), code, year, &values)
        })
}

// --- Row mapper properties ---

proptest! {
    #[test]
    fn mapper_preserves_row_count_and_values(rows in proptest::collection::vec(share_record(), 0..40)) {
        let raw = to_csv(&rows);
        let mapped = map_records::<ShareRenewablesRecord>(&raw).unwrap();
        prop_assert_eq!(mapped, rows);
    }

    #[test]
    fn mapper_handles_every_per_capita_measure(rows in proptest::collection::vec(per_capita_record(), 0..20)) {
        let raw = to_csv(&rows);
        let mapped = map_records::<PerCapitaEnergyRecord>(&raw).unwrap();
        prop_assert_eq!(mapped, rows);
    }

    #[test]
    fn mapper_rejects_any_missing_required_header(drop in 0usize..4) {
        let mut headers = DatasetKind::ShareRenewables.required_headers();
        let removed = headers.remove(drop);
        let raw = format!("{}\n", headers.join(","));
        let err = map_records::<ShareRenewablesRecord>(&raw).unwrap_err();
        match err {
            energy_atlas_core::EnergyError::SchemaMismatch { missing, .. } => {
                prop_assert_eq!(missing, vec![removed.to_string()]);
            }
            other => prop_assert!(false, "expected schema mismatch, got {:?}", other),
        }
    }
}

// --- Query filter properties ---

const ENTITIES: [&str; 3] = ["Germany", "France", "Chad"];

fn filter_rows() -> impl Strategy<Value = Vec<PerCapitaEnergyRecord>> {
    proptest::collection::vec(
        (0usize..ENTITIES.len(), 2000i32..2004, measure()).prop_map(|(e, year, coal)| {
            PerCapitaEnergyRecord::from_parts(Some(ENTITIES[e].to_string()), None, Some(year), &[coal])
        }),
        0..25,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn query_matches_in_memory_filter(
        rows in filter_rows(),
        year in proptest::option::of(1999i32..2005),
        entity in proptest::option::of(prop_oneof![Just("Germany"), Just("Chad"), Just("Spain")]),
    ) {
        let dir = tempfile::TempDir::new().unwrap();
        let store = EnergyStore::new(dir.path().join("energy.db"));
        store.ensure_schema().unwrap();
        replace_table(&store, &rows).unwrap();

        let mut expected: Vec<_> = rows
            .iter()
            .filter(|r| year.is_none_or(|y| r.year == Some(y)))
            .filter(|r| entity.is_none_or(|e| r.entity.as_deref() == Some(e)))
            .cloned()
            .collect();
        expected.sort_by_key(|r| r.year);

        let actual: Vec<_> = query_table::<PerCapitaEnergyRecord>(&store, &RowFilter::new(year, entity))
            .unwrap()
            .into_iter()
            .map(|r| r.record)
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
