//! Row mapper: raw CSV text into typed records.
//!
//! The header row is validated against the dataset's fixed column catalogue
//! before any record is read. A missing header is reported as
//! [`EnergyError::SchemaMismatch`]; a present but unparsable value is a
//! [`ParseError`] that aborts the whole load (fail-closed, no rows skipped).
//! Empty values and fields missing from a short row map to null.

use crate::dataset::{CODE_HEADER, DatasetKind, ENTITY_HEADER, YEAR_HEADER};
use crate::error::{EnergyError, ParseError, Result};
use crate::records::{
    DatasetRows, EnergyRecord, GlobalEnergySubstitutionRecord, PerCapitaEnergyRecord,
    ShareRenewablesRecord,
};
use csv::StringRecord;
use tracing::debug;

/// Map a raw CSV payload into the typed rows of `kind`.
pub fn map_rows(kind: DatasetKind, raw: &str) -> Result<DatasetRows> {
    let rows = match kind {
        DatasetKind::GlobalEnergySubstitution => DatasetRows::GlobalEnergySubstitution(
            map_records::<GlobalEnergySubstitutionRecord>(raw)?,
        ),
        DatasetKind::ShareRenewables => {
            DatasetRows::ShareRenewables(map_records::<ShareRenewablesRecord>(raw)?)
        }
        DatasetKind::PerCapitaEnergy => {
            DatasetRows::PerCapitaEnergy(map_records::<PerCapitaEnergyRecord>(raw)?)
        }
    };
    debug!(dataset = %kind, rows = rows.len(), "Mapped CSV rows");
    Ok(rows)
}

/// Map a raw CSV payload into records of type `R`, one per data row.
pub fn map_records<R: EnergyRecord>(raw: &str) -> Result<Vec<R>> {
    let kind = R::KIND;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| malformed(kind, 1, &e))?
        .clone();
    let layout = ColumnLayout::resolve(kind, &headers)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or_default();
            malformed(kind, line, &e)
        })?;
        rows.push(layout.parse::<R>(&record)?);
    }
    Ok(rows)
}

fn malformed(dataset: DatasetKind, line: u64, err: &csv::Error) -> EnergyError {
    ParseError::MalformedRecord {
        dataset,
        line,
        message: err.to_string(),
    }
    .into()
}

/// Positions of the required columns within the source header row.
#[derive(Debug)]
struct ColumnLayout {
    dataset: DatasetKind,
    entity: usize,
    code: usize,
    year: usize,
    measures: Vec<(usize, &'static str)>,
}

impl ColumnLayout {
    fn resolve(dataset: DatasetKind, headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<String> = dataset
            .required_headers()
            .into_iter()
            .filter(|h| position(*h).is_none())
            .map(String::from)
            .collect();
        if !missing.is_empty() {
            return Err(EnergyError::SchemaMismatch { dataset, missing });
        }

        let index = |name: &str| position(name).unwrap_or_default();
        Ok(Self {
            dataset,
            entity: index(ENTITY_HEADER),
            code: index(CODE_HEADER),
            year: index(YEAR_HEADER),
            measures: dataset
                .measures()
                .iter()
                .map(|m| (index(m.header), m.header))
                .collect(),
        })
    }

    fn parse<R: EnergyRecord>(&self, record: &StringRecord) -> Result<R> {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let field = |idx: usize| record.get(idx).unwrap_or("");

        let entity = non_empty(field(self.entity)).map(String::from);
        let code = non_empty(field(self.code)).map(String::from);

        let year = match non_empty(field(self.year)) {
            Some(raw) => Some(raw.trim().parse::<i32>().map_err(|_| {
                self.invalid_number(line, YEAR_HEADER, raw)
            })?),
            None => None,
        };

        let mut measures = Vec::with_capacity(self.measures.len());
        for &(idx, header) in &self.measures {
            measures.push(self.parse_measure(line, header, field(idx))?);
        }

        Ok(R::from_parts(entity, code, year, &measures))
    }

    fn parse_measure(&self, line: u64, header: &str, raw: &str) -> Result<Option<f64>> {
        let Some(value) = non_empty(raw) else {
            return Ok(None);
        };
        match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(self.invalid_number(line, header, raw)),
        }
    }

    fn invalid_number(&self, line: u64, column: &str, value: &str) -> EnergyError {
        ParseError::InvalidNumber {
            dataset: self.dataset,
            line,
            column: column.to_string(),
            value: value.to_string(),
        }
        .into()
    }
}

/// `None` for empty or whitespace-only source values.
fn non_empty(raw: &str) -> Option<&str> {
    if raw.trim().is_empty() { None } else { Some(raw) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PER_CAPITA_HEADER: &str = "Entity,Code,Year,Coal per capita (kWh),Oil per capita (kWh),Gas per capita (kWh),Nuclear per capita (kWh - equivalent),Hydro per capita (kWh - equivalent),Wind per capita (kWh - equivalent),Solar per capita (kWh - equivalent),Other renewables per capita (kWh - equivalent)";

    #[test]
    fn test_per_capita_example_row() {
        let raw = format!("{PER_CAPITA_HEADER}\nGermany,DEU,2020,5000,,,,,,,\n");
        let rows = map_records::<PerCapitaEnergyRecord>(&raw).unwrap();
        assert_eq!(
            rows,
            vec![PerCapitaEnergyRecord {
                entity: Some("Germany".into()),
                code: Some("DEU".into()),
                year: Some(2020),
                coal_per_capita: Some(5000.0),
                oil_per_capita: None,
                gas_per_capita: None,
                nuclear_per_capita: None,
                hydro_per_capita: None,
                wind_per_capita: None,
                solar_per_capita: None,
                other_renewables_per_capita: None,
            }]
        );
    }

    #[test]
    fn test_header_only_yields_no_rows() {
        let rows = map_rows(DatasetKind::PerCapitaEnergy, PER_CAPITA_HEADER).unwrap();
        assert_eq!(rows.kind(), DatasetKind::PerCapitaEnergy);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_empty_body_is_schema_mismatch() {
        let err = map_rows(DatasetKind::ShareRenewables, "").unwrap_err();
        match err {
            EnergyError::SchemaMismatch { dataset, missing } => {
                assert_eq!(dataset, DatasetKind::ShareRenewables);
                assert_eq!(missing.len(), 4);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_renamed_header_is_schema_mismatch() {
        let raw = "Entity,Code,Year,Renewables (% electricity)\nNorway,NOR,2019,98.4\n";
        let err = map_rows(DatasetKind::ShareRenewables, raw).unwrap_err();
        match err {
            EnergyError::SchemaMismatch { missing, .. } => {
                assert_eq!(missing, vec!["Renewables - % electricity".to_string()]);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let raw = "entity,Code,Year,Renewables - % electricity\n";
        let err = map_rows(DatasetKind::ShareRenewables, raw).unwrap_err();
        assert!(matches!(err, EnergyError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_extra_and_reordered_columns() {
        let raw = "Renewables - % electricity,Note,Year,Code,Entity\n98.4,x,2019,NOR,Norway\n";
        let rows = map_records::<ShareRenewablesRecord>(raw).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity.as_deref(), Some("Norway"));
        assert_eq!(rows[0].code.as_deref(), Some("NOR"));
        assert_eq!(rows[0].year, Some(2019));
        assert_eq!(rows[0].renewables_pct_electricity, Some(98.4));
    }

    #[test]
    fn test_non_numeric_value_is_parse_error() {
        let raw = "Entity,Code,Year,Renewables - % electricity\nNorway,NOR,2018,97.9\nNorway,NOR,2019,lots\n";
        let err = map_rows(DatasetKind::ShareRenewables, raw).unwrap_err();
        match err {
            EnergyError::Parse(ParseError::InvalidNumber {
                line,
                column,
                value,
                ..
            }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "Renewables - % electricity");
                assert_eq!(value, "lots");
            }
            other => panic!("expected invalid number, got {other:?}"),
        }
    }

    #[test]
    fn test_non_integer_year_is_parse_error() {
        let raw = "Entity,Code,Year,Renewables - % electricity\nNorway,NOR,2019.5,97.9\n";
        let err = map_rows(DatasetKind::ShareRenewables, raw).unwrap_err();
        assert!(matches!(
            err,
            EnergyError::Parse(ParseError::InvalidNumber { ref column, .. }) if column == "Year"
        ));
    }

    #[test]
    fn test_nan_is_rejected() {
        let raw = "Entity,Code,Year,Renewables - % electricity\nNorway,NOR,2019,NaN\n";
        let err = map_rows(DatasetKind::ShareRenewables, raw).unwrap_err();
        assert!(matches!(err, EnergyError::Parse(_)));
    }

    #[test]
    fn test_empty_code_and_year_are_null() {
        let raw = "Entity,Code,Year,Renewables - % electricity\nWorld,,,\n";
        let rows = map_records::<ShareRenewablesRecord>(raw).unwrap();
        assert_eq!(rows[0].code, None);
        assert_eq!(rows[0].year, None);
        assert_eq!(rows[0].renewables_pct_electricity, None);
    }

    #[test]
    fn test_empty_entity_is_null() {
        let raw = "Entity,Code,Year,Renewables - % electricity\n,,2019,5\n";
        let rows = map_records::<ShareRenewablesRecord>(raw).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity, None);
        assert_eq!(rows[0].year, Some(2019));
        assert_eq!(rows[0].renewables_pct_electricity, Some(5.0));
    }

    #[test]
    fn test_quoted_entity_with_comma() {
        let raw = "Entity,Code,Year,Renewables - % electricity\n\"Korea, South\",KOR,2020,7.2\n";
        let rows = map_records::<ShareRenewablesRecord>(raw).unwrap();
        assert_eq!(rows[0].entity.as_deref(), Some("Korea, South"));
    }

    #[test]
    fn test_short_row_fills_nulls() {
        let raw = "Entity,Code,Year,Renewables - % electricity\nWorld,,2019\nNorway\n";
        let rows = map_records::<ShareRenewablesRecord>(raw).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity.as_deref(), Some("World"));
        assert_eq!(rows[0].year, Some(2019));
        assert_eq!(rows[0].renewables_pct_electricity, None);
        assert_eq!(rows[1].entity.as_deref(), Some("Norway"));
        assert_eq!(rows[1].year, None);
    }

    #[test]
    fn test_extra_trailing_fields_are_ignored() {
        let raw = "Entity,Code,Year,Renewables - % electricity\nNorway,NOR,2019,98.4,stray,9\n";
        let rows = map_records::<ShareRenewablesRecord>(raw).unwrap();
        assert_eq!(rows[0].renewables_pct_electricity, Some(98.4));
    }

    #[test]
    fn test_whitespace_only_values_are_null() {
        let raw = "Entity,Code,Year,Renewables - % electricity\nNorway, , ,  \n";
        let rows = map_records::<ShareRenewablesRecord>(raw).unwrap();
        assert_eq!(rows[0].code, None);
        assert_eq!(rows[0].year, None);
        assert_eq!(rows[0].renewables_pct_electricity, None);
    }

    #[test]
    fn test_row_count_preserved() {
        let mut raw = String::from("Entity,Code,Year,Renewables - % electricity\n");
        for year in 1990..2020 {
            raw.push_str(&format!("Norway,NOR,{year},{}\n", year - 1900));
        }
        let rows = map_rows(DatasetKind::ShareRenewables, &raw).unwrap();
        assert_eq!(rows.len(), 30);
    }
}
