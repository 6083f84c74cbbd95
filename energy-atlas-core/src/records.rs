//! Typed rows for the three fact tables.
//!
//! Each record is a fixed-field struct whose measure fields line up one-to-one
//! with the dataset's [`Measure`](crate::dataset::Measure) catalogue, so the
//! mapper, loader, and query service can stay generic over [`EnergyRecord`].

use crate::dataset::DatasetKind;
use serde::{Deserialize, Serialize};

/// Behaviour shared by the three fact-table row types.
pub trait EnergyRecord:
    Clone + std::fmt::Debug + PartialEq + Serialize + Send + Sync + 'static
{
    const KIND: DatasetKind;

    fn entity(&self) -> Option<&str>;
    fn code(&self) -> Option<&str>;
    fn year(&self) -> Option<i32>;

    /// Measure values in catalogue order.
    fn measures(&self) -> Vec<Option<f64>>;

    /// Build a row from its key columns and measure values in catalogue order.
    /// Missing trailing values become null.
    fn from_parts(
        entity: Option<String>,
        code: Option<String>,
        year: Option<i32>,
        measures: &[Option<f64>],
    ) -> Self;
}

macro_rules! energy_record {
    ($(#[$meta:meta])* $name:ident, $kind:expr, [$($field:ident),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub entity: Option<String>,
            pub code: Option<String>,
            pub year: Option<i32>,
            $(pub $field: Option<f64>,)+
        }

        impl EnergyRecord for $name {
            const KIND: DatasetKind = $kind;

            fn entity(&self) -> Option<&str> {
                self.entity.as_deref()
            }

            fn code(&self) -> Option<&str> {
                self.code.as_deref()
            }

            fn year(&self) -> Option<i32> {
                self.year
            }

            fn measures(&self) -> Vec<Option<f64>> {
                vec![$(self.$field),+]
            }

            fn from_parts(
                entity: Option<String>,
                code: Option<String>,
                year: Option<i32>,
                measures: &[Option<f64>],
            ) -> Self {
                let mut values = measures.iter().copied();
                Self {
                    entity,
                    code,
                    year,
                    $($field: values.next().flatten(),)+
                }
            }
        }
    };
}

energy_record!(
    /// Substituted primary energy by source, in terawatt-hours.
    GlobalEnergySubstitutionRecord,
    DatasetKind::GlobalEnergySubstitution,
    [
        other_renewables,
        biofuels,
        solar,
        wind,
        hydropower,
        nuclear,
        gas,
        oil,
        coal,
        traditional_biomass,
    ]
);

energy_record!(
    /// Share of electricity produced from renewables, in percent (0-100).
    ShareRenewablesRecord,
    DatasetKind::ShareRenewables,
    [renewables_pct_electricity]
);

energy_record!(
    /// Per-capita primary energy by source, in kilowatt-hours.
    PerCapitaEnergyRecord,
    DatasetKind::PerCapitaEnergy,
    [
        coal_per_capita,
        oil_per_capita,
        gas_per_capita,
        nuclear_per_capita,
        hydro_per_capita,
        wind_per_capita,
        solar_per_capita,
        other_renewables_per_capita,
    ]
);

/// A row read back from the store together with its synthetic identifier.
///
/// Identifiers are reassigned on every load and carry no cross-load identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord<R> {
    pub id: i64,
    #[serde(flatten)]
    pub record: R,
}

/// Mapped rows for one dataset, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetRows {
    GlobalEnergySubstitution(Vec<GlobalEnergySubstitutionRecord>),
    ShareRenewables(Vec<ShareRenewablesRecord>),
    PerCapitaEnergy(Vec<PerCapitaEnergyRecord>),
}

impl DatasetRows {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Self::GlobalEnergySubstitution(_) => DatasetKind::GlobalEnergySubstitution,
            Self::ShareRenewables(_) => DatasetKind::ShareRenewables,
            Self::PerCapitaEnergy(_) => DatasetKind::PerCapitaEnergy,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::GlobalEnergySubstitution(rows) => rows.len(),
            Self::ShareRenewables(rows) => rows.len(),
            Self::PerCapitaEnergy(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
