//! Dataset catalogue: the three fixed sources, their tables, and the exact
//! CSV headers each table column is read from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// CSV header of the entity name column (shared by every dataset).
pub const ENTITY_HEADER: &str = "Entity";
/// CSV header of the ISO-like code column.
pub const CODE_HEADER: &str = "Code";
/// CSV header of the year column.
pub const YEAR_HEADER: &str = "Year";

/// One numeric measurement column: where it comes from and where it goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measure {
    /// Exact CSV header (case- and punctuation-sensitive).
    pub header: &'static str,
    /// Column name in the relational table and JSON field name.
    pub column: &'static str,
    /// Human-facing source label used when melting rows for charts.
    pub label: &'static str,
}

const fn measure(header: &'static str, column: &'static str, label: &'static str) -> Measure {
    Measure {
        header,
        column,
        label,
    }
}

pub const GLOBAL_ENERGY_SUBSTITUTION_MEASURES: &[Measure] = &[
    measure(
        "Other renewables (TWh, substituted energy)",
        "other_renewables",
        "Other renewables",
    ),
    measure("Biofuels (TWh, substituted energy)", "biofuels", "Biofuels"),
    measure("Solar (TWh, substituted energy)", "solar", "Solar"),
    measure("Wind (TWh, substituted energy)", "wind", "Wind"),
    measure(
        "Hydropower (TWh, substituted energy)",
        "hydropower",
        "Hydropower",
    ),
    measure("Nuclear (TWh, substituted energy)", "nuclear", "Nuclear"),
    measure("Gas (TWh, substituted energy)", "gas", "Gas"),
    measure("Oil (TWh, substituted energy)", "oil", "Oil"),
    measure("Coal (TWh, substituted energy)", "coal", "Coal"),
    measure(
        "Traditional biomass (TWh, substituted energy)",
        "traditional_biomass",
        "Traditional biomass",
    ),
];

pub const SHARE_RENEWABLES_MEASURES: &[Measure] = &[measure(
    "Renewables - % electricity",
    "renewables_pct_electricity",
    "Renewables",
)];

pub const PER_CAPITA_ENERGY_MEASURES: &[Measure] = &[
    measure("Coal per capita (kWh)", "coal_per_capita", "Coal"),
    measure("Oil per capita (kWh)", "oil_per_capita", "Oil"),
    measure("Gas per capita (kWh)", "gas_per_capita", "Gas"),
    measure(
        "Nuclear per capita (kWh - equivalent)",
        "nuclear_per_capita",
        "Nuclear",
    ),
    measure(
        "Hydro per capita (kWh - equivalent)",
        "hydro_per_capita",
        "Hydro",
    ),
    measure(
        "Wind per capita (kWh - equivalent)",
        "wind_per_capita",
        "Wind",
    ),
    measure(
        "Solar per capita (kWh - equivalent)",
        "solar_per_capita",
        "Solar",
    ),
    measure(
        "Other renewables per capita (kWh - equivalent)",
        "other_renewables_per_capita",
        "Other renewables",
    ),
];

/// The three fixed datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    GlobalEnergySubstitution,
    ShareRenewables,
    PerCapitaEnergy,
}

impl DatasetKind {
    /// Catalogue order; ingestion loads tables in this order.
    pub const ALL: [DatasetKind; 3] = [
        DatasetKind::GlobalEnergySubstitution,
        DatasetKind::ShareRenewables,
        DatasetKind::PerCapitaEnergy,
    ];

    /// Name used in the HTTP API path and in configuration keys.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GlobalEnergySubstitution => "global_energy_substitution",
            Self::ShareRenewables => "share_renewables",
            Self::PerCapitaEnergy => "per_capita_energy",
        }
    }

    /// Relational table that owns this dataset's rows.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::GlobalEnergySubstitution => "global_energy_substitution",
            Self::ShareRenewables => "share_electricity_renewables",
            Self::PerCapitaEnergy => "per_capita_energy",
        }
    }

    pub fn measures(&self) -> &'static [Measure] {
        match self {
            Self::GlobalEnergySubstitution => GLOBAL_ENERGY_SUBSTITUTION_MEASURES,
            Self::ShareRenewables => SHARE_RENEWABLES_MEASURES,
            Self::PerCapitaEnergy => PER_CAPITA_ENERGY_MEASURES,
        }
    }

    /// Every CSV header this dataset requires, key columns first.
    pub fn required_headers(&self) -> Vec<&'static str> {
        let mut headers = vec![ENTITY_HEADER, CODE_HEADER, YEAR_HEADER];
        headers.extend(self.measures().iter().map(|m| m.header));
        headers
    }

    /// Whether this dataset's queries accept an entity filter.
    pub fn supports_entity_filter(&self) -> bool {
        matches!(self, Self::PerCapitaEnergy)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
