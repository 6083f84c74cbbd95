//! # Energy Atlas Core
//!
//! Core library for Energy Atlas.
//! Downloads public energy-statistics CSV datasets, maps them onto three fixed
//! relational tables, replace-loads them atomically into SQLite, and serves
//! filtered reads over a JSON API.

pub mod analysis;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod ingest;
pub mod mapper;
pub mod records;
pub mod store;

// Re-export commonly used types at the crate root.
pub use config::{EnergyConfig, load_config};
pub use dataset::{DatasetKind, Measure};
pub use error::{ConfigError, EnergyError, FetchError, ParseError, Result, StorageError};
pub use fetch::{HttpSourceFetcher, SourceFetcher, StaticSourceFetcher};
pub use ingest::{IngestPipeline, IngestReport};
pub use mapper::{map_records, map_rows};
pub use records::{
    DatasetRows, EnergyRecord, GlobalEnergySubstitutionRecord, PerCapitaEnergyRecord,
    ShareRenewablesRecord, StoredRecord,
};
pub use store::{EnergyStore, LoadRecord, LoadSummary, RowFilter};
