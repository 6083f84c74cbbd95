//! # Relational store
//!
//! SQLite-backed storage for the three fact tables. [`EnergyStore`] is an
//! explicitly constructed handle passed into every component; it opens one
//! connection per operation and drops it on every exit path.
//!
//! - [`schema`]: table declarations and `ensure_schema`
//! - [`loader`]: transactional replace-loads
//! - [`query`]: filtered, year-ordered reads
//! - [`history`]: per-table load metadata

pub mod history;
pub mod loader;
pub mod query;
pub mod schema;

pub use history::{LoadRecord, latest_loads};
pub use loader::{LoadSummary, replace_rows, replace_table};
pub use query::{
    RowFilter, query_global_energy_substitution, query_per_capita_energy, query_share_renewables,
    query_table,
};

use crate::config::DatabaseConfig;
use crate::error::{Result, StorageError};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Handle to the SQLite database holding the fact tables.
#[derive(Debug, Clone)]
pub struct EnergyStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl EnergyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DatabaseConfig::default().busy_timeout(),
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            path: config.path.clone(),
            busy_timeout: config.busy_timeout(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection scoped to one operation.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(|e| StorageError::Unavailable {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    /// Create the fact tables if absent. Safe to call on every startup.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        schema::ensure_schema(&conn)
    }

    /// Run a blocking store operation on the tokio blocking pool.
    pub async fn run_blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&EnergyStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| StorageError::Task {
                message: e.to_string(),
            })?
    }
}
