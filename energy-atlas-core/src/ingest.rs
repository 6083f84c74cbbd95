//! Ingestion run: ensure schema, fetch, map, then replace-load every table.
//!
//! All three sources are fetched concurrently and mapped before the first
//! table is touched, so a fetch or parse failure leaves the store unchanged.
//! Loads then run in catalogue order, each in its own transaction; the first
//! failing load stops the run and later tables keep their previous contents.

use crate::dataset::DatasetKind;
use crate::error::{EnergyError, Result};
use crate::fetch::SourceFetcher;
use crate::mapper::map_rows;
use crate::store::{EnergyStore, LoadSummary, replace_rows};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Outcome of a completed ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub loads: Vec<LoadSummary>,
    pub elapsed: Duration,
}

impl IngestReport {
    pub fn total_rows(&self) -> usize {
        self.loads.iter().map(|l| l.rows_inserted).sum()
    }
}

pub struct IngestPipeline {
    store: EnergyStore,
    fetcher: Arc<dyn SourceFetcher>,
}

impl IngestPipeline {
    pub fn new(store: EnergyStore, fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self { store, fetcher }
    }

    pub fn store(&self) -> &EnergyStore {
        &self.store
    }

    /// Run one full ingestion pass.
    pub async fn run(&self) -> Result<IngestReport> {
        let started = Instant::now();
        info!(database = %self.store.path().display(), "Starting ingestion run");

        self.store.run_blocking(|s| s.ensure_schema()).await?;

        let payloads = try_join_all(DatasetKind::ALL.into_iter().map(|kind| {
            let fetcher = Arc::clone(&self.fetcher);
            async move {
                fetcher
                    .fetch(kind)
                    .await
                    .map(|body| (kind, body))
                    .map_err(|e| EnergyError::ingest(kind, e))
            }
        }))
        .await
        .inspect_err(|e| error!(error = %e, "Fetch failed, no table was modified"))?;

        let mut mapped = Vec::with_capacity(payloads.len());
        for (kind, body) in payloads {
            let rows = map_rows(kind, &body).map_err(|e| EnergyError::ingest(kind, e));
            let rows = rows.inspect_err(|e| error!(error = %e, "Mapping failed, no table was modified"))?;
            info!(dataset = %kind, rows = rows.len(), "Mapped source");
            mapped.push(rows);
        }

        let mut loads = Vec::with_capacity(mapped.len());
        for rows in mapped {
            let kind = rows.kind();
            let summary = self
                .store
                .run_blocking(move |s| replace_rows(s, &rows))
                .await
                .map_err(|e| EnergyError::ingest(kind, e))
                .inspect_err(|e| error!(error = %e, "Load failed, stopping ingestion run"))?;
            loads.push(summary);
        }

        let report = IngestReport {
            loads,
            elapsed: started.elapsed(),
        };
        info!(
            tables = report.loads.len(),
            rows = report.total_rows(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Ingestion run complete"
        );
        Ok(report)
    }
}
