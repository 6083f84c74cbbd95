//! Subcommand handlers.

use crate::Commands;
use energy_atlas_core::analysis::{EntityTotal, per_capita_totals};
use energy_atlas_core::gateway::run_gateway;
use energy_atlas_core::store::{latest_loads, query_per_capita_energy};
use energy_atlas_core::{
    EnergyConfig, EnergyStore, HttpSourceFetcher, IngestPipeline, IngestReport, LoadRecord,
};
use std::sync::Arc;

pub async fn handle_command(command: Commands, config: EnergyConfig) -> anyhow::Result<()> {
    match command {
        Commands::Ingest => ingest(&config).await,
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Top { year, limit } => top(&config, year, limit).await,
        Commands::Status => status(&config).await,
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn ingest(config: &EnergyConfig) -> anyhow::Result<()> {
    let store = EnergyStore::from_config(&config.database);
    let fetcher = HttpSourceFetcher::from_config(&config.sources)?;
    let report = IngestPipeline::new(store, Arc::new(fetcher)).run().await?;
    log_ingest_summary(&report);

    for load in &report.loads {
        println!(
            "  {:<30} {:>8} rows",
            load.dataset.table_name(),
            load.rows_inserted
        );
    }
    println!(
        "Loaded {} rows into {} tables in {:.1}s",
        report.total_rows(),
        report.loads.len(),
        report.elapsed.as_secs_f64()
    );
    Ok(())
}

fn log_ingest_summary(report: &IngestReport) {
    tracing::info!(
        tables = report.loads.len(),
        rows = report.total_rows(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Ingestion finished"
    );
}

async fn serve(
    mut config: EnergyConfig,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    let store = EnergyStore::from_config(&config.database);
    store.run_blocking(|s| s.ensure_schema()).await?;
    run_gateway(&config.server, store).await?;
    Ok(())
}

async fn top(config: &EnergyConfig, year: i32, limit: usize) -> anyhow::Result<()> {
    let store = EnergyStore::from_config(&config.database);
    let rows = store
        .run_blocking(move |s| {
            s.ensure_schema()?;
            query_per_capita_energy(s, Some(year), None)
        })
        .await?;
    let records: Vec<_> = rows.into_iter().map(|r| r.record).collect();
    let totals = per_capita_totals(&records, limit);

    if totals.is_empty() {
        println!("No per-capita data for {year}. Run `energy-atlas ingest` first.");
        return Ok(());
    }
    println!("Top {} by per-capita energy use ({year}):", totals.len());
    print!("{}", format_ranking(&totals));
    Ok(())
}

async fn status(config: &EnergyConfig) -> anyhow::Result<()> {
    let store = EnergyStore::from_config(&config.database);
    let loads = store
        .run_blocking(|s| {
            s.ensure_schema()?;
            latest_loads(s)
        })
        .await?;

    println!("Database: {}", store.path().display());
    if loads.is_empty() {
        println!("No tables loaded yet.");
    } else {
        print!("{}", format_loads(&loads));
    }
    Ok(())
}

fn format_ranking(totals: &[EntityTotal]) -> String {
    totals
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "{:>3}. {:<32} {:>12.1} kWh\n",
                i + 1,
                t.entity,
                t.total_per_capita
            )
        })
        .collect()
}

fn format_loads(loads: &[LoadRecord]) -> String {
    loads
        .iter()
        .map(|l| {
            format!(
                "  {:<30} {:>8} rows  loaded {}\n",
                l.table,
                l.row_count,
                l.loaded_at.format("%Y-%m-%d %H:%M:%S UTC")
            )
        })
        .collect()
}
