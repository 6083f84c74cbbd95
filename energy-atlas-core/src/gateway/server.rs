//! HTTP query server built on axum.

use super::params::FilterParams;
use crate::config::ServerConfig;
use crate::error::EnergyError;
use crate::records::{
    GlobalEnergySubstitutionRecord, PerCapitaEnergyRecord, ShareRenewablesRecord, StoredRecord,
};
use crate::store::{
    EnergyStore, latest_loads, query_global_energy_substitution, query_per_capita_energy,
    query_share_renewables,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Shared state for the query handlers.
#[derive(Debug, Clone)]
pub struct ApiState {
    store: EnergyStore,
    started_at: Instant,
}

impl ApiState {
    pub fn new(store: EnergyStore) -> Self {
        Self {
            store,
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &EnergyStore {
        &self.store
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Error response: 400 for bad filter values, 500 for everything else.
#[derive(Debug)]
pub struct ApiError(pub EnergyError);

impl From<EnergyError> for ApiError {
    fn from(err: EnergyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            EnergyError::QueryValidation { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "Query failed");
        } else {
            debug!(error = %self.0, "Rejected query");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build the query API router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/api/global_energy_substitution",
            get(global_energy_substitution_handler),
        )
        .route("/api/share_renewables", get(share_renewables_handler))
        .route("/api/per_capita_energy", get(per_capita_energy_handler))
        .route("/api/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn global_energy_substitution_handler(
    State(state): State<ApiState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Vec<StoredRecord<GlobalEnergySubstitutionRecord>>> {
    let year = params.year()?;
    let rows = state
        .store
        .run_blocking(move |s| query_global_energy_substitution(s, year))
        .await?;
    Ok(Json(rows))
}

async fn share_renewables_handler(
    State(state): State<ApiState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Vec<StoredRecord<ShareRenewablesRecord>>> {
    let year = params.year()?;
    let rows = state
        .store
        .run_blocking(move |s| query_share_renewables(s, year))
        .await?;
    Ok(Json(rows))
}

async fn per_capita_energy_handler(
    State(state): State<ApiState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Vec<StoredRecord<PerCapitaEnergyRecord>>> {
    let year = params.year()?;
    let entity = params.entity();
    let rows = state
        .store
        .run_blocking(move |s| query_per_capita_energy(s, year, entity.as_deref()))
        .await?;
    Ok(Json(rows))
}

/// Most recent load of each table.
async fn status_handler(State(state): State<ApiState>) -> ApiResult<serde_json::Value> {
    let loads = state.store.run_blocking(latest_loads).await?;
    Ok(Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "tables": loads,
    })))
}

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "uptime_secs": state.uptime_secs(),
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Serve the query API on the configured address until Ctrl-C.
pub async fn run(config: &ServerConfig, store: EnergyStore) -> Result<(), std::io::Error> {
    let app = router(ApiState::new(store));
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Query API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
