//! # Query API
//!
//! Read-only HTTP/JSON surface over the store, built on axum. One endpoint per
//! fact table plus `/api/status` (load history) and `/health`.

mod params;
mod server;

pub use params::FilterParams;
pub use server::{ApiError, ApiState, router as gateway_router, run as run_gateway};
