//! `GET /health`: liveness plus the settings layout writes run under.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use seatplan_core::layout::TransactLimits;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutLimits {
    pub max_items_per_batch: usize,
    pub max_bytes_per_batch: usize,
}

impl From<TransactLimits> for LayoutLimits {
    fn from(limits: TransactLimits) -> Self {
        Self {
            max_items_per_batch: limits.max_items,
            max_bytes_per_batch: limits.max_bytes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database cannot be queried.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Newest applied migration; absent when the database is unreachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<i64>,
    pub layout_limits: LayoutLimits,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (db_healthy, schema_version) = match seatplan_db::schema_version(&state.pool).await {
        Ok(version) => (true, version),
        Err(err) => {
            tracing::warn!(error = %err, "Health check could not reach the chart database");
            (false, None)
        }
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        schema_version,
        layout_limits: state.config.transact_limits.into(),
    })
}

/// Served at the root, outside `/api/v1`, and without authentication.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
