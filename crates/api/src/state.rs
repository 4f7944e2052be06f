use std::sync::Arc;

use seatplan_db::{DbPool, PgChartStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Entity store used by layout reconciliation. Shares `pool`.
    pub store: PgChartStore,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, config: ServerConfig) -> Self {
        let store = PgChartStore::new(pool.clone(), config.transact_limits);
        Self {
            pool,
            store,
            config: Arc::new(config),
        }
    }
}
