pub mod charts;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /charts                                          list, create
/// /charts/{id}                                     get (with layout), update, delete
/// /charts/{id}/furniture                           list furniture
/// /charts/{id}/assignments                         list assignments
/// /charts/{id}/layout                              reconcile layout (PATCH)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/charts", charts::router())
}
