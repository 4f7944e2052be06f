//! Route definitions for charts, mounted at `/charts`.

use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::{charts, layout};
use crate::state::AppState;

/// ```text
/// GET    /                   -> list_charts
/// POST   /                   -> create_chart
/// GET    /{id}               -> get_chart
/// PATCH  /{id}               -> update_chart
/// DELETE /{id}               -> delete_chart
/// GET    /{id}/furniture     -> list_furniture
/// GET    /{id}/assignments   -> list_assignments
/// PATCH  /{id}/layout        -> update_layout
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(charts::list_charts).post(charts::create_chart))
        .route(
            "/{id}",
            get(charts::get_chart)
                .patch(charts::update_chart)
                .delete(charts::delete_chart),
        )
        .route("/{id}/furniture", get(charts::list_furniture))
        .route("/{id}/assignments", get(charts::list_assignments))
        .route("/{id}/layout", patch(layout::update_layout))
}
