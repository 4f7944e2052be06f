//! The layout endpoint: replace a chart's furniture and seating in one call.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use seatplan_core::error::CoreError;
use seatplan_core::layout::{reconcile_layout, LayoutRequest, LayoutUpdateResponse};
use seatplan_core::types::ChartId;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// PATCH /api/v1/charts/{id}/layout
///
/// Accepts the full desired layout and reconciles persisted state toward it.
/// Responds with `{ transaction, chart }`; failures that reached the store
/// use the same shape with `chart: null` (see [`AppError`]).
///
/// Reconciliation runs on its own task so that a client disconnect or request
/// timeout cannot stop it between batches.
pub async fn update_layout(
    user: AuthUser,
    State(state): State<AppState>,
    Path(chart_id): Path<ChartId>,
    Json(request): Json<LayoutRequest>,
) -> AppResult<impl IntoResponse> {
    if let Some(body_id) = request.chart_id {
        if body_id != chart_id {
            return Err(AppError::Core(CoreError::Validation(format!(
                "chartId {body_id} does not match the chart in the path"
            ))));
        }
    }

    tracing::debug!(
        %chart_id,
        user_id = user.user_id,
        furniture = request.layout.furniture.len(),
        assignments = request.layout.assignments.len(),
        "Layout update requested",
    );

    let store = state.store.clone();
    let layout = request.layout;
    let result = tokio::spawn(async move {
        reconcile_layout(&store, user.user_id, chart_id, &layout).await
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Layout task failed: {e}")))??;

    Ok(Json(LayoutUpdateResponse::from(result)))
}
