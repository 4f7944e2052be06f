//! Handlers for chart CRUD and the per-chart furniture/assignment reads.
//!
//! Every handler is scoped to the authenticated user; a chart owned by
//! someone else is reported as not found.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use seatplan_core::chart::{validate_chart_name, validate_metadata, Chart, ChartView};
use seatplan_core::error::CoreError;
use seatplan_core::types::ChartId;
use seatplan_db::models::chart::{CreateChart, DeletedChart, UpdateChart};
use seatplan_db::repositories::{AssignmentRepo, ChartRepo, FurnitureRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

fn chart_not_found(chart_id: ChartId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Chart",
        id: chart_id.to_string(),
    })
}

/// Load a chart owned by the caller or fail with 404.
async fn owned_chart(state: &AppState, user: AuthUser, chart_id: ChartId) -> AppResult<Chart> {
    ChartRepo::find_owned(&state.pool, user.user_id, chart_id)
        .await?
        .ok_or_else(|| chart_not_found(chart_id))
}

/// POST /api/v1/charts
pub async fn create_chart(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateChart>,
) -> AppResult<impl IntoResponse> {
    validate_chart_name(&input.name)?;
    if let Some(metadata) = &input.metadata {
        validate_metadata(metadata)?;
    }

    let chart = ChartRepo::create(&state.pool, user.user_id, &input).await?;

    tracing::info!(
        chart_id = %chart.chart_id,
        user_id = user.user_id,
        name = %chart.name,
        "Chart created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: chart })))
}

/// GET /api/v1/charts
pub async fn list_charts(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let charts = ChartRepo::list_by_user(&state.pool, user.user_id).await?;
    Ok(Json(DataResponse { data: charts }))
}

/// GET /api/v1/charts/{id}
///
/// Returns the chart with its furniture and assignments.
pub async fn get_chart(
    user: AuthUser,
    State(state): State<AppState>,
    Path(chart_id): Path<ChartId>,
) -> AppResult<impl IntoResponse> {
    let chart = owned_chart(&state, user, chart_id).await?;
    let (furniture, assignments) = tokio::try_join!(
        FurnitureRepo::list_by_chart(&state.pool, chart_id),
        AssignmentRepo::list_by_chart(&state.pool, chart_id),
    )?;

    Ok(Json(DataResponse {
        data: ChartView {
            chart,
            furniture,
            assignments,
        },
    }))
}

/// PATCH /api/v1/charts/{id}
pub async fn update_chart(
    user: AuthUser,
    State(state): State<AppState>,
    Path(chart_id): Path<ChartId>,
    Json(input): Json<UpdateChart>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.name {
        validate_chart_name(name)?;
    }
    if let Some(metadata) = &input.metadata {
        validate_metadata(metadata)?;
    }

    let chart = ChartRepo::update(&state.pool, user.user_id, chart_id, &input)
        .await?
        .ok_or_else(|| chart_not_found(chart_id))?;

    tracing::info!(%chart_id, user_id = user.user_id, "Chart updated");

    Ok(Json(DataResponse { data: chart }))
}

/// DELETE /api/v1/charts/{id}
///
/// Removes the chart with all of its furniture and assignments.
pub async fn delete_chart(
    user: AuthUser,
    State(state): State<AppState>,
    Path(chart_id): Path<ChartId>,
) -> AppResult<impl IntoResponse> {
    if !ChartRepo::delete(&state.pool, user.user_id, chart_id).await? {
        return Err(chart_not_found(chart_id));
    }

    tracing::info!(%chart_id, user_id = user.user_id, "Chart deleted");

    Ok(Json(DataResponse {
        data: DeletedChart {
            user_id: user.user_id,
            chart_id,
        },
    }))
}

/// GET /api/v1/charts/{id}/furniture
pub async fn list_furniture(
    user: AuthUser,
    State(state): State<AppState>,
    Path(chart_id): Path<ChartId>,
) -> AppResult<impl IntoResponse> {
    owned_chart(&state, user, chart_id).await?;
    let furniture = FurnitureRepo::list_by_chart(&state.pool, chart_id).await?;
    Ok(Json(DataResponse { data: furniture }))
}

/// GET /api/v1/charts/{id}/assignments
pub async fn list_assignments(
    user: AuthUser,
    State(state): State<AppState>,
    Path(chart_id): Path<ChartId>,
) -> AppResult<impl IntoResponse> {
    owned_chart(&state, user, chart_id).await?;
    let assignments = AssignmentRepo::list_by_chart(&state.pool, chart_id).await?;
    Ok(Json(DataResponse { data: assignments }))
}
