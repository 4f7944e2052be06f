use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Map, Value};
use seatplan_core::error::CoreError;
use seatplan_core::layout::{PlanError, ReconcileError};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors, [`ReconcileError`] for layout
/// updates, and adds HTTP-specific variants. Implements [`IntoResponse`] to
/// produce consistent JSON error responses of the form
/// `{ "error": message, "code": CODE, ...extra }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `seatplan_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A layout update failure.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Status, code, message and any extra body fields for an error response.
type ErrorParts = (StatusCode, &'static str, String, Map<String, Value>);

fn plain(status: StatusCode, code: &'static str, message: String) -> ErrorParts {
    (status, code, message, Map::new())
}

fn internal() -> ErrorParts {
    plain(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, extra) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => plain(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    plain(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    plain(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
            },

            // --- Layout updates ---
            AppError::Reconcile(err) => classify_reconcile_error(err),

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let mut body = Map::new();
        body.insert("error".into(), Value::String(message));
        body.insert("code".into(), Value::String(code.into()));
        body.extend(extra);

        (status, axum::Json(Value::Object(body))).into_response()
    }
}

/// Classify a layout update failure.
///
/// Rejections before any write carry a `details` array. Failures that reached
/// the store carry the `transaction` counts of what committed and
/// `chart: null`, matching the success body shape.
fn classify_reconcile_error(err: &ReconcileError) -> ErrorParts {
    match err {
        ReconcileError::NotFound(chart_id) => plain(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Chart with id {chart_id} not found"),
        ),
        ReconcileError::Plan(plan) => {
            let (status, code, details) = match plan {
                PlanError::Validation(issues) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", json!(issues))
                }
                PlanError::Capacity(violations) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "CAPACITY_ERROR",
                    json!(violations),
                ),
                PlanError::PayloadTooLarge { .. } => {
                    (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", json!([]))
                }
            };
            let mut extra = Map::new();
            extra.insert("details".into(), details);
            (status, code, plan.to_string(), extra)
        }
        ReconcileError::Store(_) | ReconcileError::PartialTransaction { .. } => {
            let (status, code) = match err {
                ReconcileError::PartialTransaction { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "PARTIAL_TRANSACTION")
                }
                _ => (StatusCode::SERVICE_UNAVAILABLE, "STORE_ERROR"),
            };
            let mut extra = Map::new();
            extra.insert("transaction".into(), json!(err.transaction_summary()));
            extra.insert("chart".into(), Value::Null);
            (status, code, err.to_string(), extra)
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> ErrorParts {
    match err {
        sqlx::Error::RowNotFound => plain(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            plain(
                StatusCode::CONFLICT,
                "CONFLICT",
                format!("Duplicate value violates unique constraint: {constraint}"),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
