//! Shared response envelope types for API handlers.
//!
//! Chart CRUD responses use a `{ "data": ... }` envelope. The layout endpoint
//! is the exception: it returns `{ "transaction": ..., "chart": ... }` as is.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: charts }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
