//! Chart models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use seatplan_core::chart::Chart;
use seatplan_core::types::{ChartId, DbId, Timestamp};

// ---------------------------------------------------------------------------
// Entity struct (database row)
// ---------------------------------------------------------------------------

/// A row from the `charts` table.
#[derive(Debug, Clone, FromRow)]
pub struct ChartRow {
    pub chart_id: ChartId,
    pub user_id: DbId,
    pub name: String,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ChartRow> for Chart {
    fn from(row: ChartRow) -> Self {
        Self {
            chart_id: row.chart_id,
            user_id: row.user_id,
            name: row.name,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

/// DTO for creating a chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChart {
    pub name: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// DTO for partially updating a chart. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChart {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Identifies a deleted chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedChart {
    pub user_id: DbId,
    pub chart_id: ChartId,
}
