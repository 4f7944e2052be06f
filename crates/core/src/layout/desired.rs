//! Wire types for the desired layout snapshot and the layout endpoint response.

use serde::{Deserialize, Serialize};

use crate::chart::{ChartView, FurnitureShape};
use crate::layout::change_set::TransactionSummary;
use crate::types::{ChartId, FurnitureId, PersonId};

/// One seat claim nested inside a furniture descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatDescriptor {
    pub seat_index: i32,
    pub person_id: PersonId,
}

/// Desired state of one furniture item.
///
/// `id` refers to persisted furniture. New furniture omits it and may carry a
/// client-chosen `key` so that assignments can reference it before it has an
/// identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureDescriptor {
    #[serde(default)]
    pub id: Option<FurnitureId>,
    #[serde(default)]
    pub key: Option<String>,
    pub kind: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    pub shape: FurnitureShape,
    pub capacity: i32,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub seats: Vec<SeatDescriptor>,
}

/// A seat claim listed outside its furniture descriptor.
///
/// Exactly one of `furniture_id` / `furniture_key` should be set; when both
/// are, the id wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDescriptor {
    #[serde(default)]
    pub furniture_id: Option<FurnitureId>,
    #[serde(default)]
    pub furniture_key: Option<String>,
    pub seat_index: i32,
    pub person_id: PersonId,
}

/// The full submitted snapshot for one chart. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredLayout {
    #[serde(default)]
    pub furniture: Vec<FurnitureDescriptor>,
    #[serde(default)]
    pub assignments: Vec<AssignmentDescriptor>,
}

/// Body of `PATCH /charts/{id}/layout`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    /// Optional echo of the path id; rejected when it disagrees.
    #[serde(default)]
    pub chart_id: Option<ChartId>,
    #[serde(flatten)]
    pub layout: DesiredLayout,
}

/// Body returned by the layout endpoint, on success and on transaction failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutUpdateResponse {
    pub transaction: TransactionSummary,
    pub chart: Option<ChartView>,
}
