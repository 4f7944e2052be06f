//! Chart, furniture and seat assignment types.
//!
//! A chart is the root of a one-to-many-to-many hierarchy: furniture carries
//! its `chart_id`, and assignments carry both `chart_id` and `furniture_id`.
//! Persons live in an external directory and are only referenced by id.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{ChartId, DbId, FurnitureId, PersonId, Timestamp};

// ---------------------------------------------------------------------------
// Furniture kind / shape constants
// ---------------------------------------------------------------------------

/// Recognised furniture kinds.
pub mod furniture_kinds {
    pub const TABLE: &str = "table";
    pub const DESK: &str = "desk";
    pub const BENCH: &str = "bench";
    pub const CHAIR: &str = "chair";
    pub const SOFA: &str = "sofa";

    /// All recognised furniture kinds.
    pub const ALL: &[&str] = &[TABLE, DESK, BENCH, CHAIR, SOFA];
}

/// Recognised shape outlines.
pub mod shape_forms {
    pub const RECT: &str = "rect";
    pub const ROUND: &str = "round";
    pub const OVAL: &str = "oval";

    /// All recognised shape outlines.
    pub const ALL: &[&str] = &[RECT, ROUND, OVAL];
}

/// Upper bound on seats a single furniture item may declare.
pub const MAX_CAPACITY: i32 = 64;

/// Maximum length of a chart name.
pub const MAX_CHART_NAME_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A named seating layout belonging to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub chart_id: ChartId,
    pub user_id: DbId,
    pub name: String,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Outline and footprint of a furniture item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureShape {
    pub form: String,
    pub width: f64,
    pub height: f64,
}

/// A placed seating object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Furniture {
    pub furniture_id: FurnitureId,
    pub chart_id: ChartId,
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub shape: FurnitureShape,
    pub capacity: i32,
    pub label: Option<String>,
}

impl Furniture {
    /// Whether every persisted attribute other than identity matches `other`.
    pub fn same_attributes(&self, other: &Furniture) -> bool {
        self.kind == other.kind
            && self.x == other.x
            && self.y == other.y
            && self.rotation == other.rotation
            && self.shape == other.shape
            && self.capacity == other.capacity
            && self.label == other.label
    }
}

/// Identity of a seat: one seat index on one furniture item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatKey {
    pub furniture_id: FurnitureId,
    pub seat_index: i32,
}

impl std::fmt::Display for SeatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.furniture_id, self.seat_index)
    }
}

/// A binding of one person to one seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub chart_id: ChartId,
    pub furniture_id: FurnitureId,
    pub seat_index: i32,
    pub person_id: PersonId,
}

impl Assignment {
    pub fn seat(&self) -> SeatKey {
        SeatKey {
            furniture_id: self.furniture_id,
            seat_index: self.seat_index,
        }
    }
}

/// A chart together with everything placed on it.
///
/// This is both what the snapshot loader returns and what the layout
/// endpoint sends back after a successful reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartView {
    pub chart: Chart,
    pub furniture: Vec<Furniture>,
    pub assignments: Vec<Assignment>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check whether a furniture kind string is recognised.
pub fn is_valid_kind(kind: &str) -> bool {
    furniture_kinds::ALL.contains(&kind)
}

/// Check whether a shape form string is recognised.
pub fn is_valid_form(form: &str) -> bool {
    shape_forms::ALL.contains(&form)
}

/// Validate a chart name for create/rename.
pub fn validate_chart_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Chart name must not be empty".into()));
    }
    if trimmed.len() > MAX_CHART_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Chart name must be at most {MAX_CHART_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate chart metadata: must be a JSON object when present.
pub fn validate_metadata(metadata: &serde_json::Value) -> Result<(), CoreError> {
    if metadata.is_object() {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "metadata must be a JSON object".to_string(),
        ))
    }
}
