//! Furniture row model.
//!
//! The shape is stored flattened (`shape_form`, `shape_width`,
//! `shape_height`) and regrouped on conversion.

use sqlx::FromRow;
use seatplan_core::chart::{Furniture, FurnitureShape};
use seatplan_core::types::{ChartId, FurnitureId};

/// A row from the `furniture` table.
#[derive(Debug, Clone, FromRow)]
pub struct FurnitureRow {
    pub chart_id: ChartId,
    pub furniture_id: FurnitureId,
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub shape_form: String,
    pub shape_width: f64,
    pub shape_height: f64,
    pub capacity: i32,
    pub label: Option<String>,
}

impl From<FurnitureRow> for Furniture {
    fn from(row: FurnitureRow) -> Self {
        Self {
            furniture_id: row.furniture_id,
            chart_id: row.chart_id,
            kind: row.kind,
            x: row.x,
            y: row.y,
            rotation: row.rotation,
            shape: FurnitureShape {
                form: row.shape_form,
                width: row.shape_width,
                height: row.shape_height,
            },
            capacity: row.capacity,
            label: row.label,
        }
    }
}
