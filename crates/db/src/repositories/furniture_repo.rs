//! Repository for the `furniture` table.

use sqlx::PgPool;
use seatplan_core::chart::Furniture;
use seatplan_core::types::{ChartId, FurnitureId};

use super::PgTx;
use crate::models::furniture::FurnitureRow;

/// Column list for `furniture` queries.
const COLUMNS: &str = "\
    chart_id, furniture_id, kind, x, y, rotation, \
    shape_form, shape_width, shape_height, capacity, label";

/// Provides data access for furniture.
pub struct FurnitureRepo;

impl FurnitureRepo {
    /// All furniture on a chart, oldest first.
    pub async fn list_by_chart(
        pool: &PgPool,
        chart_id: ChartId,
    ) -> Result<Vec<Furniture>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM furniture \
             WHERE chart_id = $1 \
             ORDER BY created_at, furniture_id"
        );
        let rows = sqlx::query_as::<_, FurnitureRow>(&query)
            .bind(chart_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(Furniture::from).collect())
    }

    /// Insert furniture. Fails with a unique violation if the id is taken.
    pub async fn insert(tx: &mut PgTx<'_>, furniture: &Furniture) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT INTO furniture ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        );
        sqlx::query(&query)
            .bind(furniture.chart_id)
            .bind(furniture.furniture_id)
            .bind(&furniture.kind)
            .bind(furniture.x)
            .bind(furniture.y)
            .bind(furniture.rotation)
            .bind(&furniture.shape.form)
            .bind(furniture.shape.width)
            .bind(furniture.shape.height)
            .bind(furniture.capacity)
            .bind(&furniture.label)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Overwrite every attribute of existing furniture.
    ///
    /// Returns `true` if the row existed.
    pub async fn update(tx: &mut PgTx<'_>, furniture: &Furniture) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE furniture SET \
                 kind = $3, x = $4, y = $5, rotation = $6, \
                 shape_form = $7, shape_width = $8, shape_height = $9, \
                 capacity = $10, label = $11, updated_at = NOW() \
             WHERE chart_id = $1 AND furniture_id = $2",
        )
        .bind(furniture.chart_id)
        .bind(furniture.furniture_id)
        .bind(&furniture.kind)
        .bind(furniture.x)
        .bind(furniture.y)
        .bind(furniture.rotation)
        .bind(&furniture.shape.form)
        .bind(furniture.shape.width)
        .bind(furniture.shape.height)
        .bind(furniture.capacity)
        .bind(&furniture.label)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete furniture. Fails with a foreign key violation while any
    /// assignment still references it.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(
        tx: &mut PgTx<'_>,
        chart_id: ChartId,
        furniture_id: FurnitureId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM furniture WHERE chart_id = $1 AND furniture_id = $2")
            .bind(chart_id)
            .bind(furniture_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
