//! Repository for the `assignments` table.

use sqlx::PgPool;
use seatplan_core::chart::Assignment;
use seatplan_core::types::ChartId;

use super::PgTx;
use crate::models::assignment::AssignmentRow;

/// Column list for `assignments` queries.
const COLUMNS: &str = "chart_id, furniture_id, seat_index, person_id";

/// Provides data access for seat assignments.
pub struct AssignmentRepo;

impl AssignmentRepo {
    /// All assignments on a chart, grouped by furniture and ordered by seat.
    pub async fn list_by_chart(
        pool: &PgPool,
        chart_id: ChartId,
    ) -> Result<Vec<Assignment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assignments \
             WHERE chart_id = $1 \
             ORDER BY furniture_id, seat_index"
        );
        let rows = sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(chart_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(Assignment::from).collect())
    }

    /// Seat a person. Fails with a unique violation if the seat is taken and
    /// with a foreign key violation if the furniture does not exist.
    pub async fn insert(tx: &mut PgTx<'_>, assignment: &Assignment) -> Result<(), sqlx::Error> {
        let query = format!("INSERT INTO assignments ({COLUMNS}) VALUES ($1, $2, $3, $4)");
        sqlx::query(&query)
            .bind(assignment.chart_id)
            .bind(assignment.furniture_id)
            .bind(assignment.seat_index)
            .bind(&assignment.person_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Replace the person on an occupied seat.
    ///
    /// Returns `true` if the seat was occupied.
    pub async fn update(tx: &mut PgTx<'_>, assignment: &Assignment) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE assignments SET person_id = $4, updated_at = NOW() \
             WHERE chart_id = $1 AND furniture_id = $2 AND seat_index = $3",
        )
        .bind(assignment.chart_id)
        .bind(assignment.furniture_id)
        .bind(assignment.seat_index)
        .bind(&assignment.person_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Vacate a seat.
    ///
    /// Returns `true` if the seat was occupied.
    pub async fn delete(tx: &mut PgTx<'_>, assignment: &Assignment) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM assignments \
             WHERE chart_id = $1 AND furniture_id = $2 AND seat_index = $3",
        )
        .bind(assignment.chart_id)
        .bind(assignment.furniture_id)
        .bind(assignment.seat_index)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
