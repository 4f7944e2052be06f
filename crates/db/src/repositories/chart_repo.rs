//! Repository for the `charts` table.
//!
//! Every lookup is scoped by owner: a chart owned by another user behaves
//! exactly like a chart that does not exist.

use sqlx::PgPool;
use uuid::Uuid;
use seatplan_core::chart::Chart;
use seatplan_core::types::{ChartId, DbId};

use crate::models::chart::{ChartRow, CreateChart, UpdateChart};

/// Column list for `charts` queries.
const COLUMNS: &str = "chart_id, user_id, name, metadata, created_at, updated_at";

/// Provides CRUD operations for charts.
pub struct ChartRepo;

impl ChartRepo {
    /// Insert a new chart for `user_id` under a fresh UUIDv7.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateChart,
    ) -> Result<Chart, sqlx::Error> {
        let query = format!(
            "INSERT INTO charts (chart_id, user_id, name, metadata) \
             VALUES ($1, $2, $3, COALESCE($4, '{{}}'::jsonb)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ChartRow>(&query)
            .bind(Uuid::now_v7())
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
            .map(Chart::from)
    }

    /// List the charts owned by `user_id`, most recently updated first.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Chart>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM charts \
             WHERE user_id = $1 \
             ORDER BY updated_at DESC, chart_id"
        );
        let rows = sqlx::query_as::<_, ChartRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(Chart::from).collect())
    }

    /// Find a chart by id if it is owned by `user_id`.
    pub async fn find_owned(
        pool: &PgPool,
        user_id: DbId,
        chart_id: ChartId,
    ) -> Result<Option<Chart>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM charts WHERE chart_id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, ChartRow>(&query)
            .bind(chart_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Chart::from))
    }

    /// Partially update a chart.
    ///
    /// Uses `COALESCE` so only provided fields are changed. Returns `None`
    /// when the chart does not exist or is owned by someone else.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        chart_id: ChartId,
        input: &UpdateChart,
    ) -> Result<Option<Chart>, sqlx::Error> {
        let query = format!(
            "UPDATE charts SET \
                 name       = COALESCE($3, name), \
                 metadata   = COALESCE($4, metadata), \
                 updated_at = NOW() \
             WHERE chart_id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, ChartRow>(&query)
            .bind(chart_id)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.metadata)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(Chart::from))
    }

    /// Delete a chart together with its furniture and assignments.
    ///
    /// Runs in one transaction, children first. Returns `true` if the chart
    /// existed and was owned by `user_id`.
    pub async fn delete(
        pool: &PgPool,
        user_id: DbId,
        chart_id: ChartId,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let owned = sqlx::query("SELECT 1 FROM charts WHERE chart_id = $1 AND user_id = $2 FOR UPDATE")
            .bind(chart_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !owned {
            return Ok(false);
        }

        let assignments = sqlx::query("DELETE FROM assignments WHERE chart_id = $1")
            .bind(chart_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let furniture = sqlx::query("DELETE FROM furniture WHERE chart_id = $1")
            .bind(chart_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM charts WHERE chart_id = $1")
            .bind(chart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(%chart_id, furniture, assignments, "Deleted chart");
        Ok(true)
    }
}
