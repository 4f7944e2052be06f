//! PostgreSQL implementation of [`ChartStore`].
//!
//! Each `transact_write` call is one database transaction. Transient
//! failures (serialization conflicts, deadlocks, pool exhaustion, I/O) are
//! retried with exponential backoff; a rolled-back transaction is always safe
//! to replay. A `COMMIT` that fails without an answer from the server is never
//! replayed: the transaction may have landed, so the outcome is reported as
//! unknown. Everything else is classified once and returned.

use std::future::Future;
use std::time::Duration;

use seatplan_core::chart::{Assignment, Chart, Furniture};
use seatplan_core::layout::{StoreOp, TransactLimits};
use seatplan_core::store::{ChartStore, StoreError};
use seatplan_core::types::{ChartId, DbId};

use crate::repositories::{AssignmentRepo, ChartRepo, FurnitureRepo};
use crate::DbPool;

/// Tunable parameters for retrying transient database failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`RetryConfig::max_delay`].
pub fn next_delay(current: Duration, config: &RetryConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// How a database failure should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    /// A key, reference or check constraint did not hold.
    Condition,
    /// Worth retrying.
    Transient,
    Fatal,
}

/// Classify a PostgreSQL SQLSTATE code.
fn classify_code(code: &str) -> Failure {
    match code {
        // unique_violation, foreign_key_violation, check_violation
        "23505" | "23503" | "23514" => Failure::Condition,
        // serialization_failure, deadlock_detected, too_many_connections
        "40001" | "40P01" | "53300" => Failure::Transient,
        _ => Failure::Fatal,
    }
}

fn classify(err: &sqlx::Error) -> Failure {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .as_deref()
            .map_or(Failure::Fatal, classify_code),
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => Failure::Transient,
        _ => Failure::Fatal,
    }
}

/// A failed attempt at a store call.
#[derive(Debug)]
enum AttemptError {
    Sql(sqlx::Error),
    /// An update or delete found no row to act on.
    Missing(String),
    /// `COMMIT` was sent but no verdict came back.
    Commit(sqlx::Error),
}

impl AttemptError {
    /// Wrap an error returned by `tx.commit()`.
    ///
    /// A database error means the server answered and rolled back, so the
    /// attempt is as replayable as any other. Anything else leaves the
    /// outcome unknown.
    fn from_commit(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(_) => Self::Sql(err),
            other => Self::Commit(other),
        }
    }
}

impl From<sqlx::Error> for AttemptError {
    fn from(err: sqlx::Error) -> Self {
        Self::Sql(err)
    }
}

/// What to do after a failed attempt.
#[derive(Debug, PartialEq)]
enum NextStep {
    Retry,
    Fail(StoreError),
}

/// Decide whether attempt number `tries` may be repeated.
fn next_step(err: &AttemptError, tries: u32, config: &RetryConfig) -> NextStep {
    let err = match err {
        AttemptError::Missing(what) => {
            return NextStep::Fail(StoreError::ConditionFailed(what.clone()))
        }
        AttemptError::Commit(err) => {
            return NextStep::Fail(StoreError::Unavailable(format!(
                "commit outcome unknown, the batch may have been applied: {err}"
            )))
        }
        AttemptError::Sql(err) => err,
    };

    match classify(err) {
        Failure::Condition => NextStep::Fail(StoreError::ConditionFailed(err.to_string())),
        Failure::Fatal => NextStep::Fail(StoreError::Backend(err.to_string())),
        Failure::Transient if tries >= config.max_attempts => {
            NextStep::Fail(StoreError::Unavailable(err.to_string()))
        }
        Failure::Transient => NextStep::Retry,
    }
}

/// [`ChartStore`] backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgChartStore {
    pool: DbPool,
    limits: TransactLimits,
    retry: RetryConfig,
}

impl PgChartStore {
    pub fn new(pool: DbPool, limits: TransactLimits) -> Self {
        Self {
            pool,
            limits,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Run `attempt` until it succeeds, fails permanently, or retries run out.
    async fn retrying<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let mut delay = self.retry.initial_delay;
        let mut tries = 0u32;

        loop {
            tries += 1;
            let err = match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match next_step(&err, tries, &self.retry) {
                NextStep::Retry => {
                    tracing::warn!(
                        operation,
                        attempt = tries,
                        delay_ms = delay.as_millis() as u64,
                        error = ?err,
                        "Transient database failure, retrying",
                    );
                    tokio::time::sleep(delay).await;
                    delay = next_delay(delay, &self.retry);
                }
                NextStep::Fail(failure) => {
                    match &failure {
                        StoreError::ConditionFailed(_) => {
                            tracing::debug!(operation, error = %failure, "Store condition failed")
                        }
                        StoreError::Unavailable(_) => {
                            tracing::warn!(operation, tries, error = %failure, "Store unavailable")
                        }
                        StoreError::Backend(_) => {
                            tracing::error!(operation, error = %failure, "Database error")
                        }
                    }
                    return Err(failure);
                }
            }
        }
    }

    /// Apply `ops` in one transaction. Dropping `tx` on error rolls it back.
    async fn apply(&self, ops: &[StoreOp]) -> Result<(), AttemptError> {
        let mut tx = self.pool.begin().await?;

        for op in ops {
            let applied = match op {
                StoreOp::CreateFurniture(f) => {
                    FurnitureRepo::insert(&mut tx, f).await?;
                    true
                }
                StoreOp::UpdateFurniture(f) => FurnitureRepo::update(&mut tx, f).await?,
                StoreOp::DeleteFurniture(f) => {
                    FurnitureRepo::delete(&mut tx, f.chart_id, f.furniture_id).await?
                }
                StoreOp::CreateAssignment(a) => {
                    AssignmentRepo::insert(&mut tx, a).await?;
                    true
                }
                StoreOp::UpdateAssignment(a) => AssignmentRepo::update(&mut tx, a).await?,
                StoreOp::DeleteAssignment(a) => AssignmentRepo::delete(&mut tx, a).await?,
            };
            if !applied {
                return Err(AttemptError::Missing(describe_missing(op)));
            }
        }

        tx.commit().await.map_err(AttemptError::from_commit)?;
        Ok(())
    }
}

fn describe_missing(op: &StoreOp) -> String {
    match op {
        StoreOp::CreateFurniture(f) | StoreOp::UpdateFurniture(f) | StoreOp::DeleteFurniture(f) => {
            format!("{}: furniture {} does not exist", op.kind(), f.furniture_id)
        }
        StoreOp::CreateAssignment(a)
        | StoreOp::UpdateAssignment(a)
        | StoreOp::DeleteAssignment(a) => {
            format!("{}: seat {} is not occupied", op.kind(), a.seat())
        }
    }
}

impl ChartStore for PgChartStore {
    async fn find_chart(&self, user_id: DbId, chart_id: ChartId) -> Result<Option<Chart>, StoreError> {
        self.retrying("find_chart", || async {
            Ok(ChartRepo::find_owned(&self.pool, user_id, chart_id).await?)
        })
        .await
    }

    async fn list_furniture(&self, chart_id: ChartId) -> Result<Vec<Furniture>, StoreError> {
        self.retrying("list_furniture", || async {
            Ok(FurnitureRepo::list_by_chart(&self.pool, chart_id).await?)
        })
        .await
    }

    async fn list_assignments(&self, chart_id: ChartId) -> Result<Vec<Assignment>, StoreError> {
        self.retrying("list_assignments", || async {
            Ok(AssignmentRepo::list_by_chart(&self.pool, chart_id).await?)
        })
        .await
    }

    async fn transact_write(&self, ops: &[StoreOp]) -> Result<(), StoreError> {
        if ops.len() > self.limits.max_items {
            return Err(StoreError::Backend(format!(
                "{} operations exceed the limit of {}",
                ops.len(),
                self.limits.max_items
            )));
        }
        self.retrying("transact_write", || self.apply(ops)).await
    }

    fn limits(&self) -> TransactLimits {
        self.limits
    }
}
