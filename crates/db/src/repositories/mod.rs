//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads
//! accept `&PgPool` as the first argument; layout writes take an open
//! transaction so that a whole batch commits or rolls back together.

pub mod assignment_repo;
pub mod chart_repo;
pub mod furniture_repo;

pub use assignment_repo::AssignmentRepo;
pub use chart_repo::ChartRepo;
pub use furniture_repo::FurnitureRepo;

/// Shorthand for an open PostgreSQL transaction.
pub type PgTx<'c> = sqlx::Transaction<'c, sqlx::Postgres>;
