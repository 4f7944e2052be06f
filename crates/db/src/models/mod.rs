//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` struct matching the database row, convertible into the
//!   corresponding `seatplan_core::chart` type
//! - `Deserialize` DTOs for inserts and patches where the API accepts them

pub mod assignment;
pub mod chart;
pub mod furniture;
