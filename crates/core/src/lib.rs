//! Seating chart domain core.
//!
//! Holds the domain types shared by the database, API and client crates,
//! together with the layout reconciliation engine: the pure diff planner,
//! batch partitioning, and the loader/executor that drive a [`store::ChartStore`].

pub mod chart;
pub mod error;
pub mod layout;
pub mod store;
pub mod types;
