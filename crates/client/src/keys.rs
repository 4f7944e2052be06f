//! Cache keys, one per server query the client issues.

use seatplan_core::types::ChartId;

/// Identifies one cached query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// `GET /charts`: the caller's chart list.
    Charts,
    /// `GET /charts/{id}`: a chart with its furniture and assignments.
    Chart(ChartId),
    /// `GET /charts/{id}/furniture`.
    Furniture(ChartId),
    /// `GET /charts/{id}/assignments`.
    Assignments(ChartId),
}

impl QueryKey {
    /// The chart this key is scoped to, if any.
    pub fn chart_id(&self) -> Option<ChartId> {
        match self {
            QueryKey::Charts => None,
            QueryKey::Chart(id) | QueryKey::Furniture(id) | QueryKey::Assignments(id) => Some(*id),
        }
    }

    /// Every key derived from one chart's layout.
    pub fn chart_scope(chart_id: ChartId) -> [QueryKey; 3] {
        [
            QueryKey::Chart(chart_id),
            QueryKey::Furniture(chart_id),
            QueryKey::Assignments(chart_id),
        ]
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryKey::Charts => write!(f, "charts"),
            QueryKey::Chart(id) => write!(f, "chart:{id}"),
            QueryKey::Furniture(id) => write!(f, "furniture:{id}"),
            QueryKey::Assignments(id) => write!(f, "assignments:{id}"),
        }
    }
}
