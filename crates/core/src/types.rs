use uuid::Uuid;

/// User primary keys are PostgreSQL BIGSERIAL (issued by the identity service).
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifies a chart.
pub type ChartId = Uuid;

/// Identifies a furniture item within a chart.
pub type FurnitureId = Uuid;

/// Reference into the external person directory. Never owned here.
pub type PersonId = String;
