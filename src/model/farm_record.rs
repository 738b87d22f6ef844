use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One row of the durable key-value table. `value` holds JSON text.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FarmRecord {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
