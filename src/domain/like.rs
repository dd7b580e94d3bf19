use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A per-user like row. Composite key (product_id, user_id); created at
/// most once per pair and only ever deleted, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub product_id: i64,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
