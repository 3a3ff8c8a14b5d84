//! History job.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Record a note view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct HistoryJob {
    #[validate(range(min = 1))]
    pub user_id: i64,

    #[validate(range(min = 1))]
    pub note_id: i64,
}

impl HistoryJob {
    /// Create a new history job.
    #[must_use]
    pub const fn new(user_id: i64, note_id: i64) -> Self {
        Self { user_id, note_id }
    }
}
