//! Favorite job.

use engage_core::FavoriteAction;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Add or remove a favorite edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct FavoriteJob {
    #[validate(range(min = 1))]
    pub user_id: i64,

    #[validate(range(min = 1))]
    pub note_id: i64,

    pub action: FavoriteAction,
}

impl FavoriteJob {
    /// Create a new favorite job.
    #[must_use]
    pub const fn new(user_id: i64, note_id: i64, action: FavoriteAction) -> Self {
        Self {
            user_id,
            note_id,
            action,
        }
    }
}
