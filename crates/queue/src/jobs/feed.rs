//! Feed fan-out job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Fan a new public note out to the author's followers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct FeedJob {
    #[validate(range(min = 1))]
    pub author_id: i64,

    #[validate(range(min = 1))]
    pub note_id: i64,

    /// Unix seconds on the wire.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub post_time: DateTime<Utc>,
}

impl FeedJob {
    /// Create a new feed job.
    #[must_use]
    pub const fn new(author_id: i64, note_id: i64, post_time: DateTime<Utc>) -> Self {
        Self {
            author_id,
            note_id,
            post_time,
        }
    }
}
