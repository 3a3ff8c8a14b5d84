//! AI task job.

use engage_core::AiTask;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Generate a title or summary for a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AiJob {
    #[validate(range(min = 1))]
    pub note_id: i64,

    pub task: AiTask,
}

impl AiJob {
    /// Create a new AI job.
    #[must_use]
    pub const fn new(note_id: i64, task: AiTask) -> Self {
        Self { note_id, task }
    }
}
