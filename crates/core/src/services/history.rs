//! View history service.

use chrono::Utc;
use engage_common::AppResult;
use engage_db::repositories::NoteHistoryRepository;

/// Persists note views.
#[derive(Clone)]
pub struct HistoryService {
    history: NoteHistoryRepository,
}

impl HistoryService {
    /// Create a new history service.
    #[must_use]
    pub const fn new(history: NoteHistoryRepository) -> Self {
        Self { history }
    }

    /// Record that the user viewed the note, stamped with the current time.
    pub async fn record(&self, user_id: i64, note_id: i64) -> AppResult<()> {
        self.history.upsert(user_id, note_id, Utc::now()).await
    }
}
