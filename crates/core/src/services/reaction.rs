//! Reaction service.

use engage_common::{AppResult, Cache, cache::keys};
use engage_db::repositories::{ReactionRepository, ReactionToggle};
use tracing::debug;

/// Applies reaction toggles and invalidates the cached note.
#[derive(Clone)]
pub struct ReactionService {
    reactions: ReactionRepository,
    cache: Cache,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub const fn new(reactions: ReactionRepository, cache: Cache) -> Self {
        Self { reactions, cache }
    }

    /// Toggle `emoji` for the user on the note.
    pub async fn toggle(&self, user_id: i64, note_id: i64, emoji: &str) -> AppResult<ReactionToggle> {
        let outcome = self.reactions.toggle(user_id, note_id, emoji).await?;

        if outcome == ReactionToggle::Conflict {
            debug!(user_id, note_id, emoji, "Concurrent duplicate reaction, nothing applied");
        } else {
            self.cache.del(&keys::note(note_id)).await;
        }

        Ok(outcome)
    }
}
