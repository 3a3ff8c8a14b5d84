//! Favorite service.

use engage_common::{AppResult, Cache, cache::keys};
use engage_db::repositories::NoteFavoriteRepository;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Favorite change carried by `favorite_queue` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteAction {
    /// Favorite the note.
    Add,
    /// Remove the favorite.
    Remove,
}

impl fmt::Display for FavoriteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("add"),
            Self::Remove => f.write_str("remove"),
        }
    }
}

/// Applies favorite changes to the store and invalidates the affected entries.
#[derive(Clone)]
pub struct FavoriteService {
    favorites: NoteFavoriteRepository,
    cache: Cache,
}

impl FavoriteService {
    /// Create a new favorite service.
    #[must_use]
    pub const fn new(favorites: NoteFavoriteRepository, cache: Cache) -> Self {
        Self { favorites, cache }
    }

    /// Apply one favorite change. Returns whether the store changed.
    ///
    /// Replays are no-ops. The cached note and the user's favorites listing
    /// are cleared after commit either way.
    pub async fn apply(&self, user_id: i64, note_id: i64, action: FavoriteAction) -> AppResult<bool> {
        let changed = match action {
            FavoriteAction::Add => self.favorites.add(user_id, note_id).await?,
            FavoriteAction::Remove => self.favorites.remove(user_id, note_id).await?,
        };

        if !changed {
            debug!(user_id, note_id, %action, "Favorite already applied");
        }

        self.cache
            .del_many(&[keys::note(note_id), keys::user_favorites(user_id)])
            .await;

        Ok(changed)
    }
}
