//! Reaction repository.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::map_note_ref_err;
use crate::entities::{Note, Reaction, note, reaction};
use chrono::Utc;
use engage_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect,
    Set, TransactionTrait,
    sea_query::{Expr, LockType, OnConflict},
};

/// What a toggle did to the user's reaction on a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionToggle {
    /// The emoji was added.
    Added,
    /// The same emoji was already there and got removed.
    Removed,
    /// A different emoji was replaced by the requested one.
    Switched {
        /// Emoji that was removed.
        previous: String,
    },
    /// A concurrent toggle won the race; nothing changed.
    Conflict,
}

/// Apply a ±1 change to a sparse emoji → count map.
///
/// Counts never go below zero and zero entries are removed.
pub fn apply_reaction_delta(counts: &mut BTreeMap<String, i64>, emoji: &str, delta: i64) {
    let next = counts.get(emoji).copied().unwrap_or(0).saturating_add(delta).max(0);
    if next == 0 {
        counts.remove(emoji);
    } else {
        counts.insert(emoji.to_string(), next);
    }
}

fn decode_counts(value: &serde_json::Value) -> BTreeMap<String, i64> {
    serde_json::from_value(value.clone()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Malformed reaction_counts, starting from empty map");
        BTreeMap::new()
    })
}

/// Reaction repository for database operations.
#[derive(Clone)]
pub struct ReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Toggle `emoji` for a user on a note and update the note's tally.
    ///
    /// Everything happens in one transaction: the edge change, a row lock on
    /// the note, then a write of `reaction_counts` alone.
    pub async fn toggle(&self, user_id: i64, note_id: i64, emoji: &str) -> AppResult<ReactionToggle> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let removed = Reaction::delete_many()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::NoteId.eq(note_id))
            .filter(reaction::Column::Emoji.eq(emoji))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut deltas: Vec<(String, i64)> = Vec::with_capacity(2);
        let outcome = if removed.rows_affected > 0 {
            deltas.push((emoji.to_string(), -1));
            ReactionToggle::Removed
        } else {
            let previous = Self::take_existing(&txn, user_id, note_id).await?;
            if let Some(old) = &previous {
                deltas.push((old.clone(), -1));
            }

            let inserted = Reaction::insert(reaction::ActiveModel {
                user_id: Set(user_id),
                note_id: Set(note_id),
                emoji: Set(emoji.to_string()),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            })
            .on_conflict(
                OnConflict::columns([reaction::Column::UserId, reaction::Column::NoteId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(|e| map_note_ref_err(&e, note_id))?;

            if inserted == 0 {
                txn.rollback()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                return Ok(ReactionToggle::Conflict);
            }

            deltas.push((emoji.to_string(), 1));
            match previous {
                Some(previous) => ReactionToggle::Switched { previous },
                None => ReactionToggle::Added,
            }
        };

        // NO KEY UPDATE: the FK checks of concurrent inserts hold KEY SHARE on this row
        let locked = Note::find_by_id(note_id)
            .lock(LockType::NoKeyUpdate)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let Some(locked) = locked else {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Err(AppError::NoteNotFound(note_id));
        };

        let mut counts = decode_counts(&locked.reaction_counts);
        for (key, delta) in &deltas {
            apply_reaction_delta(&mut counts, key, *delta);
        }
        let counts = serde_json::to_value(&counts).map_err(|e| AppError::Internal(e.to_string()))?;

        Note::update_many()
            .col_expr(note::Column::ReactionCounts, Expr::value(counts))
            .filter(note::Column::Id.eq(note_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(outcome)
    }

    /// Delete whatever reaction the user holds on the note, returning its emoji.
    async fn take_existing(
        txn: &DatabaseTransaction,
        user_id: i64,
        note_id: i64,
    ) -> AppResult<Option<String>> {
        let existing = Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::NoteId.eq(note_id))
            .one(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let deleted = Reaction::delete_by_id(existing.id)
            .exec(txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((deleted.rows_affected > 0).then_some(existing.emoji))
    }

    /// Tally the reaction edges of a note by emoji.
    pub async fn count_by_note(&self, note_id: i64) -> AppResult<BTreeMap<String, i64>> {
        let rows: Vec<(String, i64)> = Reaction::find()
            .select_only()
            .column(reaction::Column::Emoji)
            .column_as(reaction::Column::Id.count(), "count")
            .filter(reaction::Column::NoteId.eq(note_id))
            .group_by(reaction::Column::Emoji)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().collect())
    }
}
