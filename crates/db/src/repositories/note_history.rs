//! Note view history repository.

use std::sync::Arc;

use super::map_note_ref_err;
use crate::entities::{NoteHistory, note_history};
use chrono::{DateTime, Utc};
use engage_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::OnConflict,
};

/// Note history repository for database operations.
#[derive(Clone)]
pub struct NoteHistoryRepository {
    db: Arc<DatabaseConnection>,
}

impl NoteHistoryRepository {
    /// Create a new note history repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a view or move an existing one to `viewed_at`.
    ///
    /// Keyed on (user, note), so any number of deliveries leaves one row.
    pub async fn upsert(&self, user_id: i64, note_id: i64, viewed_at: DateTime<Utc>) -> AppResult<()> {
        let entry = note_history::ActiveModel {
            user_id: Set(user_id),
            note_id: Set(note_id),
            viewed_at: Set(viewed_at.into()),
            ..Default::default()
        };

        NoteHistory::insert(entry)
            .on_conflict(
                OnConflict::columns([note_history::Column::UserId, note_history::Column::NoteId])
                    .update_column(note_history::Column::ViewedAt)
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| map_note_ref_err(&e, note_id))?;
        Ok(())
    }

    /// A user's most recent views, newest first.
    pub async fn find_recent(&self, user_id: i64, limit: u64) -> AppResult<Vec<note_history::Model>> {
        NoteHistory::find()
            .filter(note_history::Column::UserId.eq(user_id))
            .order_by_desc(note_history::Column::ViewedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
