//! Note repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Note, following, note};
use engage_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
    sea_query::{Expr, Query},
};

/// Note repository for database operations.
#[derive(Clone)]
pub struct NoteRepository {
    db: Arc<DatabaseConnection>,
}

impl NoteRepository {
    /// Create a new note repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a note by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<note::Model>> {
        Note::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a note by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<note::Model> {
        self.find_by_id(id)
            .await?
            .ok_or(AppError::NoteNotFound(id))
    }

    /// Find notes by IDs, returned in the order of `ids`. Missing ids are skipped.
    pub async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<note::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let found = Note::find()
            .filter(note::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut by_id: HashMap<i64, note::Model> = found.into_iter().map(|n| (n.id, n)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Create a new note.
    pub async fn create(&self, model: note::ActiveModel) -> AppResult<note::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Newest public notes written by the users `user_id` follows.
    ///
    /// Relational fallback for a cold or unavailable timeline cache.
    pub async fn find_following_timeline(
        &self,
        user_id: i64,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<note::Model>> {
        let followees = Query::select()
            .column(following::Column::FolloweeId)
            .from(following::Entity)
            .and_where(following::Column::FollowerId.eq(user_id))
            .to_owned();

        Note::find()
            .filter(note::Column::UserId.in_subquery(followees))
            .filter(note::Column::IsPrivate.eq(false))
            .order_by_desc(note::Column::CreatedAt)
            .order_by_desc(note::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite the title only. Returns whether the note exists.
    pub async fn update_title(&self, id: i64, title: &str) -> AppResult<bool> {
        let result = Note::update_many()
            .col_expr(note::Column::Title, Expr::value(title))
            .filter(note::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Overwrite the summary only. Returns whether the note exists.
    pub async fn update_summary(&self, id: i64, summary: &str) -> AppResult<bool> {
        let result = Note::update_many()
            .col_expr(note::Column::Summary, Expr::value(summary))
            .filter(note::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}
