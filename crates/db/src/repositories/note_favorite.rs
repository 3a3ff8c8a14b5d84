//! Note favorite repository.

use std::sync::Arc;

use super::map_note_ref_err;
use crate::entities::{Note, NoteFavorite, note, note_favorite};
use chrono::Utc;
use engage_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
    sea_query::{Expr, OnConflict},
};

/// Note favorite repository for database operations.
#[derive(Clone)]
pub struct NoteFavoriteRepository {
    db: Arc<DatabaseConnection>,
}

impl NoteFavoriteRepository {
    /// Create a new note favorite repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record a favorite and bump the note's counter in one transaction.
    ///
    /// Returns `false` when the edge already existed; the counter is left
    /// untouched in that case so redelivered messages are harmless.
    pub async fn add(&self, user_id: i64, note_id: i64) -> AppResult<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let favorite = note_favorite::ActiveModel {
            user_id: Set(user_id),
            note_id: Set(note_id),
            created_at: Set(Utc::now().into()),
        };

        let inserted = NoteFavorite::insert(favorite)
            .on_conflict(
                OnConflict::columns([note_favorite::Column::UserId, note_favorite::Column::NoteId])
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
            return Ok(false);
        }

        Note::update_many()
            .col_expr(
                note::Column::FavoriteCount,
                Expr::col(note::Column::FavoriteCount).add(1),
            )
            .filter(note::Column::Id.eq(note_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    /// Remove a favorite and decrement the counter, floored at zero.
    ///
    /// Returns `false` when there was nothing to remove.
    pub async fn remove(&self, user_id: i64, note_id: i64) -> AppResult<bool> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let deleted = NoteFavorite::delete_many()
            .filter(note_favorite::Column::UserId.eq(user_id))
            .filter(note_favorite::Column::NoteId.eq(note_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if deleted.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(false);
        }

        Note::update_many()
            .col_expr(
                note::Column::FavoriteCount,
                Expr::cust("GREATEST(favorite_count - 1, 0)"),
            )
            .filter(note::Column::Id.eq(note_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    /// Count favorite edges of a note.
    pub async fn count_by_note(&self, note_id: i64) -> AppResult<u64> {
        NoteFavorite::find()
            .filter(note_favorite::Column::NoteId.eq(note_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction};

    const fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn statements(log: &[Transaction]) -> String {
        format!("{log:?}")
    }

    #[tokio::test]
    async fn test_add_bumps_counter_once() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1), exec(1)])
                .into_connection(),
        );

        let repo = NoteFavoriteRepository::new(db.clone());
        assert!(repo.add(1, 10).await.unwrap());
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let sql = statements(&log);
        assert!(sql.contains("ON CONFLICT"));
        assert!(sql.contains("UPDATE"));
        assert!(sql.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_add_duplicate_leaves_counter_alone() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let repo = NoteFavoriteRepository::new(db.clone());
        assert!(!repo.add(1, 10).await.unwrap());
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let sql = statements(&log);
        assert!(sql.contains("INSERT"));
        assert!(!sql.contains("UPDATE"));
    }

    #[tokio::test]
    async fn test_remove_without_edge_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(0)])
                .into_connection(),
        );

        let repo = NoteFavoriteRepository::new(db.clone());
        assert!(!repo.remove(1, 10).await.unwrap());
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert!(!statements(&log).contains("GREATEST"));
    }

    #[tokio::test]
    async fn test_remove_decrements_with_floor() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1), exec(1)])
                .into_connection(),
        );

        let repo = NoteFavoriteRepository::new(db.clone());
        assert!(repo.remove(1, 10).await.unwrap());
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert!(statements(&log).contains("GREATEST(favorite_count - 1, 0)"));
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_errors([sea_orm::DbErr::Custom("connection reset".to_string())])
                .into_connection(),
        );

        let repo = NoteFavoriteRepository::new(db);
        let err = repo.add(1, 10).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert!(err.is_transient());
    }
}
