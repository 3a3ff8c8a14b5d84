//! Following repository.

use std::sync::Arc;

use crate::entities::{Following, following};
use chrono::Utc;
use engage_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::OnConflict,
};

/// Following repository for database operations.
#[derive(Clone)]
pub struct FollowingRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowingRepository {
    /// Create a new following repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a follow edge. Returns `false` if it already existed.
    pub async fn follow(&self, follower_id: i64, followee_id: i64) -> AppResult<bool> {
        let edge = following::ActiveModel {
            follower_id: Set(follower_id),
            followee_id: Set(followee_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let inserted = Following::insert(edge)
            .on_conflict(
                OnConflict::columns([following::Column::FollowerId, following::Column::FolloweeId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(inserted > 0)
    }

    /// Remove a follow edge. Returns `false` if there was none.
    pub async fn unfollow(&self, follower_id: i64, followee_id: i64) -> AppResult<bool> {
        let result = Following::delete_many()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// One page of follower ids of `followee_id`, ascending.
    ///
    /// Keyset pagination: pass the last id of the previous page as `after`.
    pub async fn find_follower_ids(
        &self,
        followee_id: i64,
        after: Option<i64>,
        limit: u64,
    ) -> AppResult<Vec<i64>> {
        let mut query = Following::find()
            .select_only()
            .column(following::Column::FollowerId)
            .filter(following::Column::FolloweeId.eq(followee_id));

        if let Some(after) = after {
            query = query.filter(following::Column::FollowerId.gt(after));
        }

        query
            .order_by_asc(following::Column::FollowerId)
            .limit(limit)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count followers of a user.
    pub async fn count_followers(&self, user_id: i64) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FolloweeId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    #[tokio::test]
    async fn test_find_follower_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    btreemap! { "follower_id" => Value::BigInt(Some(4)) },
                    btreemap! { "follower_id" => Value::BigInt(Some(9)) },
                ]])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db.clone());
        let ids = repo.find_follower_ids(1, Some(3), 2).await.unwrap();
        assert_eq!(ids, vec![4, 9]);
        drop(repo);

        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert!(log.contains("ORDER BY"));
        assert!(log.contains("LIMIT"));
    }

    #[tokio::test]
    async fn test_follow_twice_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db);
        assert!(repo.follow(1, 2).await.unwrap());
        assert!(!repo.follow(1, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_unfollow_reports_missing_edge() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = FollowingRepository::new(db.clone());
        assert!(repo.unfollow(1, 2).await.unwrap());
        assert!(!repo.unfollow(1, 2).await.unwrap());
        drop(repo);

        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert!(log.contains("DELETE FROM"));
    }
}
